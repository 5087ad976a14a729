#![allow(dead_code)]

use lazy_static::lazy_static;
use substrate::layout::layers::Layers;
use substrate::pdk::rules::*;

pub const LAYERS_CSV: &str = "layernum,datatype,name,purpose
1,0,Activ,drawing
1,2,Activ,pin
5,0,GatPoly,drawing
6,0,Cont,drawing
8,0,Metal1,drawing
8,2,Metal1,pin
8,25,Metal1,pintext
8,100,Metal1,obstruction
14,0,pSD,drawing
31,0,NWell,drawing
63,0,TEXT,drawing
";

lazy_static! {
    pub static ref GRID: Grid = Grid::from_microns(0.005).unwrap();
    pub static ref RULES: RuleGraph = small_rules().unwrap();
}

/// A small front-end process: one active, one poly, one metal.
pub fn small_rules() -> RuleResult<RuleGraph> {
    let mut g = RuleGraph::new("small", *GRID);
    g.register_all([Marker::new("Activ.pin"), Marker::new("Metal1.pin")])?;
    g.register(Marker::new("Metal1.obs"))?;
    g.register(Well::new("NWell", ImplantType::N, 0.62, 0.62))?;
    g.register(
        Implant::builder()
            .name("pSD")
            .type_(ImplantType::P)
            .min_width(0.31)
            .min_space(0.31)
            .min_area(0.25)
            .build()?,
    )?;
    g.register(
        WaferWire::builder()
            .name("Activ")
            .pin("Activ.pin")
            .min_width(0.15)
            .min_space(0.21)
            .min_area(0.122)
            .allow_in_substrate(true)
            .well("NWell")
            .implant("pSD")
            .enclosure(WireEnclosure::Implant, 0.18)
            .enclosure(WireEnclosure::Well, 0.31)
            .build()?,
    )?;
    g.register(
        GateWire::builder()
            .name("GatPoly")
            .min_width(0.13)
            .min_space(0.18)
            .build()?,
    )?;
    g.register(
        MetalWire::builder()
            .name("Metal1")
            .pin("Metal1.pin")
            .blockage("Metal1.obs")
            .min_width(0.16)
            .min_space(0.18)
            .space_row(0.3, Some(1.0), 0.22)
            .build()?,
    )?;
    g.register(
        Via::builder()
            .name("Cont")
            .width(0.16)
            .min_space(0.18)
            .bottom("Activ", 0.07)
            .bottom("GatPoly", 0.07)
            .top("Metal1", (0.0, 0.08))
            .build()?,
    )?;
    g.register(Spacing::new(["Activ"], ["pSD"], 0.18))?;
    g.register(Spacing::new(["Cont"], ["Activ"], 0.14))?;
    g.register(
        MosfetGate::builder()
            .name("mosgate")
            .active("Activ")
            .poly("GatPoly")
            .contact("Cont")
            .min_sd_width(0.23)
            .build()?,
    )?;
    g.register(
        Mosfet::builder()
            .name("pmos")
            .gate("mosgate")
            .well("NWell")
            .implant("pSD", 0.3)
            .build()?,
    )?;
    g.register(Auxiliary::new("TEXT"))?;
    Ok(g)
}

pub fn small_layers() -> Layers {
    Layers::from_csv(LAYERS_CSV).unwrap()
}
