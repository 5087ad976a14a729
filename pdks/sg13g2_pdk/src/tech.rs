//! The SG13G2 design rules.

use substrate::pdk::rules::*;

use crate::config::Sg13g2Params;

/// Name of the technology, as used in rule decks.
pub const TECH_NAME: &str = "IHPSG13G2";

/// Wires that get a `.pin` marker.
const PIN_LAYERS: [&str; 9] = [
    "Activ", "GatPoly", "Metal1", "Metal2", "Metal3", "Metal4", "Metal5", "TopMetal1",
    "TopMetal2",
];

/// Layers that get a `.obs` marker.
const OBS_LAYERS: [&str; 16] = [
    "Activ", "GatPoly", "Cont", "Metal1", "Metal2", "Metal3", "Metal4", "Metal5", "Via1",
    "Via2", "Via3", "Via4", "TopMetal1", "TopVia1", "TopMetal2", "TopVia2",
];

fn pin(name: &str) -> String {
    format!("{name}.pin")
}

fn obs(name: &str) -> String {
    format!("{name}.obs")
}

/// Builds the SG13G2 rule graph.
///
/// Primitives are registered so that every reference points back to an
/// already registered primitive.
pub fn build_technology(params: &Sg13g2Params) -> RuleResult<RuleGraph> {
    let mut g = RuleGraph::new(TECH_NAME, Grid::from_microns(params.grid)?);

    g.register_all(PIN_LAYERS.iter().map(|name| Marker::new(pin(name))))?;
    g.register_all(OBS_LAYERS.iter().map(|name| Marker::new(obs(name))))?;

    register_front_end(&mut g)?;
    register_interconnect(&mut g)?;
    register_spacings(&mut g)?;
    register_devices(&mut g, params)?;

    g.register_all([
        Auxiliary::new("TEXT"),
        Auxiliary::new("prBoundary"),
        Auxiliary::new("Recog.esd"),
    ])?;

    log::info!(
        "built technology {} with {} primitives on a {} grid",
        g.name(),
        g.len(),
        g.grid()
    );
    Ok(g)
}

fn register_front_end(g: &mut RuleGraph) -> RuleResult<()> {
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
    g.register(Insulator::new("ThickGateOx", 0.86, 0.86))?;
    g.register(
        Implant::builder()
            .name("EXTBlock")
            .type_(ImplantType::Adjust)
            .min_width(0.31)
            .min_space(0.31)
            .build()?,
    )?;
    g.register(Marker::new("RES"))?;
    g.register(ExtraProcess::new("SalBlock", 0.42, 0.42))?;
    g.register(SubstrateMarker::new("Substrate"))?;

    g.register(
        WaferWire::builder()
            .name("Activ")
            .pin(pin("Activ"))
            .blockage(obs("Activ"))
            .min_width(0.15)
            .min_space(0.21)
            .min_area(0.122)
            .allow_in_substrate(true)
            .well("NWell")
            .implant("pSD")
            .oxide("ThickGateOx")
            .enclosure(WireEnclosure::Implant, 0.18)
            .enclosure(WireEnclosure::Well, 0.31)
            .enclosure(WireEnclosure::Substrate, 0.31)
            .well_enclosure_for_oxide("ThickGateOx", 0.62)
            .substrate_enclosure_for_oxide("ThickGateOx", 0.62)
            .enclosure(WireEnclosure::WellSameType, 0.03)
            .enclosure(WireEnclosure::SubstrateSameType, 0.03)
            .enclosure(WireEnclosure::Oxide, 0.27)
            .allow_contactless_implant(false)
            .allow_well_crossing(false)
            .build()?,
    )?;
    g.register(
        GateWire::builder()
            .name("GatPoly")
            .pin(pin("GatPoly"))
            .blockage(obs("GatPoly"))
            .min_width(0.13)
            .min_space(0.18)
            .min_area(0.09)
            .build()?,
    )?;
    Ok(())
}

fn register_interconnect(g: &mut RuleGraph) -> RuleResult<()> {
    g.register(
        MetalWire::builder()
            .name("Metal1")
            .pin(pin("Metal1"))
            .blockage(obs("Metal1"))
            .min_width(0.16)
            .min_space(0.18)
            .space_row(0.3, Some(1.0), 0.22)
            .space_row(10.0, Some(10.0), 0.6)
            .min_area(0.09)
            .build()?,
    )?;
    for n in 2..=5 {
        let name = format!("Metal{n}");
        g.register(
            MetalWire::builder()
                .name(name.as_str())
                .pin(pin(&name))
                .blockage(obs(&name))
                .min_width(0.2)
                .min_space(0.21)
                .space_row(0.39, Some(1.0), 0.24)
                .space_row(10.0, Some(10.0), 0.6)
                .min_area(0.144)
                .build()?,
        )?;
    }
    g.register(
        MetalWire::builder()
            .name("TopMetal1")
            .pin(pin("TopMetal1"))
            .blockage(obs("TopMetal1"))
            .min_width(1.64)
            .min_space(1.64)
            .build()?,
    )?;
    g.register(
        MetalWire::builder()
            .name("TopMetal2")
            .pin(pin("TopMetal2"))
            .blockage(obs("TopMetal2"))
            .min_width(2.0)
            .min_space(2.0)
            .space_row(5.0, Some(50.0), 5.0)
            .build()?,
    )?;

    g.register(
        Via::builder()
            .name("Cont")
            .blockage(obs("Cont"))
            .width(0.16)
            .min_space(0.18)
            .bottom("Activ", 0.07)
            .bottom("GatPoly", 0.07)
            .top("Metal1", (0.0, 0.08))
            .build()?,
    )?;
    g.register(
        Via::builder()
            .name("Via1")
            .blockage(obs("Via1"))
            .width(0.19)
            .min_space(0.22)
            .bottom("Metal1", (0.01, 0.05))
            .top("Metal2", (0.005, 0.05))
            .build()?,
    )?;
    for n in 2..=4 {
        let name = format!("Via{n}");
        g.register(
            Via::builder()
                .name(name.as_str())
                .blockage(obs(&name))
                .width(0.19)
                .min_space(0.22)
                .bottom(format!("Metal{n}"), (0.005, 0.05))
                .top(format!("Metal{}", n + 1), (0.005, 0.05))
                .build()?,
        )?;
    }
    g.register(
        Via::builder()
            .name("TopVia1")
            .blockage(obs("TopVia1"))
            .width(0.42)
            .min_space(0.42)
            .bottom("Metal5", 0.01)
            .top("TopMetal1", 0.42)
            .build()?,
    )?;
    g.register(
        Via::builder()
            .name("TopVia2")
            .blockage(obs("TopVia2"))
            .width(0.9)
            .min_space(1.06)
            .bottom("TopMetal1", 0.5)
            .top("TopMetal2", 0.5)
            .build()?,
    )?;

    g.register(
        PadOpening::builder()
            .name("Passiv")
            .min_width(40.0)
            .min_space(3.5)
            .bottom("TopMetal2")
            .min_bottom_enclosure(2.1)
            .build()?,
    )?;
    Ok(())
}

fn register_spacings(g: &mut RuleGraph) -> RuleResult<()> {
    g.register_all([
        Spacing::new(["Activ"], ["pSD"], 0.18),
        Spacing::new(["NWell"], ["Activ"], 0.24),
        Spacing::new(["Activ"], ["ThickGateOx"], 0.27),
        Spacing::new(["Activ"], ["GatPoly"], 0.07),
        Spacing::new(["Cont"], ["Activ"], 0.14),
        Spacing::new(["SalBlock"], ["Activ", "GatPoly", "Cont"], 0.2),
        Spacing::new(["EXTBlock"], ["pSD"], 0.31),
        Spacing::new(["GatPoly"], ["EXTBlock"], 0.18),
    ])
}

fn register_devices(g: &mut RuleGraph, params: &Sg13g2Params) -> RuleResult<()> {
    g.register(
        Resistor::builder()
            .name("Rsil")
            .wire("GatPoly")
            .indicator("RES")
            .min_width(0.5)
            .min_length(0.5)
            .min_indicator_extension(0.0)
            .contact("Cont")
            .min_contact_space(0.12)
            .sheet_resistance(params.rsil_sheet_resistance)
            .build()?,
    )?;
    g.register(
        Resistor::builder()
            .name("Rppd")
            .wire("GatPoly")
            .indicator("SalBlock")
            .min_width(0.5)
            .min_length(0.5)
            .min_indicator_extension(0.2)
            .implant("pSD", 0.18)
            .implant("EXTBlock", 0.18)
            .contact("Cont")
            .min_contact_space(0.2)
            .sheet_resistance(params.rppd_sheet_resistance)
            .build()?,
    )?;

    g.register(Marker::new("Recog.dio"))?;
    g.register(
        Diode::builder()
            .name("ndiode")
            .type_(ImplantType::N)
            .wire("Activ")
            .min_width(0.48)
            .indicator("Recog.dio")
            .min_indicator_enclosure(0.02)
            .build()?,
    )?;
    g.register(
        Diode::builder()
            .name("pdiode")
            .type_(ImplantType::P)
            .wire("Activ")
            .min_width(0.48)
            .indicator("Recog.dio")
            .min_indicator_enclosure(0.02)
            .implant("pSD")
            .well("NWell")
            .build()?,
    )?;

    g.register(
        MosfetGate::builder()
            .name("lvmosgate")
            .active("Activ")
            .poly("GatPoly")
            .contact("Cont")
            .min_sd_width(0.23)
            .min_polyactive_extension(0.18)
            .min_contactgate_space(0.11)
            .build()?,
    )?;
    g.register(
        MosfetGate::builder()
            .name("hvmosgate")
            .active("Activ")
            .poly("GatPoly")
            .oxide("ThickGateOx")
            .contact("Cont")
            .min_l(0.45)
            .min_w(0.3)
            .max_w(10.0)
            .min_gate_space(0.25)
            .min_gateoxide_enclosure((0.34, 0.26))
            .min_sd_width(0.23)
            .min_polyactive_extension(0.18)
            .min_contactgate_space(0.11)
            .build()?,
    )?;

    g.register(
        Mosfet::builder()
            .name("sg13g2_lv_nmos")
            .gate("lvmosgate")
            .build()?,
    )?;
    g.register(
        Mosfet::builder()
            .name("sg13g2_lv_pmos")
            .gate("lvmosgate")
            .well("NWell")
            .implant("pSD", 0.3)
            .build()?,
    )?;
    g.register(
        Mosfet::builder()
            .name("sg13g2_hv_nmos")
            .gate("hvmosgate")
            .build()?,
    )?;
    g.register(
        Mosfet::builder()
            .name("sg13g2_hv_pmos")
            .gate("hvmosgate")
            .well("NWell")
            .implant("pSD", 0.4)
            .build()?,
    )?;
    g.register_all([
        Spacing::new(["sg13g2_lv_nmos"], ["pSD"], 0.3),
        Spacing::new(["sg13g2_hv_nmos"], ["pSD"], 0.4),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registration_order_resolves() {
        let g = build_technology(&Sg13g2Params::default()).unwrap();
        assert_eq!(g.name(), TECH_NAME);
        assert_eq!(g.grid().nm(), 5);
        assert_eq!(g.all::<MetalWire>().count(), 7);
        assert_eq!(g.all::<Via>().count(), 7);
        assert_eq!(g.all::<Mosfet>().count(), 4);
    }

    #[test]
    fn every_via_has_an_obstruction_marker() {
        let g = build_technology(&Sg13g2Params::default()).unwrap();
        for via in g.all::<Via>() {
            let blockage = via.blockage().unwrap();
            assert_eq!(blockage.as_str(), obs(via.name()));
            assert!(g.get::<Marker>(blockage).is_ok(), "{blockage} not registered");
        }
        assert!(g.get::<Marker>("TopVia2.obs").is_ok());
        assert_eq!(g.all::<Marker>().count(), PIN_LAYERS.len() + OBS_LAYERS.len() + 2);
    }

    #[test]
    fn off_grid_parameter_fails() {
        let params = Sg13g2Params {
            grid: 0.0123,
            ..Default::default()
        };
        assert!(matches!(
            build_technology(&params),
            Err(RuleError::InvalidGrid(_))
        ));
    }
}
