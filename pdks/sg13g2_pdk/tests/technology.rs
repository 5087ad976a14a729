use float_eq::assert_float_eq;
use sg13g2_pdk::config::Sg13g2Params;
use sg13g2_pdk::layers::LAYERS_CSV;
use sg13g2_pdk::{build_layers, build_technology, io_spec, technology, Sg13g2Pdk};
use substrate::error::{ErrorContext, ErrorSource};
use substrate::layout::layers::{LayerMapError, LayerPurpose, Layers, MissingEntry};
use substrate::pdk::rules::*;
use substrate::pdk::{Pdk, PdkParams};

#[test]
fn full_rule_set_builds() {
    let g = technology();
    assert_eq!(g.name(), "IHPSG13G2");

    let activ = g.get::<WaferWire>("Activ").unwrap();
    assert_eq!(activ.wells().len(), 1);
    assert_eq!(activ.wells()[0], "NWell");
    assert_eq!(
        activ.well_enclosure(Some("ThickGateOx")),
        Some(Enclosure::uniform(0.62))
    );
    assert_eq!(activ.well_enclosure(None), Some(Enclosure::uniform(0.31)));

    let m3 = g.get::<MetalWire>("Metal3").unwrap();
    assert_float_eq!(m3.min_space_for(0.2, 0.5), 0.21, abs <= 1e-12);
    assert_float_eq!(m3.min_space_for(0.5, 2.0), 0.24, abs <= 1e-12);
    assert_float_eq!(m3.min_space_for(12.0, 12.0), 0.6, abs <= 1e-12);

    let vias: Vec<_> = g.vias_on("Metal1").map(|v| v.name().as_str()).collect();
    assert_eq!(vias, ["Cont", "Via1"]);
    assert_eq!(g.vias_between("TopMetal1", "TopMetal2").count(), 1);

    let oxides: Vec<_> = g.oxides_of("Activ").map(|o| o.name().as_str()).collect();
    assert_eq!(oxides, ["ThickGateOx"]);

    let psd: Vec<_> = g.spacings_of("pSD").map(|s| s.name().as_str()).collect();
    assert_eq!(
        psd,
        [
            "Spacing(Activ,pSD:0.18)",
            "Spacing(EXTBlock,pSD:0.31)",
            "Spacing(sg13g2_lv_nmos,pSD:0.3)",
            "Spacing(sg13g2_hv_nmos,pSD:0.4)",
        ]
    );

    let rppd = g.get::<Resistor>("Rppd").unwrap();
    assert_eq!(rppd.sheet_resistance(), Some(396.917));
    assert_eq!(rppd.indicator(), "SalBlock");
    assert_eq!(g.get::<Diode>("pdiode").unwrap().type_(), ImplantType::P);
    assert_eq!(
        g.get::<Mosfet>("sg13g2_hv_pmos").unwrap().gate(),
        "hvmosgate"
    );
    assert!(g.lookup("Recog.esd").is_some());
}

#[test]
fn layer_table_covers_technology() {
    let layers = build_layers().unwrap();
    layers.validate(technology()).unwrap();
    assert_eq!(
        sg13g2_pdk::layers().map("Recog.dio", LayerPurpose::Drawing),
        Some(substrate::layout::layers::GdsLayerSpec(99, 31))
    );
}

#[test]
fn removed_layer_entry_is_named() {
    let csv: String = LAYERS_CSV
        .lines()
        .filter(|l| *l != "19,100,Via1,obstruction")
        .map(|l| format!("{l}\n"))
        .collect();
    let layers = Layers::from_csv(&csv).unwrap();
    assert_eq!(
        layers.validate(technology()),
        Err(LayerMapError::MissingEntries(vec![MissingEntry {
            primitive: "Via1.obs".into(),
            layer: "Via1".into(),
            purpose: LayerPurpose::Obstruction,
        }]))
    );
}

#[test]
fn technology_is_append_only() {
    let mut g = build_technology(&Sg13g2Params::default()).unwrap();
    let n = g.len();
    assert_eq!(
        g.register(Marker::new("RES")),
        Err(RuleError::DuplicateName("RES".into()))
    );
    assert_eq!(g.len(), n);
}

#[test]
fn pdk_exposes_tables() {
    let pdk = Sg13g2Pdk::new(&PdkParams {
        pdk_root: "/opt/pdks/ihp-sg13g2".into(),
    })
    .unwrap();
    assert_eq!(pdk.name(), "sg13g2");
    assert_eq!(pdk.process(), "IHPSG13G2");
    assert_eq!(pdk.layout_grid(), 5);
    assert_eq!(pdk.rules().len(), technology().len());
    assert!(pdk.primitive_layout_hook().is_some());
    assert_eq!(pdk.io_spec(), io_spec());
    assert_eq!(pdk.spice_models().iter().count(), 8);
    assert!(pdk.model_dir().ends_with("libs.tech/ngspice/models"));
}

#[test]
fn off_grid_sheet_resistance_is_accepted_but_grid_is_checked() {
    let params = Sg13g2Params::builder()
        .rppd_sheet_resistance(400.123)
        .build()
        .unwrap();
    let pdk = Sg13g2Pdk::with_params("/opt/pdks/ihp-sg13g2", params).unwrap();
    assert_eq!(
        pdk.rules().get::<Resistor>("Rppd").unwrap().sheet_resistance(),
        Some(400.123)
    );

    let params = Sg13g2Params::builder().grid(0.0025).build().unwrap();
    let err = match Sg13g2Pdk::with_params("/opt/pdks/ihp-sg13g2", params) {
        Ok(_) => panic!("a 2.5nm grid should be rejected"),
        Err(err) => err,
    };
    assert!(matches!(
        err.source(),
        ErrorSource::Rules(RuleError::InvalidGrid(_))
    ));
    assert_eq!(
        err.context(),
        [ErrorContext::BuildTechnology("IHPSG13G2".into())]
    );
}
