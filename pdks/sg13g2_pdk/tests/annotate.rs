use sg13g2_pdk::annotate::DeviceAnnotator;
use sg13g2_pdk::{layers, technology};
use subgeom::Point;
use substrate::error::{ErrorContext, ErrorSource};
use substrate::layout::cell::Cell;
use substrate::pdk::annotate::error::AnnotateError;
use substrate::pdk::annotate::{DeviceParams, PrimitiveLayoutHook};
use substrate::pdk::rules::*;

fn annotator() -> DeviceAnnotator {
    DeviceAnnotator::from_layers(layers()).unwrap()
}

fn label(name: &str, params: DeviceParams) -> Result<String, AnnotateError> {
    let prim = technology().lookup(name).unwrap();
    annotator()
        .annotate(prim, &params)
        .map(|t| t.string.to_string())
}

fn resistor(name: &str, sheet_resistance: f64) -> Primitive {
    Resistor::builder()
        .name(name)
        .wire("GatPoly")
        .indicator("RES")
        .min_width(0.5)
        .min_length(0.5)
        .sheet_resistance(sheet_resistance)
        .build()
        .unwrap()
        .into()
}

#[test]
fn resistor_labels() {
    let a = annotator();
    let params = DeviceParams::new(1.0, 2.0);
    let text = a.annotate(&resistor("Rtest", 260.0), &params).unwrap();
    assert_eq!(text.string, "rtest r=520.000");
    assert_eq!(text.loc, Point::zero());
    assert_eq!(text.layer, layers().mask_spec("TEXT").unwrap());

    assert_eq!(
        label("Rppd", DeviceParams::new(1.0, 20.0)).unwrap(),
        "rppd r=7.938k"
    );
    assert_eq!(
        a.annotate(&resistor("Rk", 100.0), &DeviceParams::new(1.0, 10.0))
            .unwrap()
            .string,
        "rk r=1000.000"
    );
    assert_eq!(
        label("Rsil", DeviceParams::new(0.5, 1.0)).unwrap(),
        "rsil r=49.726"
    );
}

#[test]
fn labels_are_deterministic() {
    let params = DeviceParams::new(0.75, 3.5);
    assert_eq!(label("Rppd", params), label("Rppd", params));
}

#[test]
fn diode_labels() {
    let params = DeviceParams::default();
    assert_eq!(label("ndiode", params).unwrap(), "dant");
    assert_eq!(label("pdiode", params).unwrap(), "dpant");

    let adjust: Primitive = Diode::builder()
        .name("xdiode")
        .type_(ImplantType::Adjust)
        .wire("Activ")
        .min_width(0.48)
        .indicator("Recog.dio")
        .min_indicator_enclosure(0.02)
        .build()
        .unwrap()
        .into();
    assert_eq!(
        annotator().annotate(&adjust, &params),
        Err(AnnotateError::UnsupportedDiodeType {
            primitive: "xdiode".into(),
            type_: ImplantType::Adjust,
        })
    );
}

#[test]
fn bad_inputs_are_rejected() {
    assert_eq!(
        label("Rppd", DeviceParams::new(0.0, 2.0)),
        Err(AnnotateError::InvalidParam {
            primitive: "Rppd".into(),
            param: "width",
            value: 0.0,
        })
    );
    assert!(matches!(
        label("Rsil", DeviceParams::new(1.0, f64::INFINITY)),
        Err(AnnotateError::InvalidParam { param: "length", .. })
    ));
    assert!(matches!(
        label("sg13g2_lv_nmos", DeviceParams::new(1.0, 0.13)),
        Err(AnnotateError::UnsupportedDevice {
            kind: PrimitiveKind::Mosfet,
            ..
        })
    ));

    let unknown: Primitive = Resistor::builder()
        .name("Rbare")
        .wire("GatPoly")
        .indicator("RES")
        .min_width(0.5)
        .min_length(0.5)
        .build()
        .unwrap()
        .into();
    assert_eq!(
        annotator().annotate(&unknown, &DeviceParams::new(1.0, 1.0)),
        Err(AnnotateError::UnknownSheetResistance("Rbare".into()))
    );
}

#[test]
fn hook_appends_label() {
    let hook: &dyn PrimitiveLayoutHook = &annotator();
    let rppd = technology().lookup("Rppd").unwrap();
    let mut cell = Cell::new("rppd_w1_l2");
    hook.on_primitive_layout(rppd, &DeviceParams::new(1.0, 2.0), &mut cell)
        .unwrap();
    let texts: Vec<_> = cell.annotations().map(|a| a.string.as_str()).collect();
    assert_eq!(texts, ["rppd r=793.834"]);

    let nmos = technology().lookup("sg13g2_lv_nmos").unwrap();
    let mut cell = Cell::new("nmos");
    hook.on_primitive_layout(nmos, &DeviceParams::new(1.0, 0.13), &mut cell)
        .unwrap();
    assert_eq!(cell.annotations().count(), 0);

    let err = hook
        .on_primitive_layout(rppd, &DeviceParams::default(), &mut cell)
        .unwrap_err();
    assert!(matches!(
        err.source(),
        ErrorSource::Annotate(AnnotateError::MissingParam { param: "width", .. })
    ));
    assert_eq!(
        err.context(),
        [ErrorContext::AnnotatePrimitive {
            primitive: "Rppd".into()
        }]
    );
    assert_eq!(cell.annotations().count(), 0);
}
