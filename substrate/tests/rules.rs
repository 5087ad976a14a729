use common::{small_rules, GRID, RULES};
use substrate::error::{with_err_context, ErrorContext, ErrorSource};
use substrate::pdk::rules::*;

mod common;

#[test]
fn lookup_returns_registered_primitive() {
    let activ = RULES.lookup("Activ").unwrap();
    assert_eq!(activ.kind(), PrimitiveKind::WaferWire);
    assert_eq!(activ.pin().map(|p| p.as_str()), Some("Activ.pin"));
    assert_eq!(RULES.key("Activ"), RULES.key("Activ"));
    assert!(RULES.lookup("Metal9").is_none());
}

#[test]
fn double_registration_fails() {
    let mut g = small_rules().unwrap();
    let n = g.len();
    let err = g.register(Marker::new("Activ.pin")).unwrap_err();
    assert_eq!(err, RuleError::DuplicateName("Activ.pin".into()));
    assert_eq!(g.len(), n);
}

#[test]
fn forward_reference_is_rejected() {
    let mut g = RuleGraph::new("fwd", *GRID);
    let err = g
        .register(
            Via::builder()
                .name("Via1")
                .width(0.19)
                .min_space(0.22)
                .bottom("Metal1", (0.01, 0.05))
                .top("Metal2", (0.005, 0.05))
                .build()
                .unwrap(),
        )
        .unwrap_err();
    assert_eq!(
        err,
        RuleError::UnresolvedReference {
            primitive: "Via1".into(),
            field: "bottom",
            target: "Metal1".into(),
        }
    );
    assert!(g.is_empty());
}

#[test]
fn off_grid_value_is_rejected() {
    let mut g = RuleGraph::new("grid", *GRID);
    let err = g
        .register(
            GateWire::builder()
                .name("GatPoly")
                .min_width(0.1234)
                .min_space(0.18)
                .build()
                .unwrap(),
        )
        .unwrap_err();
    match err {
        RuleError::InvalidConstraint {
            primitive,
            field,
            value,
            reason,
        } => {
            assert_eq!(primitive, "GatPoly");
            assert_eq!(field, "min_width");
            assert_eq!(value, 0.1234);
            assert_eq!(reason, ConstraintViolation::OffGrid { grid: 0.005 });
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn derived_accessors_are_ordered() {
    let spacings: Vec<_> = RULES.spacings_of("Activ").map(|s| s.name().as_str()).collect();
    assert_eq!(
        spacings,
        ["Spacing(Activ,pSD:0.18)", "Spacing(Cont,Activ:0.14)"]
    );

    let vias: Vec<_> = RULES.vias_on("GatPoly").map(|v| v.name().as_str()).collect();
    assert_eq!(vias, ["Cont"]);
    assert_eq!(RULES.vias_between("Activ", "Metal1").count(), 1);
    assert_eq!(RULES.vias_between("Metal1", "Activ").count(), 0);

    let markers: Vec<_> = RULES
        .all_of_kind(PrimitiveKind::Marker)
        .map(|p| p.name().as_str())
        .collect();
    assert_eq!(markers, ["Activ.pin", "Metal1.pin", "Metal1.obs"]);
    assert_eq!(RULES.oxides_of("Activ").count(), 0);
}

#[test]
fn space_table_from_graph() {
    let m1 = RULES.get::<MetalWire>("Metal1").unwrap();
    assert_eq!(m1.min_space_for(0.16, 10.0), 0.18);
    assert_eq!(m1.min_space_for(0.4, 10.0), 0.22);
}

#[test]
fn rule_errors_carry_context() {
    let mut g = small_rules().unwrap();
    let err = with_err_context(g.register(Auxiliary::new("TEXT")), || {
        ErrorContext::BuildTechnology("small".into())
    })
    .unwrap_err();
    assert!(matches!(
        err.source(),
        ErrorSource::Rules(RuleError::DuplicateName(_))
    ));
    assert_eq!(
        err.context(),
        [ErrorContext::BuildTechnology("small".into())]
    );
    assert!(err.to_string().contains("while building technology small"));
}
