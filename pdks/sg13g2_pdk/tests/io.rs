use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use sg13g2_pdk::compliance::{ComplianceTarget, PadKind};
use sg13g2_pdk::Sg13g2Pdk;
use subgeom::orientation::Named;
use substrate::error::{ErrorContext, ErrorSource};
use substrate::layout::cell::Cell;
use substrate::pdk::rules::ImplantType;

mod common;

fn pdk() -> Sg13g2Pdk {
    Sg13g2Pdk::with_params("/opt/pdks/ihp-sg13g2", Default::default()).unwrap()
}

#[test]
fn callback_sees_labeled_cell() {
    let seen = Arc::new(AtomicUsize::new(0));
    let seen_cb = seen.clone();
    let hooks = pdk().io_hooks().with_callback(move |cell: &mut Cell| {
        seen_cb.store(cell.annotations().count(), Ordering::SeqCst);
        Ok(())
    });

    let mut cell = Cell::new("sg13g2_GuardRing_P");
    let target = ComplianceTarget::GuardRing {
        type_: ImplantType::P,
        width: 20_000,
        height: 10_000,
        ring_width: 2_000,
    };
    assert_eq!(hooks.on_create(&mut cell, target).unwrap(), 1);
    assert_eq!(seen.load(Ordering::SeqCst), 1);
}

#[test]
fn callback_is_skipped_on_failed_scan() {
    let called = Arc::new(AtomicUsize::new(0));
    let called_cb = called.clone();
    let hooks = pdk().io_hooks().with_callback(move |_: &mut Cell| {
        called_cb.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });

    let ndio = common::diode("sg13g2_DCNDiode");
    let mut cell = Cell::new("sg13g2_IOPadIn");
    cell.add_inst(common::place(&ndio, "dcndiode", (0, 0), Named::R0));
    assert!(hooks
        .on_create(&mut cell, ComplianceTarget::Pad(PadKind::In))
        .is_err());
    assert_eq!(called.load(Ordering::SeqCst), 0);
}

#[test]
fn callback_errors_carry_cell_name() {
    let hooks = pdk().io_hooks().with_callback(|_: &mut Cell| {
        Err(ErrorSource::InvalidArgs("no filler".into()).into())
    });
    let mut cell = Cell::new("sg13g2_Filler200");
    let target = ComplianceTarget::DcDiode {
        type_: ImplantType::P,
        active_width: 1_260,
    };
    let err = hooks.on_create(&mut cell, target).unwrap_err();
    assert!(matches!(err.source(), ErrorSource::InvalidArgs(_)));
    assert_eq!(
        err.context(),
        [ErrorContext::Task(
            "running create callback of sg13g2_Filler200".into()
        )]
    );
}
