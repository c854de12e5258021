mod common;
use common::*;

use battctl::modbus::frame::RegisterBlock;
use battctl::storage::{self, Side, StorageLimits};
use battctl::sunspec::{ModelVariant, RegisterLayout};
use battctl::Error;

#[test]
fn scale_matches_powers_of_ten() {
    for exponent in -10i16..=10 {
        let register = exponent as u16;
        let expected = 10f64.powi(i32::from(exponent));
        let scale = storage::effective_scale(register);
        assert!(
            (scale - expected).abs() <= expected * 1e-12,
            "exponent {}: got {}, wanted {}",
            exponent,
            scale,
            expected
        );
    }
}

#[test]
fn scale_exponent_is_signed() {
    assert_eq!(storage::effective_scale(0xfffe), 0.01);
}

#[test]
fn percent_to_raw_rounds() {
    assert_eq!(storage::percent_to_raw(60, 0.01), 6000);
    assert_eq!(storage::percent_to_raw(60, 1.0), 60);
    assert_eq!(storage::percent_to_raw(33, 0.1), 330);
}

#[test]
fn percent_survives_a_raw_round_trip() {
    for scale in [1.0, 0.1, 0.01] {
        for percent in 0..=100 {
            let raw = storage::percent_to_raw(percent, scale);
            assert_eq!(
                storage::raw_to_percent(raw, scale),
                percent,
                "percent {} at scale {}",
                percent,
                scale
            );
        }
    }
}

#[test]
fn raw_to_percent_truncates() {
    assert_eq!(storage::raw_to_percent(7550, 0.01), 75);
    assert_eq!(storage::raw_to_percent(99, 0.01), 0);
}

#[test]
fn set_mask_is_idempotent_and_leaves_other_bits() {
    let bits = 0b1010_0100;

    let enabled = storage::set_mask(bits, Side::Charge, true);
    assert_eq!(enabled, 0b1010_0101);
    assert_eq!(storage::set_mask(enabled, Side::Charge, true), enabled);

    let disabled = storage::set_mask(enabled, Side::Discharge, false);
    assert_eq!(disabled, 0b1010_0101);
    assert_eq!(storage::set_mask(disabled, Side::Discharge, false), disabled);

    assert_eq!(storage::set_mask(enabled, Side::Charge, false), 0b1010_0100);
    assert_eq!(
        storage::set_mask(enabled, Side::Discharge, true),
        0b1010_0111
    );
}

#[test]
fn read_limits_extracts_the_block_points() {
    let layout = RegisterLayout::for_variant(ModelVariant::Integer);
    let block = RegisterBlock::new(control_block(0b10, 5000, 7500, 0xfffe));

    let limits = storage::read_limits(&block, &layout).unwrap();
    assert_eq!(
        limits,
        StorageLimits {
            control_bits: 0b10,
            charge_raw: 7500,
            discharge_raw: 5000,
            scale: 0.01,
        }
    );

    assert_eq!(limits.percent(Side::Discharge), 50);
    assert!(limits.enabled(Side::Discharge));
    assert_eq!(limits.percent(Side::Charge), 75);
    assert!(!limits.enabled(Side::Charge));
}

#[test]
fn read_limits_rejects_a_block_missing_points() {
    let layout = RegisterLayout::for_variant(ModelVariant::Integer);
    let block = RegisterBlock::new(vec![0; 20]); // ends before the scale factor

    match storage::read_limits(&block, &layout) {
        Err(Error::Protocol(message)) => assert!(
            message.contains("InOutWRte_SF"),
            "unexpected message: {}",
            message
        ),
        other => panic!("expected protocol error, got {:?}", other),
    }
}
