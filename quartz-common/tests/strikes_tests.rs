// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Unit tests for the three-strikes fault counters.

mod mock;

use mock::MockStore;
use quartz_common::hal::RetainedStore;
use quartz_common::retained::SlotId;
use quartz_common::{bootbits, strikes, BootBit};

fn fresh_store() -> MockStore {
    let mut store = MockStore::default();
    bootbits::init(&mut store);
    store
}

// =============================================================================
// normal-firmware strikes
// =============================================================================

#[test]
fn test_fw_first_strike_sets_strike_one() {
    let mut store = fresh_store();
    assert!(!strikes::observe_fw_start_failure(&mut store));
    assert!(bootbits::test(&mut store, BootBit::FwStartFailStrikeOne));
    assert!(!bootbits::test(&mut store, BootBit::FwStartFailStrikeTwo));
}

#[test]
fn test_fw_second_strike_sets_strike_two() {
    let mut store = fresh_store();
    strikes::observe_fw_start_failure(&mut store);
    assert!(!strikes::observe_fw_start_failure(&mut store));
    assert!(bootbits::test(&mut store, BootBit::FwStartFailStrikeOne));
    assert!(bootbits::test(&mut store, BootBit::FwStartFailStrikeTwo));
}

#[test]
fn test_fw_third_strike_is_fatal_and_clears_pair() {
    let mut store = fresh_store();
    strikes::observe_fw_start_failure(&mut store);
    strikes::observe_fw_start_failure(&mut store);
    assert!(strikes::observe_fw_start_failure(&mut store));
    assert!(!bootbits::test(&mut store, BootBit::FwStartFailStrikeOne));
    assert!(!bootbits::test(&mut store, BootBit::FwStartFailStrikeTwo));
}

#[test]
fn test_fw_advance_changes_at_most_one_bit() {
    let mut store = fresh_store();
    let before = store.read(SlotId::BootBits);
    strikes::observe_fw_start_failure(&mut store);
    let after = store.read(SlotId::BootBits);
    assert_eq!((before ^ after).count_ones(), 1);

    let before = after;
    strikes::observe_fw_start_failure(&mut store);
    let after = store.read(SlotId::BootBits);
    assert_eq!((before ^ after).count_ones(), 1);
}

#[test]
fn test_clear_fw_strikes() {
    let mut store = fresh_store();
    strikes::observe_fw_start_failure(&mut store);
    strikes::observe_fw_start_failure(&mut store);
    strikes::clear_fw_strikes(&mut store);
    assert!(!bootbits::test(&mut store, BootBit::FwStartFailStrikeOne));
    assert!(!bootbits::test(&mut store, BootBit::FwStartFailStrikeTwo));

    // A fresh ladder starts over at strike one.
    assert!(!strikes::observe_fw_start_failure(&mut store));
}

// =============================================================================
// recovery-firmware strikes
// =============================================================================

#[test]
fn test_recovery_ladder_reaches_fatal_on_third() {
    let mut store = fresh_store();
    assert!(!strikes::observe_recovery_load_failure(&mut store));
    assert!(!strikes::observe_recovery_load_failure(&mut store));
    assert!(strikes::observe_recovery_load_failure(&mut store));
}

#[test]
fn test_counters_are_independent() {
    let mut store = fresh_store();
    strikes::observe_fw_start_failure(&mut store);
    strikes::observe_fw_start_failure(&mut store);

    // Two firmware strikes must not advance the recovery ladder.
    assert!(!strikes::observe_recovery_load_failure(&mut store));
    assert!(bootbits::test(&mut store, BootBit::FwStartFailStrikeTwo));
    assert!(bootbits::test(
        &mut store,
        BootBit::RecoveryLoadFailStrikeOne
    ));
    assert!(!bootbits::test(
        &mut store,
        BootBit::RecoveryLoadFailStrikeTwo
    ));
}

#[test]
fn test_clear_recovery_strikes() {
    let mut store = fresh_store();
    strikes::observe_recovery_load_failure(&mut store);
    strikes::clear_recovery_strikes(&mut store);
    assert!(!bootbits::test(
        &mut store,
        BootBit::RecoveryLoadFailStrikeOne
    ));
}
