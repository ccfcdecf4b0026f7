// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Three-strikes fault counters.
//!
//! Two independent two-bit saturating counters live in the boot bits:
//! one for normal-firmware start failures, one for recovery-firmware
//! load failures. The first two observations advance a single bit
//! each; the third clears the pair and reports strike three, at which
//! point the caller takes its fallback action (switch to recovery, or
//! give up and show the sad watch).

use crate::bootbits::{self, BootBit};
use crate::hal::RetainedStore;

fn advance<S: RetainedStore>(store: &mut S, one: BootBit, two: BootBit) -> bool {
    if bootbits::test(store, two) {
        bootbits::clear(store, one);
        bootbits::clear(store, two);
        true
    } else if bootbits::test(store, one) {
        bootbits::set(store, two);
        false
    } else {
        bootbits::set(store, one);
        false
    }
}

/// Record a normal-firmware start failure. Returns true on strike
/// three: the caller should divert to the recovery image.
pub fn observe_fw_start_failure<S: RetainedStore>(store: &mut S) -> bool {
    let fatal = advance(
        store,
        BootBit::FwStartFailStrikeOne,
        BootBit::FwStartFailStrikeTwo,
    );
    warn!("firmware start failure (fatal: {})", fatal);
    fatal
}

/// Record a recovery-firmware load failure. Returns true on strike
/// three: nothing left to try.
pub fn observe_recovery_load_failure<S: RetainedStore>(store: &mut S) -> bool {
    let fatal = advance(
        store,
        BootBit::RecoveryLoadFailStrikeOne,
        BootBit::RecoveryLoadFailStrikeTwo,
    );
    warn!("recovery load failure (fatal: {})", fatal);
    fatal
}

pub fn clear_fw_strikes<S: RetainedStore>(store: &mut S) {
    bootbits::clear(store, BootBit::FwStartFailStrikeOne);
    bootbits::clear(store, BootBit::FwStartFailStrikeTwo);
}

pub fn clear_recovery_strikes<S: RetainedStore>(store: &mut S) {
    bootbits::clear(store, BootBit::RecoveryLoadFailStrikeOne);
    bootbits::clear(store, BootBit::RecoveryLoadFailStrikeTwo);
}
