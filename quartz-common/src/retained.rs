// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Retained-register slot map and the version stamp.
//!
//! The slot ids are shared with the running firmware; moving one is a
//! flag-day. The reboot-reason slots belong to the firmware and are
//! never written from the boot path.

use crate::hal::RetainedStore;

/// Build timestamp of this bootloader, written to
/// [`SlotId::BootloaderVersion`] so the firmware can tell which loader
/// it was started by. Bumped with every release.
pub const BOOTLOADER_TIMESTAMP: u32 = 1_767_225_600;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum SlotId {
    /// Bitfield of [`crate::BootBit`] flags.
    BootBits = 0,
    /// Monotonic timestamp of the installed bootloader.
    BootloaderVersion = 1,
    /// Four per-button stuck-press counters, one byte each.
    StuckButtons = 2,
    RebootReason0 = 3,
    RebootReason1 = 4,
    RebootReason2 = 5,
    RebootReason3 = 6,
    RebootReason4 = 7,
    RebootReason5 = 8,
}

/// Number of retained slots the boot chain knows about.
pub const SLOT_COUNT: usize = 9;

/// Stamp the bootloader version, but only when the stored value
/// differs. A cleared backup domain that happens to read back the
/// compiled-in timestamp is left alone.
pub fn boot_version_write<S: RetainedStore>(store: &mut S) {
    if store.read(SlotId::BootloaderVersion) != BOOTLOADER_TIMESTAMP {
        store.write(SlotId::BootloaderVersion, BOOTLOADER_TIMESTAMP);
    }
}
