// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Install engine: moves a staged image from external flash into the
//! internal firmware slot with integrity checks on both sides.
//!
//! The engine validates before it erases, so a bad staging area leaves
//! the installed firmware untouched. Once the erase begins, the only
//! acceptable outcomes are a verified copy or [`UpdateOutcome::ManglingFailure`].

use crate::bootbits::{self, BootBit};
use crate::hal::{Display, ExternalFlash, InternalFlash, RetainedStore, Watchdog};
use crate::image::{self, DESCRIPTION_SIZE};
use crate::integrity;

/// Result of one install attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UpdateOutcome {
    /// Image copied and verified in place.
    Success,
    /// Validation failed before internal flash was modified.
    UntouchedFailure,
    /// Internal flash was erased or written and the post-copy check
    /// failed; the installed firmware can no longer be trusted.
    ManglingFailure,
}

/// Where firmware may live in internal flash.
///
/// Some boards went through a layout change: older images link against
/// `old_world_base`, newer ones against the lower `new_world_base`.
/// The two bases share the tail of the slot, so installs must be
/// careful about residue from the other layout.
#[derive(Clone, Copy, Debug)]
pub struct FirmwareLayout {
    pub new_world_base: u32,
    pub old_world_base: u32,
    /// Usable bytes from `new_world_base` to the end of the slot.
    pub slot_len: u32,
}

impl FirmwareLayout {
    /// Pick the install base by looking at where the image expects to
    /// run. The reset-vector word of the body is the identifier: an
    /// entry point at or above the old-world base belongs to an
    /// old-world image.
    pub fn install_base(&self, reset_vector: u32) -> u32 {
        if reset_vector >= self.old_world_base {
            self.old_world_base
        } else {
            self.new_world_base
        }
    }

    /// Span to erase for an install at `base`. Dropping back to the
    /// old world erases from the new-world base as well, so no stale
    /// new-world vector table survives the downgrade.
    pub fn erase_span(&self, base: u32, firmware_length: u32) -> (u32, u32) {
        if base == self.old_world_base {
            let gap = self.old_world_base - self.new_world_base;
            (self.new_world_base, gap + firmware_length)
        } else {
            (base, firmware_length)
        }
    }

    /// Remaining slot bytes for an image installed at `base`.
    pub fn capacity_at(&self, base: u32) -> u32 {
        self.slot_len - (base - self.new_world_base)
    }
}

/// Install the staged image at `source` into the internal firmware
/// slot.
///
/// Progress is rendered across erase and copy: the erase span fills
/// the first part of the bar, the copy the rest. The watchdog is fed
/// on every sector the flash driver reports. External reads are staged
/// through `scratch`.
pub fn install_image<S, X, F, D, W>(
    store: &mut S,
    ext: &mut X,
    int: &mut F,
    display: &mut D,
    watchdog: &mut W,
    layout: &FirmwareLayout,
    source: u32,
    scratch: &mut [u8],
) -> UpdateOutcome
where
    S: RetainedStore,
    X: ExternalFlash,
    F: InternalFlash,
    D: Display,
    W: Watchdog,
{
    bootbits::set(store, BootBit::NewFwUpdateInProgress);
    display.progress(0, 1);

    let desc = image::read_description(ext, source);
    if !desc.is_valid() {
        warn!("staged image description invalid");
        return UpdateOutcome::UntouchedFailure;
    }
    if desc.firmware_length == 0 || desc.firmware_length > layout.slot_len {
        warn!("staged image length unusable: {}", desc.firmware_length);
        return UpdateOutcome::UntouchedFailure;
    }

    let body = source + DESCRIPTION_SIZE;
    let staged_crc = integrity::crc32_external(ext, body, desc.firmware_length, scratch);
    if staged_crc != desc.checksum {
        warn!(
            "staged image crc mismatch: expected 0x{:08x}, got 0x{:08x}",
            desc.checksum, staged_crc
        );
        return UpdateOutcome::UntouchedFailure;
    }

    // Identifier word: the image's reset vector decides which world it
    // belongs to.
    let mut word = [0u8; 4];
    ext.read(body + 4, &mut word);
    let base = layout.install_base(u32::from_le_bytes(word));
    if desc.firmware_length > layout.capacity_at(base) {
        warn!("image does not fit at base 0x{:08x}", base);
        return UpdateOutcome::UntouchedFailure;
    }

    let (erase_base, erase_len) = layout.erase_span(base, desc.firmware_length);
    let total = erase_len + desc.firmware_length;
    trace!(
        "installing {} bytes at 0x{:08x} (erase 0x{:08x}+{})",
        desc.firmware_length,
        base,
        erase_base,
        erase_len
    );

    int.erase(erase_base, erase_len, &mut |done| {
        watchdog.feed();
        display.progress(done.min(erase_len), total);
    });

    let mut written: u32 = 0;
    while written < desc.firmware_length {
        let n = (desc.firmware_length - written).min(scratch.len() as u32);
        ext.read(body + written, &mut scratch[..n as usize]);
        let chunk_base = erase_len + written;
        int.write(base + written, &scratch[..n as usize], &mut |done| {
            watchdog.feed();
            display.progress((chunk_base + done).min(total), total);
        });
        written += n;
        display.progress(erase_len + written, total);
    }

    let installed_crc = integrity::crc32_internal(int, base, desc.firmware_length);
    if installed_crc != desc.checksum {
        warn!(
            "installed image crc mismatch: expected 0x{:08x}, got 0x{:08x}",
            desc.checksum, installed_crc
        );
        return UpdateOutcome::ManglingFailure;
    }

    display.progress(total, total);
    if let Some(meta) = image::read_metadata(ext, source, &desc) {
        trace!(
            "installed firmware {} ({})",
            meta.version_tag.as_str(),
            meta.version_timestamp
        );
    }
    UpdateOutcome::Success
}
