// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Hardware-independent core of the quartz bootloader.
//!
//! Everything that decides *what* the bootloader does lives here: the
//! boot-bit register, the reset-loop and strike counters, the staged
//! image format, the install engine, and the boot policy. Hardware is
//! reached exclusively through the traits in [`hal`], so the whole
//! crate runs under host tests with in-memory doubles.

#![no_std]

#[macro_use]
mod fmt;

pub mod bootbits;
pub mod hal;
pub mod image;
pub mod integrity;
pub mod policy;
pub mod reset_loop;
pub mod retained;
pub mod strikes;
pub mod update;

// Re-export commonly used types
pub use bootbits::BootBit;
pub use hal::{Button, Buttons, Display, ExternalFlash, InternalFlash, RetainedStore, Watchdog};
pub use image::{FirmwareDescription, FirmwareMetadata};
pub use policy::{BootVerdict, Bootloader, SadCode, StagingRegions};
pub use retained::SlotId;
pub use update::{FirmwareLayout, UpdateOutcome};
