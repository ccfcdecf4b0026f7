// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Board constants and bring-up for the STM32F4 watch board.
//!
//! The bootloader runs from the HSI at 16 MHz; there is nothing here
//! that needs the PLL, and leaving the clock tree at its reset state
//! keeps the handoff cheap.

use embedded_hal::delay::DelayNs;
use quartz_common::policy::{Bootloader, StagingRegions};
use quartz_common::update::FirmwareLayout;

use crate::buttons::BoardButtons;
use crate::display::MemoryLcd;
use crate::ext_flash::ExtNorFlash;
use crate::int_flash::IntFlash;
use crate::power::PowerLatch;
use crate::rtc_backup::RtcBackup;
use crate::watchdog::Iwdg;

/// Core clock out of reset (HSI).
pub const SYSCLK_HZ: u32 = 16_000_000;

/// Internal-flash layout. The bootloader owns sectors 0-1; firmware
/// images start at the new-world base right behind it, except old
/// builds that still link against the 64 KiB mark.
pub const FIRMWARE_LAYOUT: FirmwareLayout = FirmwareLayout {
    new_world_base: 0x0800_8000,
    old_world_base: 0x0801_0000,
    slot_len: 0x000F_8000,
};

/// External-flash byte offsets of the staged-image regions.
pub const STAGING_REGIONS: StagingRegions = StagingRegions {
    update: 0x0020_0000,
    recovery: 0x0050_0000,
};

pub const SCRATCH_SIZE: usize = 64 * 1024;

// RCC register block, the only peripheral several drivers share.
pub const RCC_BASE: u32 = 0x4002_3800;
pub const RCC_AHB1ENR: *mut u32 = (RCC_BASE + 0x30) as *mut u32;
pub const RCC_AHB3ENR: *mut u32 = (RCC_BASE + 0x38) as *mut u32;
pub const RCC_APB1ENR: *mut u32 = (RCC_BASE + 0x40) as *mut u32;
pub const RCC_CSR: *mut u32 = (RCC_BASE + 0x74) as *mut u32;

/// Busy-wait delay calibrated against the core clock.
pub struct CycleDelay {
    pub sysclk_hz: u32,
}

impl DelayNs for CycleDelay {
    fn delay_ns(&mut self, ns: u32) {
        let cycles = (ns as u64 * self.sysclk_hz as u64 / 1_000_000_000) as u32;
        cortex_m::asm::delay(cycles.max(1));
    }
}

pub type BoardBootloader =
    Bootloader<RtcBackup, ExtNorFlash, IntFlash, MemoryLcd, BoardButtons, Iwdg, CycleDelay>;

pub struct Board {
    pub bootloader: BoardBootloader,
    pub power: PowerLatch,
}

/// Bring the board far enough up for the boot policy to run. Order
/// matters: the power latch must be held before anything slow happens,
/// and the backup domain must be open before the first boot-bit read.
pub fn init() -> Board {
    let power = PowerLatch::new();
    let store = RtcBackup::new();
    let buttons = BoardButtons::new();
    let ext_flash = ExtNorFlash::new();
    let int_flash = IntFlash::new();
    let mut display = MemoryLcd::new();
    display.init();
    let watchdog = Iwdg::new();

    Board {
        bootloader: Bootloader {
            store,
            ext_flash,
            int_flash,
            display,
            buttons,
            watchdog,
            delay: CycleDelay {
                sysclk_hz: SYSCLK_HZ,
            },
            layout: FIRMWARE_LAYOUT,
            regions: STAGING_REGIONS,
        },
        power,
    }
}
