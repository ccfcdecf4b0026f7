// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Independent watchdog (IWDG) plus the reset-cause flag in RCC.
//!
//! The IWDG runs from the LSI and cannot be stopped once started, so
//! the policy only starts it on the way into a firmware jump. Long
//! erase and copy loops feed it through the progress callbacks.

use quartz_common::hal::Watchdog;

use crate::board::RCC_CSR;

const IWDG_KR: *mut u32 = 0x4000_3000 as *mut u32;
const IWDG_PR: *mut u32 = 0x4000_3004 as *mut u32;
const IWDG_RLR: *mut u32 = 0x4000_3008 as *mut u32;

const KR_UNLOCK: u32 = 0x5555;
const KR_FEED: u32 = 0xAAAA;
const KR_START: u32 = 0xCCCC;

// LSI/64 with a full reload: roughly eight seconds.
const PRESCALER_DIV64: u32 = 0b100;
const RELOAD_MAX: u32 = 0xFFF;

const CSR_IWDGRSTF: u32 = 1 << 29;
const CSR_RMVF: u32 = 1 << 24;

pub struct Iwdg(());

impl Iwdg {
    pub fn new() -> Self {
        Self(())
    }
}

impl Watchdog for Iwdg {
    fn start(&mut self) {
        unsafe {
            IWDG_KR.write_volatile(KR_UNLOCK);
            IWDG_PR.write_volatile(PRESCALER_DIV64);
            IWDG_RLR.write_volatile(RELOAD_MAX);
            IWDG_KR.write_volatile(KR_FEED);
            IWDG_KR.write_volatile(KR_START);
        }
    }

    fn feed(&mut self) {
        unsafe {
            IWDG_KR.write_volatile(KR_FEED);
        }
    }

    fn check_reset_flag(&mut self) -> bool {
        unsafe {
            let flagged = RCC_CSR.read_volatile() & CSR_IWDGRSTF != 0;
            RCC_CSR.write_volatile(RCC_CSR.read_volatile() | CSR_RMVF);
            flagged
        }
    }
}
