// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Parallel NOR external flash on FSMC bank 1.
//!
//! The part is memory-mapped for reads, so the engine-facing `read` is
//! a plain volatile copy out of the window. The CFI query is the only
//! command sequence the bootloader ever issues: if the part cannot
//! answer 'Q','R','Y' it is either absent or the bus is broken, and
//! nothing staged on it can be trusted.

use quartz_common::hal::ExternalFlash;

use crate::board::RCC_AHB3ENR;

/// FSMC bank 1 memory window.
const NOR_BASE: u32 = 0x6000_0000;

const FSMC_BCR1: *mut u32 = 0xA000_0000 as *mut u32;
const FSMC_BTR1: *mut u32 = 0xA000_0004 as *mut u32;

const RCC_AHB3ENR_FSMCEN: u32 = 1 << 0;

// MBKEN | MTYP=NOR | MWID=16 | FACCEN | WREN
const BCR_NOR_X16: u32 = 1 | 0b10 << 2 | 0b01 << 4 | 1 << 6 | 1 << 12;
// Conservative timings; the bootloader is not in a hurry.
const BTR_SLOW: u32 = 0x0FFF_FFFF;

// CFI command set (x16 addressing)
const CFI_QUERY_ADDR: u32 = 0x55;
const CFI_QUERY_CMD: u16 = 0x98;
const CFI_RESET_CMD: u16 = 0xF0;

pub struct ExtNorFlash(());

impl ExtNorFlash {
    pub fn new() -> Self {
        unsafe {
            RCC_AHB3ENR.write_volatile(RCC_AHB3ENR.read_volatile() | RCC_AHB3ENR_FSMCEN);
            FSMC_BCR1.write_volatile(BCR_NOR_X16);
            FSMC_BTR1.write_volatile(BTR_SLOW);
        }
        Self(())
    }

    fn write_word(&mut self, word_addr: u32, value: u16) {
        unsafe {
            ((NOR_BASE + word_addr * 2) as *mut u16).write_volatile(value);
        }
    }

    fn read_word(&mut self, word_addr: u32) -> u16 {
        unsafe { ((NOR_BASE + word_addr * 2) as *const u16).read_volatile() }
    }
}

impl ExternalFlash for ExtNorFlash {
    fn read(&mut self, addr: u32, buf: &mut [u8]) {
        for (i, byte) in buf.iter_mut().enumerate() {
            *byte = unsafe { ((NOR_BASE + addr + i as u32) as *const u8).read_volatile() };
        }
    }

    fn sanity_check(&mut self) -> bool {
        self.write_word(CFI_QUERY_ADDR, CFI_QUERY_CMD);
        let q = self.read_word(0x10) as u8;
        let r = self.read_word(0x11) as u8;
        let y = self.read_word(0x12) as u8;
        self.write_word(0, CFI_RESET_CMD);

        let ok = q == b'Q' && r == b'R' && y == b'Y';
        if !ok {
            defmt::println!("CFI query failed: {:02x} {:02x} {:02x}", q, r, y);
        }
        ok
    }
}
