// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! STM32F4 embedded flash controller.
//!
//! Erase works on the part's uneven sector map (4x16K, 1x64K, then
//! 128K sectors); programming is word-wise with the tail padded to a
//! full word. Both wait for BSY to clear before returning, so callers
//! see strictly ordered flash state.

use quartz_common::hal::InternalFlash;

const FLASH_BASE: u32 = 0x0800_0000;
const FLASH_END: u32 = 0x0810_0000;

const FLASH_KEYR: *mut u32 = 0x4002_3C04 as *mut u32;
const FLASH_SR: *mut u32 = 0x4002_3C0C as *mut u32;
const FLASH_CR: *mut u32 = 0x4002_3C10 as *mut u32;

const KEY1: u32 = 0x4567_0123;
const KEY2: u32 = 0xCDEF_89AB;

const CR_PG: u32 = 1 << 0;
const CR_SER: u32 = 1 << 1;
const CR_SNB_SHIFT: u32 = 3;
const CR_PSIZE_X32: u32 = 0b10 << 8;
const CR_STRT: u32 = 1 << 16;
const CR_LOCK: u32 = 1 << 31;

const SR_BSY: u32 = 1 << 16;
// WRPERR, PGAERR, PGPERR, PGSERR, OPERR
const SR_ERRORS: u32 = 1 << 4 | 1 << 5 | 1 << 6 | 1 << 7 | 1 << 1;

/// Sector map of the 1 MiB part.
const SECTORS: [(u32, u32, u32); 12] = [
    (0, 0x0800_0000, 0x4000),
    (1, 0x0800_4000, 0x4000),
    (2, 0x0800_8000, 0x4000),
    (3, 0x0800_C000, 0x4000),
    (4, 0x0801_0000, 0x1_0000),
    (5, 0x0802_0000, 0x2_0000),
    (6, 0x0804_0000, 0x2_0000),
    (7, 0x0806_0000, 0x2_0000),
    (8, 0x0808_0000, 0x2_0000),
    (9, 0x080A_0000, 0x2_0000),
    (10, 0x080C_0000, 0x2_0000),
    (11, 0x080E_0000, 0x2_0000),
];

/// Progress callbacks come at least this often during programming.
const PROGRESS_GRANULE: u32 = 0x1000;

pub struct IntFlash(());

impl IntFlash {
    pub fn new() -> Self {
        Self(())
    }

    fn unlock(&mut self) {
        unsafe {
            if FLASH_CR.read_volatile() & CR_LOCK != 0 {
                FLASH_KEYR.write_volatile(KEY1);
                FLASH_KEYR.write_volatile(KEY2);
            }
        }
    }

    fn lock(&mut self) {
        unsafe {
            FLASH_CR.write_volatile(FLASH_CR.read_volatile() | CR_LOCK);
        }
    }

    fn wait_not_busy(&mut self) {
        unsafe {
            while FLASH_SR.read_volatile() & SR_BSY != 0 {
                core::hint::spin_loop();
            }
            let sr = FLASH_SR.read_volatile();
            if sr & SR_ERRORS != 0 {
                FLASH_SR.write_volatile(sr & SR_ERRORS);
                panic!("flash controller error: {:#x}", sr);
            }
        }
    }

    fn check_range(&self, base: u32, len: u32) {
        assert!(
            base >= FLASH_BASE && base <= FLASH_END && len <= FLASH_END - base,
            "flash access out of range: {:#x}+{:#x}",
            base,
            len
        );
    }
}

impl InternalFlash for IntFlash {
    fn erase(&mut self, base: u32, len: u32, progress: &mut dyn FnMut(u32)) {
        self.check_range(base, len);
        let end = base + len;
        self.unlock();

        let mut erased = 0;
        for &(index, sector_base, sector_len) in &SECTORS {
            if sector_base >= end || sector_base + sector_len <= base {
                continue;
            }
            self.wait_not_busy();
            unsafe {
                FLASH_CR.write_volatile(CR_SER | (index << CR_SNB_SHIFT) | CR_PSIZE_X32);
                FLASH_CR.write_volatile(
                    CR_SER | (index << CR_SNB_SHIFT) | CR_PSIZE_X32 | CR_STRT,
                );
            }
            self.wait_not_busy();

            let overlap = end.min(sector_base + sector_len) - base.max(sector_base);
            erased += overlap;
            progress(erased);
        }

        self.lock();
    }

    fn write(&mut self, addr: u32, data: &[u8], progress: &mut dyn FnMut(u32)) {
        self.check_range(addr, data.len() as u32);
        assert!(addr % 4 == 0, "unaligned program address: {:#x}", addr);
        self.unlock();
        self.wait_not_busy();
        unsafe {
            FLASH_CR.write_volatile(CR_PG | CR_PSIZE_X32);
        }

        let mut done: u32 = 0;
        let mut chunks = data.chunks_exact(4);
        for chunk in &mut chunks {
            let word = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
            unsafe {
                ((addr + done) as *mut u32).write_volatile(word);
            }
            self.wait_not_busy();
            done += 4;
            if done % PROGRESS_GRANULE == 0 {
                progress(done);
            }
        }

        // Tail shorter than a word goes out padded with erased bytes.
        let tail = chunks.remainder();
        if !tail.is_empty() {
            let mut word = [0xFFu8; 4];
            word[..tail.len()].copy_from_slice(tail);
            unsafe {
                ((addr + done) as *mut u32).write_volatile(u32::from_le_bytes(word));
            }
            self.wait_not_busy();
            done += tail.len() as u32;
        }

        unsafe {
            FLASH_CR.write_volatile(FLASH_CR.read_volatile() & !CR_PG);
        }
        self.lock();
        progress(done);
    }

    fn read(&mut self, addr: u32, buf: &mut [u8]) {
        for (i, byte) in buf.iter_mut().enumerate() {
            *byte = unsafe { ((addr + i as u32) as *const u8).read_volatile() };
        }
    }
}
