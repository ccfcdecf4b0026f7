// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! In-memory doubles of the hardware traits, shared by the
//! integration tests.

#![allow(dead_code)]

use quartz_common::hal::{
    Button, Buttons, Display, ExternalFlash, InternalFlash, RetainedStore, Watchdog,
};
use quartz_common::image::{FirmwareDescription, FirmwareMetadata, DESCRIPTION_SIZE, METADATA_SIZE};
use quartz_common::policy::{Bootloader, StagingRegions};
use quartz_common::retained::{SlotId, SLOT_COUNT};
use quartz_common::update::FirmwareLayout;
use quartz_common::{integrity, BootBit};

pub const NEW_WORLD_BASE: u32 = 0x0800_8000;
pub const OLD_WORLD_BASE: u32 = 0x0801_0000;
pub const SLOT_LEN: u32 = 0x0004_0000;
pub const SECTOR_SIZE: u32 = 0x1000;

pub const UPDATE_REGION: u32 = 0x0000_1000;
pub const RECOVERY_REGION: u32 = 0x0004_0000;
pub const EXT_FLASH_SIZE: usize = 0x0008_0000;

// --- Retained store ---

#[derive(Default)]
pub struct MockStore {
    pub slots: [u32; SLOT_COUNT],
}

impl RetainedStore for MockStore {
    fn read(&mut self, slot: SlotId) -> u32 {
        self.slots[slot as usize]
    }

    fn write(&mut self, slot: SlotId, value: u32) {
        self.slots[slot as usize] = value;
    }
}

// --- External flash ---

pub struct MockExtFlash {
    pub data: Vec<u8>,
    pub sane: bool,
}

impl Default for MockExtFlash {
    fn default() -> Self {
        Self {
            data: vec![0xFF; EXT_FLASH_SIZE],
            sane: true,
        }
    }
}

impl ExternalFlash for MockExtFlash {
    fn read(&mut self, addr: u32, buf: &mut [u8]) {
        let addr = addr as usize;
        buf.copy_from_slice(&self.data[addr..addr + buf.len()]);
    }

    fn sanity_check(&mut self) -> bool {
        self.sane
    }
}

// --- Internal flash ---

pub struct MockIntFlash {
    pub base: u32,
    pub mem: Vec<u8>,
    pub erases: Vec<(u32, u32)>,
    pub write_count: u32,
    /// Absolute address whose byte gets flipped after every write,
    /// for mangling-failure tests.
    pub corrupt_at: Option<u32>,
}

impl Default for MockIntFlash {
    fn default() -> Self {
        Self {
            base: NEW_WORLD_BASE,
            mem: vec![0xFF; SLOT_LEN as usize],
            erases: Vec::new(),
            write_count: 0,
            corrupt_at: None,
        }
    }
}

impl MockIntFlash {
    fn offset(&self, addr: u32, len: usize) -> usize {
        assert!(
            addr >= self.base && addr as usize + len <= self.base as usize + self.mem.len(),
            "flash access out of range: {:#x}+{}",
            addr,
            len
        );
        (addr - self.base) as usize
    }

    /// Write a plausible vector table straight into the slot, the way
    /// a previous install would have left it.
    pub fn program_vectors(&mut self, base: u32) {
        let off = self.offset(base, 8);
        self.mem[off..off + 4].copy_from_slice(&0x2002_0000u32.to_le_bytes());
        self.mem[off + 4..off + 8].copy_from_slice(&(base + 0x201).to_le_bytes());
    }
}

impl InternalFlash for MockIntFlash {
    fn erase(&mut self, base: u32, len: u32, progress: &mut dyn FnMut(u32)) {
        let off = self.offset(base, len as usize);
        self.mem[off..off + len as usize].fill(0xFF);
        self.erases.push((base, len));

        let mut done = 0;
        while done < len {
            done = (done + SECTOR_SIZE).min(len);
            progress(done);
        }
    }

    fn write(&mut self, addr: u32, data: &[u8], progress: &mut dyn FnMut(u32)) {
        let off = self.offset(addr, data.len());
        self.mem[off..off + data.len()].copy_from_slice(data);
        self.write_count += 1;

        if let Some(corrupt) = self.corrupt_at {
            if corrupt >= addr && corrupt < addr + data.len() as u32 {
                let coff = self.offset(corrupt, 1);
                self.mem[coff] ^= 0x01;
            }
        }

        let mut done = 0;
        while done < data.len() as u32 {
            done = (done + SECTOR_SIZE).min(data.len() as u32);
            progress(done);
        }
    }

    fn read(&mut self, addr: u32, buf: &mut [u8]) {
        let off = self.offset(addr, buf.len());
        buf.copy_from_slice(&self.mem[off..off + buf.len()]);
    }
}

// --- Display ---

#[derive(Default)]
pub struct MockDisplay {
    pub splashed: bool,
    pub progress_calls: Vec<(u32, u32)>,
    pub error_codes: Vec<u32>,
    pub prepared_for_reset: bool,
}

impl Display for MockDisplay {
    fn splash(&mut self) {
        self.splashed = true;
    }

    fn progress(&mut self, numerator: u32, denominator: u32) {
        self.progress_calls.push((numerator, denominator));
    }

    fn error_code(&mut self, code: u32) {
        self.error_codes.push(code);
    }

    fn prepare_for_reset(&mut self) {
        self.prepared_for_reset = true;
    }
}

// --- Buttons ---

#[derive(Default)]
pub struct MockButtons {
    pub pressed: [bool; 4],
    /// When set, every button reads released after this many more
    /// samples; models a human letting go mid-hold.
    pub release_countdown: Option<u32>,
}

impl Buttons for MockButtons {
    fn is_pressed(&mut self, button: Button) -> bool {
        if let Some(countdown) = self.release_countdown.as_mut() {
            if *countdown == 0 {
                return false;
            }
            *countdown -= 1;
        }
        self.pressed[button.index()]
    }

    fn state_bits(&mut self) -> u8 {
        let mut bits = 0;
        for button in Button::ALL {
            if self.is_pressed(button) {
                bits |= 1 << button.index();
            }
        }
        bits
    }
}

// --- Watchdog ---

#[derive(Default)]
pub struct MockWatchdog {
    pub started: bool,
    pub feeds: u32,
    pub reset_flag: bool,
}

impl Watchdog for MockWatchdog {
    fn start(&mut self) {
        self.started = true;
    }

    fn feed(&mut self) {
        self.feeds += 1;
    }

    fn check_reset_flag(&mut self) -> bool {
        let flag = self.reset_flag;
        self.reset_flag = false;
        flag
    }
}

// --- Delay ---

pub struct MockDelay;

impl embedded_hal::delay::DelayNs for MockDelay {
    fn delay_ns(&mut self, _ns: u32) {}
}

// --- Assembly ---

pub type MockBootloader =
    Bootloader<MockStore, MockExtFlash, MockIntFlash, MockDisplay, MockButtons, MockWatchdog, MockDelay>;

pub fn layout() -> FirmwareLayout {
    FirmwareLayout {
        new_world_base: NEW_WORLD_BASE,
        old_world_base: OLD_WORLD_BASE,
        slot_len: SLOT_LEN,
    }
}

/// A board with a live retained store (sentinel set) and nothing else.
pub fn make_bootloader() -> MockBootloader {
    let mut store = MockStore::default();
    store.write(SlotId::BootBits, BootBit::Initialized as u32);
    Bootloader {
        store,
        ext_flash: MockExtFlash::default(),
        int_flash: MockIntFlash::default(),
        display: MockDisplay::default(),
        buttons: MockButtons::default(),
        watchdog: MockWatchdog::default(),
        delay: MockDelay,
        layout: layout(),
        regions: StagingRegions {
            update: UPDATE_REGION,
            recovery: RECOVERY_REGION,
        },
    }
}

/// Build a descriptor-prefixed image whose body carries a vector
/// table for `link_base`, a fill pattern, and a metadata trailer.
pub fn build_image(body_len: u32, link_base: u32, is_recovery: bool) -> Vec<u8> {
    assert!(body_len >= 8 + METADATA_SIZE);

    let mut body = vec![0u8; body_len as usize];
    body[0..4].copy_from_slice(&0x2002_0000u32.to_le_bytes());
    body[4..8].copy_from_slice(&(link_base + 0x201).to_le_bytes());
    for (i, byte) in body[8..].iter_mut().enumerate() {
        *byte = (i % 251) as u8;
    }

    let mut meta = FirmwareMetadata {
        version_timestamp: 1_726_000_000,
        version_tag: heapless::String::new(),
        version_short: heapless::String::new(),
        is_recovery,
        hw_platform: 1,
        metadata_version: 1,
    };
    meta.version_tag.push_str("v9.9").unwrap();
    meta.version_short.push_str("abc1234").unwrap();
    let trailer_at = (body_len - METADATA_SIZE) as usize;
    body[trailer_at..].copy_from_slice(&meta.to_bytes());

    let desc = FirmwareDescription {
        description_length: DESCRIPTION_SIZE,
        firmware_length: body_len,
        checksum: integrity::crc32_buffer(&body),
    };

    let mut image = desc.to_bytes().to_vec();
    image.extend_from_slice(&body);
    image
}

/// Place an image at an external-flash region offset.
pub fn stage_image(ext: &mut MockExtFlash, region: u32, image: &[u8]) {
    let region = region as usize;
    ext.data[region..region + image.len()].copy_from_slice(image);
}
