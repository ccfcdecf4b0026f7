// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Integrity engine: CRC-32 over buffers and flash ranges.
//!
//! The 32-bit polynomial is IEEE 802.3 (ISO HDLC in the `crc`
//! catalogue), matching what the build tooling stamps into image
//! descriptors. The 8-bit variant guards small retained structures and
//! is deliberately not the 0x07 textbook CRC-8.

use crc::{Crc, CRC_32_ISO_HDLC, CRC_8_DVB_S2};

use crate::hal::{ExternalFlash, InternalFlash};

pub const CRC32: Crc<u32> = Crc::<u32>::new(&CRC_32_ISO_HDLC);
pub const CRC8: Crc<u8> = Crc::<u8>::new(&CRC_8_DVB_S2);

pub fn crc32_buffer(data: &[u8]) -> u32 {
    CRC32.checksum(data)
}

pub fn crc8_buffer(data: &[u8]) -> u8 {
    CRC8.checksum(data)
}

/// CRC-32 over an external-flash range, staged through `scratch` since
/// the part may not be memory-mapped.
pub fn crc32_external<X: ExternalFlash>(
    flash: &mut X,
    addr: u32,
    len: u32,
    scratch: &mut [u8],
) -> u32 {
    let mut digest = CRC32.digest();
    let mut addr = addr;
    let mut remaining = len as usize;

    while remaining > 0 {
        let n = remaining.min(scratch.len());
        flash.read(addr, &mut scratch[..n]);
        digest.update(&scratch[..n]);
        addr += n as u32;
        remaining -= n;
    }

    digest.finalize()
}

/// CRC-32 over an internal-flash range.
pub fn crc32_internal<F: InternalFlash>(flash: &mut F, addr: u32, len: u32) -> u32 {
    let mut digest = CRC32.digest();
    let mut addr = addr;
    let mut remaining = len as usize;
    let mut chunk = [0u8; 256];

    while remaining > 0 {
        let n = remaining.min(chunk.len());
        flash.read(addr, &mut chunk[..n]);
        digest.update(&chunk[..n]);
        addr += n as u32;
        remaining -= n;
    }

    digest.finalize()
}
