// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Staged firmware image format.
//!
//! An image in external flash is a 12-byte little-endian description,
//! the firmware body, and a fixed-width metadata trailer occupying the
//! last bytes of the body:
//!
//! ```text
//! +--------------------------------------+
//! | FirmwareDescription (12 bytes)       |
//! +--------------------------------------+
//! | firmware binary (firmware_length B)  |
//! |   ...                                |
//! |   FirmwareMetadata (47 bytes)        |
//! +--------------------------------------+
//! ```
//!
//! The description's `checksum` covers exactly the `firmware_length`
//! bytes of the body, trailer included.

use heapless::String;

use crate::hal::ExternalFlash;

pub const DESCRIPTION_SIZE: u32 = 12;
pub const METADATA_SIZE: u32 = 47;

pub const METADATA_VERSION: u8 = 1;
pub const VERSION_TAG_BYTES: usize = 32;
pub const VERSION_SHORT_BYTES: usize = 8;

/// The 12-byte prefix declaring the length and CRC of a staged image.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FirmwareDescription {
    pub description_length: u32,
    pub firmware_length: u32,
    pub checksum: u32,
}

impl FirmwareDescription {
    pub fn from_bytes(bytes: &[u8; 12]) -> Self {
        Self {
            description_length: u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            firmware_length: u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
            checksum: u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]),
        }
    }

    pub fn to_bytes(&self) -> [u8; 12] {
        let mut out = [0u8; 12];
        out[0..4].copy_from_slice(&self.description_length.to_le_bytes());
        out[4..8].copy_from_slice(&self.firmware_length.to_le_bytes());
        out[8..12].copy_from_slice(&self.checksum.to_le_bytes());
        out
    }

    /// Shallow validity: the description length doubles as the proof
    /// that a description was fully written. The deep check is the CRC
    /// over the body.
    pub fn is_valid(&self) -> bool {
        self.description_length == DESCRIPTION_SIZE
    }
}

/// Read a description from the head of a staged image.
pub fn read_description<X: ExternalFlash>(flash: &mut X, addr: u32) -> FirmwareDescription {
    let mut buf = [0u8; 12];
    flash.read(addr, &mut buf);
    FirmwareDescription::from_bytes(&buf)
}

/// Build-time metadata carried in the last [`METADATA_SIZE`] bytes of
/// the firmware body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FirmwareMetadata {
    pub version_timestamp: u32,
    pub version_tag: String<VERSION_TAG_BYTES>,
    pub version_short: String<VERSION_SHORT_BYTES>,
    pub is_recovery: bool,
    pub hw_platform: u8,
    pub metadata_version: u8,
}

fn tag_str<const N: usize>(raw: &[u8]) -> String<N> {
    let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
    let mut out = String::new();
    if let Ok(s) = core::str::from_utf8(&raw[..end]) {
        // Cannot overflow: raw is at most N bytes.
        let _ = out.push_str(s);
    }
    out
}

fn tag_bytes<const N: usize>(s: &String<N>) -> [u8; N] {
    let mut out = [0u8; N];
    out[..s.len()].copy_from_slice(s.as_bytes());
    out
}

impl FirmwareMetadata {
    pub fn from_bytes(bytes: &[u8; 47]) -> Self {
        Self {
            version_timestamp: u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            version_tag: tag_str(&bytes[4..36]),
            version_short: tag_str(&bytes[36..44]),
            is_recovery: bytes[44] != 0,
            hw_platform: bytes[45],
            metadata_version: bytes[46],
        }
    }

    pub fn to_bytes(&self) -> [u8; 47] {
        let mut out = [0u8; 47];
        out[0..4].copy_from_slice(&self.version_timestamp.to_le_bytes());
        out[4..36].copy_from_slice(&tag_bytes(&self.version_tag));
        out[36..44].copy_from_slice(&tag_bytes(&self.version_short));
        out[44] = self.is_recovery as u8;
        out[45] = self.hw_platform;
        out[46] = self.metadata_version;
        out
    }
}

/// Read the metadata trailer of a staged image whose description has
/// already been validated. None when the body is too short to carry
/// one.
pub fn read_metadata<X: ExternalFlash>(
    flash: &mut X,
    image_addr: u32,
    desc: &FirmwareDescription,
) -> Option<FirmwareMetadata> {
    if desc.firmware_length < METADATA_SIZE {
        return None;
    }
    let mut buf = [0u8; 47];
    let addr = image_addr + DESCRIPTION_SIZE + desc.firmware_length - METADATA_SIZE;
    flash.read(addr, &mut buf);
    Some(FirmwareMetadata::from_bytes(&buf))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn description_roundtrip() {
        let desc = FirmwareDescription {
            description_length: 12,
            firmware_length: 0x0002_0000,
            checksum: 0xDEAD_BEEF,
        };
        assert_eq!(FirmwareDescription::from_bytes(&desc.to_bytes()), desc);
    }

    #[test]
    fn description_validity_is_length_only() {
        let mut desc = FirmwareDescription {
            description_length: 12,
            firmware_length: 0,
            checksum: 0,
        };
        assert!(desc.is_valid());
        desc.description_length = 0xFFFF_FFFF;
        assert!(!desc.is_valid());
    }

    #[test]
    fn metadata_roundtrip_trims_at_nul() {
        let mut meta = FirmwareMetadata {
            version_timestamp: 1_700_000_000,
            version_tag: String::new(),
            version_short: String::new(),
            is_recovery: true,
            hw_platform: 3,
            metadata_version: METADATA_VERSION,
        };
        meta.version_tag.push_str("v4.2-beta1").unwrap();
        meta.version_short.push_str("8c0f12a").unwrap();

        let parsed = FirmwareMetadata::from_bytes(&meta.to_bytes());
        assert_eq!(parsed, meta);
    }
}
