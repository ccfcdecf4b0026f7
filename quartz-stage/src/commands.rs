// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Command implementations.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use crc::{Crc, CRC_32_ISO_HDLC};
use indicatif::{ProgressBar, ProgressStyle};

use quartz_common::image::{
    FirmwareDescription, FirmwareMetadata, DESCRIPTION_SIZE, METADATA_SIZE, METADATA_VERSION,
    VERSION_SHORT_BYTES, VERSION_TAG_BYTES,
};

const CRC32: Crc<u32> = Crc::<u32>::new(&CRC_32_ISO_HDLC);
const VERIFY_CHUNK: usize = 64 * 1024;

/// Build a staged image: description, firmware body, metadata trailer.
pub fn pack(
    firmware: &Path,
    image: &Path,
    tag: &str,
    short: &str,
    timestamp: u32,
    platform: u8,
    recovery: bool,
) -> Result<()> {
    let binary =
        fs::read(firmware).with_context(|| format!("Failed to read {}", firmware.display()))?;

    let mut version_tag = heapless::String::<VERSION_TAG_BYTES>::new();
    if version_tag.push_str(tag).is_err() {
        bail!("tag too long: at most {} characters", VERSION_TAG_BYTES - 1);
    }
    let mut version_short = heapless::String::<VERSION_SHORT_BYTES>::new();
    if version_short.push_str(short).is_err() {
        bail!(
            "short hash too long: at most {} characters",
            VERSION_SHORT_BYTES - 1
        );
    }

    let metadata = FirmwareMetadata {
        version_timestamp: timestamp,
        version_tag,
        version_short,
        is_recovery: recovery,
        hw_platform: platform,
        metadata_version: METADATA_VERSION,
    };

    let mut body = binary;
    body.extend_from_slice(&metadata.to_bytes());

    let description = FirmwareDescription {
        description_length: DESCRIPTION_SIZE,
        firmware_length: body.len() as u32,
        checksum: CRC32.checksum(&body),
    };

    let mut staged = description.to_bytes().to_vec();
    staged.extend_from_slice(&body);
    fs::write(image, &staged).with_context(|| format!("Failed to write {}", image.display()))?;

    println!(
        "Packed {} ({} bytes, CRC32: 0x{:08x}) -> {}",
        firmware.display(),
        description.firmware_length,
        description.checksum,
        image.display()
    );
    Ok(())
}

fn read_image(image: &Path) -> Result<(FirmwareDescription, Vec<u8>)> {
    let staged = fs::read(image).with_context(|| format!("Failed to read {}", image.display()))?;
    if staged.len() < DESCRIPTION_SIZE as usize {
        bail!("file too short for an image description");
    }

    let mut head = [0u8; 12];
    head.copy_from_slice(&staged[..12]);
    let description = FirmwareDescription::from_bytes(&head);
    if !description.is_valid() {
        bail!(
            "invalid description (description_length = {})",
            description.description_length
        );
    }

    let body = staged[12..].to_vec();
    if (body.len() as u32) < description.firmware_length {
        bail!(
            "body truncated: description claims {} bytes, file holds {}",
            description.firmware_length,
            body.len()
        );
    }
    Ok((description, body))
}

/// Print the description and metadata of a staged image.
pub fn inspect(image: &Path) -> Result<()> {
    let (description, body) = read_image(image)?;

    println!("Description:");
    println!("  Firmware length: {} bytes", description.firmware_length);
    println!("  Checksum:        0x{:08x}", description.checksum);

    if description.firmware_length < METADATA_SIZE {
        println!("No metadata trailer (body too short)");
        return Ok(());
    }

    let trailer_at = (description.firmware_length - METADATA_SIZE) as usize;
    let mut raw = [0u8; 47];
    raw.copy_from_slice(&body[trailer_at..trailer_at + METADATA_SIZE as usize]);
    let metadata = FirmwareMetadata::from_bytes(&raw);

    println!("Metadata:");
    println!("  Version tag:     {}", metadata.version_tag);
    println!("  Short hash:      {}", metadata.version_short);
    println!("  Timestamp:       {}", metadata.version_timestamp);
    println!("  Recovery image:  {}", metadata.is_recovery);
    println!("  Platform:        {}", metadata.hw_platform);
    println!("  Metadata ver:    {}", metadata.metadata_version);
    Ok(())
}

/// Recompute the body CRC and compare with the description.
pub fn verify(image: &Path) -> Result<()> {
    let (description, body) = read_image(image)?;
    let body = &body[..description.firmware_length as usize];

    let pb = ProgressBar::new(body.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{bar:40.cyan/blue}] {bytes}/{total_bytes}")?
            .progress_chars("#>-"),
    );

    let mut digest = CRC32.digest();
    for chunk in body.chunks(VERIFY_CHUNK) {
        digest.update(chunk);
        pb.inc(chunk.len() as u64);
    }
    pb.finish_and_clear();

    let actual = digest.finalize();
    if actual != description.checksum {
        bail!(
            "CRC mismatch: description says 0x{:08x}, body is 0x{:08x}",
            description.checksum,
            actual
        );
    }

    println!("OK: 0x{:08x} over {} bytes", actual, body.len());
    Ok(())
}
