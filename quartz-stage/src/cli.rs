// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Command-line interface definitions.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::commands;

/// Command-line arguments.
#[derive(Parser)]
#[command(name = "quartz-stage")]
#[command(about = "Staged-image tool for the quartz bootloader")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Subcommand)]
pub enum Commands {
    /// Wrap a firmware binary into a staged image (description,
    /// body, metadata trailer)
    Pack {
        /// Raw firmware binary
        #[arg(value_name = "FIRMWARE")]
        firmware: PathBuf,

        /// Output image file
        #[arg(value_name = "IMAGE")]
        image: PathBuf,

        /// Version tag (git tag, at most 31 characters)
        #[arg(long, default_value = "v0.0")]
        tag: String,

        /// Short commit hash (at most 7 characters)
        #[arg(long, default_value = "0000000")]
        short: String,

        /// Build timestamp (seconds since the epoch)
        #[arg(long, default_value = "0")]
        timestamp: u32,

        /// Hardware platform id
        #[arg(long, default_value = "1")]
        platform: u8,

        /// Mark the image as recovery firmware
        #[arg(long)]
        recovery: bool,
    },

    /// Print the description and metadata of a staged image
    Inspect {
        #[arg(value_name = "IMAGE")]
        image: PathBuf,
    },

    /// Recompute the body CRC and compare it with the description
    Verify {
        #[arg(value_name = "IMAGE")]
        image: PathBuf,
    },
}

/// Execute the parsed CLI command.
pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Pack {
            firmware,
            image,
            tag,
            short,
            timestamp,
            platform,
            recovery,
        } => commands::pack(&firmware, &image, &tag, &short, timestamp, platform, recovery),
        Commands::Inspect { image } => commands::inspect(&image),
        Commands::Verify { image } => commands::verify(&image),
    }
}
