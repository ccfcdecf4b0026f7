// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Staged-image tool for the quartz bootloader.
//!
//! Usage:
//!   quartz-stage pack firmware.bin staged.img --tag v4.2 --short 8c0f12a
//!   quartz-stage inspect staged.img
//!   quartz-stage verify staged.img

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let args = cli::Cli::parse();
    cli::run(args)
}
