// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! The sad watch: terminal error screen.
//!
//! Shows the four-nibble code and parks until the button state
//! changes, so the code stays readable however the user was holding
//! the watch when things went wrong. Any press or release resets.

use embedded_hal::delay::DelayNs;
use quartz_common::hal::{Buttons, Display};
use quartz_common::policy::SadCode;

use crate::board::BoardBootloader;
use crate::reset;

pub fn watch(bl: &mut BoardBootloader, code: SadCode) -> ! {
    defmt::println!("sad watch: 0x{:04x}", code as u32);
    bl.display.error_code(code as u32);

    let initial = bl.buttons.state_bits();
    while bl.buttons.state_bits() == initial {
        bl.delay.delay_ms(10);
    }

    bl.display.prepare_for_reset();
    reset::system_reset();
}
