// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Board power latch.
//!
//! The regulator enable line is held by this GPIO; dropping it cuts
//! power to everything including the MCU. Grabbing the latch is the
//! very first thing board init does, before the user lets go of the
//! button that woke us.

use quartz_common::hal::Power;

use crate::gpio::{self, GPIOD};

const LATCH_PIN: u32 = 2;

pub struct PowerLatch(());

impl PowerLatch {
    pub fn new() -> Self {
        gpio::enable_clock(GPIOD);
        gpio::set_high(GPIOD, LATCH_PIN);
        gpio::set_mode(GPIOD, LATCH_PIN, gpio::Mode::Output);
        Self(())
    }
}

impl Power for PowerLatch {
    fn power_off(&mut self) {
        gpio::set_low(GPIOD, LATCH_PIN);
        // Supply rails take a moment to drain.
        loop {
            cortex_m::asm::wfi();
        }
    }
}
