// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Button inputs. Active low with internal pull-ups; no debouncing
//! here, the policy samples over windows long enough not to care.

use quartz_common::hal::{Button, Buttons};

use crate::gpio::{self, GPIOA, GPIOC};

const PINS: [(u32, u32); 4] = [
    (GPIOC, 3), // back
    (GPIOA, 2), // up
    (GPIOC, 6), // select
    (GPIOA, 3), // down
];

pub struct BoardButtons(());

impl BoardButtons {
    pub fn new() -> Self {
        gpio::enable_clock(GPIOA);
        gpio::enable_clock(GPIOC);
        for (port, pin) in PINS {
            gpio::set_mode(port, pin, gpio::Mode::Input);
            gpio::set_pullup(port, pin);
        }
        Self(())
    }
}

impl Buttons for BoardButtons {
    fn is_pressed(&mut self, button: Button) -> bool {
        let (port, pin) = PINS[button.index()];
        !gpio::is_high(port, pin)
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
