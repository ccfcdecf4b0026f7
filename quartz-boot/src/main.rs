// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Quartz bootloader for the STM32F4 watch board.
//!
//! Runs to a single decision per reset: jump to firmware, install a
//! staged or recovery image first, park on the sad watch, power off,
//! or reset and try again. The decision itself lives in
//! `quartz-common`; this binary is the board and the terminal actions.

#![no_std]
#![no_main]

mod board;
mod buttons;
mod display;
mod ext_flash;
mod gpio;
mod handoff;
mod int_flash;
mod power;
mod reset;
mod rtc_backup;
mod sad;
mod watchdog;

use cortex_m_rt::{entry, exception, ExceptionFrame};
use defmt_rtt as _;
use quartz_common::hal::{Power, Watchdog};
use quartz_common::policy::BootVerdict;
use quartz_common::{bootbits, BootBit};

defmt::timestamp!("{=u64:us}", { 0 });

static mut SCRATCH: [u8; board::SCRATCH_SIZE] = [0; board::SCRATCH_SIZE];

#[entry]
fn main() -> ! {
    defmt::println!("quartz bootloader");

    let mut board = board::init();
    let scratch = unsafe { &mut *core::ptr::addr_of_mut!(SCRATCH) };

    match board.bootloader.boot(scratch) {
        BootVerdict::Jump(base) => {
            defmt::println!("jumping to firmware at 0x{:08x}", base);
            board.bootloader.watchdog.start();
            unsafe { handoff::jump_to_fw(base) }
        }
        BootVerdict::Sad(code) => sad::watch(&mut board.bootloader, code),
        BootVerdict::Reset => reset::system_reset(),
        BootVerdict::PowerOff => {
            defmt::println!("powering off");
            board.power.power_off();
            // The latch failed to kill us; start over.
            reset::system_reset()
        }
    }
}

/// Assert bridge: every panic writes the failure mark for the next
/// boot's strike accounting, then hard-resets.
#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
    defmt::error!("ASSERT: {}", defmt::Display2Format(info));
    let mut store = rtc_backup::RtcBackup::new();
    bootbits::set(&mut store, BootBit::SoftwareFailureOccurred);
    reset::system_hard_reset();
}

#[exception]
unsafe fn HardFault(_frame: &ExceptionFrame) -> ! {
    defmt::error!("HARD FAULT");
    if cfg!(feature = "no-watchdog") {
        loop {
            cortex_m::asm::nop();
        }
    } else {
        reset::system_hard_reset()
    }
}

#[exception]
unsafe fn NMI() {
    defmt::error!("NMI");
    reset::system_hard_reset();
}

#[exception]
unsafe fn DefaultHandler(irqn: i16) {
    defmt::error!("unexpected interrupt: {}", irqn);
    reset::system_hard_reset();
}
