// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Reset paths out of the bootloader.

const SCB_AIRCR: *mut u32 = 0xE000_ED0C as *mut u32;
const AIRCR_VECTKEY: u32 = 0x05FA << 16;
const AIRCR_SYSRESETREQ: u32 = 1 << 2;

/// Orderly reset: the normal way back to the top of the boot policy.
pub fn system_reset() -> ! {
    defmt::println!("system reset");
    cortex_m::peripheral::SCB::sys_reset();
}

/// Last-resort reset used by the fault handlers. Touches nothing but
/// the reset request register, because nothing else can be trusted.
pub fn system_hard_reset() -> ! {
    unsafe {
        SCB_AIRCR.write_volatile(AIRCR_VECTKEY | AIRCR_SYSRESETREQ);
    }
    loop {
        cortex_m::asm::nop();
    }
}
