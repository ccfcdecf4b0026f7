// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Handoff: leave the MCU looking freshly reset and branch into the
//! firmware's vector table.
//!
//! Everything the bootloader powered up gets masked, reset, or
//! returned to its power-on value, with two exceptions: the backup
//! domain (it carries the boot bits) and the GPIO ports (resetting
//! them would drop the power latch and visible panel state).

const NVIC_ICER0: *mut u32 = 0xE000_E180 as *mut u32;
const NVIC_ICPR0: *mut u32 = 0xE000_E280 as *mut u32;
const SCB_VTOR: *mut u32 = 0xE000_ED08 as *mut u32;

const RCC_BASE: u32 = crate::board::RCC_BASE;
const RCC_AHB1RSTR: *mut u32 = (RCC_BASE + 0x10) as *mut u32;
const RCC_AHB3RSTR: *mut u32 = (RCC_BASE + 0x18) as *mut u32;
const RCC_APB1RSTR: *mut u32 = (RCC_BASE + 0x20) as *mut u32;
const RCC_APB2RSTR: *mut u32 = (RCC_BASE + 0x24) as *mut u32;
const RCC_AHB1ENR: *mut u32 = (RCC_BASE + 0x30) as *mut u32;
const RCC_AHB2ENR: *mut u32 = (RCC_BASE + 0x34) as *mut u32;
const RCC_AHB3ENR: *mut u32 = (RCC_BASE + 0x38) as *mut u32;
const RCC_APB1ENR: *mut u32 = (RCC_BASE + 0x40) as *mut u32;
const RCC_APB2ENR: *mut u32 = (RCC_BASE + 0x44) as *mut u32;

// DMA1, DMA2
const AHB1_PERIPHS: u32 = 1 << 21 | 1 << 22;
// FSMC
const AHB3_PERIPHS: u32 = 1 << 0;
// TIM2..TIM7, WWDG, SPI2, SPI3, USART2, USART3, UART4, UART5,
// I2C1..I2C3. PWR stays: its reset would close the backup domain.
const APB1_PERIPHS: u32 = 0x3F | 1 << 11 | 0b11 << 14 | 0b1111 << 17 | 0b111 << 21;
// TIM1, TIM8, USART1, USART6, ADC, SDIO, SPI1, SYSCFG, TIM9..TIM11
const APB2_PERIPHS: u32 = 0b11 | 0b11 << 4 | 1 << 8 | 1 << 11 | 1 << 12 | 1 << 14 | 0b111 << 16;

// Power-on value of AHB1ENR (CCM data RAM clock); every other enable
// register resets to zero.
const AHB1ENR_RESET: u32 = 0x0010_0000;

const ERASED_WORD: u32 = 0xFFFF_FFFF;

/// Branch into the firmware at `base`. The vector guard has already
/// run in the policy; it is re-asserted here because jumping through
/// erased flash is unrecoverable.
///
/// # Safety
/// `base` must point at a programmed vector table. Nothing after the
/// final branch can be undone.
pub unsafe fn jump_to_fw(base: u32) -> ! {
    let initial_sp = (base as *const u32).read_volatile();
    let reset_handler = (base as *const u32).offset(1).read_volatile();
    assert!(
        initial_sp != ERASED_WORD && reset_handler != ERASED_WORD,
        "jump into erased flash"
    );

    cortex_m::interrupt::disable();

    // Mask and clear every interrupt across all NVIC banks.
    for bank in 0..8 {
        NVIC_ICER0.add(bank).write_volatile(ERASED_WORD);
        NVIC_ICPR0.add(bank).write_volatile(ERASED_WORD);
    }

    // Pulse the peripheral resets, then put the clock enables back to
    // their power-on values.
    RCC_AHB1RSTR.write_volatile(AHB1_PERIPHS);
    RCC_AHB1RSTR.write_volatile(0);
    RCC_AHB3RSTR.write_volatile(AHB3_PERIPHS);
    RCC_AHB3RSTR.write_volatile(0);
    RCC_APB1RSTR.write_volatile(APB1_PERIPHS);
    RCC_APB1RSTR.write_volatile(0);
    RCC_APB2RSTR.write_volatile(APB2_PERIPHS);
    RCC_APB2RSTR.write_volatile(0);

    RCC_AHB1ENR.write_volatile(AHB1ENR_RESET);
    RCC_AHB2ENR.write_volatile(0);
    RCC_AHB3ENR.write_volatile(0);
    RCC_APB1ENR.write_volatile(0);
    RCC_APB2ENR.write_volatile(0);

    SCB_VTOR.write_volatile(base);
    cortex_m::asm::dsb();
    cortex_m::asm::isb();

    // MSP to the firmware's initial stack, interrupt masks open, link
    // register poisoned so a return faults loudly.
    core::arch::asm!(
        "msr msp, {sp}",
        "mov lr, {lr}",
        "cpsie i",
        "cpsie f",
        "bx {reset}",
        sp = in(reg) initial_sp,
        lr = in(reg) ERASED_WORD,
        reset = in(reg) reset_handler,
        options(noreturn)
    );
}
