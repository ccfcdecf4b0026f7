// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Boot policy: the state machine that runs once per reset.
//!
//! The policy reads the retained state, the buttons, and the watchdog
//! reset flag, performs any pending install, and hands back a
//! [`BootVerdict`] for the binary to execute. Keeping the terminal
//! actions (jump, park, reset, power-off) out of this module means the
//! whole decision tree runs under host tests.

use embedded_hal::delay::DelayNs;

use crate::bootbits::{self, BootBit};
use crate::hal::{Button, Buttons, Display, ExternalFlash, InternalFlash, RetainedStore, Watchdog};
use crate::retained::{self, SlotId};
use crate::update::{self, FirmwareLayout, UpdateOutcome};
use crate::{reset_loop, strikes};

/// How long UP+BACK must be held to force a recovery install.
pub const RECOVERY_HOLD_MS: u32 = 5_000;

/// Boots at which a continuously held button is declared stuck.
pub const STUCK_BUTTON_TRIP: u8 = 5;

/// An erased internal-flash word.
const ERASED_WORD: u32 = 0xFFFF_FFFF;

/// Error codes rendered on the sad watch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u32)]
pub enum SadCode {
    StuckButton = 0xA001,
    BadFlash = 0xA002,
    CantLoadFirmware = 0xA003,
    ResetLoop = 0xA004,
}

/// What the binary should do once the policy returns.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BootVerdict {
    /// Start the watchdog and branch through the vector table at this
    /// base.
    Jump(u32),
    /// Park on the sad watch until the buttons change, then reset.
    Sad(SadCode),
    /// Reset immediately; the retained bits carry the reason forward.
    Reset,
    /// Drop the power latch.
    PowerOff,
}

/// External-flash byte offsets of the two image regions.
#[derive(Clone, Copy, Debug)]
pub struct StagingRegions {
    /// Update staging area, written by the running firmware.
    pub update: u32,
    /// Recovery (PRF) image.
    pub recovery: u32,
}

/// The bootloader's view of the board, plus the layout constants.
pub struct Bootloader<S, X, F, D, B, W, L> {
    pub store: S,
    pub ext_flash: X,
    pub int_flash: F,
    pub display: D,
    pub buttons: B,
    pub watchdog: W,
    pub delay: L,
    pub layout: FirmwareLayout,
    pub regions: StagingRegions,
}

impl<S, X, F, D, B, W, L> Bootloader<S, X, F, D, B, W, L>
where
    S: RetainedStore,
    X: ExternalFlash,
    F: InternalFlash,
    D: Display,
    B: Buttons,
    W: Watchdog,
    L: DelayNs,
{
    /// Run the boot decision for this reset. `scratch` stages external
    /// flash reads during installs.
    pub fn boot(&mut self, scratch: &mut [u8]) -> BootVerdict {
        bootbits::init(&mut self.store);
        retained::boot_version_write(&mut self.store);
        bootbits::dump(&mut self.store);

        let verdict = self.decide(scratch);

        // The loop counter advances exactly once per boot that goes on
        // to run firmware; every sad path has its own exit.
        if let BootVerdict::Jump(base) = verdict {
            if reset_loop::observe_and_increment(&mut self.store) {
                return BootVerdict::Sad(SadCode::ResetLoop);
            }
            return BootVerdict::Jump(base);
        }
        verdict
    }

    fn decide(&mut self, scratch: &mut [u8]) -> BootVerdict {
        if bootbits::test(&mut self.store, BootBit::ShutdownRequested) {
            bootbits::clear(&mut self.store, BootBit::ShutdownRequested);
            trace!("shutdown requested");
            return BootVerdict::PowerOff;
        }
        if bootbits::test(&mut self.store, BootBit::StandbyModeRequested) {
            bootbits::clear(&mut self.store, BootBit::StandbyModeRequested);
            bootbits::set(&mut self.store, BootBit::StandbyModeEntered);
            trace!("entering standby");
            return BootVerdict::PowerOff;
        }
        if bootbits::test(&mut self.store, BootBit::StandbyModeEntered) {
            // Woke from standby; continue as a normal boot.
            bootbits::clear(&mut self.store, BootBit::StandbyModeEntered);
        }

        self.display.splash();

        if bootbits::test(&mut self.store, BootBit::FwStable) {
            bootbits::clear(&mut self.store, BootBit::FwStable);
            strikes::clear_fw_strikes(&mut self.store);
            strikes::clear_recovery_strikes(&mut self.store);
            reset_loop::clear(&mut self.store);
        }

        if self.stuck_button_check() {
            return BootVerdict::Sad(SadCode::StuckButton);
        }
        if !self.ext_flash.sanity_check() {
            return BootVerdict::Sad(SadCode::BadFlash);
        }

        if bootbits::test(&mut self.store, BootBit::RecoveryStartInProgress) {
            // The recovery image never cleared its latch: it jumped
            // but died before setting itself up.
            bootbits::clear(&mut self.store, BootBit::RecoveryStartInProgress);
            return BootVerdict::Sad(SadCode::CantLoadFirmware);
        }

        let fw_base = self.firmware_base();
        let force_prf = bootbits::test(&mut self.store, BootBit::ForcePrf);
        if force_prf || fw_base.is_none() || self.recovery_combo_held() {
            if force_prf {
                bootbits::clear(&mut self.store, BootBit::ForcePrf);
            }
            trace!("forcing recovery");
            return self.switch_to_recovery(scratch);
        }

        let watchdog_reset = self.watchdog.check_reset_flag();
        let software_failure = bootbits::test(&mut self.store, BootBit::SoftwareFailureOccurred);
        if watchdog_reset || software_failure {
            bootbits::clear(&mut self.store, BootBit::SoftwareFailureOccurred);
            warn!(
                "firmware failure signs (watchdog: {}, software: {})",
                watchdog_reset, software_failure
            );
            if strikes::observe_fw_start_failure(&mut self.store) {
                return self.switch_to_recovery(scratch);
            }
        } else {
            strikes::clear_fw_strikes(&mut self.store);
            if let Some(verdict) = self.check_update_fw(scratch) {
                return verdict;
            }
        }

        match self.firmware_base() {
            Some(base) => BootVerdict::Jump(base),
            // An install attempt left nothing runnable behind.
            None => self.switch_to_recovery(scratch),
        }
    }

    /// Apply a staged update, if one is pending. Some(verdict) aborts
    /// the normal boot flow.
    fn check_update_fw(&mut self, scratch: &mut [u8]) -> Option<BootVerdict> {
        if !bootbits::test(&mut self.store, BootBit::NewFwAvailable) {
            return None;
        }

        if bootbits::test(&mut self.store, BootBit::NewFwUpdateInProgress) {
            // A previous install was interrupted. Whether internal
            // flash survived is unknowable from here; drop the intent
            // and try the image we have.
            warn!("interrupted update detected, booting existing firmware");
            self.clear_update_intent();
            return None;
        }

        let outcome = update::install_image(
            &mut self.store,
            &mut self.ext_flash,
            &mut self.int_flash,
            &mut self.display,
            &mut self.watchdog,
            &self.layout,
            self.regions.update,
            scratch,
        );
        self.clear_update_intent();

        match outcome {
            UpdateOutcome::Success => {
                bootbits::set(&mut self.store, BootBit::NewFwInstalled);
                None
            }
            UpdateOutcome::UntouchedFailure => {
                // The staged image was bad; the installed one is fine.
                None
            }
            UpdateOutcome::ManglingFailure => {
                // Divert the next boot to recovery: force the strike
                // counter to three and leave a failure sign so the
                // counter is actually consulted.
                bootbits::set(&mut self.store, BootBit::FwStartFailStrikeOne);
                bootbits::set(&mut self.store, BootBit::FwStartFailStrikeTwo);
                bootbits::set(&mut self.store, BootBit::SoftwareFailureOccurred);
                Some(BootVerdict::Reset)
            }
        }
    }

    /// Install and enter the recovery image. Failures walk the
    /// recovery strike ladder: two reset-and-retry rounds, then the
    /// sad watch.
    fn switch_to_recovery(&mut self, scratch: &mut [u8]) -> BootVerdict {
        let outcome = update::install_image(
            &mut self.store,
            &mut self.ext_flash,
            &mut self.int_flash,
            &mut self.display,
            &mut self.watchdog,
            &self.layout,
            self.regions.recovery,
            scratch,
        );
        bootbits::clear(&mut self.store, BootBit::NewFwUpdateInProgress);

        match outcome {
            UpdateOutcome::Success => {
                strikes::clear_recovery_strikes(&mut self.store);
                bootbits::set(&mut self.store, BootBit::RecoveryStartInProgress);
                match self.firmware_base() {
                    Some(base) => BootVerdict::Jump(base),
                    None => BootVerdict::Sad(SadCode::CantLoadFirmware),
                }
            }
            UpdateOutcome::UntouchedFailure | UpdateOutcome::ManglingFailure => {
                if strikes::observe_recovery_load_failure(&mut self.store) {
                    BootVerdict::Sad(SadCode::CantLoadFirmware)
                } else {
                    BootVerdict::Reset
                }
            }
        }
    }

    /// Locate a runnable vector table, preferring the new-world base.
    /// None when both worlds read as erased.
    fn firmware_base(&mut self) -> Option<u32> {
        for base in [self.layout.new_world_base, self.layout.old_world_base] {
            let mut words = [0u8; 8];
            self.int_flash.read(base, &mut words);
            let sp = u32::from_le_bytes([words[0], words[1], words[2], words[3]]);
            let reset = u32::from_le_bytes([words[4], words[5], words[6], words[7]]);
            if sp != ERASED_WORD && reset != ERASED_WORD {
                return Some(base);
            }
        }
        None
    }

    /// Advance the per-button stuck counters and report whether any
    /// button has been held for [`STUCK_BUTTON_TRIP`] boots straight.
    fn stuck_button_check(&mut self) -> bool {
        let mut counters = self
            .store
            .read(SlotId::StuckButtons)
            .to_le_bytes();
        let mut stuck = false;

        for button in Button::ALL {
            let slot = &mut counters[button.index()];
            if self.buttons.is_pressed(button) {
                *slot = slot.saturating_add(1);
                if *slot >= STUCK_BUTTON_TRIP {
                    warn!("button stuck: {}", button.index());
                    stuck = true;
                }
            } else {
                *slot = 0;
            }
        }

        self.store
            .write(SlotId::StuckButtons, u32::from_le_bytes(counters));
        stuck
    }

    /// Poll UP+BACK for the full hold window. Releasing either button
    /// cancels the request with no state left behind.
    fn recovery_combo_held(&mut self) -> bool {
        if !(self.buttons.is_pressed(Button::Up) && self.buttons.is_pressed(Button::Back)) {
            return false;
        }
        for _ in 0..RECOVERY_HOLD_MS {
            if !(self.buttons.is_pressed(Button::Up) && self.buttons.is_pressed(Button::Back)) {
                return false;
            }
            self.delay.delay_ms(1);
        }
        true
    }

    fn clear_update_intent(&mut self) {
        bootbits::clear(&mut self.store, BootBit::NewFwUpdateInProgress);
        bootbits::clear(&mut self.store, BootBit::NewFwAvailable);
    }
}
