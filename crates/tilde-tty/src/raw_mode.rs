#![forbid(unsafe_code)]

//! Raw-mode derivation and the scoped raw-mode guard.
//!
//! Raw mode is never built from scratch. [`RawModeFlags::derive`] takes the
//! captured [`TerminalAttributes`] and clears or sets exactly the bits named
//! by its [`RawToggles`], so everything else the user's environment had
//! configured survives the round trip.
//!
//! | Toggle                 | termios change        |
//! |------------------------|-----------------------|
//! | `NO_BREAK_INTERRUPT`   | `c_iflag &= ~BRKINT`  |
//! | `NO_CR_TO_NL`          | `c_iflag &= ~ICRNL`   |
//! | `NO_PARITY_CHECK`      | `c_iflag &= ~INPCK`   |
//! | `NO_STRIP_HIGH_BIT`    | `c_iflag &= ~ISTRIP`  |
//! | `NO_FLOW_CONTROL`      | `c_iflag &= ~IXON`    |
//! | `NO_OUTPUT_PROCESSING` | `c_oflag &= ~OPOST`   |
//! | `EIGHT_BIT_CHARS`      | `c_cflag \|= CS8`     |
//! | `NO_ECHO`              | `c_lflag &= ~ECHO`    |
//! | `NO_CANONICAL`         | `c_lflag &= ~ICANON`  |
//! | `NO_EXTENDED_INPUT`    | `c_lflag &= ~IEXTEN`  |
//! | `NO_SIGNALS`           | `c_lflag &= ~ISIG`    |
//!
//! `VMIN` and `VTIME` are always written from [`RawModeFlags::min_bytes`] and
//! [`RawModeFlags::timeout_deciseconds`].

use std::os::fd::AsFd;

use bitflags::bitflags;
use nix::sys::termios::{
    ControlFlags, InputFlags, LocalFlags, OutputFlags, SpecialCharacterIndices,
};

use crate::attributes::TerminalAttributes;
use crate::error::TtyError;

bitflags! {
    /// Named capability toggles applied on raw-mode entry.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct RawToggles: u16 {
        /// Stop echoing typed characters.
        const NO_ECHO              = 1 << 0;
        /// Deliver input byte by byte instead of line by line.
        const NO_CANONICAL         = 1 << 1;
        /// Deliver Ctrl+C / Ctrl+Z as bytes instead of signals.
        const NO_SIGNALS           = 1 << 2;
        /// Deliver Ctrl+V as a byte.
        const NO_EXTENDED_INPUT    = 1 << 3;
        /// Deliver Ctrl+S / Ctrl+Q as bytes.
        const NO_FLOW_CONTROL      = 1 << 4;
        /// Deliver carriage return as 13, not 10.
        const NO_CR_TO_NL          = 1 << 5;
        const NO_PARITY_CHECK      = 1 << 6;
        const NO_STRIP_HIGH_BIT    = 1 << 7;
        const NO_BREAK_INTERRUPT   = 1 << 8;
        /// Stop translating `\n` into `\r\n` on output.
        const NO_OUTPUT_PROCESSING = 1 << 9;
        const EIGHT_BIT_CHARS      = 1 << 10;
    }
}

/// The raw-mode configuration derived from a captured snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawModeFlags {
    toggles: RawToggles,
    min_bytes: u8,
    timeout_deciseconds: u8,
}

impl Default for RawModeFlags {
    /// Every toggle on, `VMIN = 1`, `VTIME = 1` (about 100 ms).
    fn default() -> Self {
        Self {
            toggles: RawToggles::all(),
            min_bytes: 1,
            timeout_deciseconds: 1,
        }
    }
}

impl RawModeFlags {
    /// Replace the toggle set.
    #[must_use]
    pub fn with_toggles(mut self, toggles: RawToggles) -> Self {
        self.toggles = toggles;
        self
    }

    /// Override `VMIN`.
    #[must_use]
    pub fn with_min_bytes(mut self, min_bytes: u8) -> Self {
        self.min_bytes = min_bytes;
        self
    }

    /// Override `VTIME`, in tenths of a second.
    #[must_use]
    pub fn with_timeout_deciseconds(mut self, deciseconds: u8) -> Self {
        self.timeout_deciseconds = deciseconds;
        self
    }

    #[must_use]
    pub fn toggles(&self) -> RawToggles {
        self.toggles
    }

    #[must_use]
    pub fn min_bytes(&self) -> u8 {
        self.min_bytes
    }

    #[must_use]
    pub fn timeout_deciseconds(&self) -> u8 {
        self.timeout_deciseconds
    }

    /// Derive the raw configuration from `base`.
    ///
    /// Pure: `base` is not modified, and deriving from the result again
    /// yields the same result.
    #[must_use]
    pub fn derive(&self, base: &TerminalAttributes) -> TerminalAttributes {
        let mut derived = base.clone();
        let t = derived.termios_mut();
        let on = |toggle| self.toggles.contains(toggle);

        if on(RawToggles::NO_BREAK_INTERRUPT) {
            t.input_flags.remove(InputFlags::BRKINT);
        }
        if on(RawToggles::NO_CR_TO_NL) {
            t.input_flags.remove(InputFlags::ICRNL);
        }
        if on(RawToggles::NO_PARITY_CHECK) {
            t.input_flags.remove(InputFlags::INPCK);
        }
        if on(RawToggles::NO_STRIP_HIGH_BIT) {
            t.input_flags.remove(InputFlags::ISTRIP);
        }
        if on(RawToggles::NO_FLOW_CONTROL) {
            t.input_flags.remove(InputFlags::IXON);
        }
        if on(RawToggles::NO_OUTPUT_PROCESSING) {
            t.output_flags.remove(OutputFlags::OPOST);
        }
        if on(RawToggles::EIGHT_BIT_CHARS) {
            t.control_flags.insert(ControlFlags::CS8);
        }
        if on(RawToggles::NO_ECHO) {
            t.local_flags.remove(LocalFlags::ECHO);
        }
        if on(RawToggles::NO_CANONICAL) {
            t.local_flags.remove(LocalFlags::ICANON);
        }
        if on(RawToggles::NO_EXTENDED_INPUT) {
            t.local_flags.remove(LocalFlags::IEXTEN);
        }
        if on(RawToggles::NO_SIGNALS) {
            t.local_flags.remove(LocalFlags::ISIG);
        }

        t.control_chars[SpecialCharacterIndices::VMIN as usize] = self.min_bytes;
        t.control_chars[SpecialCharacterIndices::VTIME as usize] = self.timeout_deciseconds;
        derived
    }
}

// ── Controller ───────────────────────────────────────────────────────────

/// Owns the controlling terminal and the snapshot taken before any change.
///
/// The snapshot is captured once in [`TerminalModeController::capture`] and
/// never replaced, so every raw-mode entry derives from, and every restore
/// returns to, the configuration the shell had.
#[derive(Debug)]
pub struct TerminalModeController<F: AsFd> {
    tty: F,
    original: TerminalAttributes,
}

impl<F: AsFd> TerminalModeController<F> {
    /// Capture the current attributes of `tty`.
    ///
    /// # Errors
    ///
    /// Returns [`TtyError::TerminalIo`] (`tcgetattr`) when `tty` is not a
    /// terminal.
    pub fn capture(tty: F) -> Result<Self, TtyError> {
        let original = TerminalAttributes::read_from(&tty)?;
        crate::debug!("captured original terminal attributes");
        Ok(Self { tty, original })
    }

    /// The snapshot taken at capture time.
    #[must_use]
    pub fn original(&self) -> &TerminalAttributes {
        &self.original
    }

    /// The terminal this controller acts on.
    #[must_use]
    pub fn tty(&self) -> &F {
        &self.tty
    }

    /// Apply `flags` derived from the captured snapshot.
    ///
    /// The returned guard borrows the controller mutably, so a second entry
    /// while the first guard is alive does not compile. Entering again after
    /// the guard is released derives from the same snapshot and yields the
    /// same configuration.
    ///
    /// # Errors
    ///
    /// Returns [`TtyError::TerminalIo`] (`tcsetattr`) when the terminal
    /// rejects the new attributes.
    pub fn enter_raw_mode(
        &mut self,
        flags: &RawModeFlags,
    ) -> Result<RawModeGuard<'_, F>, TtyError> {
        flags.derive(&self.original).apply_to(&self.tty)?;
        crate::info!("terminal raw mode enabled");
        Ok(RawModeGuard {
            controller: self,
            active: true,
        })
    }

    /// Reapply the captured snapshot verbatim.
    ///
    /// # Errors
    ///
    /// Returns [`TtyError::TerminalIo`] (`tcsetattr`) when the terminal
    /// rejects the attributes.
    pub fn restore_original(&self) -> Result<(), TtyError> {
        self.original.apply_to(&self.tty)?;
        crate::info!("terminal raw mode disabled");
        Ok(())
    }
}

/// RAII guard for raw mode.
///
/// Releasing the guard restores the original attributes: explicitly through
/// [`RawModeGuard::restore`], which returns the outcome, or implicitly on
/// drop (early `?` returns, panics), which reports a failure on stderr.
#[derive(Debug)]
#[must_use = "dropping the guard immediately restores cooked mode"]
pub struct RawModeGuard<'a, F: AsFd> {
    controller: &'a TerminalModeController<F>,
    active: bool,
}

impl<F: AsFd> RawModeGuard<'_, F> {
    /// Restore the original attributes now.
    ///
    /// # Errors
    ///
    /// Returns the `tcsetattr` failure. The guard is consumed either way and
    /// does not retry on drop.
    pub fn restore(mut self) -> Result<(), TtyError> {
        self.active = false;
        self.controller.restore_original()
    }

    /// The snapshot that will be restored.
    #[must_use]
    pub fn original(&self) -> &TerminalAttributes {
        self.controller.original()
    }

    /// The terminal in raw mode.
    #[must_use]
    pub fn tty(&self) -> &F {
        self.controller.tty()
    }
}

impl<F: AsFd> Drop for RawModeGuard<'_, F> {
    fn drop(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;
        if let Err(err) = self.controller.restore_original() {
            crate::error!("failed to restore terminal attributes: {}", err);
            eprintln!("failed to restore terminal attributes: {err}");
        }
    }
}
