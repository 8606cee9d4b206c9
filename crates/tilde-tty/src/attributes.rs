#![forbid(unsafe_code)]

//! Snapshot of a terminal's configuration.

use std::fmt;
use std::os::fd::AsFd;

use nix::sys::termios::{
    ControlFlags, InputFlags, LocalFlags, OutputFlags, SetArg, SpecialCharacterIndices, Termios,
    tcgetattr, tcsetattr,
};

use crate::error::TtyError;

/// Opaque snapshot of a terminal's attributes.
///
/// Wraps the full `termios` structure, so flags this crate does not know about
/// (and line speeds, and every control character) travel with the snapshot
/// and are written back untouched.
#[derive(Clone)]
pub struct TerminalAttributes {
    termios: Termios,
}

impl TerminalAttributes {
    /// Read the current attributes of `tty` (`tcgetattr`).
    ///
    /// # Errors
    ///
    /// Returns [`TtyError::TerminalIo`] when `tty` is not a terminal or the
    /// call otherwise fails.
    pub fn read_from<Fd: AsFd>(tty: Fd) -> Result<Self, TtyError> {
        let termios = tcgetattr(tty).map_err(|errno| TtyError::io("tcgetattr", errno))?;
        Ok(Self { termios })
    }

    /// Apply these attributes to `tty` (`tcsetattr` with `TCSAFLUSH`).
    ///
    /// Pending unread input is discarded, matching what a shell expects after
    /// a full-screen program exits.
    ///
    /// # Errors
    ///
    /// Returns [`TtyError::TerminalIo`] when the call fails.
    pub fn apply_to<Fd: AsFd>(&self, tty: Fd) -> Result<(), TtyError> {
        tcsetattr(tty, SetArg::TCSAFLUSH, &self.termios)
            .map_err(|errno| TtyError::io("tcsetattr", errno))
    }

    #[must_use]
    pub fn input_flags(&self) -> InputFlags {
        self.termios.input_flags
    }

    #[must_use]
    pub fn output_flags(&self) -> OutputFlags {
        self.termios.output_flags
    }

    #[must_use]
    pub fn control_flags(&self) -> ControlFlags {
        self.termios.control_flags
    }

    #[must_use]
    pub fn local_flags(&self) -> LocalFlags {
        self.termios.local_flags
    }

    /// Minimum number of bytes a read waits for (`VMIN`).
    #[must_use]
    pub fn min_bytes(&self) -> u8 {
        self.termios.control_chars[SpecialCharacterIndices::VMIN as usize]
    }

    /// Inter-byte read timeout in tenths of a second (`VTIME`).
    #[must_use]
    pub fn timeout_deciseconds(&self) -> u8 {
        self.termios.control_chars[SpecialCharacterIndices::VTIME as usize]
    }

    pub(crate) fn termios_mut(&mut self) -> &mut Termios {
        &mut self.termios
    }
}

impl PartialEq for TerminalAttributes {
    fn eq(&self, other: &Self) -> bool {
        let (a, b) = (&self.termios, &other.termios);
        a.input_flags == b.input_flags
            && a.output_flags == b.output_flags
            && a.control_flags == b.control_flags
            && a.local_flags == b.local_flags
            && a.control_chars == b.control_chars
    }
}

impl Eq for TerminalAttributes {}

impl fmt::Debug for TerminalAttributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TerminalAttributes")
            .field("input_flags", &self.termios.input_flags)
            .field("output_flags", &self.termios.output_flags)
            .field("control_flags", &self.termios.control_flags)
            .field("local_flags", &self.termios.local_flags)
            .field("vmin", &self.min_bytes())
            .field("vtime", &self.timeout_deciseconds())
            .finish()
    }
}
