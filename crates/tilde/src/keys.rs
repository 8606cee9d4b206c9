#![forbid(unsafe_code)]

//! Key decoding and dispatch.
//!
//! Terminals encode Ctrl+<letter> as the letter's code with bits 5-7 cleared,
//! so Ctrl+Q arrives as `0x11` and Ctrl+C as `0x03`, whichever case the
//! letter was typed in.

/// Mask that keeps the low five bits of a key code.
pub const CTRL_MASK: u8 = 0x1f;

/// Control code produced by Ctrl+`letter`.
#[must_use]
pub const fn ctrl_key(letter: u8) -> u8 {
    letter & CTRL_MASK
}

/// What the loop does with a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    /// Clear the screen and leave the loop.
    Quit,
    /// No binding; the loop continues.
    Ignored,
}

/// Dispatch one input byte against the quit binding.
#[must_use]
pub fn dispatch(byte: u8, quit_code: u8) -> KeyAction {
    if byte == quit_code {
        KeyAction::Quit
    } else {
        KeyAction::Ignored
    }
}

/// Whether `byte` is a non-printable control character (`0x00..=0x1f`, `0x7f`).
#[must_use]
pub fn is_control(byte: u8) -> bool {
    byte.is_ascii_control()
}

/// Human-readable form of a key byte: `113 ('q')`, or just `17` for control
/// and non-ASCII bytes.
#[must_use]
pub fn describe_key(byte: u8) -> String {
    if byte.is_ascii_graphic() || byte == b' ' {
        format!("{byte} ('{}')", byte as char)
    } else {
        format!("{byte}")
    }
}
