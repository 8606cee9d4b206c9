#![forbid(unsafe_code)]

//! Screen refresh protocol.
//!
//! ## Escape Sequence Reference
//!
//! | Sequence  | Bytes          | Effect                      |
//! |-----------|----------------|-----------------------------|
//! | `CSI 2 J` | `1b 5b 32 4a`  | erase entire display        |
//! | `CSI H`   | `1b 5b 48`     | cursor to row 1, column 1   |
//!
//! A frame is: erase, home, one marker row per screen row, home. Erasing
//! first hides stale content; homing last leaves the cursor in a known place.

use std::io::{self, Write};

pub const ERASE_DISPLAY: &[u8] = b"\x1b[2J";
pub const CURSOR_HOME: &[u8] = b"\x1b[H";

/// Line ending for every painted row. Output post-processing is off in raw
/// mode, so the carriage return must be explicit.
const ROW_END: &[u8] = b"\r\n";

/// Write one full repaint of `rows` marker rows.
pub fn write_frame(rows: u16, marker: u8, writer: &mut impl Write) -> io::Result<()> {
    writer.write_all(ERASE_DISPLAY)?;
    writer.write_all(CURSOR_HOME)?;
    for _ in 0..rows {
        writer.write_all(&[marker])?;
        writer.write_all(ROW_END)?;
    }
    writer.write_all(CURSOR_HOME)
}

/// Write the clear sequence used on quit and on fatal errors.
pub fn write_clear(writer: &mut impl Write) -> io::Result<()> {
    writer.write_all(ERASE_DISPLAY)?;
    writer.write_all(CURSOR_HOME)
}
