#![forbid(unsafe_code)]

//! Terminal window dimensions.

use std::os::fd::AsFd;

use crate::error::{TtyError, WindowSizeError};

/// Screen size in character cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowSize {
    pub rows: u16,
    pub cols: u16,
}

impl WindowSize {
    /// Validate raw dimensions.
    ///
    /// # Errors
    ///
    /// Returns [`WindowSizeError::ZeroColumns`] when `cols` is zero.
    pub fn new(rows: u16, cols: u16) -> Result<Self, WindowSizeError> {
        if cols == 0 {
            return Err(WindowSizeError::ZeroColumns { rows });
        }
        Ok(Self { rows, cols })
    }

    /// Ask the terminal behind `tty` for its size (`TIOCGWINSZ`).
    ///
    /// # Errors
    ///
    /// Returns [`TtyError::WindowSize`] when the query fails or reports zero
    /// columns.
    pub fn query<Fd: AsFd>(tty: Fd) -> Result<Self, TtyError> {
        let ws = rustix::termios::tcgetwinsize(tty)
            .map_err(|errno| WindowSizeError::Query(errno.into()))?;
        let size = Self::new(ws.ws_row, ws.ws_col)?;
        crate::debug!("window size {}x{}", size.cols, size.rows);
        Ok(size)
    }
}
