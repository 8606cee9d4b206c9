#![forbid(unsafe_code)]

//! Byte-at-a-time terminal input.

use std::io::{self, Read};

use crate::error::TtyError;

/// Outcome of a single `read(2)` attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReadAttempt {
    Byte(u8),
    /// `VTIME` expired under `VMIN = 0`, or the call was interrupted.
    NoData,
}

/// Blocking reader that yields one byte per call.
///
/// The source is read directly, one byte at a time; nothing is buffered
/// beyond the byte in flight. Wrap an unbuffered handle (a `File` on the
/// terminal fd), not `Stdin`.
///
/// A zero-byte read means different things depending on the terminal's
/// `VMIN`. With `VMIN = 0` it is a `VTIME` expiry and is retried. With
/// `VMIN >= 1` the kernel only returns zero at end of input (a hung-up
/// terminal), which is fatal.
#[derive(Debug)]
pub struct InputReader<R> {
    source: R,
    min_bytes: u8,
}

impl<R: Read> InputReader<R> {
    /// Reader for a terminal configured with `VMIN = 1`.
    pub fn new(source: R) -> Self {
        Self {
            source,
            min_bytes: 1,
        }
    }

    /// Match the `VMIN` the terminal was configured with.
    #[must_use]
    pub fn with_min_bytes(mut self, min_bytes: u8) -> Self {
        self.min_bytes = min_bytes;
        self
    }

    #[must_use]
    pub fn min_bytes(&self) -> u8 {
        self.min_bytes
    }

    /// Block until a byte arrives.
    ///
    /// Reads that return no data (`VTIME` expiry under `VMIN = 0`,
    /// `WouldBlock`, `EINTR`) are retried and never surface to the caller.
    ///
    /// # Errors
    ///
    /// Returns [`TtyError::TerminalIo`] (`read`) at end of input and for any
    /// other failure.
    pub fn read_byte(&mut self) -> Result<u8, TtyError> {
        loop {
            match self.attempt()? {
                ReadAttempt::Byte(byte) => return Ok(byte),
                ReadAttempt::NoData => {
                    crate::trace!("no input before read timeout, retrying");
                }
            }
        }
    }

    fn attempt(&mut self) -> Result<ReadAttempt, TtyError> {
        let mut buf = [0u8; 1];
        match self.source.read(&mut buf) {
            Ok(0) if self.min_bytes == 0 => Ok(ReadAttempt::NoData),
            Ok(0) => Err(TtyError::io("read", io::ErrorKind::UnexpectedEof)),
            Ok(_) => Ok(ReadAttempt::Byte(buf[0])),
            Err(err) if is_no_data(&err) => Ok(ReadAttempt::NoData),
            Err(err) => Err(TtyError::io("read", err)),
        }
    }

    pub fn get_ref(&self) -> &R {
        &self.source
    }

    pub fn into_inner(self) -> R {
        self.source
    }
}

fn is_no_data(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
    )
}
