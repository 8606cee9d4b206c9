#![forbid(unsafe_code)]

//! Owned handles on the process's controlling terminal.

use std::fs::File;
use std::io;
use std::os::fd::AsFd;

use crate::error::TtyError;

/// Unbuffered handles on standard input and standard output.
///
/// Both are duplicated file descriptors, so reads bypass `Stdin`'s buffer
/// and writes bypass `Stdout`'s line buffering.
#[derive(Debug)]
pub struct Terminal {
    /// Input side: attributes are captured and set here, keys are read here.
    pub input: File,
    /// Output side: the screen, and the fd queried for the window size.
    pub output: File,
}

impl Terminal {
    /// Duplicate fd 0 and fd 1.
    ///
    /// # Errors
    ///
    /// Returns [`TtyError::TerminalIo`] (`dup`) when a descriptor cannot be
    /// duplicated.
    pub fn stdio() -> Result<Self, TtyError> {
        let input = dup(io::stdin().as_fd())?;
        let output = dup(io::stdout().as_fd())?;
        Ok(Self { input, output })
    }
}

fn dup(fd: std::os::fd::BorrowedFd<'_>) -> Result<File, TtyError> {
    fd.try_clone_to_owned()
        .map(File::from)
        .map_err(|err| TtyError::io("dup", err))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stdio_duplicates_descriptors() {
        // Whatever the test harness wires to fd 0/1, duplicating must work.
        let terminal = Terminal::stdio().expect("dup stdio");
        assert!(terminal.input.metadata().is_ok());
        assert!(terminal.output.metadata().is_ok());
    }
}
