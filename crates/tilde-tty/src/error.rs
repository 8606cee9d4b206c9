#![forbid(unsafe_code)]

//! Error taxonomy for terminal control.
//!
//! Every variant is fatal to the editor: there is no retry and no degraded
//! mode. The `Display` output names the failed operation so the process can
//! print it verbatim before exiting with status 1.

use std::fmt;
use std::io;

/// Errors raised while controlling the terminal.
#[derive(Debug)]
pub enum TtyError {
    /// Reading or writing terminal attributes, or reading from / writing to
    /// the terminal device, failed.
    TerminalIo {
        /// Name of the failed operation (`tcgetattr`, `tcsetattr`, `read`, ...).
        operation: &'static str,
        source: io::Error,
    },
    /// The window dimensions could not be determined.
    WindowSize(WindowSizeError),
}

impl TtyError {
    /// Wrap an I/O failure of the named operation.
    pub fn io(operation: &'static str, source: impl Into<io::Error>) -> Self {
        Self::TerminalIo {
            operation,
            source: source.into(),
        }
    }

    /// Name of the operation that failed.
    #[must_use]
    pub fn operation(&self) -> &'static str {
        match self {
            Self::TerminalIo { operation, .. } => operation,
            Self::WindowSize(_) => "window size query",
        }
    }
}

impl fmt::Display for TtyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TerminalIo { operation, source } => write!(f, "{operation}: {source}"),
            Self::WindowSize(err) => write!(f, "window size query: {err}"),
        }
    }
}

impl std::error::Error for TtyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::TerminalIo { source, .. } => Some(source),
            Self::WindowSize(err) => Some(err),
        }
    }
}

impl From<WindowSizeError> for TtyError {
    fn from(err: WindowSizeError) -> Self {
        Self::WindowSize(err)
    }
}

/// Reasons a window-size query is unusable.
#[derive(Debug)]
pub enum WindowSizeError {
    /// The `TIOCGWINSZ` query itself failed.
    Query(io::Error),
    /// The terminal reported zero columns.
    ZeroColumns { rows: u16 },
}

impl fmt::Display for WindowSizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Query(err) => write!(f, "{err}"),
            Self::ZeroColumns { rows } => {
                write!(f, "terminal reported zero columns ({rows} rows)")
            }
        }
    }
}

impl std::error::Error for WindowSizeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Query(err) => Some(err),
            Self::ZeroColumns { .. } => None,
        }
    }
}
