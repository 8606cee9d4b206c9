#![forbid(unsafe_code)]
//! Terminal-control substrate for the tilde editor (Unix).
//!
//! This crate owns the parts of the editor that touch the terminal device:
//!
//! - [`TerminalModeController`] captures the original attributes once and
//!   hands out a [`RawModeGuard`] that restores them on every exit path.
//! - [`RawModeFlags`] derives raw mode from the captured snapshot as a pure
//!   function over named [`RawToggles`].
//! - [`InputReader`] blocks for one byte at a time and hides read timeouts.
//! - [`WindowSize`] queries the screen dimensions.
//!
//! # Lifecycle
//!
//! ```no_run
//! use tilde_tty::{InputReader, RawModeFlags, Terminal, TerminalModeController, WindowSize};
//!
//! let terminal = Terminal::stdio()?;
//! let mut controller = TerminalModeController::capture(&terminal.input)?;
//! let guard = controller.enter_raw_mode(&RawModeFlags::default())?;
//! let size = WindowSize::query(&terminal.output)?;
//! let mut reader = InputReader::new(&terminal.input);
//! let key = reader.read_byte()?;
//! guard.restore()?;
//! # let _ = (size, key);
//! # Ok::<(), tilde_tty::TtyError>(())
//! ```
//!
//! Only one controller should exist per terminal at a time; the crate does
//! not coordinate between several.

pub mod attributes;
pub mod error;
pub mod input;
pub mod logging;
pub mod raw_mode;
pub mod terminal;
pub mod window;

pub use attributes::TerminalAttributes;
pub use error::{TtyError, WindowSizeError};
pub use input::InputReader;
pub use raw_mode::{RawModeFlags, RawModeGuard, RawToggles, TerminalModeController};
pub use terminal::Terminal;
pub use window::WindowSize;

// Re-export tracing macros at crate root for ergonomic use.
#[cfg(feature = "tracing")]
pub use logging::{debug, error, info, trace, warn};
