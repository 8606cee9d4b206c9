#![forbid(unsafe_code)]

//! tilde: a full-screen terminal editor shell.
//!
//! The editor puts the terminal in raw mode, paints a `~` on every row, and
//! waits for keys until Ctrl+Q. Text editing and files come later; this
//! crate is the loop they will plug into:
//!
//! - [`keys`] turns bytes into actions (`Ctrl+<letter>` = letter `& 0x1f`).
//! - [`render`] writes the repaint protocol.
//! - [`editor`] alternates refresh and key processing.
//! - [`session`] binds the loop to the real terminal under a raw-mode guard.
//!
//! Terminal mode handling, byte input and window sizing live in `tilde-tty`.

pub mod config;
pub mod editor;
pub mod keys;
pub mod render;
pub mod session;

pub use config::{EditorConfig, LogConfig};
pub use editor::{Editor, EditorState};
pub use keys::KeyAction;
