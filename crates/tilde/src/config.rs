#![forbid(unsafe_code)]

//! Editor and logging configuration.
//!
//! The editor itself takes no flags, files or environment variables. The
//! only environment lookups are the two logging variables read by
//! [`LogConfig::from_env`]; the screen belongs to the editor, so logs go to a
//! file or nowhere.

use std::ffi::OsString;
use std::path::PathBuf;

use tilde_tty::RawModeFlags;

use crate::keys::ctrl_key;

/// Path of the log file. Unset disables logging.
pub const LOG_PATH_VAR: &str = "TILDE_LOG";
/// `EnvFilter` directive for the log file.
pub const LOG_LEVEL_VAR: &str = "TILDE_LOG_LEVEL";

const DEFAULT_LOG_FILTER: &str = "debug";

/// Editor behavior knobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorConfig {
    quit_letter: u8,
    row_marker: u8,
    raw_mode: RawModeFlags,
}

impl Default for EditorConfig {
    /// Ctrl+Q quits, rows are drawn as `~`, full raw mode with a 100 ms
    /// inter-byte timeout.
    fn default() -> Self {
        Self {
            quit_letter: b'q',
            row_marker: b'~',
            raw_mode: RawModeFlags::default(),
        }
    }
}

impl EditorConfig {
    /// Quit on Ctrl+`letter` instead of Ctrl+Q.
    #[must_use]
    pub fn with_quit_letter(mut self, letter: u8) -> Self {
        self.quit_letter = letter;
        self
    }

    /// Draw rows with `marker` instead of `~`.
    #[must_use]
    pub fn with_row_marker(mut self, marker: u8) -> Self {
        self.row_marker = marker;
        self
    }

    /// Override the raw-mode configuration.
    #[must_use]
    pub fn with_raw_mode(mut self, raw_mode: RawModeFlags) -> Self {
        self.raw_mode = raw_mode;
        self
    }

    #[must_use]
    pub fn quit_letter(&self) -> u8 {
        self.quit_letter
    }

    /// The byte that quits: the control code of the quit letter.
    #[must_use]
    pub fn quit_code(&self) -> u8 {
        ctrl_key(self.quit_letter)
    }

    #[must_use]
    pub fn row_marker(&self) -> u8 {
        self.row_marker
    }

    #[must_use]
    pub fn raw_mode(&self) -> &RawModeFlags {
        &self.raw_mode
    }
}

/// Where and how much to log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Log file; `None` disables logging.
    pub path: Option<PathBuf>,
    /// `EnvFilter` directive.
    pub filter: String,
}

impl LogConfig {
    /// Read [`LOG_PATH_VAR`] and [`LOG_LEVEL_VAR`].
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_vars(
            std::env::var_os(LOG_PATH_VAR),
            std::env::var(LOG_LEVEL_VAR).ok(),
        )
    }

    /// Build from raw variable values. Empty values count as unset.
    #[must_use]
    pub fn from_vars(path: Option<OsString>, filter: Option<String>) -> Self {
        Self {
            path: path.filter(|p| !p.is_empty()).map(PathBuf::from),
            filter: filter
                .filter(|f| !f.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
        }
    }

    #[must_use]
    pub fn enabled(&self) -> bool {
        self.path.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_quit_on_ctrl_q() {
        let config = EditorConfig::default();
        assert_eq!(config.quit_letter(), b'q');
        assert_eq!(config.quit_code(), 0x11);
        assert_eq!(config.row_marker(), b'~');
        assert_eq!(config.raw_mode(), &RawModeFlags::default());
    }

    #[test]
    fn builders_override_fields() {
        let raw = RawModeFlags::default().with_timeout_deciseconds(3);
        let config = EditorConfig::default()
            .with_quit_letter(b'x')
            .with_row_marker(b'.')
            .with_raw_mode(raw);
        assert_eq!(config.quit_code(), 0x18);
        assert_eq!(config.row_marker(), b'.');
        assert_eq!(config.raw_mode().timeout_deciseconds(), 3);
    }

    #[test]
    fn logging_disabled_without_path() {
        let log = LogConfig::from_vars(None, None);
        assert!(!log.enabled());
        assert_eq!(log.filter, "debug");
    }

    #[test]
    fn empty_values_count_as_unset() {
        let log = LogConfig::from_vars(Some(OsString::new()), Some("  ".to_string()));
        assert!(!log.enabled());
        assert_eq!(log.filter, "debug");
    }

    #[test]
    fn explicit_values_are_kept() {
        let log = LogConfig::from_vars(
            Some(OsString::from("/tmp/tilde.log")),
            Some("tilde=trace".to_string()),
        );
        assert_eq!(log.path, Some(PathBuf::from("/tmp/tilde.log")));
        assert_eq!(log.filter, "tilde=trace");
    }
}
