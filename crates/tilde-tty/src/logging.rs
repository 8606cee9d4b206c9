#![forbid(unsafe_code)]

//! Logging support.
//!
//! Re-exports the `tracing` level macros when the `tracing` feature is enabled.
//! When the feature is disabled, no-op macros with the same names are provided
//! so call sites compile unchanged.

#[cfg(feature = "tracing")]
pub use tracing::{debug, error, info, trace, warn};

// When tracing is not enabled, provide no-op macros
#[cfg(not(feature = "tracing"))]
mod noop_macros {
    /// No-op trace macro when tracing is disabled.
    #[macro_export]
    macro_rules! trace {
        ($($arg:tt)*) => {};
    }

    /// No-op debug macro when tracing is disabled.
    #[macro_export]
    macro_rules! debug {
        ($($arg:tt)*) => {};
    }

    /// No-op info macro when tracing is disabled.
    #[macro_export]
    macro_rules! info {
        ($($arg:tt)*) => {};
    }

    /// No-op warn macro when tracing is disabled.
    #[macro_export]
    macro_rules! warn {
        ($($arg:tt)*) => {};
    }

    /// No-op error macro when tracing is disabled.
    #[macro_export]
    macro_rules! error {
        ($($arg:tt)*) => {};
    }
}

// Note: Macros are exported at crate root via #[macro_export],
// so callers use `crate::debug!` regardless of the feature.

#[cfg(test)]
mod tests {
    #[test]
    fn macros_accept_format_arguments() {
        let op = "tcsetattr";
        crate::trace!("trace {}", op);
        crate::debug!("debug {}", op);
        crate::info!("info {op}");
        crate::warn!("warn {}", op);
        crate::error!("error {}", op);
        assert_eq!(op, "tcsetattr");
    }
}
