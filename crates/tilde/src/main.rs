#![forbid(unsafe_code)]

//! tilde binary entry point.

use std::process::ExitCode;

use tilde::config::{EditorConfig, LogConfig};
use tilde::session;

fn main() -> ExitCode {
    let log = LogConfig::from_env();
    if let Err(err) = session::init_logging(&log) {
        eprintln!("tilde: logging disabled: {err}");
    }

    match session::run(&EditorConfig::default()) {
        Ok(()) => {
            tracing::info!("exited on quit key");
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!(%err, "fatal");
            eprintln!("tilde: {err}");
            ExitCode::FAILURE
        }
    }
}
