#![forbid(unsafe_code)]

//! Process-level wiring: logging setup and the guarded editor session.

use std::fs::OpenOptions;
use std::io;
use std::sync::Mutex;

use tilde_tty::{InputReader, Terminal, TerminalModeController, TtyError};
use tracing_subscriber::EnvFilter;

use crate::config::{EditorConfig, LogConfig};
use crate::editor::{Editor, EditorState};

/// Install a file-backed `fmt` subscriber when logging is configured.
///
/// Returns `Ok(false)` when logging is disabled.
///
/// # Errors
///
/// Returns an error when the log file cannot be opened, the filter does not
/// parse, or a global subscriber is already installed.
pub fn init_logging(config: &LogConfig) -> io::Result<bool> {
    let Some(path) = config.path.as_ref() else {
        return Ok(false);
    };
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let filter = EnvFilter::try_new(&config.filter).map_err(io::Error::other)?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(io::Error::other)?;
    Ok(true)
}

/// Run one editor session on the process's terminal.
///
/// Raw mode is held by a guard for the whole session, so the original
/// attributes come back on quit, on any error after raw-mode entry, and
/// during panic unwinding. A failed restore is reported but never replaces
/// the session's own outcome.
///
/// # Errors
///
/// Returns the first fatal [`TtyError`]: attribute capture or apply, the
/// window-size query, or a read/write on the terminal.
pub fn run(config: &EditorConfig) -> Result<(), TtyError> {
    let terminal = Terminal::stdio()?;
    let mut controller = TerminalModeController::capture(&terminal.input)?;
    let guard = controller.enter_raw_mode(config.raw_mode())?;

    let state = EditorState::query(&terminal.output)?;
    let input = InputReader::new(&terminal.input).with_min_bytes(config.raw_mode().min_bytes());
    let mut editor = Editor::new(config, state, input, &terminal.output);
    let outcome = editor.run();

    settle(outcome, guard.restore())
}

/// Combine the loop's outcome with the restore result.
///
/// A restore failure is logged and printed; the loop's outcome decides the
/// exit status.
fn settle(outcome: Result<(), TtyError>, restored: Result<(), TtyError>) -> Result<(), TtyError> {
    if let Err(err) = restored {
        tracing::error!(%err, "failed to restore terminal attributes");
        eprintln!("tilde: failed to restore terminal: {err}");
    }
    outcome
}
