//! End-to-end tests: the `tilde` binary under a real PTY.
//!
//! 1. The first frame paints one marker per PTY row.
//! 2. Ctrl+Q clears the screen and exits 0.
//! 3. Unbound keys only trigger a repaint.
//! 4. Zero columns fails before the loop with status 1.
//! 5. A non-terminal stdin fails with status 1 naming `tcgetattr`.
//! 6. `TILDE_LOG` captures the raw-mode lifecycle in a file.

use std::process::{Command, Stdio};
use std::time::Duration;

use portable_pty::CommandBuilder;
use tilde_pty::{
    PtyConfig, ROW_MARKER, assert_screen_cleared, count_occurrences, find_subsequence, frames,
    spawn_command,
};

const TIMEOUT: Duration = Duration::from_secs(5);
const CTRL_Q: &[u8] = &[0x11];

fn tilde() -> CommandBuilder {
    CommandBuilder::new(env!("CARGO_BIN_EXE_tilde"))
}

fn config(name: &str) -> PtyConfig {
    PtyConfig::default().with_test_name(name).logging(false)
}

#[test]
fn first_frame_fills_every_row() {
    let mut session = spawn_command(config("first_frame").with_size(80, 24), tilde())
        .expect("spawn tilde");
    session
        .read_until_count(ROW_MARKER, 24, TIMEOUT)
        .expect("first frame");
    session.send_input(CTRL_Q).expect("send quit");
    session.wait_and_drain(Duration::from_secs(1)).expect("wait");

    let output = session.output();
    let frames = frames(output);
    assert_eq!(count_occurrences(frames[0], ROW_MARKER), 24);
    assert!(frames[0].ends_with(b"~\r\n\x1b[H"));
}

#[test]
fn ctrl_q_clears_and_exits_zero() {
    let mut session = spawn_command(config("ctrl_q").with_size(40, 10), tilde())
        .expect("spawn tilde");
    session
        .read_until_count(ROW_MARKER, 10, TIMEOUT)
        .expect("first frame");
    session.send_input(CTRL_Q).expect("send quit");

    let status = session.wait_and_drain(Duration::from_secs(1)).expect("wait");
    assert!(status.success(), "tilde exited with {status:?}");
    assert_screen_cleared(session.output()).expect("quit sequence");
}

#[test]
fn plain_q_does_not_quit() {
    let mut session = spawn_command(config("plain_q").with_size(40, 5), tilde())
        .expect("spawn tilde");
    session
        .read_until_count(ROW_MARKER, 5, TIMEOUT)
        .expect("first frame");

    session.send_input(b"q").expect("send q");
    session
        .read_until_count(ROW_MARKER, 10, TIMEOUT)
        .expect("repaint after q");
    session.send_input(b"x").expect("send x");
    session
        .read_until_count(ROW_MARKER, 15, TIMEOUT)
        .expect("repaint after x");

    session.send_input(CTRL_Q).expect("send quit");
    let status = session.wait_and_drain(Duration::from_secs(1)).expect("wait");
    assert!(status.success());

    let output = session.output();
    // No echo of the typed keys in raw mode.
    assert!(find_subsequence(output, b"qx").is_none());
    assert_eq!(frames(output).len(), 4, "three repaints plus the quit clear");
}

#[test]
fn zero_columns_is_fatal() {
    let mut session = spawn_command(config("zero_columns").with_size(0, 24), tilde())
        .expect("spawn tilde");
    let status = session.wait_and_drain(Duration::from_secs(1)).expect("wait");
    assert_eq!(status.exit_code(), 1);

    let output = session.output();
    assert!(find_subsequence(output, b"window size query").is_some());
    assert_eq!(count_occurrences(output, ROW_MARKER), 0, "loop must not start");
}

#[test]
fn non_terminal_stdin_is_fatal() {
    let output = Command::new(env!("CARGO_BIN_EXE_tilde"))
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .expect("run tilde");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("tcgetattr"), "stderr: {stderr}");
    assert!(output.stdout.is_empty());
}

#[test]
fn log_file_records_lifecycle() {
    let dir = tempfile::tempdir().expect("tempdir");
    let log = dir.path().join("tilde.log");
    let cfg = config("log_file")
        .with_size(20, 3)
        .with_env("TILDE_LOG", log.to_string_lossy())
        .with_env("TILDE_LOG_LEVEL", "debug");

    let mut session = spawn_command(cfg, tilde()).expect("spawn tilde");
    session
        .read_until_count(ROW_MARKER, 3, TIMEOUT)
        .expect("first frame");
    session.send_input(b"a").expect("send a");
    session
        .read_until_count(ROW_MARKER, 6, TIMEOUT)
        .expect("repaint");
    session.send_input(CTRL_Q).expect("send quit");
    let status = session.wait_and_drain(Duration::from_secs(1)).expect("wait");
    assert!(status.success());

    let text = std::fs::read_to_string(&log).expect("log file");
    assert!(text.contains("terminal raw mode enabled"), "log: {text}");
    assert!(text.contains("97 ('a')"), "log: {text}");
    assert!(text.contains("terminal raw mode disabled"), "log: {text}");
}
