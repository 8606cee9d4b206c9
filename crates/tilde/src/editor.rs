#![forbid(unsafe_code)]

//! The read → dispatch → render loop.

use std::io::{Read, Write};
use std::os::fd::AsFd;

use tilde_tty::{InputReader, TtyError, WindowSize};

use crate::config::EditorConfig;
use crate::keys::{self, KeyAction};
use crate::render;

/// Screen dimensions the editor paints against.
///
/// Refreshed only by an explicit [`EditorState::refresh_size`]; resize
/// events are not tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditorState {
    pub rows: u16,
    pub cols: u16,
}

impl EditorState {
    #[must_use]
    pub fn new(size: WindowSize) -> Self {
        Self {
            rows: size.rows,
            cols: size.cols,
        }
    }

    /// Query the window size of `tty`.
    ///
    /// # Errors
    ///
    /// Returns [`TtyError::WindowSize`] when the query fails or reports zero
    /// columns.
    pub fn query<Fd: AsFd>(tty: Fd) -> Result<Self, TtyError> {
        WindowSize::query(tty).map(Self::new)
    }

    /// Re-query the window size of `tty`.
    ///
    /// # Errors
    ///
    /// As [`EditorState::query`]; the state is left unchanged on failure.
    pub fn refresh_size<Fd: AsFd>(&mut self, tty: Fd) -> Result<(), TtyError> {
        *self = Self::query(tty)?;
        Ok(())
    }
}

/// The editor loop over an input source `R` and a screen `W`.
///
/// Single-threaded: a refresh always precedes the key read that follows it.
#[derive(Debug)]
pub struct Editor<'c, R, W> {
    config: &'c EditorConfig,
    state: EditorState,
    input: InputReader<R>,
    output: W,
}

impl<'c, R: Read, W: Write> Editor<'c, R, W> {
    pub fn new(
        config: &'c EditorConfig,
        state: EditorState,
        input: InputReader<R>,
        output: W,
    ) -> Self {
        Self {
            config,
            state,
            input,
            output,
        }
    }

    #[must_use]
    pub fn state(&self) -> &EditorState {
        &self.state
    }

    /// Repaint the whole screen in one write.
    ///
    /// # Errors
    ///
    /// Returns [`TtyError::TerminalIo`] (`write`) when the screen cannot be
    /// written.
    pub fn refresh_screen(&mut self) -> Result<(), TtyError> {
        let mut frame = Vec::with_capacity(16 + usize::from(self.state.rows) * 3);
        render::write_frame(self.state.rows, self.config.row_marker(), &mut frame)
            .map_err(|err| TtyError::io("write", err))?;
        self.emit(&frame)
    }

    /// Read one key and act on it.
    ///
    /// The quit key clears the screen and returns [`KeyAction::Quit`]; every
    /// other key produces no output.
    ///
    /// # Errors
    ///
    /// Returns the reader's or the screen's [`TtyError`].
    pub fn process_key(&mut self) -> Result<KeyAction, TtyError> {
        let byte = self.input.read_byte()?;
        let action = keys::dispatch(byte, self.config.quit_code());
        match action {
            KeyAction::Quit => {
                tracing::info!(key = %keys::describe_key(byte), "quit key received");
                self.clear_screen()?;
            }
            KeyAction::Ignored => {
                tracing::debug!(
                    key = %keys::describe_key(byte),
                    control = keys::is_control(byte),
                    "unbound key"
                );
            }
        }
        Ok(action)
    }

    /// Refresh and process keys until the quit key.
    ///
    /// On a fatal error the screen is cleared (best effort) before the error
    /// is returned, so the caller's diagnostic lands on a clean screen.
    ///
    /// # Errors
    ///
    /// Returns the first [`TtyError`] from reading or painting.
    pub fn run(&mut self) -> Result<(), TtyError> {
        tracing::info!(rows = self.state.rows, cols = self.state.cols, "editor loop started");
        let result = self.run_until_quit();
        if let Err(err) = &result {
            tracing::error!(%err, "editor loop failed");
            if let Err(clear_err) = self.clear_screen() {
                tracing::warn!(%clear_err, "could not clear screen after fatal error");
            }
        }
        result
    }

    fn run_until_quit(&mut self) -> Result<(), TtyError> {
        loop {
            self.refresh_screen()?;
            if self.process_key()? == KeyAction::Quit {
                return Ok(());
            }
        }
    }

    fn clear_screen(&mut self) -> Result<(), TtyError> {
        let mut seq = Vec::with_capacity(8);
        render::write_clear(&mut seq).map_err(|err| TtyError::io("write", err))?;
        self.emit(&seq)
    }

    fn emit(&mut self, bytes: &[u8]) -> Result<(), TtyError> {
        self.output
            .write_all(bytes)
            .and_then(|()| self.output.flush())
            .map_err(|err| TtyError::io("write", err))
    }

    /// Tear the editor apart, returning the screen writer.
    pub fn into_output(self) -> W {
        self.output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::io;

    const CLEAR: &[u8] = b"\x1b[2J\x1b[H";

    fn state(rows: u16) -> EditorState {
        EditorState { rows, cols: 80 }
    }

    fn editor<'c>(
        config: &'c EditorConfig,
        rows: u16,
        keys: &'static [u8],
    ) -> Editor<'c, &'static [u8], Vec<u8>> {
        Editor::new(config, state(rows), InputReader::new(keys), Vec::new())
    }

    fn frame(rows: u16) -> Vec<u8> {
        let mut out = Vec::new();
        render::write_frame(rows, b'~', &mut out).unwrap();
        out
    }

    #[test]
    fn quit_key_clears_and_quits() {
        let config = EditorConfig::default();
        let mut ed = editor(&config, 5, b"\x11");
        assert_eq!(ed.process_key().unwrap(), KeyAction::Quit);
        assert_eq!(ed.into_output(), CLEAR.to_vec());
    }

    #[test]
    fn other_keys_emit_nothing() {
        let config = EditorConfig::default();
        let mut ed = editor(&config, 5, b"q\x03\x1b[A");
        for _ in 0..5 {
            assert_eq!(ed.process_key().unwrap(), KeyAction::Ignored);
        }
        assert!(ed.into_output().is_empty());
    }

    #[test]
    fn refresh_paints_every_row() {
        let config = EditorConfig::default();
        let mut ed = editor(&config, 4, b"");
        assert_eq!(ed.state(), &state(4));
        ed.refresh_screen().unwrap();
        assert_eq!(ed.into_output(), frame(4));
    }

    #[test]
    fn run_alternates_refresh_and_read() {
        let config = EditorConfig::default();
        let mut ed = editor(&config, 3, b"ab\x11");
        ed.run().unwrap();

        let mut expected = Vec::new();
        for _ in 0..3 {
            expected.extend_from_slice(&frame(3));
        }
        expected.extend_from_slice(CLEAR);
        assert_eq!(ed.into_output(), expected);
    }

    #[test]
    fn custom_quit_letter() {
        let config = EditorConfig::default().with_quit_letter(b'x');
        let mut ed = editor(&config, 1, b"\x11\x18");
        assert_eq!(ed.process_key().unwrap(), KeyAction::Ignored);
        assert_eq!(ed.process_key().unwrap(), KeyAction::Quit);
    }

    #[test]
    fn custom_marker_is_painted() {
        let config = EditorConfig::default().with_row_marker(b'.');
        let mut ed = editor(&config, 2, b"");
        ed.refresh_screen().unwrap();
        assert_eq!(ed.into_output(), b"\x1b[2J\x1b[H.\r\n.\r\n\x1b[H".to_vec());
    }

    /// Yields its bytes, then fails with EIO.
    struct FailAfter(VecDeque<u8>);

    impl Read for FailAfter {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.0.pop_front() {
                Some(byte) => {
                    buf[0] = byte;
                    Ok(1)
                }
                None => Err(io::Error::from_raw_os_error(5)),
            }
        }
    }

    #[test]
    fn read_error_clears_screen_and_propagates() {
        let config = EditorConfig::default();
        let input = InputReader::new(FailAfter(VecDeque::from(vec![b'a'])));
        let mut ed = Editor::new(&config, state(2), input, Vec::new());

        let err = ed.run().expect_err("EIO is fatal");
        assert_eq!(err.operation(), "read");

        let mut expected = frame(2);
        expected.extend_from_slice(&frame(2));
        expected.extend_from_slice(CLEAR);
        assert_eq!(ed.into_output(), expected);
    }

    #[test]
    fn end_of_input_ends_the_loop() {
        let config = EditorConfig::default();
        let mut ed = editor(&config, 1, b"a");
        let err = ed.run().expect_err("exhausted input is fatal");
        assert_eq!(err.operation(), "read");

        let mut expected = frame(1);
        expected.extend_from_slice(&frame(1));
        expected.extend_from_slice(CLEAR);
        assert_eq!(ed.into_output(), expected);
    }

    /// Accepts `budget` writes, then fails.
    struct BrokenScreen {
        budget: usize,
    }

    impl Write for BrokenScreen {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.budget == 0 {
                return Err(io::Error::from(io::ErrorKind::BrokenPipe));
            }
            self.budget -= 1;
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn write_error_is_fatal() {
        let config = EditorConfig::default();
        let mut ed = Editor::new(
            &config,
            state(2),
            InputReader::new(&b"a\x11"[..]),
            BrokenScreen { budget: 0 },
        );
        let err = ed.run().expect_err("broken screen");
        assert_eq!(err.operation(), "write");
    }

    #[test]
    fn state_query_and_refresh_use_window_size() {
        use nix::pty::{Winsize, openpty};

        let ws = Winsize {
            ws_row: 30,
            ws_col: 100,
            ws_xpixel: 0,
            ws_ypixel: 0,
        };
        let pty = openpty(&ws, None).expect("openpty");
        let mut state = EditorState::query(&pty.slave).expect("size");
        assert_eq!(state, EditorState { rows: 30, cols: 100 });

        let zero = Winsize { ws_col: 0, ..ws };
        let narrow = openpty(&zero, None).expect("openpty");
        let err = state.refresh_size(&narrow.slave).expect_err("zero columns");
        assert!(matches!(err, TtyError::WindowSize(_)));
        assert_eq!(state, EditorState { rows: 30, cols: 100 });
    }
}
