//! Interactive terminal bridge.
//!
//! The embedded shell's input primitive is blocking from its own
//! perspective; on the host side a `read_line` call suspends the runtime
//! exactly at the point it requests input and resumes it once a full line
//! is available, without blocking the host's event loop.
//!
//! The line-editing rules live in [`LineEditor`], a pure state machine that
//! can be tested without a terminal. [`TerminalIo`] drives it from a
//! crossterm event stream with the terminal in raw mode, restoring cooked
//! mode when the line completes (or on any exit path, via an RAII guard).

use std::io::Write;

use async_trait::async_trait;
use crossterm::event::{Event, EventStream, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use futures::StreamExt;
use tokio::sync::Mutex;

use crate::runtime::HostIo;

/// Classified keystrokes the editor cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Key {
    /// A typed character (printability is decided by the editor).
    Char(char),
    /// Carriage return / newline.
    Enter,
    /// Backspace / delete.
    Backspace,
    /// The interrupt character (Ctrl-C).
    Interrupt,
}

/// Result of feeding one key to the editor.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Step {
    /// Keep capturing; `echo` is what the terminal should display.
    Continue { echo: Option<String> },
    /// The line is complete; echo `echo`, resolve the read with `line`.
    Complete { echo: &'static str, line: String },
}

/// Single-line editor state machine.
///
/// Owns the capture buffer for exactly one read request; completing a line
/// (or interrupting it) hands the buffer off and leaves the editor empty.
#[derive(Debug, Default)]
pub(crate) struct LineEditor {
    buffer: String,
}

impl LineEditor {
    pub(crate) fn apply(&mut self, key: Key) -> Step {
        match key {
            Key::Char(c) if c == ' ' || c.is_ascii_graphic() => {
                self.buffer.push(c);
                Step::Continue {
                    echo: Some(c.to_string()),
                }
            }
            // Characters outside the visible ASCII range are dropped.
            Key::Char(_) => Step::Continue { echo: None },
            Key::Backspace => {
                if self.buffer.pop().is_some() {
                    // Cursor back, blank the cell, cursor back again.
                    Step::Continue {
                        echo: Some("\x08 \x08".to_string()),
                    }
                } else {
                    Step::Continue { echo: None }
                }
            }
            Key::Enter => Step::Complete {
                echo: "\r\n",
                line: std::mem::take(&mut self.buffer),
            },
            Key::Interrupt => {
                self.buffer.clear();
                Step::Complete {
                    echo: "^C\r\n",
                    line: String::new(),
                }
            }
        }
    }
}

/// Puts the terminal in raw mode for the lifetime of the guard.
struct RawModeGuard;

impl RawModeGuard {
    fn enable() -> std::io::Result<Self> {
        enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
    }
}

/// [`HostIo`] implementation over the host terminal.
///
/// A single capture is active at a time: the internal guard serializes
/// overlapping `read_line` calls instead of leaving concurrent behavior to
/// convention.
#[derive(Debug, Default)]
pub struct TerminalIo {
    active_read: Mutex<()>,
}

impl TerminalIo {
    /// Create a terminal bridge.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HostIo for TerminalIo {
    async fn read_line(&self, _prompt: &str) -> std::io::Result<String> {
        let _active = self.active_read.lock().await;
        let _raw = RawModeGuard::enable()?;

        let mut events = EventStream::new();
        let mut editor = LineEditor::default();
        let mut stdout = std::io::stdout();

        while let Some(event) = events.next().await {
            let Some(key) = classify(&event?) else {
                continue;
            };
            match editor.apply(key) {
                Step::Continue { echo } => {
                    if let Some(echo) = echo {
                        stdout.write_all(echo.as_bytes())?;
                        stdout.flush()?;
                    }
                }
                Step::Complete { echo, line } => {
                    stdout.write_all(echo.as_bytes())?;
                    stdout.flush()?;
                    return Ok(line);
                }
            }
        }

        // Event stream closed underneath us (terminal went away).
        Ok(String::new())
    }

    fn write_line(&self, text: &str) {
        let mut stdout = std::io::stdout();
        let _ = writeln!(stdout, "{text}");
        let _ = stdout.flush();
    }
}

fn classify(event: &Event) -> Option<Key> {
    let Event::Key(key) = event else {
        return None;
    };
    if key.kind == KeyEventKind::Release {
        return None;
    }
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(Key::Interrupt)
        }
        // Other control and alt chords are commands, not text.
        KeyCode::Char(_)
            if key
                .modifiers
                .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
        {
            None
        }
        KeyCode::Char(c) => Some(Key::Char(c)),
        KeyCode::Enter => Some(Key::Enter),
        KeyCode::Backspace => Some(Key::Backspace),
        _ => None,
    }
}
