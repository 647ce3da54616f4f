//! Display sink adapters.
//!
//! The shipped adapter draws into an ANSI terminal, which stands in for the
//! panel during development and in `--once` diagnostics. A hardware adapter
//! for the real display controller implements the same
//! [`DisplaySink`] trait and slots in without touching the renderer.

use std::io::{self, Stdout, Write};

use busboard_core::ports::{DisplaySink, SinkError};
use crossterm::{
    cursor, execute, queue,
    style::Print,
    terminal::{Clear, ClearType},
};

/// Character-cell sink backed by the process's terminal.
pub(crate) struct TerminalSink {
    out: Stdout,
}

impl TerminalSink {
    /// Create a sink writing to stdout.
    #[must_use]
    pub(crate) fn new() -> Self {
        Self { out: io::stdout() }
    }
}

impl Default for TerminalSink {
    fn default() -> Self {
        Self::new()
    }
}

impl DisplaySink for TerminalSink {
    fn initialize(&mut self) -> Result<(), SinkError> {
        execute!(self.out, cursor::Hide, Clear(ClearType::All))?;
        Ok(())
    }

    fn clear(&mut self) -> Result<(), SinkError> {
        queue!(self.out, Clear(ClearType::All))?;
        Ok(())
    }

    fn draw_text(&mut self, row: u16, col: u16, text: &str) -> Result<(), SinkError> {
        queue!(self.out, cursor::MoveTo(col, row), Print(text))?;
        Ok(())
    }

    fn show(&mut self) -> Result<(), SinkError> {
        self.out.flush()?;
        Ok(())
    }
}

impl Drop for TerminalSink {
    fn drop(&mut self) {
        // leave the cursor usable even if the loop aborted mid-frame
        let _ = execute!(self.out, cursor::Show, cursor::MoveTo(0, 0));
        let _ = writeln!(self.out);
    }
}
