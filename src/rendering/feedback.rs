//! Feedback cues.

use super::{Feedback, output_error};
use crate::Result;
use std::io::Write;

/// Rings the terminal bell on stderr.
#[derive(Debug, Default)]
pub struct TerminalBell;

impl Feedback for TerminalBell {
    fn notify(&mut self) -> Result<()> {
        let mut stderr = std::io::stderr().lock();
        stderr
            .write_all(b"\x07")
            .and_then(|()| stderr.flush())
            .map_err(|e| output_error("ring_bell", e))
    }
}

/// Emits nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoFeedback;

impl Feedback for NoFeedback {
    fn notify(&mut self) -> Result<()> {
        Ok(())
    }
}
