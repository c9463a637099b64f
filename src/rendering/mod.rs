//! Presentation and feedback.
//!
//! The pipeline never formats output itself. After every state change it
//! hands the history, the stats and a status line to a [`PresentationSink`],
//! and pings a [`Feedback`] on every accepted scan.
//!
//! Both are best effort: the session logs and swallows their errors.

mod feedback;
mod json_lines;
mod terminal;

pub use feedback::{NoFeedback, TerminalBell};
pub use json_lines::JsonLinesSink;
pub use terminal::{EMPTY_HISTORY_MESSAGE, NO_PRODUCT_MESSAGE, TerminalSink};

use crate::Result;
use crate::models::{ScanHistory, ScanStats};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Status line severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Neutral information (`Scanner stopped`).
    Info,
    /// A scan was recorded or scanning started.
    Success,
    /// Degraded but still working.
    Warning,
    /// An operation failed.
    Error,
}

impl Severity {
    /// Returns the severity as a lowercase label.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Receives state changes for display.
///
/// Implementations only read the history; the recorder owns it.
pub trait PresentationSink: Send {
    /// Shows the full history, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the output cannot be written.
    fn render_history(&mut self, history: &ScanHistory) -> Result<()>;

    /// Shows the summary counters.
    ///
    /// # Errors
    ///
    /// Returns an error if the output cannot be written.
    fn render_stats(&mut self, stats: &ScanStats) -> Result<()>;

    /// Shows a one-line status message.
    ///
    /// # Errors
    ///
    /// Returns an error if the output cannot be written.
    fn render_status(&mut self, message: &str, severity: Severity) -> Result<()>;
}

/// Fire-and-forget cue on a successful scan (sound, vibration, flash).
pub trait Feedback: Send {
    /// Emits the cue.
    ///
    /// # Errors
    ///
    /// Returns an error if the cue could not be emitted.
    fn notify(&mut self) -> Result<()>;
}

/// Maps an output error to [`crate::Error::OperationFailed`].
pub(crate) fn output_error(operation: &str, e: impl fmt::Display) -> crate::Error {
    crate::Error::OperationFailed {
        operation: operation.to_string(),
        cause: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_severity_labels() {
        assert_eq!(Severity::Success.to_string(), "success");
        assert_eq!(
            serde_json::to_string(&Severity::Warning).unwrap(),
            "\"warning\""
        );
    }
}
