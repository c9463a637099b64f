//! Machine-readable sink: one JSON object per notification.

use super::{PresentationSink, Severity, output_error};
use crate::Result;
use crate::models::{ScanHistory, ScanStats};
use serde::Serialize;
use std::io::Write;

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Line<'a> {
    History { records: &'a ScanHistory },
    Stats(&'a ScanStats),
    Status { message: &'a str, severity: Severity },
}

/// Writes `{"type": "history" | "stats" | "status", ...}` lines.
///
/// Suitable for piping the scan loop into another program.
#[derive(Debug)]
pub struct JsonLinesSink<W: Write + Send> {
    out: W,
}

impl<W: Write + Send> JsonLinesSink<W> {
    /// Creates a sink writing to `out`.
    #[must_use]
    pub const fn new(out: W) -> Self {
        Self { out }
    }

    /// Returns the underlying writer.
    #[must_use]
    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, line: &Line<'_>) -> Result<()> {
        serde_json::to_writer(&mut self.out, line).map_err(|e| output_error("write_json", e))?;
        writeln!(self.out)
            .and_then(|()| self.out.flush())
            .map_err(|e| output_error("write_json", e))
    }
}

impl<W: Write + Send> PresentationSink for JsonLinesSink<W> {
    fn render_history(&mut self, history: &ScanHistory) -> Result<()> {
        self.emit(&Line::History { records: history })
    }

    fn render_stats(&mut self, stats: &ScanStats) -> Result<()> {
        self.emit(&Line::Stats(stats))
    }

    fn render_status(&mut self, message: &str, severity: Severity) -> Result<()> {
        self.emit(&Line::Status { message, severity })
    }
}
