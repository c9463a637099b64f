//! Human-readable terminal sink.

use super::{PresentationSink, Severity, output_error};
use crate::Result;
use crate::models::{ScanHistory, ScanRecord, ScanStats};
use chrono::Local;
use std::io::Write;

/// Shown when the history is empty.
pub const EMPTY_HISTORY_MESSAGE: &str = "No scans yet - Start scanning to see results";

/// Shown for records without a catalog match.
pub const NO_PRODUCT_MESSAGE: &str = "Product information not available";

/// Renders history cards, counters and status lines as plain text.
///
/// In compact mode only the newest record is printed on each history
/// update, which keeps a long scan session readable.
#[derive(Debug)]
pub struct TerminalSink<W: Write + Send> {
    out: W,
    compact: bool,
    limit: Option<usize>,
}

impl<W: Write + Send> TerminalSink<W> {
    /// Creates a sink that prints the full history on every update.
    #[must_use]
    pub const fn new(out: W) -> Self {
        Self {
            out,
            compact: false,
            limit: None,
        }
    }

    /// Builder method to print only the newest record.
    #[must_use]
    pub const fn with_compact(mut self, compact: bool) -> Self {
        self.compact = compact;
        self
    }

    /// Builder method to print at most `limit` records.
    #[must_use]
    pub const fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    /// Returns the underlying writer.
    #[must_use]
    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_record(&mut self, record: &ScanRecord, latest: bool) -> std::io::Result<()> {
        let marker = if latest { "*" } else { " " };
        let time = record.timestamp.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S");

        writeln!(self.out, "{marker} [{}] {time}", record.format)?;
        writeln!(self.out, "  {}", record.code)?;
        match &record.product {
            Some(product) => {
                writeln!(self.out, "  {} - {}", product.name, product.price)?;
                writeln!(self.out, "  Brand: {}", product.brand)?;
                writeln!(self.out, "  {}", product.description)?;
            },
            None => writeln!(self.out, "  {NO_PRODUCT_MESSAGE}")?,
        }
        Ok(())
    }

    fn write_history(&mut self, history: &ScanHistory) -> std::io::Result<()> {
        if history.is_empty() {
            return writeln!(self.out, "{EMPTY_HISTORY_MESSAGE}");
        }

        let shown = if self.compact {
            1
        } else {
            self.limit.unwrap_or(usize::MAX)
        };

        for (index, record) in history.iter().take(shown).enumerate() {
            if index > 0 {
                writeln!(self.out)?;
            }
            self.write_record(record, index == 0)?;
        }
        Ok(())
    }
}

impl<W: Write + Send> PresentationSink for TerminalSink<W> {
    fn render_history(&mut self, history: &ScanHistory) -> Result<()> {
        self.write_history(history)
            .and_then(|()| self.out.flush())
            .map_err(|e| output_error("render_history", e))
    }

    fn render_stats(&mut self, stats: &ScanStats) -> Result<()> {
        writeln!(
            self.out,
            "Total: {}  Today: {}  Found: {}",
            stats.total, stats.today, stats.found
        )
        .and_then(|()| self.out.flush())
        .map_err(|e| output_error("render_stats", e))
    }

    fn render_status(&mut self, message: &str, severity: Severity) -> Result<()> {
        let prefix = match severity {
            Severity::Info => "--",
            Severity::Success => "ok",
            Severity::Warning => "!!",
            Severity::Error => "error:",
        };
        writeln!(self.out, "{prefix} {message}")
            .and_then(|()| self.out.flush())
            .map_err(|e| output_error("render_status", e))
    }
}
