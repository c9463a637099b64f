//! Scan recorder.
//!
//! Turns an accepted decode event into a history record: catalog lookup,
//! id assignment, insertion, truncation, persistence and rendering.
//! Nothing on this path returns an error; storage and sink failures are
//! logged and swallowed so the decode loop keeps running.

use crate::catalog::Catalog;
use crate::models::{RecordId, ScanEvent, ScanHistory, ScanRecord, ScanStats};
use crate::rendering::{Feedback, PresentationSink, Severity};
use crate::services::stats::compute_stats_now;
use crate::storage::HistoryStore;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::instrument;

/// Owner of the scan history.
///
/// The recorder is the only writer of the history. Sinks and stats get
/// shared references.
pub struct Recorder {
    history: ScanHistory,
    cap: usize,
    store: Box<dyn HistoryStore>,
    catalog: Arc<dyn Catalog>,
    sink: Box<dyn PresentationSink>,
    feedback: Box<dyn Feedback>,
}

impl Recorder {
    /// Opens a recorder, loading the persisted history.
    ///
    /// A persisted history longer than `cap` is truncated to its newest
    /// `cap` records. A `cap` of 0 is treated as 1.
    #[must_use]
    pub fn open(
        cap: usize,
        store: Box<dyn HistoryStore>,
        catalog: Arc<dyn Catalog>,
        sink: Box<dyn PresentationSink>,
        feedback: Box<dyn Feedback>,
    ) -> Self {
        let cap = cap.max(1);
        let mut history = store.load();
        let dropped = history.truncate(cap);
        if dropped > 0 {
            tracing::info!(dropped, cap, "Truncated persisted history to cap");
        }
        tracing::debug!(records = history.len(), store = %store.describe(), "Loaded history");

        Self {
            history,
            cap,
            store,
            catalog,
            sink,
            feedback,
        }
    }

    /// Records an accepted event observed at `at`.
    ///
    /// Returns the new record.
    #[instrument(
        skip(self, event),
        fields(operation = "record_scan", code = %event.normalized_code())
    )]
    pub fn record(&mut self, event: &ScanEvent, at: DateTime<Utc>) -> ScanRecord {
        let code = event.normalized_code();
        let product = self.catalog.lookup(code);

        let record = ScanRecord {
            id: self.next_id(at),
            code: code.to_string(),
            format: event.normalized_format(),
            timestamp: at,
            product,
        };

        let evicted = self.history.push_newest(record.clone(), self.cap);
        tracing::info!(
            id = %record.id,
            format = %record.format,
            found = record.has_product(),
            evicted,
            "Recorded scan"
        );

        self.persist();
        self.render_all();
        self.status(
            &format!("Successfully scanned: {}", record.display_name()),
            Severity::Success,
        );
        if let Err(e) = self.feedback.notify() {
            tracing::debug!(error = %e, "Feedback failed");
        }

        record
    }

    /// Empties the history and the persisted copy.
    ///
    /// Dedup state is not touched.
    #[instrument(skip(self), fields(operation = "clear_history"))]
    pub fn clear(&mut self) {
        self.history.clear();
        if let Err(e) = self.store.clear() {
            tracing::warn!(error = %e, "Failed to clear persisted history");
        }
        self.render_all();
        self.status("Scan history cleared", Severity::Info);
    }

    /// Returns the history, newest first.
    #[must_use]
    pub const fn history(&self) -> &ScanHistory {
        &self.history
    }

    /// Returns the history cap.
    #[must_use]
    pub const fn cap(&self) -> usize {
        self.cap
    }

    /// Computes current stats.
    #[must_use]
    pub fn stats(&self) -> ScanStats {
        compute_stats_now(&self.history)
    }

    /// Renders the history and stats.
    pub fn render_all(&mut self) {
        if let Err(e) = self.sink.render_history(&self.history) {
            tracing::warn!(error = %e, "Failed to render history");
        }
        let stats = self.stats();
        if let Err(e) = self.sink.render_stats(&stats) {
            tracing::warn!(error = %e, "Failed to render stats");
        }
    }

    /// Shows a status message.
    pub fn status(&mut self, message: &str, severity: Severity) {
        if let Err(e) = self.sink.render_status(message, severity) {
            tracing::warn!(error = %e, "Failed to render status");
        }
    }

    /// Millisecond id, bumped past the newest record when needed.
    fn next_id(&self, at: DateTime<Utc>) -> RecordId {
        let candidate = RecordId::new(at.timestamp_millis());
        match self.history.newest() {
            Some(newest) if candidate <= newest.id => newest.id.next(),
            _ => candidate,
        }
    }

    fn persist(&mut self) {
        match self.store.save(&self.history) {
            Ok(()) => tracing::debug!(records = self.history.len(), "Persisted history"),
            Err(e) => {
                metrics::counter!("history_persist_failed_total").increment(1);
                tracing::warn!(error = %e, "Failed to persist history, keeping it in memory");
            },
        }
    }
}

impl std::fmt::Debug for Recorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Recorder")
            .field("records", &self.history.len())
            .field("cap", &self.cap)
            .field("store", &self.store.describe())
            .finish_non_exhaustive()
    }
}
