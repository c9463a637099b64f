//! Scan session.
//!
//! The session is the explicit context for one scanning run. It owns the
//! deduplicator, the recorder (and through it the history), the clock and
//! the stop signal.
//!
//! # Lifecycle
//!
//! ```text
//!  open ──► Idle ──start──► Active ──stop──► Idle
//!            ▲  └─(source error)─┘             │
//!            └─────────────────────────────────┘
//! ```
//!
//! Events are consumed one at a time in delivery order. Once a stop has been
//! requested every further event is ignored.

use crate::catalog::Catalog;
use crate::config::ShelfscanConfig;
use crate::models::{DecodeEvent, ScanHistory, ScanStats};
use crate::rendering::{Feedback, PresentationSink, Severity};
use crate::services::clock::{Clock, SystemClock};
use crate::services::deduplication::{DedupDecision, DeduplicationService, Deduplicator};
use crate::services::recorder::Recorder;
use crate::source::{DecodeSource, MediaConstraints};
use crate::storage::HistoryStore;
use crate::{Error, Result};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{Notify, mpsc};
use tracing::instrument;

/// Capacity of the channel between a decode source and the session.
pub const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Status shown once the source is running.
pub const SCANNING_ACTIVE_MESSAGE: &str = "Scanning active - position barcode in view";

/// Status shown after stopping.
pub const SCANNER_STOPPED_MESSAGE: &str = "Scanner stopped";

/// Cloneable stop signal.
///
/// Safe to trigger from any thread, including a signal handler.
#[derive(Debug, Clone, Default)]
pub struct StopHandle {
    requested: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl StopHandle {
    /// Creates a handle with no stop requested.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests a stop and wakes a waiting run loop.
    pub fn request_stop(&self) {
        self.requested.store(true, Ordering::SeqCst);
        self.notify.notify_one();
    }

    /// Returns true once a stop has been requested.
    #[must_use]
    pub fn is_stop_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }

    fn reset(&self) {
        self.requested.store(false, Ordering::SeqCst);
    }

    async fn stopped(&self) {
        while !self.is_stop_requested() {
            self.notify.notified().await;
        }
    }
}

/// Context object for a scanning run.
pub struct ScanSession {
    dedup: Box<dyn Deduplicator>,
    recorder: Recorder,
    clock: Box<dyn Clock>,
    media: MediaConstraints,
    stop: StopHandle,
    active: bool,
}

impl ScanSession {
    /// Opens a session: loads the history and renders it with the stats.
    #[must_use]
    pub fn open(
        config: &ShelfscanConfig,
        store: Box<dyn HistoryStore>,
        catalog: Arc<dyn Catalog>,
        sink: Box<dyn PresentationSink>,
        feedback: Box<dyn Feedback>,
    ) -> Self {
        let mut recorder = Recorder::open(config.history_cap, store, catalog, sink, feedback);
        recorder.render_all();

        Self {
            dedup: Box::new(DeduplicationService::new(config.dedup.clone())),
            recorder,
            clock: Box::new(SystemClock),
            media: config.media.clone(),
            stop: StopHandle::new(),
            active: false,
        }
    }

    /// Replaces the deduplicator.
    #[must_use]
    pub fn with_deduplicator(mut self, dedup: Box<dyn Deduplicator>) -> Self {
        self.dedup = dedup;
        self
    }

    /// Replaces the clock.
    #[must_use]
    pub fn with_clock(mut self, clock: Box<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Starts `source` and returns the receiving end of its event channel.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SourceUnavailable`] if the source fails to start.
    /// The session stays idle and the history is untouched, so the start can
    /// be retried. Returns [`Error::InvalidInput`] if the session is already
    /// active.
    ///
    /// A session halted only through its [`StopHandle`] counts as idle;
    /// `source` is stopped before it is started again.
    #[instrument(skip(self, source), fields(operation = "start_scanning"))]
    pub fn start(&mut self, source: &mut dyn DecodeSource) -> Result<mpsc::Receiver<DecodeEvent>> {
        if self.is_active() {
            return Err(Error::InvalidInput(
                "scan session is already active".to_string(),
            ));
        }
        if self.active {
            tracing::debug!("Releasing source halted by a stop request");
            source.stop();
            self.active = false;
        }

        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        if let Err(e) = source.start(&self.media, tx) {
            let reason = match e {
                Error::SourceUnavailable { reason } => reason,
                other => other.to_string(),
            };
            tracing::warn!(reason = %reason, "Scan source failed to start");
            self.recorder.status(
                &format!("Scan source unavailable: {reason}"),
                Severity::Error,
            );
            return Err(Error::SourceUnavailable { reason });
        }

        self.stop.reset();
        self.active = true;
        tracing::info!(facing = ?self.media.facing_mode, "Scanning started");
        self.recorder.status(SCANNING_ACTIVE_MESSAGE, Severity::Success);
        Ok(rx)
    }

    /// Processes one event.
    ///
    /// Returns the dedup decision for a detection, or `None` for diagnostic
    /// events and for anything delivered while the session is not active.
    pub fn handle(&mut self, event: DecodeEvent) -> Option<DedupDecision> {
        if !self.is_active() {
            tracing::debug!(event_type = event.event_type(), "Ignoring event, session not active");
            return None;
        }

        let DecodeEvent::Detected(scan) = event else {
            tracing::trace!("Frame processed");
            return None;
        };

        let now = self.clock.now();
        let decision = self.dedup.evaluate(&scan, now);
        if decision.accepted {
            self.recorder.record(&scan, now);
        } else {
            tracing::debug!(
                code = %decision.code,
                reason = ?decision.reason,
                "Scan rejected"
            );
        }
        Some(decision)
    }

    /// Consumes events until the channel closes or a stop is requested.
    ///
    /// Returns the number of accepted scans.
    pub async fn run(&mut self, mut events: mpsc::Receiver<DecodeEvent>) -> usize {
        let stop = self.stop.clone();
        let mut accepted = 0;

        while !stop.is_stop_requested() {
            tokio::select! {
                biased;
                () = stop.stopped() => break,
                next = events.recv() => match next {
                    Some(event) => {
                        if self.handle(event).is_some_and(|d| d.accepted) {
                            accepted += 1;
                        }
                    },
                    None => {
                        tracing::debug!("Decode source closed its channel");
                        break;
                    },
                },
            }
        }

        accepted
    }

    /// Stops scanning and releases the source. Idempotent.
    #[instrument(skip(self, source), fields(operation = "stop_scanning"))]
    pub fn stop(&mut self, source: &mut dyn DecodeSource) {
        self.stop.request_stop();
        if !self.active {
            return;
        }

        source.stop();
        self.active = false;
        tracing::info!(records = self.recorder.history().len(), "Scanning stopped");
        self.recorder.status(SCANNER_STOPPED_MESSAGE, Severity::Info);
    }

    /// Returns a handle that can request a stop from another thread.
    #[must_use]
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Empties the history and its persisted copy.
    ///
    /// Confirmation is the caller's job.
    pub fn clear_history(&mut self) {
        self.recorder.clear();
    }

    /// Returns the history, newest first.
    #[must_use]
    pub const fn history(&self) -> &ScanHistory {
        self.recorder.history()
    }

    /// Computes current stats.
    #[must_use]
    pub fn stats(&self) -> ScanStats {
        self.recorder.stats()
    }

    /// Returns true while the source is running and no stop was requested.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active && !self.stop.is_stop_requested()
    }

    /// Returns the media constraints passed to sources.
    #[must_use]
    pub const fn media(&self) -> &MediaConstraints {
        &self.media
    }
}

impl std::fmt::Debug for ScanSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScanSession")
            .field("recorder", &self.recorder)
            .field("active", &self.active)
            .field("stop", &self.stop)
            .finish_non_exhaustive()
    }
}
