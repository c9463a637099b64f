//! Deduplication service orchestrator.
//!
//! Coordinates the four-stage scan filter:
//! 1. **Code validation**: non-empty, minimum length
//! 2. **Confidence gate**: decode error score at or below the threshold
//! 3. **Confirmation buffer**: K identical consecutive reads
//! 4. **Cooldown**: same code as the last acceptance is suppressed
//!
//! Uses short-circuit evaluation, returning on the first rejection.

use crate::models::ScanEvent;
use chrono::{DateTime, Utc};
use tracing::instrument;

use super::config::DeduplicationConfig;
use super::confirmation::ConfirmationBuffer;
use super::cooldown::CooldownTracker;
use super::types::{DedupDecision, Deduplicator, RejectReason};

/// Service for scan deduplication.
///
/// Holds the per-session state: the confirmation buffer and the last
/// accepted code. One instance per scan session.
///
/// # Example
///
/// ```rust
/// use shelfscan::ScanEvent;
/// use shelfscan::services::deduplication::{DeduplicationConfig, DeduplicationService};
/// use chrono::Utc;
/// use std::time::Duration;
///
/// let mut service =
///     DeduplicationService::new(DeduplicationConfig::time_window(Duration::from_secs(2)));
///
/// let now = Utc::now();
/// let event = ScanEvent::new("5901234123457");
/// assert!(service.check(&event, now).accepted);
/// assert!(!service.check(&event, now).accepted);
/// ```
#[derive(Debug, Clone)]
pub struct DeduplicationService {
    /// Configuration.
    config: DeduplicationConfig,
    /// Recent reads awaiting confirmation.
    confirmation: ConfirmationBuffer,
    /// Last accepted code.
    cooldown: CooldownTracker,
}

impl DeduplicationService {
    /// Creates a new deduplication service.
    #[must_use]
    pub fn new(config: DeduplicationConfig) -> Self {
        let confirmation = ConfirmationBuffer::new(config.confirmations);
        let cooldown = CooldownTracker::new(config.cooldown);

        Self {
            config,
            confirmation,
            cooldown,
        }
    }

    /// Validates the code shape.
    fn check_code(&self, code: &str) -> Option<RejectReason> {
        if code.is_empty() || code.chars().count() < self.config.min_code_length {
            tracing::debug!(
                code_length = code.chars().count(),
                min_code_length = self.config.min_code_length,
                "Rejected implausible code"
            );
            return Some(RejectReason::InvalidCode);
        }
        None
    }

    /// Applies the confidence gate. Events without a score pass.
    fn check_confidence(&self, event: &ScanEvent) -> Option<RejectReason> {
        let (Some(max_error), Some(error)) = (self.config.max_error, event.confidence) else {
            return None;
        };

        if error.is_nan() || error > max_error {
            tracing::debug!(error, max_error, "Rejected low-confidence read");
            return Some(RejectReason::LowConfidence);
        }
        None
    }

    /// Feeds the confirmation buffer.
    fn check_confirmation(&mut self, code: &str) -> Option<RejectReason> {
        if !self.config.uses_confirmation_buffer() {
            return None;
        }

        if self.confirmation.push(code).is_some() {
            None
        } else {
            tracing::debug!(
                buffered = self.confirmation.len(),
                required = self.confirmation.required(),
                "Awaiting confirmation"
            );
            Some(RejectReason::AwaitingConfirmation)
        }
    }

    /// Records metrics for a rejection.
    fn record_rejection(reason: RejectReason) {
        metrics::counter!(
            "scan_rejected_total",
            "reason" => reason.as_str()
        )
        .increment(1);
    }

    /// Decides whether a decode event becomes a new record.
    ///
    /// Performs checks in order: code → confidence → confirmation → cooldown.
    /// Returns early on first rejection. On acceptance, the confirmation
    /// buffer is cleared and the last-accepted state is updated.
    #[instrument(
        skip(self, event),
        fields(
            operation = "dedup_check",
            code = %event.normalized_code(),
            has_confidence = event.confidence.is_some()
        )
    )]
    pub fn check(&mut self, event: &ScanEvent, now: DateTime<Utc>) -> DedupDecision {
        metrics::counter!("scan_events_total").increment(1);
        let code = event.normalized_code();

        // 1. Code validation
        if let Some(reason) = self.check_code(code) {
            Self::record_rejection(reason);
            return DedupDecision::rejected(code, reason);
        }

        // 2. Confidence gate, before the event can enter the buffer
        if let Some(reason) = self.check_confidence(event) {
            Self::record_rejection(reason);
            return DedupDecision::rejected(code, reason);
        }

        // 3. Confirmation buffer
        if let Some(reason) = self.check_confirmation(code) {
            Self::record_rejection(reason);
            return DedupDecision::rejected(code, reason);
        }

        // 4. Cooldown against the last accepted code
        if let Some(elapsed) = self.cooldown.check(code, now) {
            Self::record_rejection(RejectReason::RecentlyAccepted);
            return DedupDecision::suppressed(code, elapsed);
        }

        self.confirmation.clear();
        self.cooldown.record(code, now);

        tracing::debug!("Scan accepted");
        metrics::counter!("scan_accepted_total").increment(1);

        DedupDecision::accepted(code)
    }

    /// Clears the confirmation buffer and the last accepted code.
    pub fn reset(&mut self) {
        self.confirmation.clear();
        self.cooldown.clear();
    }

    /// Returns the active configuration.
    #[must_use]
    pub const fn config(&self) -> &DeduplicationConfig {
        &self.config
    }

    /// Returns the last accepted code, if any.
    #[must_use]
    pub fn last_accepted_code(&self) -> Option<&str> {
        self.cooldown.last().map(|last| last.code.as_str())
    }
}

impl Default for DeduplicationService {
    fn default() -> Self {
        Self::new(DeduplicationConfig::default())
    }
}

/// Implementation of the Deduplicator trait.
impl Deduplicator for DeduplicationService {
    fn evaluate(&mut self, event: &ScanEvent, now: DateTime<Utc>) -> DedupDecision {
        self.check(event, now)
    }

    fn reset(&mut self) {
        Self::reset(self);
    }
}
