//! Deduplication decision types.

use crate::models::ScanEvent;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Result of evaluating one decode event.
///
/// # Example
///
/// ```rust
/// use shelfscan::services::deduplication::{DedupDecision, RejectReason};
///
/// let decision = DedupDecision::rejected("5901234123457", RejectReason::RecentlyAccepted);
/// assert!(!decision.accepted);
/// assert_eq!(decision.reason, Some(RejectReason::RecentlyAccepted));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DedupDecision {
    /// Whether the event should become a new record.
    pub accepted: bool,

    /// The normalized code that was evaluated.
    pub code: String,

    /// Why the event was rejected.
    pub reason: Option<RejectReason>,

    /// Time since the same code was last accepted, when it was suppressed by
    /// the cooldown window.
    pub since_last_accept: Option<Duration>,
}

impl DedupDecision {
    /// Creates an accepting decision.
    #[must_use]
    pub fn accepted(code: impl Into<String>) -> Self {
        Self {
            accepted: true,
            code: code.into(),
            reason: None,
            since_last_accept: None,
        }
    }

    /// Creates a rejecting decision.
    #[must_use]
    pub fn rejected(code: impl Into<String>, reason: RejectReason) -> Self {
        Self {
            accepted: false,
            code: code.into(),
            reason: Some(reason),
            since_last_accept: None,
        }
    }

    /// Creates a decision rejected by the cooldown window.
    #[must_use]
    pub fn suppressed(code: impl Into<String>, since_last_accept: Option<Duration>) -> Self {
        Self {
            since_last_accept,
            ..Self::rejected(code, RejectReason::RecentlyAccepted)
        }
    }
}

/// Why a decode event did not become a record.
///
/// # Variants
///
/// - `InvalidCode`: empty or shorter than the minimum length
/// - `LowConfidence`: decode error score above the gate threshold
/// - `AwaitingConfirmation`: not yet read the required number of times in a row
/// - `RecentlyAccepted`: same as the last accepted code, inside the cooldown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    /// Code is empty or too short to be a plausible barcode.
    InvalidCode,

    /// Decode error score exceeds the confidence gate.
    LowConfidence,

    /// Waiting for more identical consecutive reads.
    AwaitingConfirmation,

    /// Same code accepted within the cooldown window.
    RecentlyAccepted,
}

impl RejectReason {
    /// Returns the reason as a static label (logs, metric labels).
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidCode => "invalid_code",
            Self::LowConfidence => "low_confidence",
            Self::AwaitingConfirmation => "awaiting_confirmation",
            Self::RecentlyAccepted => "recently_accepted",
        }
    }
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Trait for scan deduplication.
///
/// Allows for different implementations (e.g., accept-everything for replays).
pub trait Deduplicator: Send {
    /// Decides whether `event`, observed at `now`, becomes a new record.
    ///
    /// Accepting updates the last-accepted state. Never fails.
    fn evaluate(&mut self, event: &ScanEvent, now: DateTime<Utc>) -> DedupDecision;

    /// Forgets buffered reads and the last accepted code.
    fn reset(&mut self);
}
