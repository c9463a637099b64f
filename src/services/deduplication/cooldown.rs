//! Last-accepted tracking with a cooldown window.
//!
//! Remembers the most recently accepted code and when it was accepted. A
//! different code is never suppressed; the same code is suppressed until the
//! cooldown has elapsed (or forever, when no cooldown is configured).

use chrono::{DateTime, Utc};
use std::time::Duration;
use tracing::instrument;

/// The most recently accepted code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LastAccepted {
    /// The accepted code.
    pub code: String,
    /// When it was accepted.
    pub at: DateTime<Utc>,
}

/// Tracker for the last accepted code.
///
/// # How it works
///
/// 1. After each acceptance, stores `(code, at)`
/// 2. A candidate that differs from the stored code passes immediately
/// 3. A candidate equal to the stored code passes only once at least
///    `window` has elapsed since `at`
///
/// A clock that steps backwards counts as "not elapsed", so a repeat is
/// suppressed rather than double-recorded.
///
/// # Example
///
/// ```rust
/// use shelfscan::services::deduplication::CooldownTracker;
/// use chrono::{Duration as ChronoDuration, Utc};
/// use std::time::Duration;
///
/// let mut tracker = CooldownTracker::new(Some(Duration::from_secs(2)));
/// let t0 = Utc::now();
/// tracker.record("5901234123457", t0);
///
/// assert!(tracker.check("5901234123457", t0 + ChronoDuration::milliseconds(500)).is_some());
/// assert!(tracker.check("5901234123457", t0 + ChronoDuration::milliseconds(2500)).is_none());
/// assert!(tracker.check("0123456789012", t0).is_none());
/// ```
#[derive(Debug, Clone)]
pub struct CooldownTracker {
    last: Option<LastAccepted>,
    window: Option<Duration>,
}

impl CooldownTracker {
    /// Creates a tracker. `None` suppresses repeats until another code is accepted.
    #[must_use]
    pub const fn new(window: Option<Duration>) -> Self {
        Self { last: None, window }
    }

    /// Checks whether `code` is still inside the cooldown of the last acceptance.
    ///
    /// # Returns
    ///
    /// `Some(elapsed)` if the code must be suppressed, where `elapsed` is the
    /// time since the last acceptance (`None` inside when the clock went
    /// backwards). Returns `None` if the code may be accepted.
    #[instrument(
        skip(self),
        fields(operation = "cooldown_check")
    )]
    pub fn check(&self, code: &str, now: DateTime<Utc>) -> Option<Option<Duration>> {
        let last = self.last.as_ref().filter(|last| last.code == code)?;
        let elapsed = now.signed_duration_since(last.at).to_std().ok();

        let suppressed = match self.window {
            // Repeats wait for a different code
            None => true,
            Some(window) => elapsed.is_none_or(|elapsed| elapsed < window),
        };

        if suppressed {
            tracing::debug!(
                elapsed = ?elapsed,
                "Same code inside cooldown"
            );
            Some(elapsed)
        } else {
            None
        }
    }

    /// Records an acceptance.
    pub fn record(&mut self, code: &str, at: DateTime<Utc>) {
        self.last = Some(LastAccepted {
            code: code.to_string(),
            at,
        });
    }

    /// Returns true if `code` equals the last accepted code.
    #[must_use]
    pub fn is_last(&self, code: &str) -> bool {
        self.last.as_ref().is_some_and(|last| last.code == code)
    }

    /// Returns the last acceptance.
    #[must_use]
    pub const fn last(&self) -> Option<&LastAccepted> {
        self.last.as_ref()
    }

    /// Forgets the last acceptance.
    pub fn clear(&mut self) {
        self.last = None;
    }

    /// Returns the configured window.
    #[must_use]
    pub const fn window(&self) -> Option<Duration> {
        self.window
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use chrono::{Duration as ChronoDuration, TimeZone};

    fn t(ms: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(1_700_000_000_000).unwrap() + ChronoDuration::milliseconds(ms)
    }

    #[test]
    fn test_empty_tracker_accepts() {
        let tracker = CooldownTracker::new(Some(Duration::from_secs(2)));
        assert!(tracker.check("A", t(0)).is_none());
        assert!(tracker.last().is_none());
    }

    #[test]
    fn test_same_code_inside_window() {
        let mut tracker = CooldownTracker::new(Some(Duration::from_secs(2)));
        tracker.record("A", t(0));

        assert_eq!(
            tracker.check("A", t(1200)),
            Some(Some(Duration::from_millis(1200)))
        );
    }

    #[test]
    fn test_window_boundary_accepts() {
        let mut tracker = CooldownTracker::new(Some(Duration::from_secs(2)));
        tracker.record("A", t(0));

        assert!(tracker.check("A", t(1999)).is_some());
        assert!(tracker.check("A", t(2000)).is_none());
    }

    #[test]
    fn test_different_code_passes() {
        let mut tracker = CooldownTracker::new(Some(Duration::from_secs(2)));
        tracker.record("A", t(0));

        assert!(tracker.check("B", t(1)).is_none());
        assert!(tracker.is_last("A"));
        assert!(!tracker.is_last("B"));
    }

    #[test]
    fn test_no_window_suppresses_until_other_code() {
        let mut tracker = CooldownTracker::new(None);
        tracker.record("A", t(0));

        assert!(tracker.check("A", t(3_600_000)).is_some());

        tracker.record("B", t(3_600_001));
        assert!(tracker.check("A", t(3_600_002)).is_none());
    }

    #[test]
    fn test_clock_going_backwards_suppresses() {
        let mut tracker = CooldownTracker::new(Some(Duration::from_secs(2)));
        tracker.record("A", t(10_000));

        assert_eq!(tracker.check("A", t(0)), Some(None));
    }

    #[test]
    fn test_clear() {
        let mut tracker = CooldownTracker::new(None);
        tracker.record("A", t(0));
        tracker.clear();

        assert!(tracker.check("A", t(0)).is_none());
        assert_eq!(tracker.window(), None);
    }
}
