//! Statistics derivation.
//!
//! Stats are recomputed from the history on demand and never cached.

use crate::models::{ScanHistory, ScanStats};
use chrono::{Local, NaiveDate};

/// Computes `{total, today, found}` for `history`.
///
/// `today` counts records whose timestamp, converted to the local time zone,
/// falls on the calendar date `today`.
///
/// # Example
///
/// ```rust
/// use shelfscan::ScanHistory;
/// use shelfscan::services::compute_stats;
/// use chrono::Local;
///
/// let stats = compute_stats(&ScanHistory::new(), Local::now().date_naive());
/// assert_eq!((stats.total, stats.today, stats.found), (0, 0, 0));
/// ```
#[must_use]
pub fn compute_stats(history: &ScanHistory, today: NaiveDate) -> ScanStats {
    history.iter().fold(
        ScanStats {
            total: history.len(),
            ..ScanStats::default()
        },
        |mut stats, record| {
            if record.timestamp.with_timezone(&Local).date_naive() == today {
                stats.today += 1;
            }
            if record.has_product() {
                stats.found += 1;
            }
            stats
        },
    )
}

/// Computes stats against the current local date.
#[must_use]
pub fn compute_stats_now(history: &ScanHistory) -> ScanStats {
    compute_stats(history, Local::now().date_naive())
}
