//! Summary statistics over the scan history.

use serde::{Deserialize, Serialize};

/// Aggregates derived from a [`ScanHistory`](super::ScanHistory).
///
/// Always recomputed from the history, never maintained incrementally.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanStats {
    /// Number of records in the history.
    pub total: usize,
    /// Records scanned on the current local calendar day.
    pub today: usize,
    /// Records that matched a catalog product.
    pub found: usize,
}
