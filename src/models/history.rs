//! Bounded, newest-first scan history.

use super::ScanRecord;
use serde::{Deserialize, Serialize};

/// Default maximum number of records kept in the history.
pub const DEFAULT_HISTORY_CAP: usize = 25;

/// Ordered scan history, newest record first.
///
/// The length never exceeds the cap. Insertion order is authoritative: the
/// list is never re-sorted by id or timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScanHistory {
    records: Vec<ScanRecord>,
}

impl ScanHistory {
    /// Creates an empty history.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    /// Builds a history from records already in newest-first order,
    /// keeping at most `cap` of them.
    #[must_use]
    pub fn from_records(mut records: Vec<ScanRecord>, cap: usize) -> Self {
        records.truncate(cap);
        Self { records }
    }

    /// Inserts a record at the front and evicts the oldest records beyond `cap`.
    ///
    /// Returns the number of evicted records.
    pub fn push_newest(&mut self, record: ScanRecord, cap: usize) -> usize {
        self.records.insert(0, record);
        self.truncate(cap)
    }

    /// Drops the oldest records beyond `cap`, returning how many were dropped.
    pub fn truncate(&mut self, cap: usize) -> usize {
        let dropped = self.records.len().saturating_sub(cap);
        self.records.truncate(cap);
        dropped
    }

    /// Removes every record.
    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Returns the most recent record.
    #[must_use]
    pub fn newest(&self) -> Option<&ScanRecord> {
        self.records.first()
    }

    /// Returns the records, newest first.
    #[must_use]
    pub fn records(&self) -> &[ScanRecord] {
        &self.records
    }

    /// Iterates over records, newest first.
    pub fn iter(&self) -> std::slice::Iter<'_, ScanRecord> {
        self.records.iter()
    }

    /// Returns the number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if there are no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl Default for ScanHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> IntoIterator for &'a ScanHistory {
    type Item = &'a ScanRecord;
    type IntoIter = std::slice::Iter<'a, ScanRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
