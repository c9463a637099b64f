//! History store trait.

use crate::Result;
use crate::models::ScanHistory;

/// Trait for scan history persistence.
///
/// The store holds one value: the whole history, rewritten on every save.
/// There is no incremental append format.
///
/// Persistence is best effort. Callers log and swallow `save`/`clear`
/// errors; the in-memory history stays authoritative for the session.
pub trait HistoryStore: Send {
    /// Replaces the persisted history with `history`.
    ///
    /// # Errors
    ///
    /// Returns an error if the history cannot be serialized or written.
    fn save(&mut self, history: &ScanHistory) -> Result<()>;

    /// Loads the persisted history.
    ///
    /// Never fails: an absent, unreadable or corrupt value yields an empty
    /// history.
    fn load(&self) -> ScanHistory;

    /// Removes the persisted history.
    ///
    /// # Errors
    ///
    /// Returns an error if the persisted value exists but cannot be removed.
    fn clear(&mut self) -> Result<()>;

    /// Returns a short description of where history is kept, for status output.
    fn describe(&self) -> String;
}
