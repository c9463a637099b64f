//! In-memory history store.
//!
//! Keeps the serialized history in a shared buffer, the way a browser keeps
//! it in local storage. Clones share the buffer, so a caller can hand one
//! clone to a session and inspect the other.

use crate::models::{ScanHistory, ScanRecord};
use crate::storage::traits::HistoryStore;
use crate::{Error, Result};
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
struct Slot {
    value: Option<String>,
    fail_writes: bool,
    saves: usize,
}

/// Shared in-memory history store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    slot: Arc<Mutex<Slot>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding a raw serialized value, valid or not.
    #[must_use]
    pub fn with_raw(value: impl Into<String>) -> Self {
        let store = Self::new();
        if let Ok(mut slot) = store.slot.lock() {
            slot.value = Some(value.into());
        }
        store
    }

    /// Makes every subsequent `save` and `clear` fail.
    pub fn fail_writes(&self, fail: bool) {
        if let Ok(mut slot) = self.slot.lock() {
            slot.fail_writes = fail;
        }
    }

    /// Returns the raw serialized value, if any.
    #[must_use]
    pub fn raw(&self) -> Option<String> {
        self.slot.lock().ok().and_then(|slot| slot.value.clone())
    }

    /// Returns how many saves succeeded.
    #[must_use]
    pub fn save_count(&self) -> usize {
        self.slot.lock().map(|slot| slot.saves).unwrap_or(0)
    }

    fn lock(&self, operation: &str) -> Result<std::sync::MutexGuard<'_, Slot>> {
        let slot = self.slot.lock().map_err(|e| Error::OperationFailed {
            operation: operation.to_string(),
            cause: e.to_string(),
        })?;

        if slot.fail_writes {
            return Err(Error::OperationFailed {
                operation: operation.to_string(),
                cause: "store is read-only".to_string(),
            });
        }

        Ok(slot)
    }
}

impl HistoryStore for MemoryStore {
    fn save(&mut self, history: &ScanHistory) -> Result<()> {
        let json = serde_json::to_string(history).map_err(|e| Error::OperationFailed {
            operation: "serialize_history".to_string(),
            cause: e.to_string(),
        })?;

        let mut slot = self.lock("save_history")?;
        slot.value = Some(json);
        slot.saves += 1;
        Ok(())
    }

    fn load(&self) -> ScanHistory {
        let Some(raw) = self.raw() else {
            return ScanHistory::new();
        };

        match serde_json::from_str::<Vec<ScanRecord>>(&raw) {
            Ok(records) => ScanHistory::from_records(records, usize::MAX),
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring corrupt in-memory history, starting empty");
                ScanHistory::new()
            },
        }
    }

    fn clear(&mut self) -> Result<()> {
        let mut slot = self.lock("clear_history")?;
        slot.value = None;
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
