//! Filesystem-based history store.
//!
//! Stores the whole scan history as a single JSON array, the same layout the
//! browser scanner keeps in local storage.
//!
//! # Safety limits
//!
//! - **File size limit**: files larger than [`MAX_FILE_SIZE`] are treated as
//!   corrupt and ignored on load
//! - **Atomic replace**: saves write a sibling temp file and rename it over the
//!   history file, so a crash mid-write leaves the previous history intact

use crate::models::{ScanHistory, ScanRecord};
use crate::storage::traits::HistoryStore;
use crate::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Maximum history file size (1MB).
///
/// A capped history is a few kilobytes; anything larger is not ours.
pub const MAX_FILE_SIZE: u64 = 1024 * 1024;

/// Default history file name inside the data directory.
pub const DEFAULT_HISTORY_FILE: &str = "history.json";

/// JSON file history store.
#[derive(Debug, Clone)]
pub struct FilesystemStore {
    /// Path to the history file.
    path: PathBuf,
}

impl FilesystemStore {
    /// Creates a store backed by the file at `path`.
    ///
    /// Parent directories are created lazily on the first save.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Creates a store for `file_name` inside `data_dir`.
    #[must_use]
    pub fn in_dir(data_dir: impl AsRef<Path>, file_name: &str) -> Self {
        Self::new(data_dir.as_ref().join(file_name))
    }

    /// Returns the history file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    /// Reads and parses the history file.
    ///
    /// Returns `Ok(None)` when the file does not exist.
    fn read_records(&self) -> Result<Option<Vec<ScanRecord>>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let metadata = fs::metadata(&self.path).map_err(|e| Error::OperationFailed {
            operation: "read_history_metadata".to_string(),
            cause: e.to_string(),
        })?;

        if metadata.len() > MAX_FILE_SIZE {
            return Err(Error::InvalidInput(format!(
                "History file exceeds maximum size of {MAX_FILE_SIZE} bytes: {}",
                self.path.display()
            )));
        }

        let json = fs::read_to_string(&self.path).map_err(|e| Error::OperationFailed {
            operation: "read_history_file".to_string(),
            cause: e.to_string(),
        })?;

        let records: Vec<ScanRecord> =
            serde_json::from_str(&json).map_err(|e| Error::OperationFailed {
                operation: "deserialize_history".to_string(),
                cause: e.to_string(),
            })?;

        Ok(Some(records))
    }
}

impl HistoryStore for FilesystemStore {
    fn save(&mut self, history: &ScanHistory) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| Error::OperationFailed {
                operation: "create_history_dir".to_string(),
                cause: e.to_string(),
            })?;
        }

        let json = serde_json::to_string_pretty(history).map_err(|e| Error::OperationFailed {
            operation: "serialize_history".to_string(),
            cause: e.to_string(),
        })?;

        let temp = self.temp_path();
        fs::write(&temp, json).map_err(|e| Error::OperationFailed {
            operation: "write_history_file".to_string(),
            cause: format!("{}: {e}", temp.display()),
        })?;

        fs::rename(&temp, &self.path).map_err(|e| Error::OperationFailed {
            operation: "replace_history_file".to_string(),
            cause: format!("{}: {e}", self.path.display()),
        })?;

        tracing::debug!(
            path = %self.path.display(),
            records = history.len(),
            "History saved"
        );

        Ok(())
    }

    fn load(&self) -> ScanHistory {
        match self.read_records() {
            Ok(Some(records)) => {
                tracing::debug!(
                    path = %self.path.display(),
                    records = records.len(),
                    "History loaded"
                );
                // Records are stored newest-first already; the caller applies the cap.
                ScanHistory::from_records(records, usize::MAX)
            },
            Ok(None) => ScanHistory::new(),
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Ignoring unreadable history file, starting empty"
                );
                ScanHistory::new()
            },
        }
    }

    fn clear(&mut self) -> Result<()> {
        if !self.path.exists() {
            return Ok(());
        }

        fs::remove_file(&self.path).map_err(|e| Error::OperationFailed {
            operation: "delete_history_file".to_string(),
            cause: e.to_string(),
        })?;

        tracing::debug!(path = %self.path.display(), "History file removed");

        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
