//! Storage layer abstraction.
//!
//! The scan history is persisted as one value that is rewritten in full on
//! every accepted scan:
//! - **Filesystem**: JSON file in the data directory (default)
//! - **Memory**: shared in-process buffer (tests, ephemeral sessions)

pub mod persistence;
pub mod traits;

pub use persistence::{DEFAULT_HISTORY_FILE, FilesystemStore, MAX_FILE_SIZE, MemoryStore};
pub use traits::HistoryStore;
