//! # Shelfscan
//!
//! Barcode scan pipeline: turns a noisy stream of decoder detections into a
//! deduplicated, bounded, persisted scan history.
//!
//! Decoding, camera access and the actual display are external capabilities.
//! This crate owns the policy between them:
//!
//! ```text
//! DecodeSource ──► DeduplicationService ──► Recorder ──► PresentationSink
//!   (external)        (accept / reject)     (history,       (external)
//!                                           catalog, store)
//! ```
//!
//! ## Features
//!
//! - Independently configurable dedup knobs (code validation, confidence gate,
//!   confirmation buffer, cooldown window)
//! - Newest-first history with a hard cap, rewritten in full on every accept
//! - Best-effort persistence: storage failures never stop the decode loop
//! - On-demand statistics (total, today, with product)
//!
//! ## Example
//!
//! ```rust,ignore
//! use shelfscan::services::ScanSession;
//!
//! let mut session = ScanSession::open(config, store, catalog, sink, feedback);
//! let events = session.start(&mut source)?;
//! session.run(events).await;
//! session.stop(&mut source);
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![allow(clippy::multiple_crate_versions)]

use thiserror::Error as ThisError;

// Module declarations
pub mod catalog;
pub mod config;
pub mod models;
pub mod observability;
pub mod rendering;
pub mod services;
pub mod source;
pub mod storage;

// Re-exports for convenience
pub use catalog::{Catalog, StaticCatalog};
pub use config::ShelfscanConfig;
pub use models::{
    DecodeEvent, ProductInfo, RecordId, ScanEvent, ScanHistory, ScanRecord, ScanStats,
};
pub use rendering::{Feedback, PresentationSink, Severity};
pub use services::{Clock, DeduplicationService, Recorder, ScanSession, SystemClock};
pub use source::{DecodeSource, MediaConstraints};
pub use storage::{FilesystemStore, HistoryStore, MemoryStore};

/// Error type for shelfscan operations.
///
/// Uses `thiserror` for automatic `Display` and `Error` trait implementations.
///
/// # Error Variant Triggers
///
/// | Variant | Raised When |
/// |---------|-------------|
/// | `InvalidInput` | Bad CLI arguments, invalid config values (e.g. zero history cap) |
/// | `OperationFailed` | I/O errors, JSON or TOML (de)serialization failures |
/// | `SourceUnavailable` | The decode source (camera/decoder) cannot start |
///
/// Malformed decode events are not errors: they are rejected by the
/// deduplicator with `RejectReason::InvalidCode`.
#[derive(Debug, ThisError)]
pub enum Error {
    /// Invalid input was provided.
    ///
    /// Raised when:
    /// - A config value is out of range (`history_cap = 0`)
    /// - A CLI argument cannot be parsed
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// An operation failed.
    ///
    /// Raised when:
    /// - History file I/O fails
    /// - History or config (de)serialization fails
    /// - Logging cannot be initialized
    #[error("operation '{operation}' failed: {cause}")]
    OperationFailed {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },

    /// The decode source could not be started.
    ///
    /// Raised when the camera or decoder refuses to start. The session stays
    /// idle and the start can be retried.
    #[error("scan source unavailable: {reason}")]
    SourceUnavailable {
        /// Why the source could not start.
        reason: String,
    },
}

/// Result type alias for shelfscan operations.
pub type Result<T> = std::result::Result<T, Error>;
