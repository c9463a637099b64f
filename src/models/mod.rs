//! Data models for shelfscan.
//!
//! This module contains the core data structures of the scan pipeline.

mod event;
mod history;
mod record;
mod stats;

pub use event::{DecodeEvent, ScanEvent, UNKNOWN_FORMAT};
pub use history::{DEFAULT_HISTORY_CAP, ScanHistory};
pub use record::{ProductInfo, RecordId, ScanRecord};
pub use stats::ScanStats;
