//! Scan pipeline services.
//!
//! Services own the pipeline state and wire the collaborators together:
//! - [`deduplication`]: decides which decode events become records
//! - [`Recorder`]: builds, stores and renders records
//! - [`ScanSession`]: the context object for a scanning run
//! - [`compute_stats`]: derived counters

mod clock;
pub mod deduplication;
mod recorder;
mod session;
mod stats;

pub use clock::{Clock, ManualClock, SystemClock};
pub use deduplication::{DedupDecision, DeduplicationConfig, DeduplicationService, Deduplicator};
pub use recorder::Recorder;
pub use session::{
    EVENT_CHANNEL_CAPACITY, SCANNER_STOPPED_MESSAGE, SCANNING_ACTIVE_MESSAGE, ScanSession,
    StopHandle,
};
pub use stats::{compute_stats, compute_stats_now};
