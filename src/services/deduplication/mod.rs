//! Scan deduplication.
//!
//! A camera reports the same barcode many times per second while it stays in
//! view. This module decides which decode events become new history records:
//! 1. **Code validation**: trimmed, non-empty, minimum length
//! 2. **Confidence gate**: decode error score at or below a threshold
//! 3. **Confirmation buffer**: K identical consecutive reads
//! 4. **Cooldown**: the last accepted code is suppressed for a window
//!
//! Every stage can be switched off independently, and the service
//! short-circuits on the first rejection.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    DeduplicationService                         │
//! │  ┌──────────────┐  ┌──────────────┐  ┌────────────────────────┐ │
//! │  │ Code +       │  │ Confirmation │  │ Cooldown               │ │
//! │  │ Confidence   │  │ Buffer       │  │ Tracker                │ │
//! │  │              │  │              │  │                        │ │
//! │  │ length and   │  │ K identical  │  │ last accepted code     │ │
//! │  │ error gate   │  │ reads        │  │ + window               │ │
//! │  └──────────────┘  └──────────────┘  └────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust
//! use shelfscan::ScanEvent;
//! use shelfscan::services::deduplication::{
//!     DeduplicationConfig, DeduplicationService, RejectReason,
//! };
//! use chrono::Utc;
//!
//! let mut service = DeduplicationService::new(DeduplicationConfig::confirmation_buffer(2));
//! let now = Utc::now();
//! let event = ScanEvent::new("0123456789012").with_confidence(0.02);
//!
//! let first = service.check(&event, now);
//! assert_eq!(first.reason, Some(RejectReason::AwaitingConfirmation));
//! assert!(service.check(&event, now).accepted);
//! ```

mod config;
mod confirmation;
mod cooldown;
mod service;
mod types;

pub use config::{
    DEFAULT_CONFIRMATIONS, DEFAULT_COOLDOWN, DEFAULT_MAX_ERROR, DEFAULT_MIN_CODE_LENGTH,
    DeduplicationConfig,
};
pub use confirmation::ConfirmationBuffer;
pub use cooldown::{CooldownTracker, LastAccepted};
pub use service::DeduplicationService;
pub use types::{DedupDecision, Deduplicator, RejectReason};
