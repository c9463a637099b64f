//! Decode event sources.
//!
//! The pipeline does not decode barcodes or open cameras. A [`DecodeSource`]
//! wraps whatever does and pushes [`DecodeEvent`]s into the session's
//! channel while it runs.

mod line;
mod media;

pub use line::{LineSource, parse_detection_line};
pub use media::{FacingMode, MediaConstraints, Resolution};

use crate::Result;
use crate::models::DecodeEvent;
use tokio::sync::mpsc;

/// A producer of decode events (camera + decoder, replay file, pipe).
pub trait DecodeSource: Send {
    /// Starts producing events into `events`.
    ///
    /// `constraints` are hints; a source may ignore what it cannot honor.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::SourceUnavailable`] if the device or decoder
    /// cannot be started.
    fn start(
        &mut self,
        constraints: &MediaConstraints,
        events: mpsc::Sender<DecodeEvent>,
    ) -> Result<()>;

    /// Stops producing events and releases the device. Idempotent.
    fn stop(&mut self);
}
