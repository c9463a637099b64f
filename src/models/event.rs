//! Decode events produced by an external scan source.

use serde::{Deserialize, Serialize};

/// Format label used when a decoder does not report one.
pub const UNKNOWN_FORMAT: &str = "UNKNOWN";

/// A single barcode detection reported by a decoder.
///
/// Decoders disagree on which fields they report, so everything beyond the
/// code is optional:
///
/// - a missing `format` is recorded as [`UNKNOWN_FORMAT`]
/// - a missing `confidence` always passes the confidence gate
///
/// `confidence` is a decode error score: lower is better.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanEvent {
    /// The decoded payload.
    pub code: String,
    /// Symbology reported by the decoder (`ean_13`, `code_128`, ...).
    #[serde(default)]
    pub format: Option<String>,
    /// Decode error score, lower is better.
    #[serde(default)]
    pub confidence: Option<f32>,
}

impl ScanEvent {
    /// Creates an event carrying only a code.
    #[must_use]
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            format: None,
            confidence: None,
        }
    }

    /// Sets the reported format.
    #[must_use]
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    /// Sets the decode error score.
    #[must_use]
    pub const fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = Some(confidence);
        self
    }

    /// Returns the code with surrounding whitespace removed.
    #[must_use]
    pub fn normalized_code(&self) -> &str {
        self.code.trim()
    }

    /// Returns the format in uppercase, or [`UNKNOWN_FORMAT`] when absent.
    #[must_use]
    pub fn normalized_format(&self) -> String {
        self.format
            .as_deref()
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .map_or_else(|| UNKNOWN_FORMAT.to_string(), str::to_uppercase)
    }
}

/// Events emitted by a decode source while it is running.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodeEvent {
    /// A barcode was detected in a frame.
    Detected(ScanEvent),
    /// A frame was processed. Diagnostic only, never used for decisions.
    Processed,
}

impl DecodeEvent {
    /// Returns the event type as a string for logging.
    #[must_use]
    pub const fn event_type(&self) -> &'static str {
        match self {
            Self::Detected(_) => "detected",
            Self::Processed => "processed",
        }
    }
}

impl From<ScanEvent> for DecodeEvent {
    fn from(event: ScanEvent) -> Self {
        Self::Detected(event)
    }
}
