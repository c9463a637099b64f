//! Deduplication configuration.
//!
//! Every policy knob is independent. The browser versions of the scanner
//! disagreed on which filters were authoritative, so each one can be turned
//! on or off on its own.

use std::time::Duration;

/// Default minimum code length (shortest plausible retail barcode is EAN-8).
pub const DEFAULT_MIN_CODE_LENGTH: usize = 8;

/// Default maximum decode error score accepted by the confidence gate.
pub const DEFAULT_MAX_ERROR: f32 = 0.15;

/// Default number of identical consecutive reads required.
pub const DEFAULT_CONFIRMATIONS: usize = 2;

/// Default cooldown before the same code may be recorded again.
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(3);

/// Configuration for the scan deduplicator.
///
/// # Environment Variables
///
/// | Variable | Type | Default | Description |
/// |----------|------|---------|-------------|
/// | `SHELFSCAN_DEDUP_MIN_CODE_LENGTH` | usize | `8` | Minimum trimmed code length (`0` disables) |
/// | `SHELFSCAN_DEDUP_MAX_ERROR` | f32 or `off` | `0.15` | Confidence gate threshold |
/// | `SHELFSCAN_DEDUP_CONFIRMATIONS` | usize | `2` | Identical reads required (`1` disables) |
/// | `SHELFSCAN_DEDUP_COOLDOWN_MS` | u64 or `off` | `3000` | Repeat window for the same code |
///
/// # Example
///
/// ```rust
/// use shelfscan::services::deduplication::DeduplicationConfig;
/// use std::time::Duration;
///
/// let config = DeduplicationConfig::time_window(Duration::from_secs(2));
/// assert_eq!(config.confirmations, 1);
/// assert_eq!(config.max_error, None);
/// assert_eq!(config.cooldown, Some(Duration::from_secs(2)));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct DeduplicationConfig {
    /// Minimum trimmed code length. Shorter codes are never accepted.
    pub min_code_length: usize,

    /// Maximum decode error score; `None` disables the confidence gate.
    ///
    /// Events without a score always pass.
    pub max_error: Option<f32>,

    /// Number of identical consecutive reads required before a code is
    /// considered. Values of 0 or 1 disable the confirmation buffer.
    pub confirmations: usize,

    /// How long the last accepted code is suppressed.
    ///
    /// `None` suppresses it until a different code is accepted.
    pub cooldown: Option<Duration>,
}

impl DeduplicationConfig {
    /// Minimum viable policy: accept a new code immediately, accept the same
    /// code again once `cooldown` has elapsed. No confidence gate, no buffer.
    #[must_use]
    pub const fn time_window(cooldown: Duration) -> Self {
        Self {
            min_code_length: DEFAULT_MIN_CODE_LENGTH,
            max_error: None,
            confirmations: 1,
            cooldown: Some(cooldown),
        }
    }

    /// Accuracy-first policy: require `confirmations` identical reads that
    /// pass the confidence gate, and never repeat the last accepted code.
    #[must_use]
    pub const fn confirmation_buffer(confirmations: usize) -> Self {
        Self {
            min_code_length: DEFAULT_MIN_CODE_LENGTH,
            max_error: Some(DEFAULT_MAX_ERROR),
            confirmations,
            cooldown: None,
        }
    }

    /// Creates a configuration from environment variables.
    ///
    /// Falls back to defaults for any unset variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides from a key lookup (normally the process environment).
    ///
    /// Unparseable values are ignored with a warning.
    #[must_use]
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("SHELFSCAN_DEDUP_MIN_CODE_LENGTH") {
            match v.trim().parse() {
                Ok(length) => self.min_code_length = length,
                Err(_) => warn_ignored("SHELFSCAN_DEDUP_MIN_CODE_LENGTH", &v),
            }
        }

        if let Some(v) = lookup("SHELFSCAN_DEDUP_MAX_ERROR") {
            match parse_optional(&v) {
                Some(parsed) => self.max_error = parsed,
                None => warn_ignored("SHELFSCAN_DEDUP_MAX_ERROR", &v),
            }
        }

        if let Some(v) = lookup("SHELFSCAN_DEDUP_CONFIRMATIONS") {
            match v.trim().parse() {
                Ok(confirmations) => self.confirmations = confirmations,
                Err(_) => warn_ignored("SHELFSCAN_DEDUP_CONFIRMATIONS", &v),
            }
        }

        if let Some(v) = lookup("SHELFSCAN_DEDUP_COOLDOWN_MS") {
            match parse_optional::<u64>(&v) {
                Some(parsed) => self.cooldown = parsed.map(Duration::from_millis),
                None => warn_ignored("SHELFSCAN_DEDUP_COOLDOWN_MS", &v),
            }
        }

        self
    }

    /// Returns true if the confirmation buffer is active.
    #[must_use]
    pub const fn uses_confirmation_buffer(&self) -> bool {
        self.confirmations > 1
    }

    /// Builder method to set the minimum code length.
    #[must_use]
    pub const fn with_min_code_length(mut self, length: usize) -> Self {
        self.min_code_length = length;
        self
    }

    /// Builder method to set the confidence gate threshold.
    #[must_use]
    pub const fn with_max_error(mut self, max_error: Option<f32>) -> Self {
        self.max_error = max_error;
        self
    }

    /// Builder method to set the number of required confirmations.
    #[must_use]
    pub const fn with_confirmations(mut self, confirmations: usize) -> Self {
        self.confirmations = confirmations;
        self
    }

    /// Builder method to set the cooldown window.
    #[must_use]
    pub const fn with_cooldown(mut self, cooldown: Option<Duration>) -> Self {
        self.cooldown = cooldown;
        self
    }
}

impl Default for DeduplicationConfig {
    /// Both policies layered: confidence gate, two confirmations, 3s cooldown.
    fn default() -> Self {
        Self {
            min_code_length: DEFAULT_MIN_CODE_LENGTH,
            max_error: Some(DEFAULT_MAX_ERROR),
            confirmations: DEFAULT_CONFIRMATIONS,
            cooldown: Some(DEFAULT_COOLDOWN),
        }
    }
}

/// Parses a value where `off`/`none`/`disabled` means `None`.
///
/// Returns `None` if the value cannot be parsed at all.
fn parse_optional<T: std::str::FromStr>(value: &str) -> Option<Option<T>> {
    let value = value.trim();
    match value.to_lowercase().as_str() {
        "off" | "none" | "disabled" => Some(None),
        _ => value.parse().ok().map(Some),
    }
}

fn warn_ignored(key: &str, value: &str) {
    tracing::warn!(key, value, "Ignoring unparseable dedup override");
}
