//! Configuration management.
//!
//! Resolution order:
//! 1. Built-in defaults
//! 2. TOML file (`--config`, `SHELFSCAN_CONFIG_PATH`, or the platform config dir)
//! 3. Environment overrides (`SHELFSCAN_*`)

use crate::models::DEFAULT_HISTORY_CAP;
use crate::observability::LoggingSettings;
use crate::services::deduplication::{
    DEFAULT_CONFIRMATIONS, DEFAULT_COOLDOWN, DEFAULT_MAX_ERROR, DeduplicationConfig,
};
use crate::source::MediaConstraints;
use crate::storage::DEFAULT_HISTORY_FILE;
use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable naming an explicit config file.
pub const CONFIG_PATH_ENV: &str = "SHELFSCAN_CONFIG_PATH";

/// Main configuration for shelfscan.
#[derive(Debug, Clone, PartialEq)]
pub struct ShelfscanConfig {
    /// Directory holding the history file.
    pub data_dir: PathBuf,
    /// History file name inside `data_dir`.
    pub history_file: String,
    /// Maximum number of records kept.
    pub history_cap: usize,
    /// Deduplication policy.
    pub dedup: DeduplicationConfig,
    /// Camera hints passed to decode sources.
    pub media: MediaConstraints,
    /// Scan feedback.
    pub feedback: FeedbackSettings,
    /// Logging.
    pub logging: LoggingSettings,
}

/// Feedback configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FeedbackSettings {
    /// Ring the terminal bell on each accepted scan.
    pub bell: bool,
}

impl Default for FeedbackSettings {
    fn default() -> Self {
        Self { bell: true }
    }
}

/// A numeric knob that can also be switched off with `false`.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(untagged)]
pub enum Toggle<T> {
    /// Explicit value.
    Value(T),
    /// `false` disables the knob, `true` keeps the default.
    Enabled(bool),
}

/// Configuration file structure (for TOML parsing).
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Data directory.
    pub data_dir: Option<String>,
    /// History file name.
    pub history_file: Option<String>,
    /// History cap.
    pub history_cap: Option<usize>,
    /// Deduplication section.
    pub dedup: Option<ConfigFileDedup>,
    /// Camera section.
    pub media: Option<MediaConstraints>,
    /// Feedback section.
    pub feedback: Option<FeedbackSettings>,
    /// Logging section.
    pub logging: Option<LoggingSettings>,
}

/// Dedup section in config file.
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFileDedup {
    /// Named starting point: `layered`, `time_window` or `confirmation_buffer`.
    pub preset: Option<String>,
    /// Minimum code length.
    pub min_code_length: Option<usize>,
    /// Confidence gate threshold, or `false`.
    pub max_error: Option<Toggle<f32>>,
    /// Identical reads required.
    pub confirmations: Option<usize>,
    /// Cooldown in milliseconds, or `false`.
    pub cooldown_ms: Option<Toggle<u64>>,
}

impl Default for ShelfscanConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            history_file: DEFAULT_HISTORY_FILE.to_string(),
            history_cap: DEFAULT_HISTORY_CAP,
            dedup: DeduplicationConfig::default(),
            media: MediaConstraints::default(),
            feedback: FeedbackSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

impl ShelfscanConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves the configuration for the process.
    ///
    /// `explicit` (from `--config`) must exist. Otherwise the file named by
    /// `SHELFSCAN_CONFIG_PATH` or the default location is used when present.
    /// Environment overrides are applied last.
    ///
    /// # Errors
    ///
    /// Returns an error if a named config file cannot be read or parsed, or
    /// the result fails validation.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        Self::resolve(explicit, |key| std::env::var(key).ok())
    }

    /// Same as [`Self::load`] with a custom variable lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if a named config file cannot be read or parsed, or
    /// the result fails validation.
    pub fn resolve<F>(explicit: Option<&Path>, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let named = explicit
            .map(Path::to_path_buf)
            .or_else(|| lookup(CONFIG_PATH_ENV).map(PathBuf::from));

        let config = match named {
            Some(path) => Self::load_from_file(&path)?,
            None => Self::load_default(),
        };

        let config = config.with_overrides(&lookup);
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::OperationFailed {
            operation: "read_config_file".to_string(),
            cause: format!("{}: {e}", path.display()),
        })?;

        Self::from_toml(&contents)
    }

    /// Parses configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a valid config file.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(contents).map_err(|e| Error::OperationFailed {
            operation: "parse_config_file".to_string(),
            cause: e.to_string(),
        })?;

        Self::from_config_file(file)
    }

    /// Loads configuration from the default location.
    ///
    /// Returns default configuration if no config file is found or it cannot
    /// be parsed.
    #[must_use]
    pub fn load_default() -> Self {
        let Some(path) = default_config_path().filter(|p| p.exists()) else {
            return Self::default();
        };

        match Self::load_from_file(&path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Ignoring unreadable config file");
                Self::default()
            },
        }
    }

    /// Converts a `ConfigFile` to `ShelfscanConfig`.
    fn from_config_file(file: ConfigFile) -> Result<Self> {
        let mut config = Self::default();

        if let Some(data_dir) = file.data_dir {
            config.data_dir = PathBuf::from(data_dir);
        }
        if let Some(history_file) = file.history_file {
            config.history_file = history_file;
        }
        if let Some(history_cap) = file.history_cap {
            config.history_cap = history_cap;
        }
        if let Some(dedup) = file.dedup {
            config.dedup = dedup_from_file(dedup)?;
        }
        if let Some(media) = file.media {
            config.media = media;
        }
        if let Some(feedback) = file.feedback {
            config.feedback = feedback;
        }
        if let Some(logging) = file.logging {
            config.logging = logging;
        }

        Ok(config)
    }

    /// Applies `SHELFSCAN_*` overrides from a key lookup.
    ///
    /// Unparseable values are ignored with a warning.
    #[must_use]
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup("SHELFSCAN_DATA_DIR").filter(|d| !d.trim().is_empty()) {
            self.data_dir = PathBuf::from(dir);
        }

        if let Some(v) = lookup("SHELFSCAN_HISTORY_CAP") {
            match v.trim().parse() {
                Ok(cap) => self.history_cap = cap,
                Err(_) => tracing::warn!(value = %v, "Ignoring unparseable SHELFSCAN_HISTORY_CAP"),
            }
        }

        if let Some(v) = lookup("SHELFSCAN_LOG_FORMAT") {
            match v.parse() {
                Ok(format) => self.logging.format = format,
                Err(e) => tracing::warn!(error = %e, "Ignoring SHELFSCAN_LOG_FORMAT"),
            }
        }

        self.dedup = self.dedup.with_overrides(&lookup);
        self
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the history cap is zero or the
    /// history file name is empty.
    pub fn validate(&self) -> Result<()> {
        if self.history_cap == 0 {
            return Err(Error::InvalidInput(
                "history_cap must be at least 1".to_string(),
            ));
        }
        if self.history_file.trim().is_empty() {
            return Err(Error::InvalidInput(
                "history_file must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Returns the full path of the history file.
    #[must_use]
    pub fn history_path(&self) -> PathBuf {
        self.data_dir.join(&self.history_file)
    }

    /// Sets the data directory.
    #[must_use]
    pub fn with_data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_dir = path.into();
        self
    }

    /// Sets the history cap.
    #[must_use]
    pub const fn with_history_cap(mut self, cap: usize) -> Self {
        self.history_cap = cap;
        self
    }

    /// Sets the deduplication policy.
    #[must_use]
    pub fn with_dedup(mut self, dedup: DeduplicationConfig) -> Self {
        self.dedup = dedup;
        self
    }
}

/// Builds a dedup config from its file section.
fn dedup_from_file(section: ConfigFileDedup) -> Result<DeduplicationConfig> {
    let mut dedup = match section.preset.as_deref().map(str::trim) {
        None | Some("layered") => DeduplicationConfig::default(),
        Some("time_window") => DeduplicationConfig::time_window(DEFAULT_COOLDOWN),
        Some("confirmation_buffer") => {
            DeduplicationConfig::confirmation_buffer(DEFAULT_CONFIRMATIONS)
        },
        Some(other) => {
            return Err(Error::InvalidInput(format!("unknown dedup preset '{other}'")));
        },
    };

    if let Some(length) = section.min_code_length {
        dedup.min_code_length = length;
    }
    if let Some(confirmations) = section.confirmations {
        dedup.confirmations = confirmations;
    }
    match section.max_error {
        Some(Toggle::Value(max_error)) => dedup.max_error = Some(max_error),
        Some(Toggle::Enabled(false)) => dedup.max_error = None,
        Some(Toggle::Enabled(true)) => {
            dedup.max_error = dedup.max_error.or(Some(DEFAULT_MAX_ERROR));
        },
        None => {},
    }
    match section.cooldown_ms {
        Some(Toggle::Value(ms)) => dedup.cooldown = Some(Duration::from_millis(ms)),
        Some(Toggle::Enabled(false)) => dedup.cooldown = None,
        Some(Toggle::Enabled(true)) => {
            dedup.cooldown = dedup.cooldown.or(Some(DEFAULT_COOLDOWN));
        },
        None => {},
    }

    Ok(dedup)
}

/// Platform data directory (`~/.local/share/shelfscan` on Linux).
fn default_data_dir() -> PathBuf {
    directories::BaseDirs::new().map_or_else(
        || PathBuf::from(".shelfscan"),
        |base| base.data_dir().join("shelfscan"),
    )
}

/// Platform config file (`~/.config/shelfscan/config.toml` on Linux).
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|base| base.config_dir().join("shelfscan").join("config.toml"))
}
