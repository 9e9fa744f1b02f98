//! Configuration file parser for ~/.config/rss-aggregator/config.toml.
//!
//! The config file is optional; a missing file yields `Config::default()`.
//! Unknown keys are accepted but logged, since they are usually typos.
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::feed::DEFAULT_RELAY_URL;
use crate::i18n::Language;
use crate::scheduler::DEFAULT_REFRESH_INTERVAL;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config file too large: {0}")]
    TooLarge(String),

    #[error("Invalid config value: {0}")]
    Invalid(String),
}

// ============================================================================
// Configuration
// ============================================================================

/// Top-level application configuration.
///
/// Every field has a default, so any subset of keys may be given.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Relay endpoint that wraps fetched feeds in `{"contents": ...}`.
    pub relay_url: String,

    /// Delay between the end of one refresh cycle and the next, in milliseconds.
    pub refresh_interval_ms: u64,

    /// Language for messages printed by the CLI.
    pub language: Language,

    /// Feed URLs to subscribe to at startup, in order.
    pub feeds: Vec<String>,

    /// Column budget for post descriptions in text output. 0 hides them.
    pub description_width: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            relay_url: DEFAULT_RELAY_URL.to_string(),
            refresh_interval_ms: DEFAULT_REFRESH_INTERVAL.as_millis() as u64,
            language: Language::default(),
            feeds: Vec::new(),
            description_width: 100,
        }
    }
}

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    const KNOWN_KEYS: [&'static str; 5] = [
        "relay_url",
        "refresh_interval_ms",
        "language",
        "feeds",
        "description_width",
    ];

    /// Load configuration from a TOML file.
    ///
    /// - Missing or empty file → `Ok(Config::default())`
    /// - Invalid TOML or wrong value types → `Err(ConfigError::Parse)`
    /// - A zero refresh interval → `Err(ConfigError::Invalid)`
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = std::fs::read_to_string(path)?;
        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Self::default());
        }

        let config = Self::from_toml(&content)?;
        tracing::info!(
            path = %path.display(),
            feeds = config.feeds.len(),
            interval_ms = config.refresh_interval_ms,
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        if let Ok(raw) = content.parse::<toml::Table>() {
            for key in raw.keys() {
                if !Self::KNOWN_KEYS.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let config: Config = toml::from_str(content)?;
        if config.refresh_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "refresh_interval_ms must be greater than 0".to_string(),
            ));
        }
        Ok(config)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }
}

// ============================================================================
// Tests
// ============================================================================
