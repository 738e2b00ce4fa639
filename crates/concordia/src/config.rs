//! # Collection Configuration
//!
//! Tunables shared by every collection type. Usually built in code, but can be
//! loaded from a TOML table so hosts keep them next to their other settings:
//!
//! ```toml
//! label = "inbox"
//! initial_capacity = 256
//! feed_capacity = 4096
//! ```

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default bound for channel subscriptions.
pub const DEFAULT_FEED_CAPACITY: usize = 1024;

/// Configuration for a synchronized collection.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequenceConfig {
    /// Name attached to every tracing event emitted by the collection.
    pub label: String,
    /// Storage reserved up front.
    pub initial_capacity: usize,
    /// Bound used by `subscribe_channel`.
    pub feed_capacity: usize,
}

impl Default for SequenceConfig {
    fn default() -> Self {
        Self {
            label: String::from("sequence"),
            initial_capacity: 0,
            feed_capacity: DEFAULT_FEED_CAPACITY,
        }
    }
}

impl SequenceConfig {
    /// Creates a default config with the given label.
    #[must_use]
    pub fn labeled(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }

    /// Parses and validates a config from a TOML document.
    ///
    /// Missing keys fall back to their defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` for malformed TOML and `ConfigError::Invalid`
    /// if [`validate`](Self::validate) rejects the result.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(source).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that every value is usable.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if `feed_capacity` is 0.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.feed_capacity == 0 {
            return Err(ConfigError::Invalid(String::from(
                "feed_capacity must be greater than zero",
            )));
        }
        Ok(())
    }
}
