//! Editor configuration
//!
//! Loaded from TOML; every field has a default so a partial file is valid.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::settings::NumericBounds;

/// Quiet interval after the last edit before an update is sent
pub const DEFAULT_QUIET_INTERVAL_MS: u64 = 150;

/// Editor configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Debounce window per parameter, in milliseconds
    pub quiet_interval_ms: u64,
    /// Bounds used when a numeric input has none stored
    pub default_bounds: NumericBounds,
    /// Where selection state is persisted; in memory when unset
    pub state_path: Option<PathBuf>,
    /// Capacity of the dispatch outcome channel
    pub outcome_channel_capacity: usize,
}

impl EditorConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With debounce window
    #[inline]
    #[must_use]
    pub fn with_quiet_interval(mut self, interval: Duration) -> Self {
        self.quiet_interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// With default numeric bounds
    #[inline]
    #[must_use]
    pub fn with_default_bounds(mut self, bounds: NumericBounds) -> Self {
        self.default_bounds = bounds;
        self
    }

    /// With state file
    #[inline]
    #[must_use]
    pub fn with_state_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.state_path = Some(path.into());
        self
    }

    /// With outcome channel capacity
    #[inline]
    #[must_use]
    pub fn with_outcome_channel_capacity(mut self, capacity: usize) -> Self {
        self.outcome_channel_capacity = capacity;
        self
    }

    /// Debounce window as a duration
    #[inline]
    #[must_use]
    pub fn quiet_interval(&self) -> Duration {
        Duration::from_millis(self.quiet_interval_ms)
    }

    /// Parse and validate a TOML document
    ///
    /// # Errors
    /// Invalid TOML or out-of-range values
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file
    ///
    /// # Errors
    /// Unreadable file, invalid TOML or out-of-range values
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!("Loaded editor config from {}", path.display());
        Ok(config)
    }

    /// Check values are usable
    ///
    /// # Errors
    /// Zero quiet interval or channel capacity, inverted or non-finite bounds,
    /// or a non-positive step
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.quiet_interval_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "quiet_interval_ms",
                reason: "must be greater than zero".into(),
            });
        }
        if self.outcome_channel_capacity == 0 {
            return Err(ConfigError::Invalid {
                field: "outcome_channel_capacity",
                reason: "must be greater than zero".into(),
            });
        }
        let bounds = &self.default_bounds;
        if !(bounds.min.is_finite() && bounds.max.is_finite()) || bounds.min > bounds.max {
            return Err(ConfigError::Invalid {
                field: "default_bounds",
                reason: format!("min {} and max {} do not form a range", bounds.min, bounds.max),
            });
        }
        if !(bounds.step.is_finite() && bounds.step > 0.0) {
            return Err(ConfigError::Invalid {
                field: "default_bounds.step",
                reason: format!("step {} must be positive", bounds.step),
            });
        }
        Ok(())
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            quiet_interval_ms: DEFAULT_QUIET_INTERVAL_MS,
            default_bounds: NumericBounds::default(),
            state_path: None,
            outcome_channel_capacity: 64,
        }
    }
}
