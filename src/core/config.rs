//! Transform system configuration

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Transform system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformConfig {
    /// Sync the written subtree right after every edit made through the
    /// propagator, instead of waiting for the next tick
    pub immediate_mode: bool,
    /// Normalize world rotations on every Local→World step. Off by default:
    /// drift is corrected when rotations are read back into local space.
    pub renormalize_world_rotation: bool,
    /// Log a warning when a world matrix is read before its entity was synced
    pub warn_on_stale_read: bool,
    /// Number of ticks kept in the statistics history
    pub stats_history: usize,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            immediate_mode: false,
            renormalize_world_rotation: false,
            warn_on_stale_read: true,
            stats_history: 120,
        }
    }
}

impl TransformConfig {
    /// Enable or disable sync-on-write
    #[must_use]
    pub fn with_immediate_mode(mut self, immediate: bool) -> Self {
        self.immediate_mode = immediate;
        self
    }

    /// Enable or disable per-step rotation normalization
    #[must_use]
    pub fn with_renormalize_world_rotation(mut self, renormalize: bool) -> Self {
        self.renormalize_world_rotation = renormalize;
        self
    }

    /// Enable or disable stale read warnings
    #[must_use]
    pub fn with_stale_read_warnings(mut self, warn: bool) -> Self {
        self.warn_on_stale_read = warn;
        self
    }

    /// Set the statistics history length
    #[must_use]
    pub fn with_stats_history(mut self, ticks: usize) -> Self {
        self.stats_history = ticks;
        self
    }

    /// Parse a configuration from RON text. Missing fields keep their
    /// defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a valid configuration
    pub fn from_ron_str(text: &str) -> Result<Self, ConfigError> {
        ron::from_str(text).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Load a configuration from a RON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed
    pub fn load_ron(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
        Self::from_ron_str(&content)
    }
}

/// Errors that can occur while loading a configuration
#[derive(Debug, Clone)]
pub enum ConfigError {
    /// IO error
    IoError(String),
    /// Parse error
    ParseError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::IoError(e) => write!(f, "IO error: {e}"),
            Self::ParseError(e) => write!(f, "Parse error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}
