//! # CLI Configuration
//!
//! Optional TOML file with defaults for the CLI commands.
//!
//! ```toml
//! [defaults]
//! reducer = "mean"
//! distance_column = "km"
//! include_cycles = false
//! ```
//!
//! Resolution: an explicit `--config` path must exist; otherwise
//! `sttn.toml` in the working directory is used if present; otherwise the
//! built-in defaults apply.

use serde::{Deserialize, Serialize};
use std::path::Path;
use sttn_core::SttnError;

/// Config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "sttn.toml";

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub defaults: Defaults,
}

/// Defaults applied when a command leaves an option unset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Defaults {
    /// Reducer for `--reduce col` without `=reducer`.
    pub reducer: String,
    /// Column written by `distance` without `--column`.
    pub distance_column: String,
    /// Whether `rollup` keeps self-loops when neither `--include-cycles` nor
    /// `--exclude-cycles` is given.
    pub include_cycles: bool,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            reducer: "sum".to_string(),
            distance_column: "distance_km".to_string(),
            include_cycles: true,
        }
    }
}

impl Config {
    /// Parse a config from TOML text.
    pub fn from_toml(text: &str) -> Result<Self, SttnError> {
        toml::from_str(text)
            .map_err(|e| SttnError::Deserialization(format!("Invalid config: {}", e)))
    }

    /// Resolve and load the configuration.
    pub fn load(explicit: Option<&Path>) -> Result<Self, SttnError> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => {
                let fallback = Path::new(DEFAULT_CONFIG_FILE);
                if fallback.is_file() {
                    Self::from_file(fallback)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    fn from_file(path: &Path) -> Result<Self, SttnError> {
        let text = std::fs::read_to_string(path)?;
        tracing::debug!(path = %path.display(), "loaded config");
        Self::from_toml(&text)
    }
}

// =============================================================================
// TESTS
// =============================================================================
