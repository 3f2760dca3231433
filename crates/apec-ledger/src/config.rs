//! # Program Configuration
//!
//! Limits and constants the program applies to every operation. Loaded from
//! YAML; every field has a default, so an empty document is a valid config.
//!
//! ```yaml
//! provider_name_max_len: 10
//! course_name_max_len: 20
//! certified_symbol: APECERT
//! max_proof_len: 64
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors loading a [`ProgramConfig`].
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config {path}: {source}")]
    Read {
        /// Path attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The YAML did not parse into a config.
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// The values parsed but are unusable.
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Tunable program limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProgramConfig {
    /// Maximum provider short-name length, in bytes.
    pub provider_name_max_len: usize,
    /// Maximum course short-name length, in bytes.
    pub course_name_max_len: usize,
    /// Symbol stamped on every certified credential.
    pub certified_symbol: String,
    /// Longest membership proof accepted, in siblings.
    pub max_proof_len: usize,
}

impl Default for ProgramConfig {
    fn default() -> Self {
        Self {
            provider_name_max_len: 10,
            course_name_max_len: 20,
            certified_symbol: "APECERT".to_string(),
            max_proof_len: 64,
        }
    }
}

impl ProgramConfig {
    /// Parse from a YAML string.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        // An empty file deserializes to unit, not to an empty mapping.
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a YAML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&text)
    }

    /// Reject values no operation could satisfy.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.provider_name_max_len == 0 || self.course_name_max_len == 0 {
            return Err(ConfigError::Invalid(
                "name limits must be at least 1".to_string(),
            ));
        }
        if self.certified_symbol.is_empty() {
            return Err(ConfigError::Invalid(
                "certified_symbol must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
