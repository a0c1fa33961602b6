//! Service configuration, read from an optional TOML file.
//!
//! ```toml
//! [artifacts]
//! model = "models/revenue_model.toml"
//! feature_info = "models/feature_info.json"
//! training_stats = "models/training_stats.json"
//!
//! [batch]
//! max_items = 100
//! ```
//!
//! Every key is optional; command-line flags override the file.

use crate::artifact::ArtifactPaths;
use crate::batch::DEFAULT_MAX_BATCH;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchSettings {
    pub max_items: usize,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            max_items: DEFAULT_MAX_BATCH,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServiceConfig {
    pub artifacts: ArtifactPaths,
    pub batch: BatchSettings,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse TOML config file: {0}")]
    TomlParseError(#[from] toml::de::Error),
    #[error("batch.max_items must be at least 1")]
    ZeroBatchLimit,
}

/// Per-invocation overrides, typically from command-line flags.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub model: Option<PathBuf>,
    pub feature_info: Option<PathBuf>,
    pub training_stats: Option<PathBuf>,
    pub max_batch: Option<usize>,
}

impl ServiceConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Reads `path` when given, otherwise starts from defaults.
    pub fn resolve(path: Option<&Path>, overrides: ConfigOverrides) -> Result<Self, ConfigError> {
        let base = match path {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        let config = base.with_overrides(overrides);
        config.validate()?;
        Ok(config)
    }

    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> Self {
        if let Some(model) = overrides.model {
            self.artifacts.model = model;
        }
        if let Some(feature_info) = overrides.feature_info {
            self.artifacts.feature_info = feature_info;
        }
        if let Some(training_stats) = overrides.training_stats {
            self.artifacts.training_stats = training_stats;
        }
        if let Some(max_items) = overrides.max_batch {
            self.batch.max_items = max_items;
        }
        self
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.batch.max_items == 0 {
            return Err(ConfigError::ZeroBatchLimit);
        }
        Ok(())
    }
}
