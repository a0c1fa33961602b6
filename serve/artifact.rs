//! # Artifact Loader
//!
//! Reads the three static artifacts written by the training step and bundles
//! them into an immutable [`ServiceState`]:
//!
//! - the serialized model (TOML). Failure is fatal.
//! - the feature info document (JSON). Failure is fatal.
//! - the training stats document (JSON). Failure is logged and tolerated:
//!   the service then answers with point-collapsed intervals.

use crate::explain::unexplained_features;
use crate::model::{ModelError, Regressor, TrainedModel};
use crate::schema::{FeatureSchema, SchemaError};
use crate::stats::load_residual_std;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_MODEL_PATH: &str = "models/revenue_model.toml";
pub const DEFAULT_FEATURE_INFO_PATH: &str = "models/feature_info.json";
pub const DEFAULT_TRAINING_STATS_PATH: &str = "models/training_stats.json";

/// Where the three artifacts live on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactPaths {
    pub model: PathBuf,
    pub feature_info: PathBuf,
    pub training_stats: PathBuf,
}

impl Default for ArtifactPaths {
    fn default() -> Self {
        Self {
            model: PathBuf::from(DEFAULT_MODEL_PATH),
            feature_info: PathBuf::from(DEFAULT_FEATURE_INFO_PATH),
            training_stats: PathBuf::from(DEFAULT_TRAINING_STATS_PATH),
        }
    }
}

impl ArtifactPaths {
    /// All three artifacts under one directory, with the default file names.
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            model: dir.join("revenue_model.toml"),
            feature_info: dir.join("feature_info.json"),
            training_stats: dir.join("training_stats.json"),
        }
    }
}

/// Fatal startup failures. The service must not become ready after either.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Failed to load model from {}: {source}", .path.display())]
    ModelLoad {
        path: PathBuf,
        #[source]
        source: ModelError,
    },
    #[error("Failed to load feature info from {}: {source}", .path.display())]
    SchemaLoad {
        path: PathBuf,
        #[source]
        source: SchemaError,
    },
}

/// Everything a prediction needs, built once and only read afterwards.
pub struct ServiceState {
    pub(crate) model: Box<dyn Regressor>,
    pub(crate) schema: FeatureSchema,
    pub(crate) residual_std: Option<f64>,
}

impl fmt::Debug for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceState")
            .field("model_features", &self.model.n_features())
            .field("schema", &self.schema)
            .field("residual_std", &self.residual_std)
            .finish()
    }
}

impl ServiceState {
    /// Bundles already-constructed parts. `residual_std` of `None` selects the
    /// point-collapsed interval mode.
    pub fn new(
        model: Box<dyn Regressor>,
        schema: FeatureSchema,
        residual_std: Option<f64>,
    ) -> Self {
        Self {
            model,
            schema,
            residual_std,
        }
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn feature_names(&self) -> &[String] {
        self.schema.feature_names()
    }

    pub fn residual_std(&self) -> Option<f64> {
        self.residual_std
    }

    pub fn has_interval(&self) -> bool {
        self.residual_std.is_some()
    }
}

/// Loads the model, the feature schema, and the residual statistic.
pub fn load(paths: &ArtifactPaths) -> Result<ServiceState, LoadError> {
    let model = TrainedModel::load(&paths.model).map_err(|source| LoadError::ModelLoad {
        path: paths.model.clone(),
        source,
    })?;
    info!(
        "Model loaded from {} ({}, {} features)",
        paths.model.display(),
        model.family_name(),
        model.n_features
    );

    let schema =
        FeatureSchema::load(&paths.feature_info).map_err(|source| LoadError::SchemaLoad {
            path: paths.feature_info.clone(),
            source,
        })?;
    info!(
        "Feature info loaded from {} ({} features, model name '{}')",
        paths.feature_info.display(),
        schema.len(),
        schema.model_name()
    );

    if model.n_features != schema.len() {
        warn!(
            "Model expects {} features but the schema lists {}; every prediction will fail",
            model.n_features,
            schema.len()
        );
    }

    let unexplained = unexplained_features(schema.feature_names());
    if !unexplained.is_empty() {
        info!(
            "{} schema feature(s) have no explanation entry: {}",
            unexplained.len(),
            unexplained.join(", ")
        );
    }

    let residual_std = match load_residual_std(&paths.training_stats) {
        Ok(value) => {
            info!(
                "Residual std {value} loaded from {}",
                paths.training_stats.display()
            );
            Some(value)
        }
        Err(e) => {
            warn!(
                "Training stats unavailable at {} ({e}); confidence intervals disabled",
                paths.training_stats.display()
            );
            None
        }
    };

    Ok(ServiceState::new(Box::new(model), schema, residual_std))
}
