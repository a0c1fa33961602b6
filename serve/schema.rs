//! # Feature Schema
//!
//! The feature-metadata document written next to the model at training time.
//! Its `feature_names` list is the canonical column order of the model; every
//! aligned vector is built against it.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Display name used when the metadata document does not carry one.
pub const DEFAULT_MODEL_NAME: &str = "Linear Regression";

/// Ordered feature names plus descriptive model metadata. Immutable after load.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureSchema {
    feature_names: Vec<String>,
    model_name: String,
    metrics: BTreeMap<String, f64>,
}

#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Failed to read feature info file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse feature info JSON: {0}")]
    JsonParseError(#[from] serde_json::Error),
    #[error("Feature info document has no 'feature_names' key.")]
    MissingFeatureNames,
    #[error("Feature info document lists no features.")]
    EmptyFeatureNames,
    #[error("Feature '{0}' appears more than once in 'feature_names'.")]
    DuplicateFeature(String),
}

/// On-disk shape. Everything except `feature_names` is optional.
#[derive(Deserialize)]
struct FeatureInfoDocument {
    feature_names: Option<Vec<String>>,
    model_name: Option<String>,
    #[serde(default)]
    metrics: BTreeMap<String, f64>,
}

impl FeatureSchema {
    /// Builds a schema, enforcing a non-empty, duplicate-free name list.
    pub fn new(
        feature_names: Vec<String>,
        model_name: impl Into<String>,
        metrics: BTreeMap<String, f64>,
    ) -> Result<Self, SchemaError> {
        if feature_names.is_empty() {
            return Err(SchemaError::EmptyFeatureNames);
        }
        let mut seen = HashSet::with_capacity(feature_names.len());
        for name in &feature_names {
            if !seen.insert(name.as_str()) {
                return Err(SchemaError::DuplicateFeature(name.clone()));
            }
        }
        Ok(Self {
            feature_names,
            model_name: model_name.into(),
            metrics,
        })
    }

    /// Parses a feature info JSON document.
    pub fn from_json_str(text: &str) -> Result<Self, SchemaError> {
        let doc: FeatureInfoDocument = serde_json::from_str(text)?;
        let feature_names = doc.feature_names.ok_or(SchemaError::MissingFeatureNames)?;
        let model_name = doc
            .model_name
            .unwrap_or_else(|| DEFAULT_MODEL_NAME.to_string());
        Self::new(feature_names, model_name, doc.metrics)
    }

    /// Reads and parses a feature info JSON file.
    pub fn load(path: &Path) -> Result<Self, SchemaError> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn metrics(&self) -> &BTreeMap<String, f64> {
        &self.metrics
    }

    pub fn len(&self) -> usize {
        self.feature_names.len()
    }

    /// Always false for a constructed schema; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.feature_names.is_empty()
    }
}
