//! # Prediction Engine
//!
//! Turns one input record into a point forecast with a symmetric 95% interval.
//!
//! The interval assumes Gaussian residuals: `point ± 1.96 * residual_std`. It is
//! not clamped to any domain bound, so the lower limit may be negative even
//! though revenue cannot be. When the residual statistic is unavailable the
//! interval collapses onto the point estimate.
//!
//! [`PredictionEngine`] is the readiness gate: it starts `Uninitialized`, becomes
//! `Ready` exactly once, and rejects every request made before that.

use crate::align::{AlignedFeatures, InputRecord, align};
use crate::artifact::{self, ArtifactPaths, LoadError, ServiceState};
use crate::explain::{self, FeatureCatalog};
use crate::model::ModelError;
use log::{debug, info};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::OnceLock;
use thiserror::Error;

/// Two-sided 95% normal quantile.
pub const CONFIDENCE_Z: f64 = 1.96;

/// Label reported alongside every interval.
pub const CONFIDENCE_LABEL: &str = "95%";

/// `(point, lower, upper)` for one record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PredictionResult {
    pub point: f64,
    pub lower: f64,
    pub upper: f64,
}

impl PredictionResult {
    /// An interval of zero width at `point`.
    pub fn collapsed(point: f64) -> Self {
        Self {
            point,
            lower: point,
            upper: point,
        }
    }

    /// `point ± z * residual_std`.
    pub fn with_margin(point: f64, residual_std: f64, z: f64) -> Self {
        let margin = z * residual_std;
        Self {
            point,
            lower: point - margin,
            upper: point + margin,
        }
    }

    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }
}

/// Static model metadata, projected from the loaded schema.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelInfo {
    pub model_name: String,
    pub metrics: BTreeMap<String, f64>,
    pub feature_count: usize,
    pub features: Vec<String>,
}

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Model not loaded: the service is not ready.")]
    ServiceUnavailable,
    #[error("The service has already been initialized.")]
    AlreadyInitialized,
    #[error("Inference failed: {0}")]
    Inference(#[source] ModelError),
    #[error(transparent)]
    Load(#[from] LoadError),
}

impl EngineError {
    /// True for conditions that are the service's fault, never the caller's.
    pub fn is_server_fault(&self) -> bool {
        match self {
            EngineError::ServiceUnavailable
            | EngineError::Inference(_)
            | EngineError::Load(_) => true,
            EngineError::AlreadyInitialized => false,
        }
    }
}

impl ServiceState {
    /// Projects `record` onto this state's feature order.
    pub fn align(&self, record: &InputRecord) -> AlignedFeatures {
        align(self.schema.feature_names(), record)
    }

    /// Runs the model on one aligned row.
    pub fn predict_point(&self, features: &AlignedFeatures) -> Result<f64, EngineError> {
        self.model
            .predict_row(features.as_view())
            .map_err(EngineError::Inference)
    }

    /// Aligns, predicts, and attaches the 95% interval.
    pub fn predict_with_interval(
        &self,
        record: &InputRecord,
    ) -> Result<PredictionResult, EngineError> {
        let features = self.align(record);
        let point = self.predict_point(&features)?;
        let result = match self.residual_std {
            Some(residual_std) => PredictionResult::with_margin(point, residual_std, CONFIDENCE_Z),
            None => PredictionResult::collapsed(point),
        };
        debug!(
            "Predicted {:.4} in [{:.4}, {:.4}]",
            result.point, result.lower, result.upper
        );
        Ok(result)
    }

    pub fn model_info(&self) -> ModelInfo {
        ModelInfo {
            model_name: self.schema.model_name().to_string(),
            metrics: self.schema.metrics().clone(),
            feature_count: self.schema.len(),
            features: self.schema.feature_names().to_vec(),
        }
    }

    pub fn feature_catalog(&self) -> FeatureCatalog {
        explain::feature_catalog(self.schema.feature_names())
    }
}

/// Readiness gate around a write-once [`ServiceState`].
#[derive(Debug, Default)]
pub struct PredictionEngine {
    state: OnceLock<ServiceState>,
}

impl PredictionEngine {
    /// An engine in the `Uninitialized` state.
    pub fn new() -> Self {
        Self::default()
    }

    /// An engine that is `Ready` from the start.
    pub fn with_state(state: ServiceState) -> Self {
        let engine = Self::new();
        // A fresh cell always accepts its first value.
        let _ = engine.state.set(state);
        engine
    }

    /// Loads the artifacts and moves to `Ready`. Load failures leave the
    /// engine `Uninitialized`.
    pub fn initialize(&self, paths: &ArtifactPaths) -> Result<&ServiceState, EngineError> {
        if self.is_ready() {
            return Err(EngineError::AlreadyInitialized);
        }
        let state = artifact::load(paths)?;
        self.install(state)
    }

    /// Installs an externally built state. Only the first install wins.
    pub fn install(&self, state: ServiceState) -> Result<&ServiceState, EngineError> {
        self.state
            .set(state)
            .map_err(|_| EngineError::AlreadyInitialized)?;
        info!("Prediction service ready");
        self.state()
    }

    pub fn is_ready(&self) -> bool {
        self.state.get().is_some()
    }

    pub fn state(&self) -> Result<&ServiceState, EngineError> {
        self.state.get().ok_or(EngineError::ServiceUnavailable)
    }

    pub fn predict_with_interval(
        &self,
        record: &InputRecord,
    ) -> Result<PredictionResult, EngineError> {
        self.state()?.predict_with_interval(record)
    }

    pub fn model_info(&self) -> Result<ModelInfo, EngineError> {
        Ok(self.state()?.model_info())
    }

    /// The fixed explanation table. Gated on readiness like every other request.
    pub fn feature_explanations(&self) -> Result<BTreeMap<&'static str, &'static str>, EngineError> {
        self.state()?;
        Ok(explain::feature_explanations())
    }

    pub fn feature_catalog(&self) -> Result<FeatureCatalog, EngineError> {
        Ok(self.state()?.feature_catalog())
    }
}
