//! Response documents produced at the service boundary.
//!
//! Field names follow the JSON documents the front-end consumes.

use crate::engine::{CONFIDENCE_LABEL, PredictionEngine, PredictionResult};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;

const PREDICTION_MEANING: &str =
    "This is the estimated daily revenue based on the provided inputs.";
const INTERVAL_MEANING: &str =
    "There is a 95% probability that the true revenue lies within this range.";
const LAG_NOTE: &str =
    "Lag and rolling features were provided by the user to reflect historical trends.";

/// Current UTC time as RFC 3339 with a `Z` suffix.
pub fn utc_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfidenceInterval {
    pub lower: f64,
    pub upper: f64,
    pub confidence_level: &'static str,
}

impl From<&PredictionResult> for ConfidenceInterval {
    fn from(result: &PredictionResult) -> Self {
        Self {
            lower: result.lower,
            upper: result.upper,
            confidence_level: CONFIDENCE_LABEL,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastExplanations {
    pub prediction_meaning: &'static str,
    pub confidence_interval: &'static str,
    pub important_note: &'static str,
}

impl Default for ForecastExplanations {
    fn default() -> Self {
        Self {
            prediction_meaning: PREDICTION_MEANING,
            confidence_interval: INTERVAL_MEANING,
            important_note: LAG_NOTE,
        }
    }
}

/// One forecast, as returned for a single prediction request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastReport {
    pub success: bool,
    pub predicted_revenue: f64,
    pub confidence_interval: ConfidenceInterval,
    pub explanations: ForecastExplanations,
    pub model_name: String,
    pub timestamp: String,
}

impl ForecastReport {
    pub fn new(result: &PredictionResult, model_name: impl Into<String>) -> Self {
        Self {
            success: true,
            predicted_revenue: result.point,
            confidence_interval: result.into(),
            explanations: ForecastExplanations::default(),
            model_name: model_name.into(),
            timestamp: utc_timestamp(),
        }
    }
}

/// Readiness signal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub model_loaded: bool,
    pub timestamp: String,
}

impl HealthReport {
    pub fn from_engine(engine: &PredictionEngine) -> Self {
        let model_loaded = engine.is_ready();
        Self {
            status: if model_loaded { "healthy" } else { "unavailable" },
            model_loaded,
            timestamp: utc_timestamp(),
        }
    }
}

/// Body of a failed request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorReport {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ErrorReport {
    /// Uses the error's display text, and its source chain as the detail.
    pub fn from_error(err: &dyn std::error::Error) -> Self {
        let mut causes = Vec::new();
        let mut source = err.source();
        while let Some(cause) = source {
            causes.push(cause.to_string());
            source = cause.source();
        }
        Self {
            error: err.to_string(),
            detail: (!causes.is_empty()).then(|| causes.join(": ")),
        }
    }
}
