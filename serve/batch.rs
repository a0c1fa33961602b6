//! # Batch Prediction
//!
//! Forecasts a bounded list of inputs in one call. Items are validated and
//! predicted independently on the rayon pool: one bad item is reported in its
//! own slot and never aborts the rest. Results keep input order.

use crate::artifact::ServiceState;
use crate::engine::{EngineError, PredictionEngine};
use crate::input::SalesInput;
use crate::report::{ConfidenceInterval, utc_timestamp};
use log::info;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::io::Read;
use thiserror::Error;

/// Default upper bound on the number of inputs per batch.
pub const DEFAULT_MAX_BATCH: usize = 100;

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("Batch must contain between 1 and {max} inputs, got {found}.")]
    Size { found: usize, max: usize },
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("Failed to parse batch JSON: {0}")]
    JsonParseError(#[from] serde_json::Error),
    #[error("Failed to read batch CSV: {0}")]
    CsvError(#[from] csv::Error),
}

/// Outcome for one input of the batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchItem {
    pub index: usize,
    pub predicted_revenue: Option<f64>,
    pub confidence_interval: Option<ConfidenceInterval>,
    pub success: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchReport {
    pub success: bool,
    pub total_predictions: usize,
    pub successful_predictions: usize,
    pub failed_predictions: usize,
    pub results: Vec<BatchItem>,
    pub model_name: String,
    pub timestamp: String,
}

/// Either a bare JSON array of inputs or `{"predictions": [...]}`.
#[derive(Deserialize)]
#[serde(untagged)]
enum BatchDocument {
    Wrapped { predictions: Vec<SalesInput> },
    Bare(Vec<SalesInput>),
}

/// Parses batch inputs from JSON text.
pub fn inputs_from_json_str(text: &str) -> Result<Vec<SalesInput>, BatchError> {
    let doc: BatchDocument = serde_json::from_str(text)?;
    Ok(match doc {
        BatchDocument::Wrapped { predictions } => predictions,
        BatchDocument::Bare(inputs) => inputs,
    })
}

/// Parses batch inputs from CSV with a header row naming the input fields.
pub fn inputs_from_csv<R: Read>(reader: R) -> Result<Vec<SalesInput>, BatchError> {
    let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let inputs = csv_reader
        .deserialize::<SalesInput>()
        .collect::<Result<Vec<_>, _>>()?;
    Ok(inputs)
}

fn predict_item(state: &ServiceState, index: usize, input: &SalesInput) -> BatchItem {
    let outcome = input
        .validate()
        .map_err(|e| e.to_string())
        .and_then(|()| {
            state
                .predict_with_interval(&input.to_record())
                .map_err(|e| e.to_string())
        });

    match outcome {
        Ok(result) => BatchItem {
            index,
            predicted_revenue: Some(result.point),
            confidence_interval: Some(ConfidenceInterval::from(&result)),
            success: true,
            error: None,
        },
        Err(message) => BatchItem {
            index,
            predicted_revenue: None,
            confidence_interval: None,
            success: false,
            error: Some(message),
        },
    }
}

/// Forecasts every input. Fails as a whole only when the batch size is out of
/// `1..=max_items`.
pub fn predict_batch(
    state: &ServiceState,
    inputs: &[SalesInput],
    max_items: usize,
) -> Result<BatchReport, BatchError> {
    if inputs.is_empty() || inputs.len() > max_items {
        return Err(BatchError::Size {
            found: inputs.len(),
            max: max_items,
        });
    }

    let results: Vec<BatchItem> = inputs
        .par_iter()
        .enumerate()
        .map(|(index, input)| predict_item(state, index, input))
        .collect();

    let successful_predictions = results.iter().filter(|item| item.success).count();
    let failed_predictions = results.len() - successful_predictions;
    info!(
        "Batch of {} processed: {} succeeded, {} failed",
        results.len(),
        successful_predictions,
        failed_predictions
    );

    Ok(BatchReport {
        success: failed_predictions == 0,
        total_predictions: results.len(),
        successful_predictions,
        failed_predictions,
        results,
        model_name: state.schema().model_name().to_string(),
        timestamp: utc_timestamp(),
    })
}

impl PredictionEngine {
    /// Batch prediction behind the readiness gate.
    pub fn predict_batch(
        &self,
        inputs: &[SalesInput],
        max_items: usize,
    ) -> Result<BatchReport, BatchError> {
        predict_batch(self.state()?, inputs, max_items)
    }
}
