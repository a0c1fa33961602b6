//! Residual statistics written at training time. Only `residual_std` is read.

use serde_json::Value;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StatsError {
    #[error("Failed to read training stats file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse training stats JSON: {0}")]
    JsonParseError(#[from] serde_json::Error),
    #[error("Training stats document has no 'residual_std' key.")]
    MissingResidualStd,
    #[error("'residual_std' is not numeric: {0}")]
    NotNumeric(String),
    #[error("'residual_std' must be finite and non-negative, found {0}.")]
    OutOfRange(f64),
}

/// Extracts `residual_std` from a stats JSON document.
///
/// Numbers and numeric strings are accepted. The value must be finite and `>= 0`.
pub fn residual_std_from_json_str(text: &str) -> Result<f64, StatsError> {
    let doc: Value = serde_json::from_str(text)?;
    let raw = doc
        .get("residual_std")
        .ok_or(StatsError::MissingResidualStd)?;

    let value = match raw {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| StatsError::NotNumeric(n.to_string()))?,
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| StatsError::NotNumeric(s.clone()))?,
        other => return Err(StatsError::NotNumeric(other.to_string())),
    };

    if !value.is_finite() || value < 0.0 {
        return Err(StatsError::OutOfRange(value));
    }
    Ok(value)
}

/// Reads `residual_std` from a stats JSON file.
pub fn load_residual_std(path: &Path) -> Result<f64, StatsError> {
    let text = fs::read_to_string(path)?;
    residual_std_from_json_str(&text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_number_and_numeric_string() {
        assert_eq!(
            residual_std_from_json_str(r#"{"residual_std": 412.5, "n": 90}"#).unwrap(),
            412.5
        );
        assert_eq!(
            residual_std_from_json_str(r#"{"residual_std": " 3.25 "}"#).unwrap(),
            3.25
        );
        assert_eq!(residual_std_from_json_str(r#"{"residual_std": 0}"#).unwrap(), 0.0);
    }

    #[test]
    fn rejects_missing_and_non_numeric() {
        assert!(matches!(
            residual_std_from_json_str(r#"{"rmse": 1.0}"#),
            Err(StatsError::MissingResidualStd)
        ));
        assert!(matches!(
            residual_std_from_json_str(r#"{"residual_std": "wide"}"#),
            Err(StatsError::NotNumeric(_))
        ));
        assert!(matches!(
            residual_std_from_json_str(r#"{"residual_std": null}"#),
            Err(StatsError::NotNumeric(_))
        ));
    }

    #[test]
    fn rejects_negative_and_non_finite() {
        assert!(matches!(
            residual_std_from_json_str(r#"{"residual_std": -1.0}"#),
            Err(StatsError::OutOfRange(_))
        ));
        assert!(matches!(
            residual_std_from_json_str(r#"{"residual_std": "NaN"}"#),
            Err(StatsError::OutOfRange(_))
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load_residual_std(&dir.path().join("training_stats.json")),
            Err(StatsError::IoError(_))
        ));
    }
}
