use ndarray::{Array1, ArrayView1, ArrayView2, Axis};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;
use thiserror::Error;

// --- Public Data Structures ---
// These structs define the public, human-readable format of a trained model
// when serialized to a TOML file by the external training step.

/// The capability the prediction engine needs from a trained model: one row of
/// `n_features` ordered floats in, one float out.
///
/// Anything that implements this can sit behind a `ServiceState`, so the
/// engine never depends on which training technique produced the artifact.
pub trait Regressor: Send + Sync {
    /// Number of input columns the model was trained on.
    fn n_features(&self) -> usize;

    /// Predicts a single row. The row order must match the training-time order.
    fn predict_row(&self, row: ArrayView1<f64>) -> Result<f64, ModelError>;
}

/// An ordinary linear model: `intercept + coefficients . x`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    pub intercept: f64,
    pub coefficients: Vec<f64>,
}

/// One node of a regression tree stored as a flat array.
///
/// Split nodes route `x[feature] <= threshold` to `left`, everything else to `right`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

/// A single regression tree. The root is `nodes[0]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    pub nodes: Vec<TreeNode>,
}

/// An additive ensemble of regression trees (gradient-boosted style).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeEnsemble {
    pub base_score: f64,
    pub trees: Vec<RegressionTree>,
}

/// The model families an artifact may contain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "snake_case")]
pub enum ModelFamily {
    Linear(LinearModel),
    TreeEnsemble(TreeEnsemble),
}

/// The top-level, self-contained, trained model artifact.
/// This is the structure that gets saved to and loaded from a file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainedModel {
    /// Number of columns in the training design. Must equal the length of the
    /// feature schema the model is served with.
    pub n_features: usize,
    #[serde(flatten)]
    pub family: ModelFamily,
}

/// Custom error type for model loading, saving, and prediction.
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Failed to read or write model file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse TOML model file: {0}")]
    TomlParseError(#[from] toml::de::Error),
    #[error("Failed to serialize model to TOML format: {0}")]
    TomlSerializeError(#[from] toml::ser::Error),
    #[error("Model artifact is structurally invalid: {0}")]
    Malformed(String),
    #[error("Prediction row has {found} features, but the model was trained on {expected}.")]
    MismatchedFeatureCount { found: usize, expected: usize },
    #[error("Model produced a non-finite prediction ({0}).")]
    NonFiniteOutput(f64),
}

impl TrainedModel {
    /// Predicts outcomes for a batch of aligned rows.
    ///
    /// # Arguments
    /// * `x_new`: A 2D array view with shape `[n_samples, n_features]`. Column
    ///   order must match the training-time feature order.
    ///
    /// # Returns
    /// One prediction per row, or a `ModelError` when the column count does not
    /// match `n_features` or a prediction is not finite.
    pub fn predict(&self, x_new: ArrayView2<f64>) -> Result<Array1<f64>, ModelError> {
        // --- 1. Validate Inputs ---
        if x_new.ncols() != self.n_features {
            return Err(ModelError::MismatchedFeatureCount {
                found: x_new.ncols(),
                expected: self.n_features,
            });
        }

        // --- 2. Evaluate the family ---
        let predictions: Array1<f64> = match &self.family {
            ModelFamily::Linear(linear) => {
                if linear.coefficients.len() != self.n_features {
                    return Err(ModelError::Malformed(format!(
                        "linear model declares {} features but carries {} coefficients",
                        self.n_features,
                        linear.coefficients.len()
                    )));
                }
                x_new.dot(&ArrayView1::from(linear.coefficients.as_slice())) + linear.intercept
            }
            ModelFamily::TreeEnsemble(ensemble) => x_new
                .axis_iter(Axis(0))
                .map(|row| internal::evaluate_ensemble(ensemble, row))
                .collect::<Result<Array1<f64>, ModelError>>()?,
        };

        if let Some(&bad) = predictions.iter().find(|p| !p.is_finite()) {
            return Err(ModelError::NonFiniteOutput(bad));
        }

        Ok(predictions)
    }

    /// Checks the structural invariants that serde cannot express.
    pub fn validate(&self) -> Result<(), ModelError> {
        match &self.family {
            ModelFamily::Linear(linear) => {
                if linear.coefficients.len() != self.n_features {
                    return Err(ModelError::Malformed(format!(
                        "linear model declares {} features but carries {} coefficients",
                        self.n_features,
                        linear.coefficients.len()
                    )));
                }
                if !linear.intercept.is_finite() || linear.coefficients.iter().any(|c| !c.is_finite())
                {
                    return Err(ModelError::Malformed(
                        "linear model contains non-finite parameters".to_string(),
                    ));
                }
                Ok(())
            }
            ModelFamily::TreeEnsemble(ensemble) => {
                for (tree_idx, tree) in ensemble.trees.iter().enumerate() {
                    internal::validate_tree(tree, self.n_features)
                        .map_err(|msg| ModelError::Malformed(format!("tree {tree_idx}: {msg}")))?;
                }
                Ok(())
            }
        }
    }

    /// Saves the trained model to a file in a human-readable TOML format.
    pub fn save(&self, path: &Path) -> Result<(), ModelError> {
        let toml_string = toml::to_string_pretty(self)?;
        let mut file = BufWriter::new(fs::File::create(path)?);
        file.write_all(toml_string.as_bytes())?;
        Ok(())
    }

    /// Loads a trained model from a TOML file and checks its structure.
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let toml_string = fs::read_to_string(path)?;
        let model: Self = toml::from_str(&toml_string)?;
        model.validate()?;
        Ok(model)
    }

    /// Short human label for the model family, used in log lines.
    pub fn family_name(&self) -> &'static str {
        match self.family {
            ModelFamily::Linear(_) => "linear",
            ModelFamily::TreeEnsemble(_) => "tree_ensemble",
        }
    }
}

impl Regressor for TrainedModel {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict_row(&self, row: ArrayView1<f64>) -> Result<f64, ModelError> {
        let predictions = self.predict(row.insert_axis(Axis(0)))?;
        Ok(predictions[0])
    }
}

/// Internal module for tree evaluation and validation details.
mod internal {
    use super::*;

    pub(super) fn evaluate_ensemble(
        ensemble: &TreeEnsemble,
        row: ArrayView1<f64>,
    ) -> Result<f64, ModelError> {
        ensemble
            .trees
            .iter()
            .enumerate()
            .try_fold(ensemble.base_score, |acc, (tree_idx, tree)| {
                evaluate_tree(tree, row)
                    .map(|value| acc + value)
                    .map_err(|msg| ModelError::Malformed(format!("tree {tree_idx}: {msg}")))
            })
    }

    /// Walks one tree. A missing node, an out-of-range feature or a child that
    /// does not point strictly forward is an error, so the walk always ends.
    fn evaluate_tree(tree: &RegressionTree, row: ArrayView1<f64>) -> Result<f64, String> {
        if tree.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }
        let mut idx = 0;
        loop {
            match tree.nodes.get(idx) {
                None => return Err(format!("node {idx} does not exist")),
                Some(TreeNode::Leaf { value }) => return Ok(*value),
                Some(TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    let x = row.get(*feature).ok_or_else(|| {
                        format!(
                            "node {idx} splits on feature {feature}, but the row has {}",
                            row.len()
                        )
                    })?;
                    let next = if *x <= *threshold { *left } else { *right };
                    if next <= idx {
                        return Err(format!("node {idx} points back to node {next}"));
                    }
                    idx = next;
                }
            }
        }
    }

    pub(super) fn validate_tree(tree: &RegressionTree, n_features: usize) -> Result<(), String> {
        if tree.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }
        let n_nodes = tree.nodes.len();
        for (idx, node) in tree.nodes.iter().enumerate() {
            match node {
                TreeNode::Leaf { value } => {
                    if !value.is_finite() {
                        return Err(format!("leaf {idx} has a non-finite value"));
                    }
                }
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if *feature >= n_features {
                        return Err(format!(
                            "node {idx} splits on feature {feature}, but the model has {n_features}"
                        ));
                    }
                    if threshold.is_nan() {
                        return Err(format!("node {idx} has a NaN threshold"));
                    }
                    for child in [*left, *right] {
                        if child <= idx || child >= n_nodes {
                            return Err(format!(
                                "node {idx} points to child {child}; children must lie in ({idx}, {n_nodes})"
                            ));
                        }
                    }
                }
            }
        }
        Ok(())
    }
}
