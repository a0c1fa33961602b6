//! # Feature Alignment
//!
//! Projects an open, string-keyed input record onto the fixed column order of
//! the trained model. The defaulting rule is explicit: a schema feature absent
//! from the record becomes `0.0`. Keys the schema does not name are ignored.

use ndarray::{Array1, ArrayView1};
use std::collections::HashMap;
use std::ops::Deref;

/// One request's raw values, keyed by feature name.
pub type InputRecord = HashMap<String, f64>;

/// Value used for any schema feature the record does not carry.
pub const MISSING_FEATURE_VALUE: f64 = 0.0;

/// A record projected onto the schema, in schema order.
#[repr(transparent)]
#[derive(Clone, Debug, PartialEq)]
pub struct AlignedFeatures(pub Array1<f64>);

impl AlignedFeatures {
    pub fn into_inner(self) -> Array1<f64> {
        self.0
    }

    pub fn as_view(&self) -> ArrayView1<'_, f64> {
        self.0.view()
    }
}

impl Deref for AlignedFeatures {
    type Target = Array1<f64>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<AlignedFeatures> for Array1<f64> {
    fn from(values: AlignedFeatures) -> Self {
        values.0
    }
}

/// Builds the aligned vector: position `i` holds `record[feature_names[i]]`,
/// or [`MISSING_FEATURE_VALUE`] when the record lacks that name.
pub fn align(feature_names: &[String], record: &InputRecord) -> AlignedFeatures {
    AlignedFeatures(
        feature_names
            .iter()
            .map(|name| record.get(name).copied().unwrap_or(MISSING_FEATURE_VALUE))
            .collect(),
    )
}

/// Schema features the record does not supply, in schema order.
pub fn missing_features<'a>(feature_names: &'a [String], record: &InputRecord) -> Vec<&'a str> {
    feature_names
        .iter()
        .filter(|name| !record.contains_key(name.as_str()))
        .map(String::as_str)
        .collect()
}
