//! Static, human-readable descriptions of the business features.
//!
//! The explanation table is fixed and does not follow the loaded schema; the
//! catalogue built here reconciles the two by falling back to a placeholder.

use serde::Serialize;
use std::collections::BTreeMap;

/// Prefix shared by the one-hot store-location indicators.
pub const LOCATION_PREFIX: &str = "store_location_";

/// Description used in the catalogue for schema features without an entry.
pub const NO_DESCRIPTION: &str = "No description available";

const EXPLANATIONS: [(&str, &str); 10] = [
    ("transaction_qty", "Number of products sold during the day"),
    ("unit_price", "Average selling price per product"),
    ("revenue_lag1", "Revenue from the previous day"),
    ("revenue_lag7", "Revenue from 7 days ago, same weekday"),
    ("revenue_rolling3", "Average revenue over the last 3 days"),
    ("revenue_rolling7", "Average revenue over the last 7 days"),
    ("month", "Month of the year (1–12)"),
    ("day", "Day of the month"),
    ("day_of_week", "Day of the week (0=Monday)"),
    ("is_weekend", "1 if weekend, else 0"),
];

/// Value kind of a feature, as accepted by the input contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureKind {
    Integer,
    Float,
    Binary,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureInfo {
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: FeatureKind,
}

/// Per-feature descriptions for a loaded schema, with thematic groups.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureCatalog {
    pub features: Vec<FeatureInfo>,
    pub total_features: usize,
    pub feature_groups: BTreeMap<String, Vec<String>>,
}

/// The fixed explanation table: exactly the ten business features.
pub fn feature_explanations() -> BTreeMap<&'static str, &'static str> {
    EXPLANATIONS.into_iter().collect()
}

pub fn explanation_for(name: &str) -> Option<&'static str> {
    EXPLANATIONS
        .iter()
        .find(|(key, _)| *key == name)
        .map(|(_, text)| *text)
}

/// Schema features the explanation table does not cover, in schema order.
pub fn unexplained_features(feature_names: &[String]) -> Vec<&str> {
    feature_names
        .iter()
        .map(String::as_str)
        .filter(|name| explanation_for(name).is_none())
        .collect()
}

pub fn feature_kind(name: &str) -> FeatureKind {
    match name {
        "transaction_qty" | "month" | "day" | "day_of_week" => FeatureKind::Integer,
        "is_weekend" => FeatureKind::Binary,
        other if other.starts_with(LOCATION_PREFIX) => FeatureKind::Binary,
        _ => FeatureKind::Float,
    }
}

fn feature_group(name: &str) -> &'static str {
    match name {
        "transaction_qty" | "unit_price" => "volume_and_price",
        "month" | "day" | "day_of_week" | "is_weekend" => "calendar",
        "revenue_lag1" | "revenue_lag7" => "lag",
        "revenue_rolling3" | "revenue_rolling7" => "rolling",
        other if other.starts_with(LOCATION_PREFIX) => "location",
        _ => "other",
    }
}

/// Describes every feature of `feature_names`, in order, and groups them.
pub fn feature_catalog(feature_names: &[String]) -> FeatureCatalog {
    let mut feature_groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
    let features = feature_names
        .iter()
        .map(|name| {
            feature_groups
                .entry(feature_group(name).to_string())
                .or_default()
                .push(name.clone());
            FeatureInfo {
                name: name.clone(),
                description: explanation_for(name).unwrap_or(NO_DESCRIPTION).to_string(),
                kind: feature_kind(name),
            }
        })
        .collect::<Vec<_>>();

    FeatureCatalog {
        total_features: features.len(),
        features,
        feature_groups,
    }
}
