//! # Sales Input Contract
//!
//! The typed form of one day's sales attributes, as accepted at the service
//! boundary. Values are range-checked here before they are flattened into an
//! [`InputRecord`]; the core itself accepts any record.

use crate::align::InputRecord;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Day-level attributes supplied by the caller. Lag and rolling revenue values
/// are provided by the caller rather than computed from history.
///
/// Integer fields also accept whole-number floats such as `6.0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesInput {
    /// Number of items sold in the day.
    #[serde(deserialize_with = "deserialize_whole_number")]
    pub transaction_qty: i64,
    /// Average unit price.
    pub unit_price: f64,
    /// Month (1-12).
    #[serde(deserialize_with = "deserialize_whole_number")]
    pub month: i64,
    /// Day of month (1-31).
    #[serde(deserialize_with = "deserialize_whole_number")]
    pub day: i64,
    /// Day of week, 0 = Monday.
    #[serde(deserialize_with = "deserialize_whole_number")]
    pub day_of_week: i64,
    /// Weekend flag, 0 or 1.
    #[serde(deserialize_with = "deserialize_whole_number")]
    pub is_weekend: i64,
    pub revenue_lag1: f64,
    pub revenue_lag7: f64,
    pub revenue_rolling3: f64,
    pub revenue_rolling7: f64,
    #[serde(
        rename = "store_location_Hells_Kitchen",
        default,
        deserialize_with = "deserialize_whole_number"
    )]
    pub store_location_hells_kitchen: i64,
    #[serde(
        rename = "store_location_Lower_Manhattan",
        default,
        deserialize_with = "deserialize_whole_number"
    )]
    pub store_location_lower_manhattan: i64,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WholeNumber {
    Integer(i64),
    Float(f64),
}

fn deserialize_whole_number<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    match WholeNumber::deserialize(deserializer)? {
        WholeNumber::Integer(value) => Ok(value),
        WholeNumber::Float(value) if value.fract() == 0.0 && value.abs() < i64::MAX as f64 => {
            Ok(value as i64)
        }
        WholeNumber::Float(value) => Err(serde::de::Error::custom(format!(
            "expected a whole number, found {value}"
        ))),
    }
}

/// A caller-side input problem. Never a server fault.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Field '{field}' = {value} is out of range: expected {expected}.")]
    OutOfRange {
        field: &'static str,
        value: String,
        expected: &'static str,
    },
    #[error("Field '{0}' must be a finite number.")]
    NotFinite(&'static str),
}

fn check_int(
    field: &'static str,
    value: i64,
    min: i64,
    max: i64,
    expected: &'static str,
) -> Result<(), ValidationError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::OutOfRange {
            field,
            value: value.to_string(),
            expected,
        })
    }
}

fn check_finite(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ValidationError::NotFinite(field))
    }
}

impl SalesInput {
    /// Checks every field constraint, reporting the first violation.
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_int("transaction_qty", self.transaction_qty, 1, i64::MAX, ">= 1")?;
        check_finite("unit_price", self.unit_price)?;
        if self.unit_price <= 0.0 {
            return Err(ValidationError::OutOfRange {
                field: "unit_price",
                value: self.unit_price.to_string(),
                expected: "> 0",
            });
        }
        check_int("month", self.month, 1, 12, "1..=12")?;
        check_int("day", self.day, 1, 31, "1..=31")?;
        check_int("day_of_week", self.day_of_week, 0, 6, "0..=6")?;
        check_int("is_weekend", self.is_weekend, 0, 1, "0 or 1")?;
        check_finite("revenue_lag1", self.revenue_lag1)?;
        check_finite("revenue_lag7", self.revenue_lag7)?;
        check_finite("revenue_rolling3", self.revenue_rolling3)?;
        check_finite("revenue_rolling7", self.revenue_rolling7)?;
        check_int(
            "store_location_Hells_Kitchen",
            self.store_location_hells_kitchen,
            0,
            1,
            "0 or 1",
        )?;
        check_int(
            "store_location_Lower_Manhattan",
            self.store_location_lower_manhattan,
            0,
            1,
            "0 or 1",
        )?;
        Ok(())
    }

    /// Flattens into the string-keyed record the engine aligns.
    pub fn to_record(&self) -> InputRecord {
        [
            ("transaction_qty", self.transaction_qty as f64),
            ("unit_price", self.unit_price),
            ("month", self.month as f64),
            ("day", self.day as f64),
            ("day_of_week", self.day_of_week as f64),
            ("is_weekend", self.is_weekend as f64),
            ("revenue_lag1", self.revenue_lag1),
            ("revenue_lag7", self.revenue_lag7),
            ("revenue_rolling3", self.revenue_rolling3),
            ("revenue_rolling7", self.revenue_rolling7),
            (
                "store_location_Hells_Kitchen",
                self.store_location_hells_kitchen as f64,
            ),
            (
                "store_location_Lower_Manhattan",
                self.store_location_lower_manhattan as f64,
            ),
        ]
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect()
    }

    /// Validates, then flattens.
    pub fn into_validated_record(self) -> Result<InputRecord, ValidationError> {
        self.validate()?;
        Ok(self.to_record())
    }
}
