#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Prediction request, feature vector, and daily series types.
//!
//! These are the plain data types that flow through the crime-rate
//! prediction pipeline. They carry no behavior beyond shape conversions so
//! that the server, CLI, and prediction engine can share them freely.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Number of fields in a [`FeatureVector`] (and time steps in the model
/// input sequence).
pub const FEATURE_COUNT: usize = 6;

/// Number of days covered by a trailing series unless configured otherwise.
pub const DEFAULT_WINDOW_DAYS: u32 = 30;

/// Largest accepted trailing series window, in days.
pub const MAX_WINDOW_DAYS: u32 = 3660;

/// A categorical input dimension the model was trained on.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
pub enum CategoryDimension {
    /// Area or neighborhood name.
    #[strum(serialize = "location")]
    Location,
    /// Crime type label (e.g. `"Burglary"`).
    #[strum(serialize = "crime type")]
    CrimeType,
}

impl CategoryDimension {
    /// Capitalized name used at the start of user-facing messages.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Location => "Location",
            Self::CrimeType => "Crime type",
        }
    }

    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Location, Self::CrimeType]
    }
}

/// A normalized single-point prediction request.
///
/// Date and time are kept as the raw strings the caller supplied; they are
/// validated when the feature vector is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionRequest {
    /// Calendar date as `YYYY-MM-DD`.
    pub date: String,
    /// Time of day as `HH:MM` (24-hour).
    pub time: String,
    /// Location label from the location vocabulary.
    pub location: String,
    /// Crime type label from the crime type vocabulary.
    pub crime_type: String,
}

impl PredictionRequest {
    /// Creates a request from its four components.
    #[must_use]
    pub fn new(
        date: impl Into<String>,
        time: impl Into<String>,
        location: impl Into<String>,
        crime_type: impl Into<String>,
    ) -> Self {
        Self {
            date: date.into(),
            time: time.into(),
            location: location.into(),
            crime_type: crime_type.into(),
        }
    }

    /// Returns a copy of this request with the date replaced.
    #[must_use]
    pub fn with_date(&self, date: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            ..self.clone()
        }
    }
}

/// The numeric encoding of one prediction request.
///
/// Field order is the order the model was trained on:
/// `[location, crime type, month, day, weekday, hour]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureVector {
    /// Location vocabulary code.
    pub location_code: u32,
    /// Crime type vocabulary code.
    pub crime_type_code: u32,
    /// Month of year, 1-12.
    pub month: u32,
    /// Day of month, 1-31.
    pub day: u32,
    /// Weekday index, 0 = Monday through 6 = Sunday.
    pub weekday: u32,
    /// Hour of day, 0-23.
    pub hour: u32,
}

impl FeatureVector {
    /// Returns the fields in model order.
    #[must_use]
    pub fn to_array(&self) -> [f64; FEATURE_COUNT] {
        [
            f64::from(self.location_code),
            f64::from(self.crime_type_code),
            f64::from(self.month),
            f64::from(self.day),
            f64::from(self.weekday),
            f64::from(self.hour),
        ]
    }

    /// Returns this vector as one `(6, 1)` single-channel sample.
    #[must_use]
    pub fn as_model_input(&self) -> [[f64; 1]; FEATURE_COUNT] {
        self.to_array().map(|value| [value])
    }
}

/// The model's score for one request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Predicted crime rate as returned by the model.
    pub value: f64,
}

/// One day of a trailing series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailySeriesPoint {
    /// The day this point was predicted for.
    pub date: NaiveDate,
    /// Model score for that day, scaled by 100 for display.
    pub crime_rate: f64,
}

/// A trailing series of daily predictions in ascending date order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailySeries {
    /// One point per day, oldest first.
    pub points: Vec<DailySeriesPoint>,
}
