#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the crime forecast server.
//!
//! These types are serialized to JSON for the REST API. They are separate
//! from the prediction types so the wire contract can evolve independently.
//! Prediction payloads keep the `snake_case` field names the charting
//! frontend already reads (`crime_type`, `crime_rate`).

use chrono::NaiveDate;
use crime_forecast_prediction_models::DailySeriesPoint;
use serde::{Deserialize, Serialize};

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Whether the server is running.
    pub healthy: bool,
    /// Whether the model and vocabularies loaded at startup.
    pub model_loaded: bool,
    /// Server version.
    pub version: String,
}

/// JSON body of `POST /api/predict`.
///
/// Date and time arrive combined as `"YYYY-MM-DD HH:MM"`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PredictJsonBody {
    /// Location label.
    pub location: Option<String>,
    /// Combined date and time.
    pub datetime: Option<String>,
    /// Crime type label.
    pub crime_type: Option<String>,
}

/// Form body of `POST /api/predict`, as posted by the prediction form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PredictForm {
    /// Location label.
    pub area: Option<String>,
    /// Date as `YYYY-MM-DD`.
    pub date: Option<String>,
    /// Time as `HH:MM`.
    pub time: Option<String>,
    /// Crime type label.
    pub crime: Option<String>,
}

/// One day of the trailing series as returned by the API.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ApiDailyPoint {
    /// Day of the prediction (`YYYY-MM-DD`).
    pub date: NaiveDate,
    /// Scaled crime rate for that day.
    pub crime_rate: f64,
}

impl From<DailySeriesPoint> for ApiDailyPoint {
    fn from(point: DailySeriesPoint) -> Self {
        Self {
            date: point.date,
            crime_rate: point.crime_rate,
        }
    }
}

/// Successful response of `POST /api/predict`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiPrediction {
    /// Always `true`.
    pub success: bool,
    /// Crime type the prediction is for.
    pub crime: String,
    /// Location the prediction is for.
    pub location: String,
    /// Requested date.
    pub date: String,
    /// Requested time.
    pub time: String,
    /// Model score for the requested date and time.
    pub prediction: f64,
    /// Trailing daily series ending the day before `date`.
    pub daily: Vec<ApiDailyPoint>,
}

/// Error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Always `false`.
    pub success: bool,
    /// Message suitable for direct display.
    pub message: String,
    /// Machine-readable error kind, when the error came from the pipeline.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

impl ApiError {
    /// Creates an error body with no kind.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            kind: None,
        }
    }

    /// Attaches a machine-readable kind.
    #[must_use]
    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }
}

/// Known labels for each categorical input.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiVocabulary {
    /// Location labels in code order.
    pub locations: Vec<String>,
    /// Crime type labels in code order.
    pub crime_types: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prediction_uses_snake_case_series_fields() {
        let body = ApiPrediction {
            success: true,
            crime: "Theft".to_string(),
            location: "Harbor".to_string(),
            date: "2023-06-15".to_string(),
            time: "14:30".to_string(),
            prediction: 0.25,
            daily: vec![ApiDailyPoint::from(DailySeriesPoint {
                date: NaiveDate::from_ymd_opt(2023, 6, 14).unwrap(),
                crime_rate: 25.0,
            })],
        };

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["daily"][0]["date"], "2023-06-14");
        assert_eq!(json["daily"][0]["crime_rate"], 25.0);
        assert_eq!(json["prediction"], 0.25);
    }

    #[test]
    fn error_kind_is_omitted_when_absent() {
        let json = serde_json::to_value(ApiError::new("Missing input data.")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "success": false, "message": "Missing input data." })
        );

        let json = serde_json::to_value(ApiError::new("x").with_kind("UNKNOWN_CATEGORY")).unwrap();
        assert_eq!(json["kind"], "UNKNOWN_CATEGORY");
    }
}
