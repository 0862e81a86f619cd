#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Crime-rate prediction pipeline.
//!
//! A [`PredictionEngine`] owns a pre-trained [`SequenceModel`] and the two
//! [`CategoricalEncoder`] vocabularies (location and crime type) it was
//! trained with. Each request is turned into a six-field
//! [`FeatureVector`](crime_forecast_prediction_models::FeatureVector) by the
//! [`features`] module and scored by the model. The [`series`] module drives
//! the engine over a trailing window of days for charting.
//!
//! Artifacts are loaded once at startup (see [`artifacts`]) and are
//! read-only afterwards, so a single engine can be shared across threads
//! behind an `Arc`.

pub mod artifacts;
pub mod encoder;
pub mod engine;
pub mod features;
pub mod model;
pub mod series;

use std::path::PathBuf;

use crime_forecast_prediction_models::{CategoryDimension, MAX_WINDOW_DAYS};
use serde::Serialize;
use strum_macros::{AsRefStr, Display, EnumString};
use thiserror::Error;

pub use encoder::CategoricalEncoder;
pub use engine::PredictionEngine;
pub use model::{ExportedModel, FnModel, SequenceModel, Serialized, StatefulModel};

/// Errors returned by prediction and series operations.
///
/// Every variant renders a message suitable for showing directly to the
/// person who made the request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PredictionError {
    /// The model or one of the encoders was not loaded at startup.
    #[error("Model or encoders not loaded.")]
    ModelUnavailable {
        /// Why loading failed, for logs.
        reason: String,
    },

    /// The date or time could not be parsed.
    #[error("Invalid date/time format. Use YYYY-MM-DD and HH:MM.")]
    InvalidTimestamp {
        /// The date as supplied.
        date: String,
        /// The time as supplied.
        time: String,
    },

    /// A label is not part of the vocabulary captured at training time.
    #[error("{} '{label}' not found in training data.", .dimension.title())]
    UnknownCategory {
        /// Which vocabulary was consulted.
        dimension: CategoryDimension,
        /// The offending label.
        label: String,
    },

    /// The model ran but did not produce a usable score.
    #[error("Model inference failed: {message}")]
    ModelInference {
        /// Description of what went wrong.
        message: String,
    },

    /// A trailing series window exceeds [`MAX_WINDOW_DAYS`] or reaches
    /// before the earliest representable date.
    #[error(
        "Series window of {window_days} days is out of range (at most {max}).",
        max = MAX_WINDOW_DAYS
    )]
    InvalidWindow {
        /// The requested window.
        window_days: u32,
    },
}

/// Stable, serializable discriminant of a [`PredictionError`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// See [`PredictionError::ModelUnavailable`].
    ModelUnavailable,
    /// See [`PredictionError::InvalidTimestamp`].
    InvalidTimestamp,
    /// See [`PredictionError::UnknownCategory`].
    UnknownCategory,
    /// See [`PredictionError::ModelInference`].
    ModelInference,
    /// See [`PredictionError::InvalidWindow`].
    InvalidWindow,
}

impl PredictionError {
    /// Returns the kind of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::ModelUnavailable { .. } => ErrorKind::ModelUnavailable,
            Self::InvalidTimestamp { .. } => ErrorKind::InvalidTimestamp,
            Self::UnknownCategory { .. } => ErrorKind::UnknownCategory,
            Self::ModelInference { .. } => ErrorKind::ModelInference,
            Self::InvalidWindow { .. } => ErrorKind::InvalidWindow,
        }
    }

    /// Whether the error was caused by the request's inputs rather than by
    /// the service.
    #[must_use]
    pub const fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidTimestamp { .. }
                | Self::UnknownCategory { .. }
                | Self::InvalidWindow { .. }
        )
    }
}

/// Errors that can occur while loading model and vocabulary artifacts.
#[derive(Debug, Error)]
pub enum ArtifactError {
    /// An artifact file could not be read.
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        /// File that was being read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// An artifact file is not valid JSON for its format.
    #[error("Failed to decode {}: {source}", .path.display())]
    Json {
        /// File that was being decoded.
        path: PathBuf,
        /// Underlying decode error.
        source: serde_json::Error,
    },

    /// The artifact manifest is not valid TOML for its format.
    #[error("Failed to parse manifest {}: {source}", .path.display())]
    Manifest {
        /// Manifest path.
        path: PathBuf,
        /// Underlying parse error.
        source: toml::de::Error,
    },

    /// A vocabulary artifact is empty or contains duplicate labels.
    #[error("Invalid {dimension} vocabulary: {message}")]
    InvalidVocabulary {
        /// Which vocabulary is invalid.
        dimension: CategoryDimension,
        /// Description of what went wrong.
        message: String,
    },

    /// The manifest's `window_days` exceeds [`MAX_WINDOW_DAYS`].
    #[error(
        "Invalid window_days {window_days} in manifest: at most {max} days",
        max = MAX_WINDOW_DAYS
    )]
    InvalidWindow {
        /// The configured window.
        window_days: u32,
    },

    /// The model artifact does not match the expected input contract.
    #[error("Invalid model artifact: {message}")]
    InvalidModel {
        /// Description of what went wrong.
        message: String,
    },
}
