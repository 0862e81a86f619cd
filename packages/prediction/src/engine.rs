//! Single-point crime-rate prediction.

use crime_forecast_prediction_models::{
    CategoryDimension, DEFAULT_WINDOW_DAYS, DailySeries, PredictionRequest, PredictionResult,
};

use crate::artifacts::{self, ArtifactConfig};
use crate::encoder::CategoricalEncoder;
use crate::model::SequenceModel;
use crate::{PredictionError, features, series};

/// Model and vocabularies, present only when every artifact loaded.
struct Loaded {
    model: Box<dyn SequenceModel>,
    locations: CategoricalEncoder,
    crime_types: CategoricalEncoder,
}

/// Owns the trained model and its vocabularies.
///
/// Built once at startup and shared read-only. An engine whose artifacts
/// failed to load still exists, but every call on it fails with
/// [`PredictionError::ModelUnavailable`] before looking at its inputs.
pub struct PredictionEngine {
    state: Result<Loaded, String>,
}

impl PredictionEngine {
    /// Creates a ready engine.
    #[must_use]
    pub fn new(
        model: impl SequenceModel + 'static,
        locations: CategoricalEncoder,
        crime_types: CategoricalEncoder,
    ) -> Self {
        Self {
            state: Ok(Loaded {
                model: Box::new(model),
                locations,
                crime_types,
            }),
        }
    }

    /// Creates an engine that rejects every call.
    #[must_use]
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            state: Err(reason.into()),
        }
    }

    /// Loads the model and vocabularies described by `config`.
    ///
    /// Never fails: a missing model file or a broken artifact is logged and
    /// produces an unavailable engine.
    #[must_use]
    pub fn load(config: &ArtifactConfig) -> Self {
        let model_path = config.model_path();
        if !model_path.exists() {
            log::warn!(
                "Model file {} not found; predictions are disabled",
                model_path.display()
            );
            return Self::unavailable(format!("{} not found", model_path.display()));
        }

        match artifacts::load_artifacts(config) {
            Ok(loaded) => {
                log::info!(
                    "Loaded model from {} ({} locations, {} crime types)",
                    model_path.display(),
                    loaded.locations.len(),
                    loaded.crime_types.len()
                );
                Self::new(loaded.model, loaded.locations, loaded.crime_types)
            }
            Err(e) => {
                log::error!("Failed to load prediction artifacts: {e}");
                Self::unavailable(e.to_string())
            }
        }
    }

    /// Whether the model and both vocabularies are loaded.
    #[must_use]
    pub const fn is_available(&self) -> bool {
        self.state.is_ok()
    }

    /// Fails with [`PredictionError::ModelUnavailable`] unless the engine is
    /// ready.
    ///
    /// # Errors
    ///
    /// Returns [`PredictionError::ModelUnavailable`] if artifacts failed to
    /// load.
    pub fn ensure_available(&self) -> Result<(), PredictionError> {
        self.loaded().map(|_| ())
    }

    fn loaded(&self) -> Result<&Loaded, PredictionError> {
        self.state
            .as_ref()
            .map_err(|reason| PredictionError::ModelUnavailable {
                reason: reason.clone(),
            })
    }

    /// Returns the vocabulary for `dimension`.
    ///
    /// # Errors
    ///
    /// Returns [`PredictionError::ModelUnavailable`] if artifacts failed to
    /// load.
    pub fn vocabulary(
        &self,
        dimension: CategoryDimension,
    ) -> Result<&CategoricalEncoder, PredictionError> {
        let loaded = self.loaded()?;
        Ok(match dimension {
            CategoryDimension::Location => &loaded.locations,
            CategoryDimension::CrimeType => &loaded.crime_types,
        })
    }

    /// Predicts the crime rate for one request.
    ///
    /// Checks run in order: availability, timestamp, location, crime type.
    ///
    /// # Errors
    ///
    /// * [`PredictionError::ModelUnavailable`] if artifacts failed to load
    /// * [`PredictionError::InvalidTimestamp`] if the date or time is malformed
    /// * [`PredictionError::UnknownCategory`] if a label is not in its vocabulary
    /// * [`PredictionError::ModelInference`] if the model gives no finite,
    ///   non-negative score
    pub fn predict(
        &self,
        request: &PredictionRequest,
    ) -> Result<PredictionResult, PredictionError> {
        let loaded = self.loaded()?;

        let timestamp = features::parse_timestamp(&request.date, &request.time)?;
        let location_code = loaded.locations.encode(&request.location)?;
        let crime_type_code = loaded.crime_types.encode(&request.crime_type)?;
        let features = features::features_at(timestamp, location_code, crime_type_code);

        let scores = loaded.model.predict(&[features.as_model_input()])?;
        let value = scores
            .first()
            .copied()
            .ok_or_else(|| PredictionError::ModelInference {
                message: "model returned no score".to_string(),
            })?;
        if !value.is_finite() {
            return Err(PredictionError::ModelInference {
                message: format!("model returned non-finite score {value}"),
            });
        }
        if value < 0.0 {
            return Err(PredictionError::ModelInference {
                message: format!("model returned negative score {value}"),
            });
        }

        log::debug!("predict: {request:?} features={features:?} value={value}");

        Ok(PredictionResult { value })
    }

    /// Predicts the trailing daily series ending before `request.date`,
    /// covering [`DEFAULT_WINDOW_DAYS`] days.
    ///
    /// # Errors
    ///
    /// Fails with the first per-day error; see
    /// [`series::generate_trailing_series`].
    pub fn daily_series(
        &self,
        request: &PredictionRequest,
    ) -> Result<DailySeries, PredictionError> {
        series::generate_trailing_series(self, request, DEFAULT_WINDOW_DAYS)
    }
}
