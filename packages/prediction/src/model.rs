//! Model boundary.
//!
//! The trained model is a black box that scores batches of `(6, 1)`
//! single-channel sequences. [`SequenceModel`] is the contract the engine
//! depends on; [`ExportedModel`] is the on-disk artifact produced by the
//! training export.

use std::sync::Mutex;

use crime_forecast_prediction_models::FEATURE_COUNT;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

use crate::{ArtifactError, PredictionError};

/// One model input sample: six time steps with one channel each.
pub type ModelInput = [[f64; 1]; FEATURE_COUNT];

/// A model that can be shared across threads and called concurrently.
pub trait SequenceModel: Send + Sync {
    /// Scores a batch of shape `(N, 6, 1)`, returning one score per sample.
    ///
    /// # Errors
    ///
    /// Returns [`PredictionError::ModelInference`] if the model cannot run.
    fn predict(&self, batch: &[ModelInput]) -> Result<Vec<f64>, PredictionError>;
}

/// A model whose inference mutates internal state (scratch buffers, a
/// runtime session handle) and therefore cannot be called concurrently.
///
/// Wrap it in [`Serialized`] to use it as a [`SequenceModel`].
pub trait StatefulModel: Send {
    /// Scores a batch of shape `(N, 6, 1)`.
    ///
    /// # Errors
    ///
    /// Returns [`PredictionError::ModelInference`] if the model cannot run.
    fn predict_mut(&mut self, batch: &[ModelInput]) -> Result<Vec<f64>, PredictionError>;
}

/// Serializes access to a [`StatefulModel`] behind a `Mutex`.
pub struct Serialized<M> {
    inner: Mutex<M>,
}

impl<M> Serialized<M> {
    /// Wraps `model`.
    #[must_use]
    pub const fn new(model: M) -> Self {
        Self {
            inner: Mutex::new(model),
        }
    }
}

impl<M: StatefulModel> SequenceModel for Serialized<M> {
    fn predict(&self, batch: &[ModelInput]) -> Result<Vec<f64>, PredictionError> {
        let mut model = self
            .inner
            .lock()
            .map_err(|_| PredictionError::ModelInference {
                message: "model mutex poisoned".to_string(),
            })?;
        model.predict_mut(batch)
    }
}

/// A model backed by a plain scoring function, applied per sample.
///
/// Useful for embedding a hand-written scorer and for tests.
pub struct FnModel<F>(pub F);

impl<F> SequenceModel for FnModel<F>
where
    F: Fn(&ModelInput) -> f64 + Send + Sync,
{
    fn predict(&self, batch: &[ModelInput]) -> Result<Vec<f64>, PredictionError> {
        Ok(batch.iter().map(&self.0).collect())
    }
}

/// Output activation applied to the exported model's linear head.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Activation {
    /// Identity.
    #[default]
    Linear,
    /// `max(0, x)`.
    Relu,
    /// Logistic sigmoid.
    Sigmoid,
}

impl Activation {
    /// Applies the activation to `x`.
    #[must_use]
    pub fn apply(self, x: f64) -> f64 {
        match self {
            Self::Linear => x,
            Self::Relu => x.max(0.0),
            Self::Sigmoid => 1.0 / (1.0 + (-x).exp()),
        }
    }
}

/// The exported inference head of the trained sequence model.
///
/// Stored as JSON:
///
/// ```json
/// {
///   "input_shape": [6, 1],
///   "weights": [[0.1], [0.2], [0.0], [0.0], [0.05], [0.01]],
///   "bias": 0.3,
///   "activation": "relu"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportedModel {
    /// Per-sample input shape; must be `[6, 1]`.
    pub input_shape: [usize; 2],
    /// One weight row per time step, one column per channel.
    pub weights: Vec<[f64; 1]>,
    /// Output bias.
    pub bias: f64,
    /// Output activation.
    #[serde(default)]
    pub activation: Activation,
}

impl ExportedModel {
    /// Checks that the artifact matches the `(6, 1)` input contract.
    ///
    /// # Errors
    ///
    /// Returns [`ArtifactError::InvalidModel`] on a shape mismatch or a
    /// non-finite parameter.
    pub fn validate(self) -> Result<Self, ArtifactError> {
        if self.input_shape != [FEATURE_COUNT, 1] {
            return Err(ArtifactError::InvalidModel {
                message: format!(
                    "expected input shape [{FEATURE_COUNT}, 1], found {:?}",
                    self.input_shape
                ),
            });
        }
        if self.weights.len() != FEATURE_COUNT {
            return Err(ArtifactError::InvalidModel {
                message: format!(
                    "expected {FEATURE_COUNT} weight rows, found {}",
                    self.weights.len()
                ),
            });
        }
        if !self.bias.is_finite() || self.weights.iter().flatten().any(|w| !w.is_finite()) {
            return Err(ArtifactError::InvalidModel {
                message: "non-finite parameter".to_string(),
            });
        }
        Ok(self)
    }

    fn score(&self, sample: &ModelInput) -> f64 {
        let sum: f64 = self
            .weights
            .iter()
            .zip(sample)
            .map(|(weight, step)| weight[0] * step[0])
            .sum();
        self.activation.apply(self.bias + sum)
    }
}

impl SequenceModel for ExportedModel {
    fn predict(&self, batch: &[ModelInput]) -> Result<Vec<f64>, PredictionError> {
        Ok(batch.iter().map(|sample| self.score(sample)).collect())
    }
}
