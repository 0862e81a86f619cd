//! Artifact discovery and loading.
//!
//! Training produces three files that live together in a model directory:
//! the exported model and one vocabulary per categorical dimension. File
//! names can be overridden with an optional `manifest.toml` in the same
//! directory:
//!
//! ```toml
//! model_file = "crime_rate_model.json"
//! location_encoder_file = "location_encoder.json"
//! crime_encoder_file = "crime_encoder.json"
//! window_days = 30
//! ```

use std::path::{Path, PathBuf};

use crime_forecast_prediction_models::{CategoryDimension, DEFAULT_WINDOW_DAYS, MAX_WINDOW_DAYS};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::ArtifactError;
use crate::encoder::CategoricalEncoder;
use crate::model::ExportedModel;

/// Environment variable naming the model directory.
pub const MODEL_DIR_ENV: &str = "CRIME_FORECAST_MODEL_DIR";

/// Model directory used when [`MODEL_DIR_ENV`] is unset.
pub const DEFAULT_MODEL_DIR: &str = "./model";

/// Name of the optional manifest inside the model directory.
pub const MANIFEST_FILE: &str = "manifest.toml";

/// Contents of `manifest.toml`. Every key is optional.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ArtifactManifest {
    /// Exported model file name.
    pub model_file: String,
    /// Location vocabulary file name.
    pub location_encoder_file: String,
    /// Crime type vocabulary file name.
    pub crime_encoder_file: String,
    /// Number of days in a trailing series.
    pub window_days: u32,
}

impl Default for ArtifactManifest {
    fn default() -> Self {
        Self {
            model_file: "crime_rate_model.json".to_string(),
            location_encoder_file: "location_encoder.json".to_string(),
            crime_encoder_file: "crime_encoder.json".to_string(),
            window_days: DEFAULT_WINDOW_DAYS,
        }
    }
}

/// Where to find the artifacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactConfig {
    /// Directory holding the artifacts.
    pub model_dir: PathBuf,
    /// File names and series settings.
    pub manifest: ArtifactManifest,
}

impl ArtifactConfig {
    /// Resolves the model directory from [`MODEL_DIR_ENV`] (falling back to
    /// [`DEFAULT_MODEL_DIR`]) and reads its manifest.
    ///
    /// # Errors
    ///
    /// Returns [`ArtifactError`] if a manifest exists but cannot be read or
    /// parsed.
    pub fn from_env() -> Result<Self, ArtifactError> {
        let model_dir =
            std::env::var(MODEL_DIR_ENV).unwrap_or_else(|_| DEFAULT_MODEL_DIR.to_string());
        Self::from_dir(model_dir)
    }

    /// Uses `model_dir`, reading `manifest.toml` from it when present.
    ///
    /// # Errors
    ///
    /// Returns [`ArtifactError`] if a manifest exists but cannot be read or
    /// parsed, or if its `window_days` exceeds [`MAX_WINDOW_DAYS`].
    pub fn from_dir(model_dir: impl Into<PathBuf>) -> Result<Self, ArtifactError> {
        let model_dir = model_dir.into();
        let manifest_path = model_dir.join(MANIFEST_FILE);

        let manifest: ArtifactManifest = if manifest_path.exists() {
            let text = read(&manifest_path)?;
            toml::from_str(&text).map_err(|source| ArtifactError::Manifest {
                path: manifest_path.clone(),
                source,
            })?
        } else {
            ArtifactManifest::default()
        };

        if manifest.window_days > MAX_WINDOW_DAYS {
            return Err(ArtifactError::InvalidWindow {
                window_days: manifest.window_days,
            });
        }

        Ok(Self {
            model_dir,
            manifest,
        })
    }

    /// Path of the exported model.
    #[must_use]
    pub fn model_path(&self) -> PathBuf {
        self.model_dir.join(&self.manifest.model_file)
    }

    /// Path of the vocabulary for `dimension`.
    #[must_use]
    pub fn encoder_path(&self, dimension: CategoryDimension) -> PathBuf {
        match dimension {
            CategoryDimension::Location => {
                self.model_dir.join(&self.manifest.location_encoder_file)
            }
            CategoryDimension::CrimeType => self.model_dir.join(&self.manifest.crime_encoder_file),
        }
    }

    /// Number of days in a trailing series.
    #[must_use]
    pub const fn window_days(&self) -> u32 {
        self.manifest.window_days
    }
}

/// On-disk vocabulary format: the fitted class list in code order.
#[derive(Debug, Deserialize)]
struct VocabularyArtifact {
    classes: Vec<String>,
}

/// Everything needed to build a ready engine.
#[derive(Debug, Clone)]
pub struct Artifacts {
    /// Exported model, already validated.
    pub model: ExportedModel,
    /// Location vocabulary.
    pub locations: CategoricalEncoder,
    /// Crime type vocabulary.
    pub crime_types: CategoricalEncoder,
}

/// Loads the model and both vocabularies.
///
/// # Errors
///
/// Returns the first [`ArtifactError`] encountered.
pub fn load_artifacts(config: &ArtifactConfig) -> Result<Artifacts, ArtifactError> {
    let model: ExportedModel = read_json(&config.model_path())?;
    let model = model.validate()?;

    let locations = load_vocabulary(config, CategoryDimension::Location)?;
    let crime_types = load_vocabulary(config, CategoryDimension::CrimeType)?;

    Ok(Artifacts {
        model,
        locations,
        crime_types,
    })
}

fn load_vocabulary(
    config: &ArtifactConfig,
    dimension: CategoryDimension,
) -> Result<CategoricalEncoder, ArtifactError> {
    let artifact: VocabularyArtifact = read_json(&config.encoder_path(dimension))?;
    CategoricalEncoder::from_classes(dimension, artifact.classes)
}

fn read(path: &Path) -> Result<String, ArtifactError> {
    std::fs::read_to_string(path).map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ArtifactError> {
    let text = read(path)?;
    serde_json::from_str(&text).map_err(|source| ArtifactError::Json {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use crime_forecast_prediction_models::PredictionRequest;

    use super::*;
    use crate::{PredictionEngine, PredictionError};

    const MODEL_JSON: &str = r#"{
        "input_shape": [6, 1],
        "weights": [[0.01], [0.02], [0.0], [0.001], [0.005], [0.002]],
        "bias": 0.1,
        "activation": "relu"
    }"#;

    fn write_artifacts(dir: &Path) {
        let _ = std::fs::remove_dir_all(dir);
        std::fs::create_dir_all(dir).unwrap();
        std::fs::write(dir.join("crime_rate_model.json"), MODEL_JSON).unwrap();
        std::fs::write(
            dir.join("location_encoder.json"),
            r#"{"classes": ["Downtown", "Harbor", "Uptown"]}"#,
        )
        .unwrap();
        std::fs::write(
            dir.join("crime_encoder.json"),
            r#"{"classes": ["Assault", "Burglary", "Theft"]}"#,
        )
        .unwrap();
    }

    #[test]
    fn loads_artifacts_with_default_names() {
        let tmp = std::env::temp_dir().join("crime_forecast_artifacts_default");
        write_artifacts(&tmp);

        let config = ArtifactConfig::from_dir(&tmp).unwrap();
        assert_eq!(config.manifest, ArtifactManifest::default());
        assert_eq!(config.window_days(), 30);

        let engine = PredictionEngine::load(&config);
        assert!(engine.is_available());

        let result = engine
            .predict(&PredictionRequest::new(
                "2023-06-15",
                "14:30",
                "Harbor",
                "Theft",
            ))
            .unwrap();
        // relu(0.1 + 0.01*1 + 0.02*2 + 0.001*15 + 0.005*3 + 0.002*14)
        assert!((result.value - 0.208).abs() < 1e-9, "{}", result.value);

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn manifest_overrides_names_and_window() {
        let tmp = std::env::temp_dir().join("crime_forecast_artifacts_manifest");
        write_artifacts(&tmp);
        std::fs::rename(tmp.join("crime_rate_model.json"), tmp.join("v2.json")).unwrap();
        std::fs::write(
            tmp.join(MANIFEST_FILE),
            "model_file = \"v2.json\"\nwindow_days = 7\n",
        )
        .unwrap();

        let config = ArtifactConfig::from_dir(&tmp).unwrap();
        assert_eq!(config.model_path(), tmp.join("v2.json"));
        assert_eq!(
            config.encoder_path(CategoryDimension::Location),
            tmp.join("location_encoder.json")
        );
        assert_eq!(config.window_days(), 7);
        assert!(PredictionEngine::load(&config).is_available());

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn invalid_manifest_is_an_error() {
        let tmp = std::env::temp_dir().join("crime_forecast_artifacts_bad_manifest");
        let _ = std::fs::remove_dir_all(&tmp);
        std::fs::create_dir_all(&tmp).unwrap();
        std::fs::write(tmp.join(MANIFEST_FILE), "window_days = \"thirty\"\n").unwrap();

        assert!(matches!(
            ArtifactConfig::from_dir(&tmp),
            Err(ArtifactError::Manifest { .. })
        ));

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn oversized_manifest_window_is_an_error() {
        let tmp = std::env::temp_dir().join("crime_forecast_artifacts_big_window");
        write_artifacts(&tmp);
        std::fs::write(tmp.join(MANIFEST_FILE), "window_days = 4294967295\n").unwrap();

        assert!(matches!(
            ArtifactConfig::from_dir(&tmp),
            Err(ArtifactError::InvalidWindow {
                window_days: u32::MAX
            })
        ));

        std::fs::write(
            tmp.join(MANIFEST_FILE),
            format!("window_days = {MAX_WINDOW_DAYS}\n"),
        )
        .unwrap();
        assert_eq!(
            ArtifactConfig::from_dir(&tmp).unwrap().window_days(),
            MAX_WINDOW_DAYS
        );

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn missing_model_file_makes_engine_unavailable() {
        let tmp = std::env::temp_dir().join("crime_forecast_artifacts_missing");
        let _ = std::fs::remove_dir_all(&tmp);
        std::fs::create_dir_all(&tmp).unwrap();

        let engine = PredictionEngine::load(&ArtifactConfig::from_dir(&tmp).unwrap());
        assert!(!engine.is_available());
        assert!(matches!(
            engine.predict(&PredictionRequest::new("2023-06-15", "14:30", "A", "B")),
            Err(PredictionError::ModelUnavailable { .. })
        ));

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn broken_encoder_makes_engine_unavailable() {
        let tmp = std::env::temp_dir().join("crime_forecast_artifacts_broken_encoder");
        write_artifacts(&tmp);
        std::fs::write(
            tmp.join("crime_encoder.json"),
            r#"{"classes": ["Theft", "Theft"]}"#,
        )
        .unwrap();

        let config = ArtifactConfig::from_dir(&tmp).unwrap();
        assert!(matches!(
            load_artifacts(&config),
            Err(ArtifactError::InvalidVocabulary {
                dimension: CategoryDimension::CrimeType,
                ..
            })
        ));
        assert!(!PredictionEngine::load(&config).is_available());

        std::fs::remove_file(tmp.join("location_encoder.json")).unwrap();
        assert!(matches!(
            load_artifacts(&config),
            Err(ArtifactError::Io { .. })
        ));

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn wrong_model_shape_is_rejected() {
        let tmp = std::env::temp_dir().join("crime_forecast_artifacts_bad_shape");
        write_artifacts(&tmp);
        std::fs::write(
            tmp.join("crime_rate_model.json"),
            r#"{"input_shape": [30, 1], "weights": [[1.0]], "bias": 0.0}"#,
        )
        .unwrap();

        let config = ArtifactConfig::from_dir(&tmp).unwrap();
        assert!(matches!(
            load_artifacts(&config),
            Err(ArtifactError::InvalidModel { .. })
        ));

        std::fs::write(tmp.join("crime_rate_model.json"), "not json").unwrap();
        assert!(matches!(
            load_artifacts(&config),
            Err(ArtifactError::Json { .. })
        ));

        let _ = std::fs::remove_dir_all(&tmp);
    }
}
