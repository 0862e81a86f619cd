//! Categorical vocabulary encoding.
//!
//! A [`CategoricalEncoder`] is built once from the class list captured at
//! training time. The code of a label is its position in that list.

use std::collections::BTreeMap;

use crime_forecast_prediction_models::CategoryDimension;

use crate::{ArtifactError, PredictionError};

/// Maps the labels of one categorical dimension to stable integer codes.
#[derive(Debug, Clone)]
pub struct CategoricalEncoder {
    dimension: CategoryDimension,
    classes: Vec<String>,
    codes: BTreeMap<String, u32>,
}

impl CategoricalEncoder {
    /// Builds an encoder from an ordered class list.
    ///
    /// # Errors
    ///
    /// Returns [`ArtifactError::InvalidVocabulary`] if the list is empty,
    /// contains a duplicate label, or is too large to code.
    pub fn from_classes(
        dimension: CategoryDimension,
        classes: Vec<String>,
    ) -> Result<Self, ArtifactError> {
        if classes.is_empty() {
            return Err(ArtifactError::InvalidVocabulary {
                dimension,
                message: "no classes".to_string(),
            });
        }

        let mut codes = BTreeMap::new();
        for (index, label) in classes.iter().enumerate() {
            let code = u32::try_from(index).map_err(|_| ArtifactError::InvalidVocabulary {
                dimension,
                message: format!("too many classes ({})", classes.len()),
            })?;
            if codes.insert(label.clone(), code).is_some() {
                return Err(ArtifactError::InvalidVocabulary {
                    dimension,
                    message: format!("duplicate class '{label}'"),
                });
            }
        }

        Ok(Self {
            dimension,
            classes,
            codes,
        })
    }

    /// Returns the code for `label`.
    ///
    /// Matching is exact: no case folding or trimming.
    ///
    /// # Errors
    ///
    /// Returns [`PredictionError::UnknownCategory`] if `label` is not in the
    /// vocabulary.
    pub fn encode(&self, label: &str) -> Result<u32, PredictionError> {
        self.codes
            .get(label)
            .copied()
            .ok_or_else(|| PredictionError::UnknownCategory {
                dimension: self.dimension,
                label: label.to_string(),
            })
    }

    /// Returns the label for `code`, if it is in range.
    #[must_use]
    pub fn decode(&self, code: u32) -> Option<&str> {
        usize::try_from(code)
            .ok()
            .and_then(|index| self.classes.get(index))
            .map(String::as_str)
    }

    /// Whether `label` is part of the vocabulary.
    #[must_use]
    pub fn contains(&self, label: &str) -> bool {
        self.codes.contains_key(label)
    }

    /// Labels in code order.
    #[must_use]
    pub fn labels(&self) -> &[String] {
        &self.classes
    }

    /// The dimension this encoder covers.
    #[must_use]
    pub const fn dimension(&self) -> CategoryDimension {
        self.dimension
    }

    /// Number of labels in the vocabulary.
    #[must_use]
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Always `false` for a successfully built encoder.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}
