//! Feature standardization with parameters persisted at training time.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Standardized feature vector, ready for the classifier.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaledFeatureVector(Vec<f32>);

impl ScaledFeatureVector {
    /// Wraps already-standardized values.
    pub fn new(values: Vec<f32>) -> Self {
        Self(values)
    }

    /// An all-zero vector of the given length, used for warm-up scoring.
    pub fn zeros(len: usize) -> Self {
        Self(vec![0.0; len])
    }

    /// Values as a slice.
    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    /// Number of values.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the vector has no elements.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Per-column standardization parameters fitted on the training set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scaler {
    /// Artifact version, matched against the schema on load.
    pub version: String,
    mean: Vec<f32>,
    std: Vec<f32>,
}

impl Scaler {
    /// Builds a scaler from explicit parameters.
    pub fn new(version: impl Into<String>, mean: Vec<f32>, std: Vec<f32>) -> Result<Self> {
        let scaler = Self {
            version: version.into(),
            mean,
            std,
        };
        scaler.validate()?;
        Ok(scaler)
    }

    /// Loads and validates a scaler artifact from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::ArtifactNotFound {
                path: path.to_path_buf(),
            });
        }
        let raw = std::fs::read_to_string(path).map_err(|e| Error::ArtifactRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let scaler: Self = serde_json::from_str(&raw).map_err(|e| Error::ArtifactParse {
            path: path.to_path_buf(),
            source: e,
        })?;
        scaler.validate()?;
        Ok(scaler)
    }

    /// Number of feature columns the scaler covers.
    pub fn len(&self) -> usize {
        self.mean.len()
    }

    /// Whether the scaler has no columns.
    pub fn is_empty(&self) -> bool {
        self.mean.is_empty()
    }

    fn validate(&self) -> Result<()> {
        if self.mean.is_empty() {
            return Err(Error::ConfigMismatch {
                message: "scaler has no columns".to_string(),
            });
        }
        if self.mean.len() != self.std.len() {
            return Err(Error::ConfigMismatch {
                message: format!(
                    "scaler mean has {} columns but std has {}",
                    self.mean.len(),
                    self.std.len()
                ),
            });
        }
        for (i, (&m, &s)) in self.mean.iter().zip(&self.std).enumerate() {
            if !m.is_finite() || !s.is_finite() {
                return Err(Error::ConfigMismatch {
                    message: format!("scaler column {i} has a non-finite parameter"),
                });
            }
            if s < 0.0 {
                return Err(Error::ConfigMismatch {
                    message: format!("scaler column {i} has negative std {s}"),
                });
            }
        }
        Ok(())
    }

    /// Standardizes a raw feature vector element-wise.
    ///
    /// Columns with zero std (constant in training) pass through unscaled.
    pub fn transform(&self, features: &[f32]) -> Result<ScaledFeatureVector> {
        if features.len() != self.mean.len() {
            return Err(Error::Validation {
                message: format!(
                    "expected {} features, got {}",
                    self.mean.len(),
                    features.len()
                ),
            });
        }
        let scaled = features
            .iter()
            .zip(self.mean.iter().zip(&self.std))
            .map(|(&x, (&m, &s))| {
                let divisor = if s == 0.0 { 1.0 } else { s };
                (x - m) / divisor
            })
            .collect();
        Ok(ScaledFeatureVector::new(scaled))
    }
}
