//! Classifier wrapper enforcing the model's input contract.

use crate::error::{Error, Result};
use crate::inference::scaler::ScaledFeatureVector;
use crate::inference::scorer::{ClassProbabilities, Scorer};

/// Frog species classifier over an injectable scoring backend.
pub struct FrogClassifier {
    scorer: Box<dyn Scorer>,
    n_features: usize,
}

impl FrogClassifier {
    /// Wraps a scorer that expects `n_features` inputs.
    pub fn new(scorer: Box<dyn Scorer>, n_features: usize) -> Self {
        Self { scorer, n_features }
    }

    /// Number of features the model consumes.
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Backend name used in logs.
    pub fn scorer_name(&self) -> &'static str {
        self.scorer.name()
    }

    /// Scores one scaled vector into a validated class distribution.
    ///
    /// A vector of the wrong length is a model contract violation, reported
    /// as [`Error::Inference`]; callers validate user input earlier.
    pub fn classify(&self, features: &ScaledFeatureVector) -> Result<ClassProbabilities> {
        if features.len() != self.n_features {
            return Err(Error::Inference {
                reason: format!(
                    "classifier expects {} features, got {}",
                    self.n_features,
                    features.len()
                ),
            });
        }
        self.scorer.score(features)
    }
}
