//! Orders a class distribution into a ranked species list.

use crate::config::InferenceConfig;
use crate::inference::scorer::ClassProbabilities;
use serde::{Deserialize, Serialize};

/// One ranked species with its confidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesScore {
    /// Species label.
    pub species: String,
    /// Calibrated probability in [0, 1].
    pub confidence: f32,
}

/// Truncating ranker over class distributions.
#[derive(Debug, Clone, Copy)]
pub struct Ranker {
    top_k: usize,
}

impl Ranker {
    /// Ranker keeping the `top_k` highest-confidence species.
    pub fn new(top_k: usize) -> Self {
        Self { top_k }
    }

    /// Ranker configured from the inference section.
    pub fn from_config(config: &InferenceConfig) -> Self {
        Self::new(config.top_k)
    }

    /// Ranks descending by confidence, ascending species label on ties,
    /// truncated to the configured depth.
    pub fn rank(&self, probabilities: &ClassProbabilities) -> Vec<SpeciesScore> {
        let mut scores: Vec<SpeciesScore> = probabilities
            .iter()
            .map(|(species, confidence)| SpeciesScore {
                species: species.to_string(),
                confidence,
            })
            .collect();
        scores.sort_by(|a, b| {
            b.confidence
                .total_cmp(&a.confidence)
                .then_with(|| a.species.cmp(&b.species))
        });
        scores.truncate(self.top_k);
        scores
    }
}
