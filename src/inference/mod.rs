//! Feature scaling, scoring, and ranking.

mod artifacts;
mod classifier;
mod labels;
mod ranker;
mod scaler;
mod scorer;

pub use artifacts::{ArtifactSet, load_artifacts};
pub use classifier::FrogClassifier;
pub use labels::load_labels;
pub use ranker::{Ranker, SpeciesScore};
pub use scaler::{ScaledFeatureVector, Scaler};
pub use scorer::{ClassProbabilities, OnnxScorer, Scorer, init_runtime};
