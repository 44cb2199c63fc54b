//! Short-time analysis and the 26-component feature vector.

mod extractor;
mod mel;
mod schema;
mod spectral;
mod stft;
mod temporal;

pub use extractor::{FeatureExtractor, FeatureVector};
pub use schema::FeatureSchema;
pub use stft::{Spectrogram, StftAnalyzer};
