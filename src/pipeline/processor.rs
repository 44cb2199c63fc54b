//! Single clip processing pipeline.
//!
//! Ties the stages together: decode, condition, select a window, enforce
//! duration, extract features, scale, classify, rank. Every stage is
//! deterministic, so the same bytes always produce the same prediction.

use crate::audio::{DecoderChain, Normalizer, WindowSelector, enforce_duration};
use crate::config::{Config, validate_config};
use crate::constants::probability;
use crate::error::{Error, Result};
use crate::features::FeatureExtractor;
use crate::inference::{
    ArtifactSet, ClassProbabilities, FrogClassifier, Ranker, Scaler, SpeciesScore, load_artifacts,
};
use crate::store::{Recorder, UploadRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

/// Non-fatal condition observed while a clip was processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Warning {
    /// The clip had no usable peak; normalization was skipped and the
    /// prediction is based on near-silent audio.
    DegenerateAudio,
}

/// Classification result for one clip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Best-scoring species label.
    pub species: String,

    /// Probability of the best-scoring species.
    pub confidence: f32,

    /// Top predictions in descending confidence order.
    pub ranking: Vec<SpeciesScore>,

    /// Full probability distribution over every known species.
    pub distribution: BTreeMap<String, f32>,

    /// Non-fatal conditions observed while processing.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<Warning>,
}

/// Fully assembled classification pipeline.
///
/// Construction loads and cross-checks every artifact, so a pipeline that
/// exists is ready to classify. The pipeline is immutable after
/// construction; classification takes `&self` and may run concurrently.
pub struct Pipeline {
    decoder: DecoderChain,
    normalizer: Normalizer,
    selector: WindowSelector,
    extractor: FeatureExtractor,
    scaler: Scaler,
    classifier: FrogClassifier,
    ranker: Ranker,
    recorder: Option<Recorder>,
    clip_samples: usize,
    sample_rate: u32,
}

// Debug is manual: several stages hold non-Debug state (trait objects,
// FFT plans, the recorder runtime).
impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("clip_samples", &self.clip_samples)
            .field("sample_rate", &self.sample_rate)
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    /// Build a pipeline from configuration, loading artifacts from disk.
    pub fn from_config(config: &Config) -> Result<Self> {
        validate_config(config)?;
        let artifacts = load_artifacts(config)?;
        Self::with_artifacts(config, artifacts)
    }

    /// Build a pipeline around an already-loaded artifact set.
    pub fn with_artifacts(config: &Config, artifacts: ArtifactSet) -> Result<Self> {
        validate_config(config)?;
        let ArtifactSet {
            schema,
            scaler,
            classifier,
        } = artifacts;

        if scaler.len() != schema.len() {
            return Err(Error::ConfigMismatch {
                message: format!(
                    "scaler covers {} columns, schema has {}",
                    scaler.len(),
                    schema.len()
                ),
            });
        }

        let extractor = FeatureExtractor::new(schema, config.audio.sample_rate)?;

        Ok(Self {
            decoder: DecoderChain::from_config(config),
            normalizer: Normalizer::from_config(&config.audio),
            selector: WindowSelector::from_config(config),
            extractor,
            scaler,
            classifier,
            ranker: Ranker::from_config(&config.inference),
            recorder: None,
            clip_samples: config.audio.clip_samples(),
            sample_rate: config.audio.sample_rate,
        })
    }

    /// Attach a persistence side channel for classified uploads.
    ///
    /// Each successful [`classify_bytes`](Self::classify_bytes) hands the
    /// submitted audio and its prediction to the recorder after the result
    /// is assembled; a store failure is logged, never surfaced.
    pub fn with_recorder(mut self, recorder: Recorder) -> Self {
        self.recorder = Some(recorder);
        self
    }

    /// Sample rate every clip is conditioned to, in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of samples in the clip the classifier sees.
    pub fn clip_samples(&self) -> usize {
        self.clip_samples
    }

    /// Classify an in-memory encoded clip.
    ///
    /// The hint may be the original filename, a bare extension, or a MIME
    /// type. A filename hint also participates in lead-in skip matching
    /// during window selection.
    pub fn classify_bytes(&self, bytes: &[u8], hint: Option<&str>) -> Result<Prediction> {
        let start = Instant::now();

        let raw = self.decoder.decode(bytes, hint)?;
        info!(
            "Decoded {:.1}s of {} audio at {} Hz",
            raw.duration_secs(),
            raw.source,
            raw.sample_rate
        );

        let waveform = self.normalizer.normalize(&raw)?;
        let mut warnings = Vec::new();
        if waveform.degenerate {
            warnings.push(Warning::DegenerateAudio);
        }

        let offset = self.selector.select(&waveform, hint);
        #[allow(clippy::cast_precision_loss)]
        let offset_secs = offset as f64 / f64::from(self.sample_rate);
        debug!(
            "Selected window at offset {:.1}s of {:.1}s audio",
            offset_secs,
            waveform.duration_secs()
        );

        let segment = enforce_duration(&waveform, offset, self.clip_samples);
        let features = self.extractor.extract(&segment)?;
        let scaled = self.scaler.transform(features.as_slice())?;
        let probabilities = self.classifier.classify(&scaled)?;
        let prediction = self.finish(probabilities, warnings)?;

        info!(
            "Classified as {} ({:.prec$}) in {:.2}s",
            prediction.species,
            prediction.confidence,
            start.elapsed().as_secs_f64(),
            prec = probability::DECIMAL_PLACES,
        );

        if let Some(recorder) = &self.recorder {
            // A MIME hint is not a filename and is not recorded as one.
            let original = hint.filter(|h| !h.contains('/'));
            recorder.record(UploadRecord::new(bytes.to_vec(), original, prediction.clone()));
        }
        Ok(prediction)
    }

    /// Classify an audio file, using its name as the decode hint.
    pub fn classify_file(&self, path: &Path) -> Result<Prediction> {
        info!("Processing: {}", path.display());
        let bytes = std::fs::read(path).map_err(|e| Error::AudioOpen {
            path: path.to_path_buf(),
            source: Box::new(e),
        })?;
        let hint = path.file_name().and_then(|n| n.to_str());
        self.classify_bytes(&bytes, hint)
    }

    /// Classify a caller-supplied raw feature vector.
    ///
    /// The vector must match the loaded schema in length and column
    /// order; scaling and classification proceed exactly as they would
    /// for extracted features.
    pub fn classify_features(&self, features: &[f32]) -> Result<Prediction> {
        let scaled = self.scaler.transform(features)?;
        let probabilities = self.classifier.classify(&scaled)?;
        self.finish(probabilities, Vec::new())
    }

    /// Rank a distribution and assemble the prediction.
    fn finish(
        &self,
        probabilities: ClassProbabilities,
        warnings: Vec<Warning>,
    ) -> Result<Prediction> {
        let ranking = self.ranker.rank(&probabilities);
        let top = ranking.first().cloned().ok_or_else(|| Error::Inference {
            reason: "ranking is empty".to_string(),
        })?;

        Ok(Prediction {
            species: top.species,
            confidence: top.confidence,
            ranking,
            distribution: probabilities.into_map(),
            warnings,
        })
    }
}
