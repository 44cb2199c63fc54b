//! Configuration type definitions.

use crate::constants::{
    DEFAULT_CLIP_DURATION, DEFAULT_PEAK_LEVEL, DEFAULT_PRE_EMPHASIS, DEFAULT_SAMPLE_RATE,
    DEFAULT_TOP_K, DEFAULT_TRIM_THRESHOLD_DB, artifacts, fallback, selection,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Complete application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Model artifact locations.
    #[serde(default)]
    pub artifacts: ArtifactsConfig,

    /// Audio conditioning settings.
    #[serde(default)]
    pub audio: AudioConfig,

    /// Decoder chain settings.
    #[serde(default)]
    pub decoder: DecoderConfig,

    /// Analysis window selection settings.
    #[serde(default)]
    pub selection: SelectionConfig,

    /// Inference settings.
    #[serde(default)]
    pub inference: InferenceConfig,
}

/// Locations of the matched artifact set produced by training.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactsConfig {
    /// Directory holding the artifact files.
    pub dir: PathBuf,

    /// Feature schema file name within `dir`.
    pub schema: String,

    /// Scaler parameters file name within `dir`.
    pub scaler: String,

    /// Class label list file name within `dir`.
    pub labels: String,

    /// Classifier model file name within `dir`.
    pub model: String,

    /// Optional version pin; when set, the schema and scaler artifacts
    /// must carry exactly this version.
    pub version: Option<String>,

    /// Optional path to the ONNX Runtime dynamic library.
    ///
    /// Falls back to the `ORT_DYLIB_PATH` environment variable when unset.
    pub runtime_dylib: Option<PathBuf>,
}

impl Default for ArtifactsConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("model"),
            schema: artifacts::SCHEMA.to_string(),
            scaler: artifacts::SCALER.to_string(),
            labels: artifacts::LABELS.to_string(),
            model: artifacts::MODEL.to_string(),
            version: None,
            runtime_dylib: None,
        }
    }
}

impl ArtifactsConfig {
    /// Full path to the feature schema file.
    pub fn schema_path(&self) -> PathBuf {
        self.dir.join(&self.schema)
    }

    /// Full path to the scaler parameters file.
    pub fn scaler_path(&self) -> PathBuf {
        self.dir.join(&self.scaler)
    }

    /// Full path to the class label list.
    pub fn labels_path(&self) -> PathBuf {
        self.dir.join(&self.labels)
    }

    /// Full path to the classifier model.
    pub fn model_path(&self) -> PathBuf {
        self.dir.join(&self.model)
    }
}

/// Audio conditioning settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Sample rate every clip is resampled to, in Hz.
    pub sample_rate: u32,

    /// Clip duration the classifier expects, in seconds.
    pub clip_secs: f64,

    /// Silence trim threshold relative to the clip peak, in dB.
    pub trim_threshold_db: f32,

    /// Whether the pre-emphasis filter is applied.
    pub pre_emphasis: bool,

    /// Pre-emphasis filter coefficient.
    pub pre_emphasis_coef: f32,

    /// Peak level clips are normalized to.
    pub peak_level: f32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            clip_secs: DEFAULT_CLIP_DURATION,
            trim_threshold_db: DEFAULT_TRIM_THRESHOLD_DB,
            pre_emphasis: true,
            pre_emphasis_coef: DEFAULT_PRE_EMPHASIS,
            peak_level: DEFAULT_PEAK_LEVEL,
        }
    }
}

impl AudioConfig {
    /// Number of samples in a full clip at the configured rate.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn clip_samples(&self) -> usize {
        (self.clip_secs * f64::from(self.sample_rate)).round() as usize
    }
}

/// Decoder chain settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoderConfig {
    /// Whether the external fallback decoder is tried after the built-in
    /// decoder fails.
    pub fallback: bool,

    /// Command invoked for fallback decoding.
    pub fallback_command: String,

    /// Wall-clock budget for one fallback decode, in seconds.
    pub fallback_timeout_secs: u64,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            fallback: true,
            fallback_command: "ffmpeg".to_string(),
            fallback_timeout_secs: fallback::DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Analysis window selection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    /// Hop between candidate window starts, in seconds.
    pub hop_secs: f64,

    /// Seconds skipped before scanning, keyed by filename prefix.
    ///
    /// Some source collections prepend spoken introductions; this skips
    /// past them. An entry is ignored when honoring it would leave less
    /// than one full window.
    pub lead_in_skip: HashMap<String, f64>,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            hop_secs: selection::HOP_SECS,
            lead_in_skip: HashMap::new(),
        }
    }
}

/// Inference settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    /// Number of top predictions returned per clip.
    pub top_k: usize,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
        }
    }
}
