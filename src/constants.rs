//! Application-wide constants.
//!
//! All magic numbers and strings are defined here to ensure consistency
//! and make changes easy to track. Most of these are defaults that can be
//! overridden through [`crate::config::Config`].

/// Application name used for config paths and user-facing messages.
pub const APP_NAME: &str = "anura";

/// Default sample rate every clip is resampled to before feature
/// extraction, in Hz.
pub const DEFAULT_SAMPLE_RATE: u32 = 22_050;

/// Default clip duration the classifier expects, in seconds.
pub const DEFAULT_CLIP_DURATION: f64 = 10.0;

/// Default peak level clips are normalized to.
pub const DEFAULT_PEAK_LEVEL: f32 = 0.98;

/// Default pre-emphasis filter coefficient.
pub const DEFAULT_PRE_EMPHASIS: f32 = 0.97;

/// Default silence trim threshold relative to the clip peak, in dB.
pub const DEFAULT_TRIM_THRESHOLD_DB: f32 = 30.0;

/// Default number of top predictions returned per clip.
pub const DEFAULT_TOP_K: usize = 3;

/// Short-time analysis parameters shared by silence trimming and
/// feature extraction.
pub mod frames {
    /// Analysis frame length in samples.
    pub const FRAME_LEN: usize = 2048;

    /// Analysis hop length in samples.
    pub const HOP_LEN: usize = 512;
}

/// Mel filterbank and cepstrum parameters.
pub mod mel {
    /// Number of mel bands in the filterbank.
    pub const N_BANDS: usize = 128;

    /// Number of cepstral coefficients kept per frame.
    pub const N_MFCC: usize = 13;

    /// Floor applied to power values before converting to dB.
    pub const POWER_FLOOR: f32 = 1e-10;

    /// Dynamic range cap below the peak when converting power to dB.
    pub const TOP_DB: f32 = 80.0;
}

/// Spectral rolloff percentile of total frame energy.
pub const ROLLOFF_PERCENT: f32 = 0.85;

/// Number of elements in the feature vector the classifier consumes.
pub const FEATURE_COUNT: usize = 26;

/// Window selection parameters.
pub mod selection {
    /// Hop between candidate window starts, in seconds.
    pub const HOP_SECS: f64 = 1.0;
}

/// Probability value bounds and formatting.
pub mod probability {
    /// Minimum valid probability value.
    pub const MIN: f32 = 0.0;
    /// Maximum valid probability value.
    pub const MAX: f32 = 1.0;
    /// Tolerance when checking that class probabilities sum to one.
    pub const SUM_TOLERANCE: f32 = 1e-3;
    /// Decimal places for probability formatting.
    pub const DECIMAL_PLACES: usize = 4;
}

/// Fallback decoder constants.
pub mod fallback {
    /// Default wall-clock budget for one fallback decode, in seconds.
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

    /// Poll interval while waiting for the fallback process to exit.
    pub const POLL_INTERVAL_MS: u64 = 20;
}

/// Artifact file names inside a model directory.
pub mod artifacts {
    /// Feature schema file name.
    pub const SCHEMA: &str = "feature_columns.json";
    /// Scaler parameters file name.
    pub const SCALER: &str = "scaler.json";
    /// Class label list file name.
    pub const LABELS: &str = "labels.txt";
    /// Classifier model file name.
    pub const MODEL: &str = "classifier.onnx";
}
