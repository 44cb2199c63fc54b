//! Error types for anura.

/// Result type alias for anura operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse error category, stable across variant changes.
///
/// Callers that map failures onto transport-level responses (HTTP status
/// codes, exit codes) should match on this instead of [`Error`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The input bytes could not be decoded as audio.
    Decode,
    /// The clip contained no usable samples.
    EmptyAudio,
    /// A caller-supplied value failed validation.
    Validation,
    /// The model could not be run or produced unusable output.
    Inference,
    /// Loaded artifacts disagree with each other or with the configuration.
    ConfigMismatch,
    /// Everything else: I/O, config file handling, internal failures.
    Other,
}

/// Top-level error type for anura.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to read configuration file.
    #[error("failed to read config file '{path}'")]
    ConfigRead {
        /// Path to the config file.
        path: std::path::PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse configuration file.
    #[error("failed to parse config file '{path}'")]
    ConfigParse {
        /// Path to the config file.
        path: std::path::PathBuf,
        /// Underlying parse error.
        #[source]
        source: toml::de::Error,
    },

    /// Configuration validation failed.
    #[error("configuration validation failed: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    /// Failed to write configuration file.
    #[error("failed to write config file '{path}'")]
    ConfigWrite {
        /// Path to the config file.
        path: std::path::PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to serialize configuration.
    #[error("failed to serialize config")]
    ConfigSerialize {
        /// Underlying serialization error.
        #[source]
        source: toml::ser::Error,
    },

    /// Failed to open audio file.
    #[error("failed to open audio file '{path}'")]
    AudioOpen {
        /// Path to the audio file.
        path: std::path::PathBuf,
        /// Underlying error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Failed to decode audio.
    #[error("failed to decode audio with {decoder}")]
    AudioDecode {
        /// Name of the decoder that failed.
        decoder: &'static str,
        /// Underlying error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// No audio tracks found in the input.
    #[error("no audio tracks found in input")]
    NoAudioTracks,

    /// Every decoder in the chain failed for this input.
    #[error("all decoders failed: {detail}")]
    DecodeChainExhausted {
        /// Per-decoder failure summary.
        detail: String,
    },

    /// Fallback decoder exceeded its wall-clock budget.
    #[error("fallback decoder '{command}' timed out after {timeout_secs}s")]
    DecodeTimeout {
        /// Command that was killed.
        command: String,
        /// Configured timeout in seconds.
        timeout_secs: u64,
    },

    /// Clip contains no samples after decoding and trimming.
    #[error("audio is empty after {stage}")]
    EmptyAudio {
        /// Pipeline stage that observed the empty clip.
        stage: &'static str,
    },

    /// Failed to resample audio.
    #[error("failed to resample audio: {reason}")]
    Resample {
        /// Description of the resampling failure.
        reason: String,
    },

    /// Caller-supplied value failed validation.
    #[error("validation failed: {message}")]
    Validation {
        /// Description of the validation failure.
        message: String,
    },

    /// Failed to initialize ONNX runtime.
    #[error("failed to initialize ONNX runtime: {reason}")]
    RuntimeInitialization {
        /// Description of the initialization failure.
        reason: String,
    },

    /// Failed to build classifier.
    #[error("failed to build classifier: {reason}")]
    ClassifierBuild {
        /// Description of the build failure.
        reason: String,
    },

    /// Inference failed.
    #[error("inference failed: {reason}")]
    Inference {
        /// Description of the inference failure.
        reason: String,
    },

    /// Loaded artifacts disagree with each other or with the configuration.
    #[error("artifact mismatch: {message}")]
    ConfigMismatch {
        /// Description of the mismatch.
        message: String,
    },

    /// Failed to read an artifact file.
    #[error("failed to read artifact file '{path}'")]
    ArtifactRead {
        /// Path to the artifact file.
        path: std::path::PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse an artifact file.
    #[error("failed to parse artifact file '{path}'")]
    ArtifactParse {
        /// Path to the artifact file.
        path: std::path::PathBuf,
        /// Underlying parse error.
        #[source]
        source: serde_json::Error,
    },

    /// Artifact file does not exist.
    #[error("artifact file does not exist: {path}")]
    ArtifactNotFound {
        /// Path to the missing artifact file.
        path: std::path::PathBuf,
    },

    /// Internal error (for unexpected failures).
    #[error("internal error: {message}")]
    Internal {
        /// Error message.
        message: String,
    },
}

impl Error {
    /// Returns the coarse category this error belongs to.
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::AudioOpen { .. }
            | Self::AudioDecode { .. }
            | Self::NoAudioTracks
            | Self::DecodeChainExhausted { .. }
            | Self::DecodeTimeout { .. } => ErrorKind::Decode,
            Self::EmptyAudio { .. } => ErrorKind::EmptyAudio,
            Self::Validation { .. } => ErrorKind::Validation,
            Self::RuntimeInitialization { .. }
            | Self::ClassifierBuild { .. }
            | Self::Inference { .. } => ErrorKind::Inference,
            Self::ConfigMismatch { .. } => ErrorKind::ConfigMismatch,
            Self::Io(_)
            | Self::ConfigRead { .. }
            | Self::ConfigParse { .. }
            | Self::ConfigValidation { .. }
            | Self::ConfigWrite { .. }
            | Self::ConfigSerialize { .. }
            | Self::Resample { .. }
            | Self::ArtifactRead { .. }
            | Self::ArtifactParse { .. }
            | Self::ArtifactNotFound { .. }
            | Self::Internal { .. } => ErrorKind::Other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_errors_share_kind() {
        let open = Error::AudioOpen {
            path: "clip.wav".into(),
            source: "boom".into(),
        };
        let timeout = Error::DecodeTimeout {
            command: "ffmpeg".into(),
            timeout_secs: 30,
        };
        assert_eq!(open.kind(), ErrorKind::Decode);
        assert_eq!(timeout.kind(), ErrorKind::Decode);
    }

    #[test]
    fn test_empty_audio_kind() {
        let err = Error::EmptyAudio { stage: "trim" };
        assert_eq!(err.kind(), ErrorKind::EmptyAudio);
        assert!(err.to_string().contains("trim"));
    }

    #[test]
    fn test_mismatch_kind_distinct_from_validation() {
        let mismatch = Error::ConfigMismatch {
            message: "scaler expects 24 features, schema has 26".into(),
        };
        let validation = Error::Validation {
            message: "expected 26 features, got 3".into(),
        };
        assert_eq!(mismatch.kind(), ErrorKind::ConfigMismatch);
        assert_eq!(validation.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_io_maps_to_other() {
        let err = Error::from(std::io::Error::other("disk gone"));
        assert_eq!(err.kind(), ErrorKind::Other);
    }
}
