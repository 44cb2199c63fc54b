//! Matched-set loading of the model directory artifacts.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::features::FeatureSchema;
use crate::inference::classifier::FrogClassifier;
use crate::inference::labels::load_labels;
use crate::inference::scaler::{ScaledFeatureVector, Scaler};
use crate::inference::scorer::{OnnxScorer, init_runtime};
use tracing::{debug, info};

/// Schema, scaler, and classifier from one model directory, loaded as a
/// unit so they cannot drift apart.
// Debug is manual: the classifier holds a `dyn Scorer` with no Debug bound.
pub struct ArtifactSet {
    /// Feature column layout the model was trained on.
    pub schema: FeatureSchema,
    /// Standardization parameters fitted on the training set.
    pub scaler: Scaler,
    /// Classifier over the ONNX model and its labels.
    pub classifier: FrogClassifier,
}

impl std::fmt::Debug for ArtifactSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArtifactSet")
            .field("schema", &self.schema)
            .field("scaler", &self.scaler)
            .finish_non_exhaustive()
    }
}

/// Loads and cross-checks all artifacts from the configured directory.
///
/// Order of checks: schema and scaler versions must agree (and match the
/// configured pin when one is set), the scaler must cover every schema
/// column, and a warm-up score with a zero vector must succeed so dimension
/// or calibration problems surface at startup instead of on the first
/// request.
pub fn load_artifacts(config: &Config) -> Result<ArtifactSet> {
    let schema = FeatureSchema::load(&config.artifacts.schema_path())?;
    let scaler = Scaler::load(&config.artifacts.scaler_path())?;

    check_versions(
        &schema.version,
        &scaler.version,
        config.artifacts.version.as_deref(),
    )?;
    if scaler.len() != schema.len() {
        return Err(Error::ConfigMismatch {
            message: format!(
                "scaler covers {} columns, schema has {}",
                scaler.len(),
                schema.len()
            ),
        });
    }

    let labels = load_labels(&config.artifacts.labels_path())?;

    // Confirm the model file exists before touching the ONNX runtime.
    let model_path = config.artifacts.model_path();
    if !model_path.exists() {
        return Err(Error::ArtifactNotFound { path: model_path });
    }
    init_runtime(config.artifacts.runtime_dylib.as_deref())?;
    let scorer = OnnxScorer::load(&model_path, labels)?;
    let classifier = FrogClassifier::new(Box::new(scorer), schema.len());
    let n_classes = warm_up(&classifier)?;

    info!(
        "Loaded artifact set version {} ({} features, {} classes)",
        schema.version,
        schema.len(),
        n_classes
    );

    Ok(ArtifactSet {
        schema,
        scaler,
        classifier,
    })
}

fn check_versions(schema: &str, scaler: &str, pin: Option<&str>) -> Result<()> {
    if schema != scaler {
        return Err(Error::ConfigMismatch {
            message: format!(
                "schema version '{schema}' does not match scaler version '{scaler}'"
            ),
        });
    }
    if let Some(pin) = pin
        && schema != pin
    {
        return Err(Error::ConfigMismatch {
            message: format!(
                "artifact version '{schema}' does not match configured version '{pin}'"
            ),
        });
    }
    Ok(())
}

fn warm_up(classifier: &FrogClassifier) -> Result<usize> {
    let probe = ScaledFeatureVector::zeros(classifier.n_features());
    let distribution = classifier.classify(&probe)?;
    debug!(
        "Warm-up scored {} classes with the {} backend",
        distribution.len(),
        classifier.scorer_name()
    );
    Ok(distribution.len())
}
