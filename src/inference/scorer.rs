//! Scoring backends that turn scaled features into class probabilities.

use crate::constants::{APP_NAME, probability};
use crate::error::{Error, Result};
use crate::inference::scaler::ScaledFeatureVector;
use ort::inputs;
use ort::session::{Session, builder::SessionBuilder};
use ort::value::Value;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Mutex, OnceLock};
use tracing::debug;

/// Calibrated class distribution keyed by species label.
///
/// Construction validates the distribution: no negative or non-finite
/// values, sum within tolerance of one.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassProbabilities(BTreeMap<String, f32>);

impl ClassProbabilities {
    /// Validates and wraps a label-to-probability map.
    pub fn new(map: BTreeMap<String, f32>) -> Result<Self> {
        if map.is_empty() {
            return Err(Error::Inference {
                reason: "model produced an empty distribution".to_string(),
            });
        }
        for (label, &p) in &map {
            if !p.is_finite() || p < probability::MIN {
                return Err(Error::Inference {
                    reason: format!("invalid probability {p} for '{label}'"),
                });
            }
            if p > probability::MAX + probability::SUM_TOLERANCE {
                return Err(Error::Inference {
                    reason: format!("probability {p} for '{label}' exceeds 1"),
                });
            }
        }
        let sum: f32 = map.values().sum();
        if (sum - 1.0).abs() > probability::SUM_TOLERANCE {
            return Err(Error::Inference {
                reason: format!("probabilities sum to {sum}, not 1"),
            });
        }
        Ok(Self(map))
    }

    /// Probability for one label, if present.
    pub fn get(&self, label: &str) -> Option<f32> {
        self.0.get(label).copied()
    }

    /// Iterates labels in ascending order with their probabilities.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f32)> {
        self.0.iter().map(|(label, &p)| (label.as_str(), p))
    }

    /// Number of classes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the distribution has no classes. Always false after
    /// construction; present for API completeness.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Consumes the distribution into the underlying map.
    pub fn into_map(self) -> BTreeMap<String, f32> {
        self.0
    }
}

/// Scoring backend interface, injectable so tests substitute a stub.
pub trait Scorer: Send + Sync {
    /// Backend name used in logs.
    fn name(&self) -> &'static str;

    /// Scores one scaled feature vector into a class distribution.
    fn score(&self, features: &ScaledFeatureVector) -> Result<ClassProbabilities>;
}

static RUNTIME_INIT: OnceLock<std::result::Result<(), String>> = OnceLock::new();

/// Initializes the process-wide ONNX runtime environment.
///
/// Only the first call in the process takes effect; later calls return its
/// outcome. With a dylib path the runtime library is loaded from there and
/// a load failure is an error, since the caller asked for that exact
/// library. Without one the runtime resolves through `ORT_DYLIB_PATH` and
/// any problem surfaces later, when the session is created.
pub fn init_runtime(dylib: Option<&Path>) -> Result<()> {
    let outcome = RUNTIME_INIT.get_or_init(|| match dylib {
        Some(path) => {
            debug!("Loading ONNX runtime from {}", path.display());
            ort::init_from(path)
                .map(|builder| {
                    builder.commit();
                })
                .map_err(|e| format!("failed to load runtime from '{}': {e}", path.display()))
        }
        None => {
            if !ort::init().with_name(APP_NAME).commit() {
                debug!("ONNX runtime environment not (re)initialized");
            }
            Ok(())
        }
    });
    outcome
        .clone()
        .map_err(|reason| Error::RuntimeInitialization { reason })
}

/// ONNX model scorer: one session paired with the species labels the model's
/// output columns correspond to.
#[derive(Debug)]
pub struct OnnxScorer {
    session: Mutex<Session>,
    labels: Vec<String>,
}

impl OnnxScorer {
    /// Loads the model file and pairs it with its output labels.
    pub fn load(model_path: &Path, labels: Vec<String>) -> Result<Self> {
        if !model_path.exists() {
            return Err(Error::ArtifactNotFound {
                path: model_path.to_path_buf(),
            });
        }

        // intra_threads=1 to avoid oversubscription under concurrent requests
        let session = SessionBuilder::new()
            .and_then(|b| Ok(b.with_intra_threads(1)?))
            .and_then(|mut b| b.commit_from_file(model_path))
            .map_err(|e| Error::ClassifierBuild {
                reason: e.to_string(),
            })?;

        debug!(
            "Loaded classifier from {} with {} labels",
            model_path.display(),
            labels.len()
        );

        Ok(Self {
            session: Mutex::new(session),
            labels,
        })
    }
}

impl Scorer for OnnxScorer {
    fn name(&self) -> &'static str {
        "onnx"
    }

    fn score(&self, features: &ScaledFeatureVector) -> Result<ClassProbabilities> {
        let input = Value::from_array((
            vec![1, features.len()],
            features.as_slice().to_vec(),
        ))
        .map_err(|e| Error::Inference {
            reason: e.to_string(),
        })?;

        let mut session = self.session.lock().map_err(|_| Error::Inference {
            reason: "classifier session mutex poisoned".to_string(),
        })?;
        let outputs = session.run(inputs![input]).map_err(|e| Error::Inference {
            reason: e.to_string(),
        })?;
        let (_, data) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| Error::Inference {
                reason: e.to_string(),
            })?;

        if data.len() != self.labels.len() {
            return Err(Error::Inference {
                reason: format!(
                    "model produced {} probabilities for {} labels",
                    data.len(),
                    self.labels.len()
                ),
            });
        }

        let map = self
            .labels
            .iter()
            .cloned()
            .zip(data.iter().copied())
            .collect();
        ClassProbabilities::new(map)
    }
}
