//! Feature schema artifact: the ordered column list the model was trained on.

use crate::constants::{FEATURE_COUNT, mel::N_MFCC};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Ordered feature layout persisted next to the model.
///
/// The column order and the MFCC std subset are training-time decisions; they
/// are read from the artifact and never derived from the feature code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureSchema {
    /// Artifact version, matched against the scaler on load.
    pub version: String,
    /// Feature column names in model input order.
    pub columns: Vec<String>,
    /// 1-based MFCC coefficients whose standard deviation is included.
    pub mfcc_std_indices: Vec<usize>,
}

impl Default for FeatureSchema {
    fn default() -> Self {
        let mut columns = vec![
            "centroid_mean".to_string(),
            "bandwidth_mean".to_string(),
            "rolloff_mean".to_string(),
        ];
        for i in 1..=N_MFCC {
            columns.push(format!("mfcc{i}_mean"));
        }
        let mfcc_std_indices = vec![1, 3, 4, 5, 7, 8, 12];
        for i in &mfcc_std_indices {
            columns.push(format!("mfcc{i}_std"));
        }
        columns.push("zcr_mean".to_string());
        columns.push("rms_mean".to_string());
        columns.push("rms_std".to_string());

        Self {
            version: "1".to_string(),
            columns,
            mfcc_std_indices,
        }
    }
}

impl FeatureSchema {
    /// Loads and validates a schema artifact from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::ArtifactNotFound {
                path: path.to_path_buf(),
            });
        }
        let raw = std::fs::read_to_string(path).map_err(|e| Error::ArtifactRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let schema: Self = serde_json::from_str(&raw).map_err(|e| Error::ArtifactParse {
            path: path.to_path_buf(),
            source: e,
        })?;
        schema.validate()?;
        Ok(schema)
    }

    /// Number of feature columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Whether the schema has no columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Checks internal consistency of the column list and the std subset.
    pub fn validate(&self) -> Result<()> {
        if self.columns.len() != FEATURE_COUNT {
            return Err(Error::ConfigMismatch {
                message: format!(
                    "schema has {} columns, expected {FEATURE_COUNT}",
                    self.columns.len()
                ),
            });
        }

        let mut seen = HashSet::new();
        for column in &self.columns {
            if !seen.insert(column.as_str()) {
                return Err(Error::ConfigMismatch {
                    message: format!("schema column '{column}' appears more than once"),
                });
            }
        }

        for &i in &self.mfcc_std_indices {
            if i == 0 || i > N_MFCC {
                return Err(Error::ConfigMismatch {
                    message: format!("mfcc std index {i} out of range 1..={N_MFCC}"),
                });
            }
            let column = format!("mfcc{i}_std");
            if !seen.contains(column.as_str()) {
                return Err(Error::ConfigMismatch {
                    message: format!("schema lists std index {i} but no column '{column}'"),
                });
            }
        }

        for column in &self.columns {
            if let Some(i) = std_coefficient(column)
                && !self.mfcc_std_indices.contains(&i)
            {
                return Err(Error::ConfigMismatch {
                    message: format!(
                        "schema column '{column}' is not in the std index list"
                    ),
                });
            }
        }

        Ok(())
    }
}

/// Parses `mfccN_std` column names, returning the 1-based coefficient.
fn std_coefficient(column: &str) -> Option<usize> {
    column
        .strip_prefix("mfcc")?
        .strip_suffix("_std")?
        .parse()
        .ok()
}
