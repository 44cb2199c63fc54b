//! Species label list, one label per line next to the model.

use crate::error::{Error, Result};
use std::collections::HashSet;
use std::path::Path;

/// Loads the label file pairing model output columns with species names.
///
/// Blank lines and surrounding whitespace are ignored. Line order defines
/// the output column order.
pub fn load_labels(path: &Path) -> Result<Vec<String>> {
    if !path.exists() {
        return Err(Error::ArtifactNotFound {
            path: path.to_path_buf(),
        });
    }
    let raw = std::fs::read_to_string(path).map_err(|e| Error::ArtifactRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    let labels: Vec<String> = raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();

    if labels.is_empty() {
        return Err(Error::ConfigMismatch {
            message: format!("labels file '{}' has no entries", path.display()),
        });
    }

    let mut seen = HashSet::new();
    for label in &labels {
        if !seen.insert(label.as_str()) {
            return Err(Error::ConfigMismatch {
                message: format!("duplicate label '{label}' in '{}'", path.display()),
            });
        }
    }

    Ok(labels)
}
