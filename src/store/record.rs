//! Upload records: the audio bytes and prediction summary a store persists.

use crate::pipeline::Prediction;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;

/// One classified upload, ready to persist.
///
/// The storage filename is derived from the classification time, the top
/// species, and its confidence, so stored clips sort chronologically and
/// are self-describing at a glance.
#[derive(Debug, Clone, Serialize)]
pub struct UploadRecord {
    /// Name the clip is stored under.
    pub storage_filename: String,

    /// Filename the clip was submitted with, if any.
    pub original_filename: Option<String>,

    /// The encoded audio exactly as submitted.
    #[serde(skip)]
    pub audio: Vec<u8>,

    /// When the clip was classified, UTC.
    pub recorded_at: DateTime<Utc>,

    /// Classification outcome.
    pub prediction: Prediction,
}

impl UploadRecord {
    /// Build a record stamped with the current time.
    pub fn new(audio: Vec<u8>, original_filename: Option<&str>, prediction: Prediction) -> Self {
        Self::at(audio, original_filename, prediction, Utc::now())
    }

    fn at(
        audio: Vec<u8>,
        original_filename: Option<&str>,
        prediction: Prediction,
        recorded_at: DateTime<Utc>,
    ) -> Self {
        Self {
            storage_filename: storage_filename(&prediction, original_filename, recorded_at),
            original_filename: original_filename.map(str::to_string),
            audio,
            recorded_at,
            prediction,
        }
    }
}

/// Derive the storage filename: `YYYYmmdd_HHMMSS_species_confidence` plus
/// the original extension when one is present.
fn storage_filename(
    prediction: &Prediction,
    original_filename: Option<&str>,
    at: DateTime<Utc>,
) -> String {
    let ext = original_filename
        .map(Path::new)
        .and_then(Path::extension)
        .and_then(|e| e.to_str())
        .map(|e| format!(".{e}"))
        .unwrap_or_default();

    format!(
        "{}_{}_{:.2}{ext}",
        at.format("%Y%m%d_%H%M%S"),
        prediction.species,
        prediction.confidence
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::SpeciesScore;
    use chrono::TimeZone;
    use std::collections::BTreeMap;

    fn prediction(species: &str, confidence: f32) -> Prediction {
        Prediction {
            species: species.to_string(),
            confidence,
            ranking: vec![SpeciesScore {
                species: species.to_string(),
                confidence,
            }],
            distribution: BTreeMap::from([(species.to_string(), confidence)]),
            warnings: Vec::new(),
        }
    }

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 30, 5).unwrap()
    }

    #[test]
    fn test_storage_filename_has_timestamp_species_confidence() {
        let record = UploadRecord::at(
            vec![1, 2, 3],
            Some("pond.wav"),
            prediction("bufo_bufo", 0.73),
            noon(),
        );
        assert_eq!(record.storage_filename, "20240601_123005_bufo_bufo_0.73.wav");
        assert_eq!(record.original_filename.as_deref(), Some("pond.wav"));
        assert_eq!(record.audio, vec![1, 2, 3]);
    }

    #[test]
    fn test_storage_filename_without_extension() {
        let record = UploadRecord::at(Vec::new(), Some("pond"), prediction("hyla", 0.5), noon());
        assert_eq!(record.storage_filename, "20240601_123005_hyla_0.50");
    }

    #[test]
    fn test_storage_filename_without_original_name() {
        let record = UploadRecord::at(Vec::new(), None, prediction("hyla", 0.5), noon());
        assert_eq!(record.storage_filename, "20240601_123005_hyla_0.50");
        assert_eq!(record.original_filename, None);
    }

    #[test]
    fn test_new_stamps_current_time() {
        let before = Utc::now();
        let record = UploadRecord::new(Vec::new(), None, prediction("hyla", 0.5));
        let after = Utc::now();
        assert!(record.recorded_at >= before);
        assert!(record.recorded_at <= after);
    }

    #[test]
    fn test_serialization_skips_audio_bytes() {
        let record = UploadRecord::at(
            vec![0xFF; 64],
            Some("pond.wav"),
            prediction("bufo_bufo", 0.73),
            noon(),
        );
        let json = serde_json::to_string(&record).unwrap();
        assert!(!json.contains("audio"));
        assert!(json.contains("\"storage_filename\""));
        assert!(json.contains("\"prediction\""));
    }
}
