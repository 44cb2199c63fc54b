//! Tests for loading the matched artifact set from disk.
//!
//! A real model file is not needed: every check these tests exercise runs
//! before the ONNX session would be created.

use anura::config::{ArtifactsConfig, Config};
use anura::features::FeatureSchema;
use anura::inference::{Scaler, load_artifacts};
use anura::{Error, ErrorKind, Pipeline};
use std::path::Path;
use tempfile::TempDir;

fn write_schema(dir: &Path, version: &str) {
    let schema = FeatureSchema {
        version: version.to_string(),
        ..FeatureSchema::default()
    };
    std::fs::write(
        dir.join("feature_columns.json"),
        serde_json::to_string(&schema).unwrap(),
    )
    .unwrap();
}

fn write_scaler(dir: &Path, version: &str, width: usize) {
    let scaler = Scaler::new(version, vec![0.0; width], vec![1.0; width]).unwrap();
    std::fs::write(
        dir.join("scaler.json"),
        serde_json::to_string(&scaler).unwrap(),
    )
    .unwrap();
}

fn write_labels(dir: &Path) {
    std::fs::write(dir.join("labels.txt"), "bufo_bufo\nhyla_arborea\n").unwrap();
}

fn config_for(dir: &Path) -> Config {
    Config {
        artifacts: ArtifactsConfig {
            dir: dir.to_path_buf(),
            ..ArtifactsConfig::default()
        },
        ..Config::default()
    }
}

#[test]
fn test_missing_schema_reports_which_file() {
    let dir = TempDir::new().unwrap();
    let err = load_artifacts(&config_for(dir.path())).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Other);
    match err {
        Error::ArtifactNotFound { path } => {
            assert!(path.ends_with("feature_columns.json"));
        }
        other => panic!("expected ArtifactNotFound, got {other}"),
    }
}

#[test]
fn test_schema_scaler_version_drift_is_rejected() {
    let dir = TempDir::new().unwrap();
    write_schema(dir.path(), "1");
    write_scaler(dir.path(), "2", 26);

    let err = load_artifacts(&config_for(dir.path())).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConfigMismatch);
    assert!(err.to_string().contains('1'));
    assert!(err.to_string().contains('2'));
}

#[test]
fn test_version_pin_is_enforced() {
    let dir = TempDir::new().unwrap();
    write_schema(dir.path(), "1");
    write_scaler(dir.path(), "1", 26);

    let mut config = config_for(dir.path());
    config.artifacts.version = Some("2".to_string());

    let err = load_artifacts(&config).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConfigMismatch);
    assert!(err.to_string().contains("configured version"));
}

#[test]
fn test_scaler_width_must_match_schema() {
    let dir = TempDir::new().unwrap();
    write_schema(dir.path(), "1");
    write_scaler(dir.path(), "1", 24);

    let err = load_artifacts(&config_for(dir.path())).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConfigMismatch);
    assert!(err.to_string().contains("24"));
}

#[test]
fn test_matched_set_still_needs_the_model_file() {
    let dir = TempDir::new().unwrap();
    write_schema(dir.path(), "1");
    write_scaler(dir.path(), "1", 26);
    write_labels(dir.path());

    let err = load_artifacts(&config_for(dir.path())).unwrap_err();
    match err {
        Error::ArtifactNotFound { path } => {
            assert!(path.ends_with("classifier.onnx"));
        }
        other => panic!("expected ArtifactNotFound, got {other}"),
    }
}

#[test]
fn test_pipeline_from_config_surfaces_artifact_errors() {
    let dir = TempDir::new().unwrap();
    write_schema(dir.path(), "1");
    write_scaler(dir.path(), "2", 26);

    let err = Pipeline::from_config(&config_for(dir.path())).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConfigMismatch);
}
