//! Decoder chain behavior when the primary decoder rejects the input.
//!
//! A stub shell script stands in for the external transcoder, so these
//! tests are unix-only. The stub honors the real contract: original bytes
//! arrive on stdin, raw f32le PCM at the analysis rate leaves on stdout.

#![cfg(unix)]

use anura::config::{AudioConfig, Config, DecoderConfig};
use anura::features::FeatureSchema;
use anura::inference::{
    ArtifactSet, ClassProbabilities, FrogClassifier, ScaledFeatureVector, Scaler, Scorer,
};
use anura::{ErrorKind, Pipeline};
use std::collections::BTreeMap;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::time::{Duration, Instant};

struct FixedScorer;

impl Scorer for FixedScorer {
    fn name(&self) -> &'static str {
        "fixed"
    }

    fn score(&self, _features: &ScaledFeatureVector) -> anura::Result<ClassProbabilities> {
        ClassProbabilities::new(BTreeMap::from([
            ("bufo_bufo".to_string(), 0.8),
            ("hyla_arborea".to_string(), 0.2),
        ]))
    }
}

/// Write an executable stub transcoder and return its invocation path.
fn stub_script(dir: &Path, body: &str) -> String {
    let path = dir.join("transcoder.sh");
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path.to_string_lossy().into_owned()
}

fn pipeline_with_fallback(command: String, timeout_secs: u64) -> Pipeline {
    let config = Config {
        audio: AudioConfig {
            clip_secs: 1.0,
            ..AudioConfig::default()
        },
        decoder: DecoderConfig {
            fallback: true,
            fallback_command: command,
            fallback_timeout_secs: timeout_secs,
        },
        ..Config::default()
    };
    let schema = FeatureSchema::default();
    let n = schema.len();
    let artifacts = ArtifactSet {
        schema,
        scaler: Scaler::new("1", vec![0.0; n], vec![1.0; n]).unwrap(),
        classifier: FrogClassifier::new(Box::new(FixedScorer), n),
    };
    Pipeline::with_artifacts(&config, artifacts).unwrap()
}

#[test]
fn test_fallback_rescues_bytes_the_primary_rejects() {
    let dir = tempfile::tempdir().unwrap();

    // One second of a 650 Hz tone as raw f32le PCM, written to a file the
    // stub answers with after draining stdin.
    let rate = 22_050u32;
    let pcm: Vec<u8> = (0..rate)
        .flat_map(|i| {
            let t = i as f32 / rate as f32;
            (0.5 * (std::f32::consts::TAU * 650.0 * t).sin()).to_le_bytes()
        })
        .collect();
    let pcm_path = dir.path().join("tone.pcm");
    std::fs::write(&pcm_path, &pcm).unwrap();

    let script = stub_script(
        dir.path(),
        &format!("cat >/dev/null\ncat '{}'", pcm_path.display()),
    );
    let pipeline = pipeline_with_fallback(script, 10);

    let prediction = pipeline.classify_bytes(b"opaque container", None).unwrap();
    assert_eq!(prediction.species, "bufo_bufo");
    assert!(prediction.warnings.is_empty());
}

#[test]
fn test_exhausted_chain_names_every_decoder() {
    let dir = tempfile::tempdir().unwrap();
    let script = stub_script(dir.path(), "cat >/dev/null\necho 'no stream' >&2\nexit 1");
    let pipeline = pipeline_with_fallback(script, 10);

    let err = pipeline
        .classify_bytes(b"opaque container", None)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Decode);
    let message = err.to_string();
    assert!(message.contains("symphonia"), "missing primary: {message}");
    assert!(message.contains("ffmpeg"), "missing fallback: {message}");
    assert!(message.contains("no stream"), "missing stderr: {message}");
}

#[test]
fn test_fallback_timeout_bounds_the_request() {
    let dir = tempfile::tempdir().unwrap();
    let script = stub_script(dir.path(), "cat >/dev/null\nsleep 30");
    let pipeline = pipeline_with_fallback(script, 1);

    let started = Instant::now();
    let err = pipeline
        .classify_bytes(b"opaque container", None)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Decode);
    // Well under the stub's 30s sleep.
    assert!(started.elapsed() < Duration::from_secs(10));
}
