//! Anura - Frog species classification from field recordings.
//!
//! This crate turns an encoded audio clip into a ranked species prediction:
//! decode, condition to a canonical mono waveform, select the most active
//! analysis window, extract classical spectral features, scale them, and
//! score them with an ONNX classifier. The whole path is deterministic, so
//! identical bytes always yield identical predictions.

#![warn(missing_docs)]

pub mod audio;
pub mod config;
pub mod constants;
pub mod error;
pub mod features;
pub mod inference;
pub mod pipeline;
pub mod store;

pub use config::Config;
pub use error::{Error, ErrorKind, Result};
pub use pipeline::{Pipeline, Prediction, Warning};
