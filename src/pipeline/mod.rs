//! End-to-end classification pipeline.

mod processor;

pub use processor::{Pipeline, Prediction, Warning};
