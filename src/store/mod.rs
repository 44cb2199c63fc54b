//! Detached persistence of classified uploads.
//!
//! Classification answers synchronously; persisting the clip and its
//! prediction is a side channel that must never delay or fail a request.
//! The [`Recorder`] queues records onto its own runtime and any
//! [`PredictionStore`] failure is logged and dropped.

mod record;
mod recorder;

pub use record::UploadRecord;
pub use recorder::{PredictionStore, Recorder};
