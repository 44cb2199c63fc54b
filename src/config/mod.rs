//! Configuration loading and management.

mod file;
mod types;
mod validate;

pub use file::{load_config_file, save_config};
pub use types::{
    ArtifactsConfig, AudioConfig, Config, DecoderConfig, InferenceConfig, SelectionConfig,
};
pub use validate::validate_config;
