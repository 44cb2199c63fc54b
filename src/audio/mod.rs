//! Audio decoding and conditioning pipeline.

mod decode;
mod ffmpeg;
mod normalize;
mod resample;
mod segment;
mod window;

pub use decode::{Decoder, DecoderChain, RawAudio, SymphoniaDecoder};
pub use ffmpeg::FfmpegDecoder;
pub use normalize::{Normalizer, Waveform};
pub use resample::resample;
pub use segment::{Segment, enforce_duration};
pub use window::WindowSelector;
