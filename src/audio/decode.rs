//! Audio decoding using symphonia, with a pluggable fallback chain.

use crate::config::Config;
use crate::error::{Error, Result};
use std::io::Cursor;
use std::time::Duration;
use symphonia::core::audio::{AudioBufferRef, Signal};
use symphonia::core::codecs::{CODEC_TYPE_NULL, DecoderOptions};
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::{MediaSourceStream, MediaSourceStreamOptions};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::debug;

/// Decoded audio data, planar per channel, at the native sample rate.
#[derive(Debug, Clone)]
pub struct RawAudio {
    /// Samples per channel as f32 in range [-1.0, 1.0].
    pub channels: Vec<Vec<f32>>,
    /// Native sample rate in Hz.
    pub sample_rate: u32,
    /// Codec or decoder name that produced the samples.
    pub source: &'static str,
}

impl RawAudio {
    /// Number of frames (samples per channel).
    pub fn frames(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }

    /// Duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        #[allow(clippy::cast_precision_loss)]
        let frames = self.frames() as f64;
        frames / f64::from(self.sample_rate)
    }
}

/// One strategy for turning input bytes into [`RawAudio`].
pub trait Decoder: Send + Sync {
    /// Short name used in logs and error summaries.
    fn name(&self) -> &'static str;

    /// Decode the byte buffer.
    ///
    /// The hint may be a filename, a bare extension, or a MIME type; it
    /// guides format probing and is never trusted over the bytes.
    fn decode(&self, bytes: &[u8], hint: Option<&str>) -> Result<RawAudio>;
}

/// In-process decoder backed by symphonia.
///
/// Supports WAV, FLAC, MP3, OGG/Vorbis, and M4A/AAC containers.
#[derive(Debug, Clone, Copy, Default)]
pub struct SymphoniaDecoder;

impl Decoder for SymphoniaDecoder {
    fn name(&self) -> &'static str {
        "symphonia"
    }

    fn decode(&self, bytes: &[u8], hint: Option<&str>) -> Result<RawAudio> {
        decode_bytes(bytes, hint)
    }
}

/// Ordered list of decoders tried in sequence.
///
/// The first success short-circuits; if every decoder fails the combined
/// failure detail is reported as one [`Error::DecodeChainExhausted`].
pub struct DecoderChain {
    decoders: Vec<Box<dyn Decoder>>,
}

impl DecoderChain {
    /// Build a chain from an explicit decoder list.
    pub fn new(decoders: Vec<Box<dyn Decoder>>) -> Self {
        Self { decoders }
    }

    /// Build the default chain for a configuration: symphonia first, then
    /// the external fallback decoder when enabled.
    pub fn from_config(config: &Config) -> Self {
        let mut decoders: Vec<Box<dyn Decoder>> = vec![Box::new(SymphoniaDecoder)];
        if config.decoder.fallback {
            decoders.push(Box::new(super::FfmpegDecoder::new(
                config.decoder.fallback_command.clone(),
                Duration::from_secs(config.decoder.fallback_timeout_secs),
                config.audio.sample_rate,
            )));
        }
        Self { decoders }
    }

    /// Decode the byte buffer with the first decoder that succeeds.
    pub fn decode(&self, bytes: &[u8], hint: Option<&str>) -> Result<RawAudio> {
        let mut failures = Vec::with_capacity(self.decoders.len());
        for decoder in &self.decoders {
            match decoder.decode(bytes, hint) {
                Ok(raw) => {
                    debug!(
                        decoder = decoder.name(),
                        frames = raw.frames(),
                        sample_rate = raw.sample_rate,
                        "decoded audio"
                    );
                    return Ok(raw);
                }
                Err(e) => {
                    debug!(decoder = decoder.name(), error = %e, "decoder failed");
                    failures.push(format!("{}: {}", decoder.name(), describe(&e)));
                }
            }
        }
        Err(Error::DecodeChainExhausted {
            detail: failures.join("; "),
        })
    }
}

/// Render an error with its full source chain on one line.
fn describe(err: &Error) -> String {
    use std::error::Error as _;
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(s) = source {
        out.push_str(": ");
        out.push_str(&s.to_string());
        source = s.source();
    }
    out
}

/// Decode a byte buffer to planar f32 samples.
fn decode_bytes(bytes: &[u8], format_hint: Option<&str>) -> Result<RawAudio> {
    let mss = MediaSourceStream::new(
        Box::new(Cursor::new(bytes.to_vec())),
        MediaSourceStreamOptions::default(),
    );

    // The hint may be a MIME type, a filename, or a bare extension
    let mut hint = Hint::new();
    if let Some(h) = format_hint {
        if h.contains('/') {
            hint.mime_type(h);
        } else if let Some(ext) = h.rsplit('.').next().filter(|e| !e.is_empty()) {
            hint.with_extension(ext);
        }
    }

    // Probe the container
    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| Error::AudioDecode {
            decoder: "symphonia",
            source: Box::new(e),
        })?;

    let mut format = probed.format;

    // Find the first audio track
    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or(Error::NoAudioTracks)?;

    let track_id = track.id;
    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| Error::AudioDecode {
            decoder: "symphonia",
            source: "missing sample rate".into(),
        })?;

    let codec_name = symphonia::default::get_codecs()
        .get_codec(track.codec_params.codec)
        .map_or("unknown", |descriptor| descriptor.short_name);

    // Create decoder
    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| Error::AudioDecode {
            decoder: "symphonia",
            source: Box::new(e),
        })?;

    let mut channels: Vec<Vec<f32>> = Vec::new();

    // Decode all packets
    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(symphonia::core::errors::Error::IoError(e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => {
                return Err(Error::AudioDecode {
                    decoder: "symphonia",
                    source: Box::new(e),
                });
            }
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = decoder.decode(&packet).map_err(|e| Error::AudioDecode {
            decoder: "symphonia",
            source: Box::new(e),
        })?;

        if channels.is_empty() {
            channels = vec![Vec::new(); decoded.spec().channels.count()];
        }
        append_samples(&decoded, &mut channels);
    }

    // A stream that yields no samples counts as a failed strategy so the
    // chain can try the next decoder.
    if channels.iter().all(Vec::is_empty) {
        return Err(Error::AudioDecode {
            decoder: "symphonia",
            source: "decoded zero samples".into(),
        });
    }

    Ok(RawAudio {
        channels,
        sample_rate,
        source: codec_name,
    })
}

/// Append decoded samples to the planar output buffers.
fn append_samples(buffer: &AudioBufferRef, channels: &mut [Vec<f32>]) {
    let present = buffer.spec().channels.count().min(channels.len());
    match buffer {
        AudioBufferRef::F32(buf) => {
            for (ch, out) in channels.iter_mut().enumerate().take(present) {
                out.extend(buf.chan(ch));
            }
        }
        AudioBufferRef::S16(buf) => {
            const I16_NORM: f32 = 32768.0;
            for (ch, out) in channels.iter_mut().enumerate().take(present) {
                out.extend(buf.chan(ch).iter().map(|&s| f32::from(s) / I16_NORM));
            }
        }
        AudioBufferRef::S32(buf) => {
            const I32_NORM: f32 = 2_147_483_648.0;
            for (ch, out) in channels.iter_mut().enumerate().take(present) {
                #[allow(clippy::cast_precision_loss)]
                out.extend(buf.chan(ch).iter().map(|&s| s as f32 / I32_NORM));
            }
        }
        _ => {
            // Unsupported sample format, skip
        }
    }
}
