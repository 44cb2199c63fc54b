//! Duration enforcement: cut or pad a waveform into an exact-length clip.

use crate::audio::normalize::Waveform;

/// Fixed-duration audio excerpt fed to feature extraction.
#[derive(Debug, Clone)]
pub struct Segment {
    /// Samples, exactly the enforced length.
    pub samples: Vec<f32>,
    /// Sample rate in Hz.
    pub sample_rate: u32,
}

impl Segment {
    /// Number of samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the segment holds no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Produce a segment of exactly `target_len` samples starting at `offset`.
///
/// Shorter material is right-padded with zeros; longer material is cut.
/// This never fails.
pub fn enforce_duration(waveform: &Waveform, offset: usize, target_len: usize) -> Segment {
    let available = waveform.samples.get(offset..).unwrap_or(&[]);
    let take = available.len().min(target_len);

    let mut samples = Vec::with_capacity(target_len);
    samples.extend_from_slice(&available[..take]);
    samples.resize(target_len, 0.0);

    Segment {
        samples,
        sample_rate: waveform.sample_rate,
    }
}
