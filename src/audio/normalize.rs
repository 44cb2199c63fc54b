//! Waveform conditioning: downmix, silence trim, resample, pre-emphasis,
//! and peak normalization, in that fixed order.

use crate::audio::decode::RawAudio;
use crate::audio::resample::resample;
use crate::config::AudioConfig;
use crate::constants::frames::{FRAME_LEN, HOP_LEN};
use crate::error::{Error, Result};
use tracing::warn;

/// Mono waveform at the target sample rate.
#[derive(Debug, Clone)]
pub struct Waveform {
    /// Samples as f32.
    pub samples: Vec<f32>,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// True when the clip was silent and peak normalization was skipped.
    ///
    /// Degenerate clips still classify; the flag surfaces as a warning on
    /// the prediction rather than a hard failure.
    pub degenerate: bool,
}

impl Waveform {
    /// Number of samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the waveform holds no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        #[allow(clippy::cast_precision_loss)]
        let len = self.samples.len() as f64;
        len / f64::from(self.sample_rate)
    }
}

/// Conditions decoded audio into the canonical mono form.
#[derive(Debug, Clone)]
pub struct Normalizer {
    target_rate: u32,
    trim_threshold_db: f32,
    pre_emphasis: Option<f32>,
    peak_level: f32,
}

impl Normalizer {
    /// Build a normalizer from audio settings.
    pub fn from_config(audio: &AudioConfig) -> Self {
        Self {
            target_rate: audio.sample_rate,
            trim_threshold_db: audio.trim_threshold_db,
            pre_emphasis: audio.pre_emphasis.then_some(audio.pre_emphasis_coef),
            peak_level: audio.peak_level,
        }
    }

    /// Condition raw decoded audio into a [`Waveform`].
    ///
    /// Fails with [`Error::EmptyAudio`] when no samples survive trimming,
    /// which only happens when the decode itself produced none.
    pub fn normalize(&self, raw: &RawAudio) -> Result<Waveform> {
        let mono = downmix(&raw.channels);
        let trimmed = trim_silence(&mono, self.trim_threshold_db);
        if trimmed.is_empty() {
            return Err(Error::EmptyAudio {
                stage: "silence trim",
            });
        }

        let mut samples = if raw.sample_rate == self.target_rate {
            trimmed.to_vec()
        } else {
            resample(trimmed.to_vec(), raw.sample_rate, self.target_rate)?
        };

        if let Some(coef) = self.pre_emphasis {
            pre_emphasize(&mut samples, coef);
        }

        let scaled = peak_normalize(&mut samples, self.peak_level);
        if !scaled {
            warn!("clip peak is zero, skipping peak normalization");
        }

        Ok(Waveform {
            samples,
            sample_rate: self.target_rate,
            degenerate: !scaled,
        })
    }
}

/// Average all channels into one, sample by sample.
fn downmix(channels: &[Vec<f32>]) -> Vec<f32> {
    match channels {
        [] => Vec::new(),
        [only] => only.clone(),
        many => {
            let frames = many.iter().map(Vec::len).min().unwrap_or(0);
            #[allow(clippy::cast_precision_loss)]
            let scale = 1.0 / many.len() as f32;
            (0..frames)
                .map(|i| many.iter().map(|ch| ch[i]).sum::<f32>() * scale)
                .collect()
        }
    }
}

/// Remove leading and trailing near-silence.
///
/// Frame energies are measured over full analysis frames; a frame is kept
/// when its energy is within `threshold_db` of the loudest frame. Interior
/// quiet stretches are never removed. An all-silent signal is returned
/// unchanged so that downstream stages can flag it instead.
fn trim_silence(samples: &[f32], threshold_db: f32) -> &[f32] {
    if samples.is_empty() {
        return samples;
    }

    let energies = frame_energies(samples);
    let max_energy = energies.iter().fold(0.0f32, |m, &e| m.max(e));
    if max_energy <= 0.0 {
        return samples;
    }

    let floor = max_energy * 10.0f32.powf(-threshold_db / 10.0);
    let first = energies.iter().position(|&e| e > floor);
    let last = energies.iter().rposition(|&e| e > floor);
    match (first, last) {
        (Some(first), Some(last)) => {
            let start = first * HOP_LEN;
            let end = (last * HOP_LEN + FRAME_LEN).min(samples.len());
            &samples[start..end]
        }
        _ => samples,
    }
}

/// Mean-square energy of each full analysis frame.
///
/// Signals shorter than one frame are measured as a single frame.
#[allow(clippy::cast_precision_loss)]
fn frame_energies(samples: &[f32]) -> Vec<f32> {
    if samples.len() < FRAME_LEN {
        let sum: f32 = samples.iter().map(|s| s * s).sum();
        return vec![sum / samples.len() as f32];
    }

    let count = 1 + (samples.len() - FRAME_LEN) / HOP_LEN;
    (0..count)
        .map(|i| {
            let frame = &samples[i * HOP_LEN..i * HOP_LEN + FRAME_LEN];
            frame.iter().map(|s| s * s).sum::<f32>() / FRAME_LEN as f32
        })
        .collect()
}

/// First-order high-pass filter, `y[n] = x[n] - coef * x[n-1]`.
///
/// The first sample passes through unchanged.
fn pre_emphasize(samples: &mut [f32], coef: f32) {
    for i in (1..samples.len()).rev() {
        samples[i] -= coef * samples[i - 1];
    }
}

/// Scale so the maximum absolute amplitude equals `peak`.
///
/// Returns false without touching the samples when the signal is silent.
fn peak_normalize(samples: &mut [f32], peak: f32) -> bool {
    let max_val = samples.iter().fold(0.0f32, |m, &s| m.max(s.abs()));
    if max_val > 0.0 {
        let gain = peak / max_val;
        for s in samples.iter_mut() {
            *s *= gain;
        }
        true
    } else {
        false
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    fn plain_normalizer() -> Normalizer {
        Normalizer {
            target_rate: 22_050,
            trim_threshold_db: 30.0,
            pre_emphasis: None,
            peak_level: 0.98,
        }
    }

    #[test]
    fn test_downmix_averages_channels() {
        let channels = vec![vec![1.0, 0.0, 0.5], vec![0.0, 1.0, 0.5]];
        assert_eq!(downmix(&channels), vec![0.5, 0.5, 0.5]);
    }

    #[test]
    fn test_downmix_single_channel_passthrough() {
        let channels = vec![vec![0.1, -0.2]];
        assert_eq!(downmix(&channels), vec![0.1, -0.2]);
    }

    #[test]
    fn test_trim_removes_leading_and_trailing_silence() {
        let mut signal = vec![0.0f32; 4096];
        signal.extend(std::iter::repeat_n(0.5f32, 8192));
        signal.extend(std::iter::repeat_n(0.0f32, 4096));

        let trimmed = trim_silence(&signal, 30.0);
        assert!(trimmed.len() < signal.len());
        // Bounds land on hop boundaries around the loud region.
        assert_eq!(trimmed.len(), 11_264);
        assert!(trimmed.iter().any(|&s| s == 0.5));
    }

    #[test]
    fn test_trim_all_silent_returns_input() {
        let signal = vec![0.0f32; 8000];
        let trimmed = trim_silence(&signal, 30.0);
        assert_eq!(trimmed.len(), 8000);
    }

    #[test]
    fn test_trim_keeps_interior_quiet_stretch() {
        let mut signal = vec![0.5f32; 4096];
        signal.extend(std::iter::repeat_n(0.0f32, 8192));
        signal.extend(std::iter::repeat_n(0.5f32, 4096));

        let trimmed = trim_silence(&signal, 30.0);
        // Interior silence survives; only edges may move.
        assert!(trimmed.iter().filter(|&&s| s == 0.0).count() >= 8000);
    }

    #[test]
    fn test_pre_emphasis_first_sample_unchanged() {
        let mut samples = vec![1.0, 1.0, 1.0];
        pre_emphasize(&mut samples, 0.97);
        assert_eq!(samples[0], 1.0);
        assert!((samples[1] - 0.03).abs() < 1e-6);
        assert!((samples[2] - 0.03).abs() < 1e-6);
    }

    #[test]
    fn test_peak_normalize_hits_target() {
        let mut samples = vec![0.1, -0.2, 0.05];
        assert!(peak_normalize(&mut samples, 0.98));
        assert!((samples[1] + 0.98).abs() < 1e-6);
        assert!((samples[0] - 0.49).abs() < 1e-6);
    }

    #[test]
    fn test_normalize_empty_decode_fails() {
        let raw = RawAudio {
            channels: vec![],
            sample_rate: 22_050,
            source: "test",
        };
        let err = plain_normalizer().normalize(&raw).unwrap_err();
        assert!(matches!(err, Error::EmptyAudio { .. }));
    }

    #[test]
    fn test_normalize_silent_clip_sets_degenerate() {
        let raw = RawAudio {
            channels: vec![vec![0.0; 4096]],
            sample_rate: 22_050,
            source: "test",
        };
        let waveform = plain_normalizer().normalize(&raw).unwrap();
        assert!(waveform.degenerate);
        assert!(waveform.samples.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_normalize_resamples_to_target() {
        #[allow(clippy::cast_precision_loss)]
        let samples: Vec<f32> = (0..44_100)
            .map(|i| (i as f32 * 0.05).sin() * 0.8)
            .collect();
        let raw = RawAudio {
            channels: vec![samples],
            sample_rate: 44_100,
            source: "test",
        };

        let waveform = plain_normalizer().normalize(&raw).unwrap();
        assert_eq!(waveform.sample_rate, 22_050);
        assert!(waveform.len() > 21_000 && waveform.len() < 23_000);
        assert!(!waveform.degenerate);
    }

    #[test]
    fn test_normalize_applies_configured_peak() {
        let raw = RawAudio {
            channels: vec![vec![0.1f32; 4096]],
            sample_rate: 22_050,
            source: "test",
        };
        let waveform = plain_normalizer().normalize(&raw).unwrap();
        let max = waveform.samples.iter().fold(0.0f32, |m, &s| m.max(s.abs()));
        assert!((max - 0.98).abs() < 1e-6);
    }
}
