//! Short-time Fourier transform over centered, Hann-windowed frames.

use crate::error::{Error, Result};
use realfft::{RealFftPlanner, RealToComplex};
use std::f32::consts::PI;
use std::sync::Arc;

/// Magnitude spectrogram, frame-major.
#[derive(Debug, Clone)]
pub struct Spectrogram {
    /// One magnitude row per frame, `n_bins` values each.
    pub frames: Vec<Vec<f32>>,
    /// Number of frequency bins (`n_fft / 2 + 1`).
    pub n_bins: usize,
}

/// Reusable STFT state: planned FFT plus the analysis window.
pub struct StftAnalyzer {
    fft: Arc<dyn RealToComplex<f32>>,
    window: Vec<f32>,
    n_fft: usize,
    hop: usize,
}

impl StftAnalyzer {
    /// Plan an analyzer for the given frame and hop lengths.
    pub fn new(n_fft: usize, hop: usize) -> Self {
        let mut planner = RealFftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(n_fft);
        Self {
            fft,
            window: periodic_hann(n_fft),
            n_fft,
            hop,
        }
    }

    /// Compute the magnitude spectrogram of `samples`.
    ///
    /// Frames are centered: the signal is reflect-padded by half a frame on
    /// each side, so frame `t` is centered on sample `t * hop`.
    pub fn magnitudes(&self, samples: &[f32]) -> Result<Spectrogram> {
        let half = self.n_fft / 2;
        let padded = reflect_pad(samples, half);

        let n_frames = if padded.len() >= self.n_fft {
            1 + (padded.len() - self.n_fft) / self.hop
        } else {
            0
        };
        let n_bins = self.n_fft / 2 + 1;

        let mut input = self.fft.make_input_vec();
        let mut output = self.fft.make_output_vec();
        let mut scratch = self.fft.make_scratch_vec();

        let mut frames = Vec::with_capacity(n_frames);
        for t in 0..n_frames {
            let start = t * self.hop;
            for (slot, (w, s)) in input
                .iter_mut()
                .zip(self.window.iter().zip(&padded[start..start + self.n_fft]))
            {
                *slot = w * s;
            }

            self.fft
                .process_with_scratch(&mut input, &mut output, &mut scratch)
                .map_err(|e| Error::Internal {
                    message: format!("fft failed: {e}"),
                })?;

            frames.push(
                output
                    .iter()
                    .map(|c| (c.re * c.re + c.im * c.im).sqrt())
                    .collect(),
            );
        }

        Ok(Spectrogram { frames, n_bins })
    }

    /// Center frequency in Hz of every bin at the given sample rate.
    #[allow(clippy::cast_precision_loss)]
    pub fn bin_frequencies(&self, sample_rate: u32) -> Vec<f32> {
        (0..=self.n_fft / 2)
            .map(|i| i as f32 * sample_rate as f32 / self.n_fft as f32)
            .collect()
    }
}

/// Periodic Hann window of length `n`.
#[allow(clippy::cast_precision_loss)]
fn periodic_hann(n: usize) -> Vec<f32> {
    (0..n)
        .map(|i| 0.5 * (1.0 - (2.0 * PI * i as f32 / n as f32).cos()))
        .collect()
}

/// Reflect-pad without repeating the edge samples.
///
/// `[1, 2, 3, 4]` padded by 2 becomes `[3, 2, 1, 2, 3, 4, 3, 2]`.
fn reflect_pad(samples: &[f32], pad: usize) -> Vec<f32> {
    let n = samples.len();
    if n == 0 {
        return vec![0.0; 2 * pad];
    }
    if n == 1 {
        return vec![samples[0]; 1 + 2 * pad];
    }

    let period = (2 * n - 2) as isize;
    (0..n + 2 * pad)
        .map(|i| {
            let pos = (i as isize - pad as isize).rem_euclid(period) as usize;
            let idx = if pos < n { pos } else { 2 * n - 2 - pos };
            samples[idx]
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn test_periodic_hann_endpoints() {
        let w = periodic_hann(8);
        assert_eq!(w.len(), 8);
        assert!(w[0].abs() < 1e-7);
        assert!((w[4] - 1.0).abs() < 1e-6);
        // Periodic form: the last sample does not return to zero.
        assert!(w[7] > 0.0);
    }

    #[test]
    fn test_reflect_pad_mirrors_without_edge() {
        let padded = reflect_pad(&[1.0, 2.0, 3.0, 4.0], 2);
        assert_eq!(padded, vec![3.0, 2.0, 1.0, 2.0, 3.0, 4.0, 3.0, 2.0]);
    }

    #[test]
    fn test_reflect_pad_single_sample() {
        let padded = reflect_pad(&[0.7], 3);
        assert_eq!(padded, vec![0.7; 7]);
    }

    #[test]
    fn test_frame_count_for_full_clip() {
        let analyzer = StftAnalyzer::new(2048, 512);
        let spec = analyzer.magnitudes(&vec![0.1; 220_500]).unwrap();
        assert_eq!(spec.frames.len(), 431);
        assert_eq!(spec.n_bins, 1025);
        assert_eq!(spec.frames[0].len(), 1025);
    }

    #[test]
    fn test_sine_peaks_at_expected_bin() {
        // A sine placed exactly on bin 100 must dominate that bin.
        let n_fft = 2048;
        let rate = 22_050u32;
        let freq = 100.0 * rate as f32 / n_fft as f32;
        #[allow(clippy::cast_precision_loss)]
        let samples: Vec<f32> = (0..22_050)
            .map(|i| (2.0 * PI * freq * i as f32 / rate as f32).sin())
            .collect();

        let analyzer = StftAnalyzer::new(n_fft, 512);
        let spec = analyzer.magnitudes(&samples).unwrap();
        // Inspect an interior frame, away from padding effects.
        let frame = &spec.frames[spec.frames.len() / 2];
        let peak_bin = frame
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .unwrap();
        assert_eq!(peak_bin, 100);
    }

    #[test]
    fn test_bin_frequencies_span_to_nyquist() {
        let analyzer = StftAnalyzer::new(2048, 512);
        let freqs = analyzer.bin_frequencies(22_050);
        assert_eq!(freqs.len(), 1025);
        assert_eq!(freqs[0], 0.0);
        assert!((freqs[1024] - 11_025.0).abs() < 1e-3);
    }
}
