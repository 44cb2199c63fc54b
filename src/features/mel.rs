//! Mel filterbank, decibel conversion, and the DCT basis behind the MFCCs.

use crate::constants::mel::{POWER_FLOOR, TOP_DB};
use std::f64::consts::PI;

// Slaney-style mel scale: linear below 1 kHz, logarithmic above.
const F_SP: f64 = 200.0 / 3.0;
const MIN_LOG_HZ: f64 = 1000.0;
const MIN_LOG_MEL: f64 = MIN_LOG_HZ / F_SP;

fn log_step() -> f64 {
    (6.4f64).ln() / 27.0
}

fn hz_to_mel(hz: f64) -> f64 {
    if hz >= MIN_LOG_HZ {
        MIN_LOG_MEL + (hz / MIN_LOG_HZ).ln() / log_step()
    } else {
        hz / F_SP
    }
}

fn mel_to_hz(mel: f64) -> f64 {
    if mel >= MIN_LOG_MEL {
        MIN_LOG_HZ * ((mel - MIN_LOG_MEL) * log_step()).exp()
    } else {
        mel * F_SP
    }
}

/// Triangular mel filterbank mapping power spectra onto mel bands.
pub struct MelFilterbank {
    /// Per-band bin weights, `n_mels` rows of `n_fft / 2 + 1` columns.
    weights: Vec<Vec<f32>>,
}

impl MelFilterbank {
    /// Build an area-normalized filterbank spanning 0 Hz to Nyquist.
    pub fn new(n_mels: usize, n_fft: usize, sample_rate: u32) -> Self {
        let n_bins = n_fft / 2 + 1;
        let nyquist = f64::from(sample_rate) / 2.0;

        let mel_max = hz_to_mel(nyquist);
        #[allow(clippy::cast_precision_loss)]
        let band_edges: Vec<f64> = (0..n_mels + 2)
            .map(|i| mel_to_hz(mel_max * i as f64 / (n_mels + 1) as f64))
            .collect();

        #[allow(clippy::cast_precision_loss)]
        let bin_freqs: Vec<f64> = (0..n_bins)
            .map(|i| i as f64 * f64::from(sample_rate) / n_fft as f64)
            .collect();

        let weights = (0..n_mels)
            .map(|m| {
                let (lower, center, upper) =
                    (band_edges[m], band_edges[m + 1], band_edges[m + 2]);
                let enorm = 2.0 / (upper - lower);
                bin_freqs
                    .iter()
                    .map(|&f| {
                        let rising = (f - lower) / (center - lower);
                        let falling = (upper - f) / (upper - center);
                        #[allow(clippy::cast_possible_truncation)]
                        let w = (rising.min(falling).max(0.0) * enorm) as f32;
                        w
                    })
                    .collect()
            })
            .collect();

        Self { weights }
    }

    /// Project one power-spectrum frame onto the mel bands.
    pub fn apply(&self, power_frame: &[f32]) -> Vec<f32> {
        self.weights
            .iter()
            .map(|row| {
                let sum: f64 = row
                    .iter()
                    .zip(power_frame)
                    .map(|(&w, &p)| f64::from(w) * f64::from(p))
                    .sum();
                #[allow(clippy::cast_possible_truncation)]
                let out = sum as f32;
                out
            })
            .collect()
    }
}

/// Convert power frames to decibels relative to 1.0, clamped to a dynamic
/// range of [`TOP_DB`] below the loudest value in the whole spectrogram.
pub fn power_to_db(frames: &[Vec<f32>]) -> Vec<Vec<f32>> {
    #[allow(clippy::cast_possible_truncation)]
    let mut db: Vec<Vec<f32>> = frames
        .iter()
        .map(|frame| {
            frame
                .iter()
                .map(|&p| (10.0 * f64::from(p.max(POWER_FLOOR)).log10()) as f32)
                .collect()
        })
        .collect();

    let max_db = db
        .iter()
        .flatten()
        .fold(f32::NEG_INFINITY, |acc, &v| acc.max(v));
    if max_db.is_finite() {
        let floor = max_db - TOP_DB;
        for frame in &mut db {
            for v in frame {
                *v = v.max(floor);
            }
        }
    }
    db
}

/// Orthonormal DCT-II basis used to decorrelate the mel bands.
pub struct DctBasis {
    /// `n_coeffs` rows of `n_input` basis values.
    basis: Vec<Vec<f32>>,
}

impl DctBasis {
    /// Precompute the first `n_coeffs` basis vectors over `n_input` points.
    pub fn new(n_coeffs: usize, n_input: usize) -> Self {
        #[allow(clippy::cast_precision_loss)]
        let n = n_input as f64;
        let basis = (0..n_coeffs)
            .map(|k| {
                let scale = if k == 0 {
                    (1.0 / n).sqrt()
                } else {
                    (2.0 / n).sqrt()
                };
                #[allow(clippy::cast_precision_loss)]
                (0..n_input)
                    .map(|i| {
                        let angle = PI * k as f64 * (i as f64 + 0.5) / n;
                        #[allow(clippy::cast_possible_truncation)]
                        let v = (scale * angle.cos()) as f32;
                        v
                    })
                    .collect()
            })
            .collect();
        Self { basis }
    }

    /// Apply the basis to one frame of mel energies.
    pub fn apply(&self, frame: &[f32]) -> Vec<f32> {
        self.basis
            .iter()
            .map(|row| {
                let sum: f64 = row
                    .iter()
                    .zip(frame)
                    .map(|(&b, &x)| f64::from(b) * f64::from(x))
                    .sum();
                #[allow(clippy::cast_possible_truncation)]
                let out = sum as f32;
                out
            })
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn test_mel_scale_linear_log_boundary() {
        // 1 kHz sits exactly at the linear/log junction.
        assert!((hz_to_mel(1000.0) - 15.0).abs() < 1e-12);
        assert!((hz_to_mel(500.0) - 7.5).abs() < 1e-12);
    }

    #[test]
    fn test_mel_scale_roundtrip() {
        for hz in [0.0, 200.0, 999.9, 1000.0, 4000.0, 11_025.0] {
            let back = mel_to_hz(hz_to_mel(hz));
            assert!((back - hz).abs() < 1e-6, "roundtrip failed at {hz}");
        }
    }

    #[test]
    fn test_filterbank_rows_cover_spectrum() {
        let fb = MelFilterbank::new(128, 2048, 22_050);
        assert_eq!(fb.weights.len(), 128);
        assert_eq!(fb.weights[0].len(), 1025);
        // Every band has some nonzero support.
        for (m, row) in fb.weights.iter().enumerate() {
            assert!(row.iter().any(|&w| w > 0.0), "band {m} is empty");
        }
    }

    #[test]
    fn test_filterbank_apply_is_nonnegative() {
        let fb = MelFilterbank::new(128, 2048, 22_050);
        let frame = vec![1.0f32; 1025];
        let mel = fb.apply(&frame);
        assert_eq!(mel.len(), 128);
        assert!(mel.iter().all(|&v| v >= 0.0));
    }

    #[test]
    fn test_power_to_db_reference_and_floor() {
        let db = power_to_db(&[vec![1.0, 1e-12]]);
        assert!((db[0][0] - 0.0).abs() < 1e-6);
        // Tiny values hit the amin clamp, then the top_db floor.
        assert!((db[0][1] - (-80.0)).abs() < 1e-4);
    }

    #[test]
    fn test_power_to_db_floor_tracks_global_max() {
        let db = power_to_db(&[vec![100.0], vec![1e-12]]);
        assert!((db[0][0] - 20.0).abs() < 1e-4);
        assert!((db[1][0] - (20.0 - 80.0)).abs() < 1e-4);
    }

    #[test]
    fn test_dct_constant_input_concentrates_in_first_coeff() {
        let dct = DctBasis::new(13, 128);
        let frame = vec![2.0f32; 128];
        let coeffs = dct.apply(&frame);
        assert_eq!(coeffs.len(), 13);
        // Orthonormal DCT of a constant: coeff 0 is c * sqrt(N).
        assert!((coeffs[0] - 2.0 * (128.0f32).sqrt()).abs() < 1e-3);
        for &c in &coeffs[1..] {
            assert!(c.abs() < 1e-3);
        }
    }
}
