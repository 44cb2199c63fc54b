//! Per-frame spectral descriptors computed from a magnitude spectrogram.

use crate::features::stft::Spectrogram;

/// Magnitude-weighted mean frequency of every frame.
///
/// Silent frames yield NaN; the caller decides how to handle them.
pub fn centroid_frames(spec: &Spectrogram, freqs: &[f32]) -> Vec<f32> {
    spec.frames
        .iter()
        .map(|frame| {
            let mut num = 0.0f64;
            let mut den = 0.0f64;
            for (&m, &f) in frame.iter().zip(freqs) {
                num += f64::from(m) * f64::from(f);
                den += f64::from(m);
            }
            #[allow(clippy::cast_possible_truncation)]
            let c = (num / den) as f32;
            c
        })
        .collect()
}

/// Magnitude-weighted standard deviation around the centroid, per frame.
pub fn bandwidth_frames(spec: &Spectrogram, freqs: &[f32]) -> Vec<f32> {
    let centroids = centroid_frames(spec, freqs);
    spec.frames
        .iter()
        .zip(&centroids)
        .map(|(frame, &c)| {
            let c = f64::from(c);
            let mut num = 0.0f64;
            let mut den = 0.0f64;
            for (&m, &f) in frame.iter().zip(freqs) {
                let dev = f64::from(f) - c;
                num += f64::from(m) * dev * dev;
                den += f64::from(m);
            }
            #[allow(clippy::cast_possible_truncation)]
            let b = (num / den).sqrt() as f32;
            b
        })
        .collect()
}

/// Frequency below which `percent` of each frame's magnitude lies.
///
/// Silent frames roll off at bin zero, i.e. 0 Hz.
pub fn rolloff_frames(spec: &Spectrogram, freqs: &[f32], percent: f32) -> Vec<f32> {
    spec.frames
        .iter()
        .map(|frame| {
            let total: f64 = frame.iter().map(|&m| f64::from(m)).sum();
            let threshold = f64::from(percent) * total;
            let mut cumulative = 0.0f64;
            for (&m, &f) in frame.iter().zip(freqs) {
                cumulative += f64::from(m);
                if cumulative >= threshold {
                    return f;
                }
            }
            freqs.last().copied().unwrap_or(0.0)
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    fn spec_of(frames: Vec<Vec<f32>>) -> Spectrogram {
        let n_bins = frames.first().map_or(0, Vec::len);
        Spectrogram { frames, n_bins }
    }

    fn freqs(n: usize, step: f32) -> Vec<f32> {
        #[allow(clippy::cast_precision_loss)]
        (0..n).map(|i| i as f32 * step).collect()
    }

    #[test]
    fn test_centroid_of_single_tone() {
        let mut frame = vec![0.0f32; 8];
        frame[3] = 1.0;
        let spec = spec_of(vec![frame]);
        let c = centroid_frames(&spec, &freqs(8, 100.0));
        assert!((c[0] - 300.0).abs() < 1e-4);
    }

    #[test]
    fn test_centroid_of_silence_is_nan() {
        let spec = spec_of(vec![vec![0.0f32; 8]]);
        let c = centroid_frames(&spec, &freqs(8, 100.0));
        assert!(c[0].is_nan());
    }

    #[test]
    fn test_bandwidth_of_tone_pair() {
        // Equal energy at 200 Hz and 400 Hz: centroid 300, deviation 100.
        let mut frame = vec![0.0f32; 8];
        frame[2] = 1.0;
        frame[4] = 1.0;
        let spec = spec_of(vec![frame]);
        let b = bandwidth_frames(&spec, &freqs(8, 100.0));
        assert!((b[0] - 100.0).abs() < 1e-3);
    }

    #[test]
    fn test_bandwidth_of_pure_tone_is_zero() {
        let mut frame = vec![0.0f32; 8];
        frame[5] = 2.0;
        let spec = spec_of(vec![frame]);
        let b = bandwidth_frames(&spec, &freqs(8, 100.0));
        assert!(b[0].abs() < 1e-4);
    }

    #[test]
    fn test_rolloff_picks_first_bin_over_threshold() {
        // 85% of the mass is reached at bin 2 (0.5 + 0.3 + 0.2 cumsum).
        let spec = spec_of(vec![vec![0.5, 0.3, 0.2, 0.0]]);
        let r = rolloff_frames(&spec, &freqs(4, 100.0), 0.85);
        assert_eq!(r[0], 200.0);
    }

    #[test]
    fn test_rolloff_of_silence_is_zero() {
        let spec = spec_of(vec![vec![0.0f32; 8]]);
        let r = rolloff_frames(&spec, &freqs(8, 100.0), 0.85);
        assert_eq!(r[0], 0.0);
    }
}
