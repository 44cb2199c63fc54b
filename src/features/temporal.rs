//! Time-domain descriptors: zero-crossing rate and RMS energy per frame.

// Samples at or below this magnitude count as positive zero when
// detecting sign changes, so denormal noise never inflates the rate.
const ZCR_THRESHOLD: f32 = 1e-10;

fn sign_negative(v: f32) -> bool {
    if v.abs() <= ZCR_THRESHOLD {
        false
    } else {
        v.is_sign_negative()
    }
}

/// Fraction of sign changes per centered frame.
///
/// The signal is edge-padded by half a frame so frame `t` is centered on
/// sample `t * hop`, matching the spectral frame grid.
pub fn zcr_frames(samples: &[f32], frame_len: usize, hop: usize) -> Vec<f32> {
    let half = frame_len / 2;
    let mut padded = Vec::with_capacity(samples.len() + 2 * half);
    let first = samples.first().copied().unwrap_or(0.0);
    let last = samples.last().copied().unwrap_or(0.0);
    padded.extend(std::iter::repeat_n(first, half));
    padded.extend_from_slice(samples);
    padded.extend(std::iter::repeat_n(last, half));

    frame_starts(padded.len(), frame_len, hop)
        .map(|start| {
            let frame = &padded[start..start + frame_len];
            let crossings = frame
                .windows(2)
                .filter(|pair| sign_negative(pair[0]) != sign_negative(pair[1]))
                .count();
            #[allow(clippy::cast_precision_loss)]
            let rate = crossings as f32 / frame_len as f32;
            rate
        })
        .collect()
}

/// Root-mean-square energy per centered frame, zero-padded at the edges.
pub fn rms_frames(samples: &[f32], frame_len: usize, hop: usize) -> Vec<f32> {
    let half = frame_len / 2;
    let mut padded = vec![0.0f32; samples.len() + 2 * half];
    padded[half..half + samples.len()].copy_from_slice(samples);

    frame_starts(padded.len(), frame_len, hop)
        .map(|start| {
            let frame = &padded[start..start + frame_len];
            #[allow(clippy::cast_precision_loss)]
            let mean_sq: f64 = frame
                .iter()
                .map(|&v| f64::from(v) * f64::from(v))
                .sum::<f64>()
                / frame_len as f64;
            #[allow(clippy::cast_possible_truncation)]
            let rms = mean_sq.sqrt() as f32;
            rms
        })
        .collect()
}

fn frame_starts(padded_len: usize, frame_len: usize, hop: usize) -> impl Iterator<Item = usize> {
    let n_frames = if padded_len >= frame_len {
        1 + (padded_len - frame_len) / hop
    } else {
        0
    };
    (0..n_frames).map(move |t| t * hop)
}
