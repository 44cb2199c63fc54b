//! Audio resampling using rubato.

use crate::error::{Error, Result};
use audioadapter_buffers::direct::SequentialSlice;
use rubato::{Fft, FixedSync, Resampler};

/// Resample audio to the target sample rate.
///
/// Returns the input unchanged if already at the target rate. The output
/// length is exactly `ceil(len * to_rate / from_rate)`, with the
/// resampler's inherent delay compensated so the signal stays aligned in
/// time with the input.
pub fn resample(samples: Vec<f32>, from_rate: u32, to_rate: u32) -> Result<Vec<f32>> {
    if from_rate == to_rate || samples.is_empty() {
        return Ok(samples);
    }

    // FFT-based synchronous resampler with fixed input/output sizes
    let chunk_size = 1024;
    let sub_chunks = 1;
    let channels = 1;

    let mut resampler = Fft::<f32>::new(
        from_rate as usize,
        to_rate as usize,
        chunk_size,
        sub_chunks,
        channels,
        FixedSync::Both,
    )
    .map_err(|e| Error::Resample {
        reason: e.to_string(),
    })?;

    let delay = resampler.output_delay();
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    let target_len =
        ((samples.len() as f64) * f64::from(to_rate) / f64::from(from_rate)).ceil() as usize;

    let input_len = resampler.input_frames_next();
    let mut output = Vec::with_capacity(target_len + delay + chunk_size);

    // Zero-pad the input up to a whole number of chunks.
    let mut padded = samples;
    let remainder = padded.len() % input_len;
    if remainder != 0 {
        padded.resize(padded.len() + input_len - remainder, 0.0);
    }

    for chunk in padded.chunks(input_len) {
        process_chunk(&mut resampler, chunk, input_len, &mut output)?;
    }

    // Flush with silence until the delayed tail has fully emerged.
    let silence = vec![0.0f32; input_len];
    while output.len() < delay + target_len {
        process_chunk(&mut resampler, &silence, input_len, &mut output)?;
    }

    output.drain(..delay);
    output.truncate(target_len);
    Ok(output)
}

/// Push one fixed-size chunk through the resampler.
fn process_chunk(
    resampler: &mut Fft<f32>,
    chunk: &[f32],
    input_len: usize,
    output: &mut Vec<f32>,
) -> Result<()> {
    let input_adapter = SequentialSlice::new(chunk, 1, input_len).map_err(|e| Error::Resample {
        reason: format!("failed to create input adapter: {e}"),
    })?;

    let resampled = resampler
        .process(&input_adapter, 0, None)
        .map_err(|e| Error::Resample {
            reason: e.to_string(),
        })?;

    output.extend_from_slice(&resampled.take_data());
    Ok(())
}
