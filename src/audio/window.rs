//! Selection of the most active fixed-length analysis window.
//!
//! Field recordings run longer than the clip the classifier expects, and
//! the call of interest is rarely at the start. The selector scores every
//! candidate window that begins on a hop boundary by its summed energy and
//! keeps the loudest one.

use crate::audio::normalize::Waveform;
use crate::config::Config;
use std::collections::HashMap;
use tracing::debug;

/// Picks the start offset of the best window of clip length.
#[derive(Debug, Clone)]
pub struct WindowSelector {
    sample_rate: u32,
    hop_samples: usize,
    window_samples: usize,
    lead_in_skip: HashMap<String, f64>,
}

impl WindowSelector {
    /// Build a selector from configuration.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn from_config(config: &Config) -> Self {
        let hop_samples =
            (config.selection.hop_secs * f64::from(config.audio.sample_rate)).round() as usize;
        Self {
            sample_rate: config.audio.sample_rate,
            hop_samples: hop_samples.max(1),
            window_samples: config.audio.clip_samples(),
            lead_in_skip: config.selection.lead_in_skip.clone(),
        }
    }

    /// Return the start offset (in samples) of the best window.
    ///
    /// Waveforms no longer than the window return offset 0 and are padded
    /// downstream. Hop energies are measured over whole hops only; a
    /// trailing partial hop is never scored. Ties go to the earliest
    /// offset.
    pub fn select(&self, waveform: &Waveform, source_name: Option<&str>) -> usize {
        let len = waveform.len();
        if len <= self.window_samples {
            return 0;
        }

        let skip = self.lead_in(source_name, len);
        let region = &waveform.samples[skip..];

        let hop = self.hop_samples;
        let n_hops = region.len() / hop;
        let window_hops = (self.window_samples / hop).max(1);
        if n_hops < window_hops {
            return skip;
        }

        let mut prefix = vec![0.0f64; n_hops + 1];
        for (i, slot) in prefix.iter_mut().enumerate().skip(1) {
            let hop_energy: f64 = region[(i - 1) * hop..i * hop]
                .iter()
                .map(|&s| {
                    let v = f64::from(s);
                    v * v
                })
                .sum();
            *slot = hop_energy;
        }
        for i in 1..=n_hops {
            prefix[i] += prefix[i - 1];
        }

        let mut best_offset = 0;
        let mut best_score = f64::NEG_INFINITY;
        for i in 0..=(n_hops - window_hops) {
            if i * hop + self.window_samples > region.len() {
                break;
            }
            let score = prefix[i + window_hops] - prefix[i];
            if score > best_score {
                best_score = score;
                best_offset = i * hop;
            }
        }

        skip + best_offset
    }

    /// Resolve the configured lead-in skip for a source name, if any.
    ///
    /// The longest matching prefix wins. The skip is dropped when honoring
    /// it would leave less than one full window.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn lead_in(&self, source_name: Option<&str>, len: usize) -> usize {
        let Some(name) = source_name else {
            return 0;
        };
        let Some(secs) = self
            .lead_in_skip
            .iter()
            .filter(|(prefix, _)| name.starts_with(prefix.as_str()))
            .max_by(|a, b| a.0.len().cmp(&b.0.len()).then_with(|| a.0.cmp(b.0)))
            .map(|(_, &secs)| secs)
        else {
            return 0;
        };

        let skip = (secs * f64::from(self.sample_rate)).round() as usize;
        if len.saturating_sub(skip) < self.window_samples {
            debug!(
                name,
                secs, "ignoring lead-in skip, not enough audio after it"
            );
            0
        } else {
            skip
        }
    }
}
