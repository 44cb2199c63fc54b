//! Assembles the feature vector the classifier consumes from one audio
//! segment, in the exact column order the schema artifact dictates.

use crate::audio::Segment;
use crate::constants::ROLLOFF_PERCENT;
use crate::constants::frames::{FRAME_LEN, HOP_LEN};
use crate::constants::mel::{N_BANDS, N_MFCC};
use crate::error::{Error, Result};
use crate::features::mel::{DctBasis, MelFilterbank, power_to_db};
use crate::features::schema::FeatureSchema;
use crate::features::spectral::{bandwidth_frames, centroid_frames, rolloff_frames};
use crate::features::stft::StftAnalyzer;
use crate::features::temporal::{rms_frames, zcr_frames};

/// Raw feature vector in schema order, one value per column.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector(Vec<f32>);

impl FeatureVector {
    /// Feature values as a slice.
    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    /// Number of features.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the vector has no elements.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// One schema column resolved to the descriptor series it summarizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Descriptor {
    CentroidMean,
    BandwidthMean,
    RolloffMean,
    /// Mean of one MFCC series, 0-based coefficient.
    MfccMean(usize),
    /// Standard deviation of one MFCC series, 0-based coefficient.
    MfccStd(usize),
    ZcrMean,
    RmsMean,
    RmsStd,
}

impl Descriptor {
    fn parse(column: &str) -> Option<Self> {
        match column {
            "centroid_mean" => Some(Self::CentroidMean),
            "bandwidth_mean" => Some(Self::BandwidthMean),
            "rolloff_mean" => Some(Self::RolloffMean),
            "zcr_mean" => Some(Self::ZcrMean),
            "rms_mean" => Some(Self::RmsMean),
            "rms_std" => Some(Self::RmsStd),
            _ => {
                let rest = column.strip_prefix("mfcc")?;
                if let Some(n) = rest.strip_suffix("_mean") {
                    let i: usize = n.parse().ok()?;
                    (1..=N_MFCC).contains(&i).then(|| Self::MfccMean(i - 1))
                } else if let Some(n) = rest.strip_suffix("_std") {
                    let i: usize = n.parse().ok()?;
                    (1..=N_MFCC).contains(&i).then(|| Self::MfccStd(i - 1))
                } else {
                    None
                }
            }
        }
    }
}

/// Computes the fixed-order feature vector from a canonical segment.
///
/// All analysis state (FFT plan, mel filterbank, DCT basis) is built once
/// and reused across clips.
pub struct FeatureExtractor {
    schema: FeatureSchema,
    descriptors: Vec<Descriptor>,
    stft: StftAnalyzer,
    mel: MelFilterbank,
    dct: DctBasis,
    bin_freqs: Vec<f32>,
    sample_rate: u32,
}

// Debug is manual: the STFT analyzer holds a non-Debug FFT plan.
impl std::fmt::Debug for FeatureExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeatureExtractor")
            .field("schema", &self.schema)
            .field("sample_rate", &self.sample_rate)
            .finish_non_exhaustive()
    }
}

impl FeatureExtractor {
    /// Builds an extractor for the given schema and sample rate.
    ///
    /// Fails with [`Error::ConfigMismatch`] if any schema column does not
    /// name a descriptor this extractor can compute.
    pub fn new(schema: FeatureSchema, sample_rate: u32) -> Result<Self> {
        let descriptors = schema
            .columns
            .iter()
            .map(|column| {
                Descriptor::parse(column).ok_or_else(|| Error::ConfigMismatch {
                    message: format!("unknown feature column '{column}'"),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let stft = StftAnalyzer::new(FRAME_LEN, HOP_LEN);
        let bin_freqs = stft.bin_frequencies(sample_rate);
        Ok(Self {
            schema,
            descriptors,
            stft,
            mel: MelFilterbank::new(N_BANDS, FRAME_LEN, sample_rate),
            dct: DctBasis::new(N_MFCC, N_BANDS),
            bin_freqs,
            sample_rate,
        })
    }

    /// The schema this extractor assembles vectors for.
    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    /// Extracts the feature vector from a fixed-length segment.
    ///
    /// Non-finite descriptor values (silent clips produce NaN centroids)
    /// are replaced with 0.0 so the vector is always usable downstream.
    pub fn extract(&self, segment: &Segment) -> Result<FeatureVector> {
        if segment.sample_rate != self.sample_rate {
            return Err(Error::Validation {
                message: format!(
                    "segment sample rate {} does not match extractor rate {}",
                    segment.sample_rate, self.sample_rate
                ),
            });
        }

        let spectrogram = self.stft.magnitudes(&segment.samples)?;

        let centroid = centroid_frames(&spectrogram, &self.bin_freqs);
        let bandwidth = bandwidth_frames(&spectrogram, &self.bin_freqs);
        let rolloff = rolloff_frames(&spectrogram, &self.bin_freqs, ROLLOFF_PERCENT);

        let mel_db = {
            let mel_frames: Vec<Vec<f32>> = spectrogram
                .frames
                .iter()
                .map(|frame| {
                    let power: Vec<f32> = frame.iter().map(|&m| m * m).collect();
                    self.mel.apply(&power)
                })
                .collect();
            power_to_db(&mel_frames)
        };

        let mut mfcc: Vec<Vec<f32>> = vec![Vec::new(); N_MFCC];
        for frame in &mel_db {
            for (series, value) in mfcc.iter_mut().zip(self.dct.apply(frame)) {
                series.push(value);
            }
        }

        let zcr = zcr_frames(&segment.samples, FRAME_LEN, HOP_LEN);
        let rms = rms_frames(&segment.samples, FRAME_LEN, HOP_LEN);

        let values = self
            .descriptors
            .iter()
            .map(|descriptor| {
                let value = match descriptor {
                    Descriptor::CentroidMean => mean(&centroid),
                    Descriptor::BandwidthMean => mean(&bandwidth),
                    Descriptor::RolloffMean => mean(&rolloff),
                    Descriptor::MfccMean(i) => mean(&mfcc[*i]),
                    Descriptor::MfccStd(i) => population_std(&mfcc[*i]),
                    Descriptor::ZcrMean => mean(&zcr),
                    Descriptor::RmsMean => mean(&rms),
                    Descriptor::RmsStd => population_std(&rms),
                };
                if value.is_finite() { value } else { 0.0 }
            })
            .collect();

        Ok(FeatureVector(values))
    }
}

fn mean(values: &[f32]) -> f32 {
    if values.is_empty() {
        return f32::NAN;
    }
    let sum: f64 = values.iter().map(|&v| f64::from(v)).sum();
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    let m = (sum / values.len() as f64) as f32;
    m
}

fn population_std(values: &[f32]) -> f32 {
    if values.is_empty() {
        return f32::NAN;
    }
    #[allow(clippy::cast_precision_loss)]
    let n = values.len() as f64;
    let m: f64 = values.iter().map(|&v| f64::from(v)).sum::<f64>() / n;
    let var: f64 = values
        .iter()
        .map(|&v| {
            let d = f64::from(v) - m;
            d * d
        })
        .sum::<f64>()
        / n;
    #[allow(clippy::cast_possible_truncation)]
    let s = var.sqrt() as f32;
    s
}
