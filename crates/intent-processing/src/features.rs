//! Feature extraction for analysis windows
//!
//! Every window becomes one `FeatureVector`: time-domain statistics,
//! zero-crossing rate, spectral entropy, spectral moments, EEG band powers and
//! the full magnitude spectrum. `FeatureVector::to_row` flattens it in the
//! published column order returned by `feature_columns`.

use crate::spectrum::{spectral_entropy, BandPowers, SpectralAnalyzer, SpectralMoments};
use intent_core::{IntentError, IntentResult, Window};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Fewest samples a window may have
pub const MIN_WINDOW_SAMPLES: usize = 2;

/// Scalar columns, in schema order, preceding the `FFT_*` columns
pub const SCALAR_COLUMNS: [&str; 21] = [
    "Start Timestamp",
    "End Timestamp",
    "Mean",
    "Max",
    "Standard Deviation",
    "RMS",
    "Kurtosis",
    "Skewness",
    "Peak-to-Peak",
    "Abs Diff Signal",
    "Zero Crossing Rate",
    "Entropy",
    "Spectral Centroid",
    "Spectral Spread",
    "Spectral Skewness",
    "Spectral Kurtosis",
    "Alpha Power",
    "Beta Power",
    "Gamma Power",
    "Delta Power",
    "Theta Power",
];

/// Name of the `bin`-th spectrum column
pub fn fft_column(bin: usize) -> String {
    format!("FFT_{}", bin)
}

/// Full ordered column list for windows of `window_size` samples
pub fn feature_columns(window_size: usize) -> Vec<String> {
    SCALAR_COLUMNS
        .iter()
        .map(|name| name.to_string())
        .chain((0..window_size).map(fft_column))
        .collect()
}

/// Time domain features
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeFeatures {
    pub mean: f64,
    pub max: f64,
    /// Population standard deviation
    pub std_dev: f64,
    pub rms: f64,
    /// Excess (Fisher) kurtosis, biased estimator
    pub kurtosis: f64,
    /// Biased sample skewness
    pub skewness: f64,
    pub peak_to_peak: f64,
    /// Mean absolute first difference
    pub abs_diff: f64,
}

impl TimeFeatures {
    /// Compute from at least two samples
    pub fn from_samples(data: &[f64]) -> IntentResult<Self> {
        if data.len() < MIN_WINDOW_SAMPLES {
            return Err(IntentError::InsufficientSamples {
                required: MIN_WINDOW_SAMPLES,
                actual: data.len(),
            });
        }

        let n = data.len() as f64;
        let mean = data.iter().sum::<f64>() / n;
        let rms = (data.iter().map(|x| x * x).sum::<f64>() / n).sqrt();

        let min = data.iter().copied().fold(f64::INFINITY, f64::min);
        let max = data.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        // Central moments
        let mut m2 = 0.0;
        let mut m3 = 0.0;
        let mut m4 = 0.0;
        for &x in data {
            let diff = x - mean;
            let diff2 = diff * diff;
            m2 += diff2;
            m3 += diff2 * diff;
            m4 += diff2 * diff2;
        }
        m2 /= n;
        m3 /= n;
        m4 /= n;

        let std_dev = m2.sqrt();
        let (skewness, kurtosis) = if m2 > 0.0 {
            (m3 / m2.powf(1.5), m4 / (m2 * m2) - 3.0)
        } else {
            (0.0, 0.0)
        };

        let abs_diff = data.windows(2).map(|w| (w[1] - w[0]).abs()).sum::<f64>() / (n - 1.0);

        Ok(TimeFeatures {
            mean,
            max,
            std_dev,
            rms,
            kurtosis,
            skewness,
            peak_to_peak: max - min,
            abs_diff,
        })
    }
}

/// Fraction of consecutive sample pairs whose sign bit differs
pub fn zero_crossing_rate(data: &[f64]) -> f64 {
    if data.len() < MIN_WINDOW_SAMPLES {
        return 0.0;
    }
    let crossings = data
        .windows(2)
        .filter(|w| w[0].is_sign_negative() != w[1].is_sign_negative())
        .count();
    crossings as f64 / (data.len() - 1) as f64
}

/// All features of one window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub start_timestamp: f64,
    pub end_timestamp: f64,
    pub time: TimeFeatures,
    pub zero_crossing_rate: f64,
    /// Entropy of the magnitude spectrum, in nats
    pub entropy: f64,
    pub spectral: SpectralMoments,
    pub bands: BandPowers,
    /// `|FFT(window)|`, one entry per sample
    pub spectrum: Vec<f64>,
}

impl FeatureVector {
    /// Number of values `to_row` produces
    pub fn width(&self) -> usize {
        SCALAR_COLUMNS.len() + self.spectrum.len()
    }

    /// Scalar features, in `SCALAR_COLUMNS` order
    pub fn scalars(&self) -> [f64; SCALAR_COLUMNS.len()] {
        [
            self.start_timestamp,
            self.end_timestamp,
            self.time.mean,
            self.time.max,
            self.time.std_dev,
            self.time.rms,
            self.time.kurtosis,
            self.time.skewness,
            self.time.peak_to_peak,
            self.time.abs_diff,
            self.zero_crossing_rate,
            self.entropy,
            self.spectral.centroid,
            self.spectral.spread,
            self.spectral.skewness,
            self.spectral.kurtosis,
            self.bands.alpha,
            self.bands.beta,
            self.bands.gamma,
            self.bands.delta,
            self.bands.theta,
        ]
    }

    /// Flatten in the order of `feature_columns(self.spectrum.len())`
    pub fn to_row(&self) -> Vec<f64> {
        let mut row = Vec::with_capacity(self.width());
        row.extend_from_slice(&self.scalars());
        row.extend_from_slice(&self.spectrum);
        row
    }

    /// Value of a named column
    pub fn get(&self, column: &str) -> Option<f64> {
        if let Some(bin) = column.strip_prefix("FFT_") {
            return bin.parse::<usize>().ok().and_then(|i| self.spectrum.get(i).copied());
        }
        let position = SCALAR_COLUMNS.iter().position(|&name| name == column)?;
        Some(self.scalars()[position])
    }
}

/// Feature extractor with a cached FFT planner and bin-frequency tables
pub struct FeatureExtractor {
    analyzer: SpectralAnalyzer,
    frequencies: HashMap<usize, Vec<f64>>,
}

impl FeatureExtractor {
    pub fn new(sampling_rate: f64) -> Self {
        Self {
            analyzer: SpectralAnalyzer::new(sampling_rate),
            frequencies: HashMap::new(),
        }
    }

    /// Extract the feature vector of one window
    pub fn extract(&mut self, window: &Window<'_>) -> IntentResult<FeatureVector> {
        self.extract_values(window.start_timestamp(), window.end_timestamp(), &window.values())
    }

    /// Extract features from bare values with explicit window bounds
    pub fn extract_values(
        &mut self,
        start_timestamp: f64,
        end_timestamp: f64,
        values: &[f64],
    ) -> IntentResult<FeatureVector> {
        let time = TimeFeatures::from_samples(values)?;

        let spectrum = self.analyzer.magnitude_spectrum(values);
        let analyzer = &self.analyzer;
        let frequencies = self
            .frequencies
            .entry(values.len())
            .or_insert_with(|| analyzer.frequencies(values.len()));

        Ok(FeatureVector {
            start_timestamp,
            end_timestamp,
            time,
            zero_crossing_rate: zero_crossing_rate(values),
            entropy: spectral_entropy(&spectrum),
            spectral: SpectralMoments::from_spectrum(&spectrum, frequencies),
            bands: BandPowers::from_spectrum(&spectrum, frequencies),
            spectrum,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segmenter::WindowSegmenter;
    use crate::spectrum::EegBand;
    use intent_core::CleanedSignal;
    use std::f64::consts::PI;

    fn sine(freq: f64, n: usize, fs: f64) -> Vec<f64> {
        (0..n).map(|i| (2.0 * PI * freq * i as f64 / fs).sin()).collect()
    }

    #[test]
    fn test_feature_columns() {
        let columns = feature_columns(125);
        assert_eq!(columns.len(), 21 + 125);
        assert_eq!(columns[0], "Start Timestamp");
        assert_eq!(columns[20], "Theta Power");
        assert_eq!(columns[21], "FFT_0");
        assert_eq!(columns[145], "FFT_124");
    }

    #[test]
    fn test_time_features() {
        let features = TimeFeatures::from_samples(&[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();

        assert_eq!(features.mean, 3.0);
        assert_eq!(features.max, 5.0);
        assert!((features.std_dev - 2.0f64.sqrt()).abs() < 1e-12);
        assert!((features.rms - 11.0f64.sqrt()).abs() < 1e-12);
        assert!(features.skewness.abs() < 1e-12);
        // Uniform five points: m4 / m2^2 = 6.8 / 4 = 1.7
        assert!((features.kurtosis - (1.7 - 3.0)).abs() < 1e-12);
        assert_eq!(features.peak_to_peak, 4.0);
        assert_eq!(features.abs_diff, 1.0);
    }

    #[test]
    fn test_time_features_skewed() {
        let features = TimeFeatures::from_samples(&[0.0, 0.0, 0.0, 4.0]).unwrap();
        // mean 1, m2 = 3, m3 = 6 -> 6 / 3^1.5
        assert!((features.skewness - 6.0 / 3.0f64.powf(1.5)).abs() < 1e-12);
        assert!((features.abs_diff - 4.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_time_features_constant_signal() {
        let features = TimeFeatures::from_samples(&[3.0; 10]).unwrap();
        assert_eq!(features.std_dev, 0.0);
        assert_eq!(features.skewness, 0.0);
        assert_eq!(features.kurtosis, 0.0);
        assert_eq!(features.abs_diff, 0.0);
    }

    #[test]
    fn test_insufficient_samples() {
        let mut extractor = FeatureExtractor::new(125.0);
        let err = extractor.extract_values(0.0, 0.0, &[1.0]).unwrap_err();
        assert_eq!(err, IntentError::InsufficientSamples { required: 2, actual: 1 });
    }

    #[test]
    fn test_zero_crossing_rate() {
        assert_eq!(zero_crossing_rate(&[1.0, -1.0, 1.0, -1.0, 1.0]), 1.0);
        assert_eq!(zero_crossing_rate(&[1.0, 2.0, 3.0]), 0.0);
        // Zero counts as non-negative
        assert_eq!(zero_crossing_rate(&[-1.0, 0.0, 1.0]), 0.5);
    }

    #[test]
    fn test_all_zero_window_uses_fallbacks() {
        let mut extractor = FeatureExtractor::new(125.0);
        let features = extractor.extract_values(0.0, 0.992, &[0.0; 125]).unwrap();

        assert_eq!(features.spectral, SpectralMoments::default());
        assert_eq!(features.entropy, 0.0);
        assert_eq!(features.bands.total(), 0.0);
        assert!(features.to_row().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_single_window_signal() {
        let values = sine(10.0, 125, 125.0);
        let signal = CleanedSignal::from_values(&values, 125.0);
        let segmenter = WindowSegmenter::new(125, 62).unwrap();
        let mut extractor = FeatureExtractor::new(125.0);

        let vectors: Vec<FeatureVector> = segmenter
            .windows(&signal)
            .map(|w| extractor.extract(&w).unwrap())
            .collect();

        assert_eq!(vectors.len(), 1);
        assert_eq!(vectors[0].spectrum.len(), 125);
        assert_eq!(vectors[0].width(), feature_columns(125).len());
        assert_eq!(vectors[0].to_row().len(), vectors[0].width());
        assert_eq!(vectors[0].start_timestamp, 0.0);
        assert_eq!(vectors[0].end_timestamp, 0.992);
    }

    #[test]
    fn test_sine_features() {
        let mut extractor = FeatureExtractor::new(125.0);
        let features = extractor.extract_values(0.0, 0.992, &sine(10.0, 125, 125.0)).unwrap();

        assert!(features.time.mean.abs() < 1e-9);
        assert!((features.time.rms - 0.5f64.sqrt()).abs() < 1e-9);
        assert!(features.zero_crossing_rate > 0.1);
        assert_eq!(features.bands.dominant(), EegBand::Alpha);
        assert!(features.bands.alpha > features.bands.total() - features.bands.alpha);

        // Mirrored bins at +/-10 Hz: centroid 0, spread 10
        assert!(features.spectral.centroid.abs() < 1e-6);
        assert!((features.spectral.spread - 10.0).abs() < 1e-6);
        // Two equal bins carry the whole spectrum: entropy ln 2
        assert!((features.entropy - 2.0f64.ln()).abs() < 1e-6);
    }

    #[test]
    fn test_named_lookup_matches_row() {
        let mut extractor = FeatureExtractor::new(125.0);
        let features = extractor
            .extract_values(1.5, 2.492, &sine(20.0, 125, 125.0))
            .unwrap();

        let row = features.to_row();
        for (i, column) in feature_columns(125).iter().enumerate() {
            assert_eq!(features.get(column), Some(row[i]), "column {}", column);
        }
        assert_eq!(features.get("FFT_125"), None);
        assert_eq!(features.get("Median Frequency"), None);
    }
}
