//! FFT-based spectral analysis for analysis windows
//!
//! Works on the full two-sided magnitude spectrum `|FFT(x)|` of a window, with
//! bin frequencies laid out the way a standard DFT orders them: non-negative
//! frequencies first, then the negative half.

use num_complex::Complex;
use rustfft::FftPlanner;
use serde::{Deserialize, Serialize};

/// Canonical EEG frequency bands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EegBand {
    Delta,
    Theta,
    Alpha,
    Beta,
    Gamma,
}

impl EegBand {
    /// All bands, low to high
    pub const ALL: [EegBand; 5] = [
        EegBand::Delta,
        EegBand::Theta,
        EegBand::Alpha,
        EegBand::Beta,
        EegBand::Gamma,
    ];

    /// Inclusive frequency range in Hz
    pub fn range_hz(&self) -> (f64, f64) {
        match self {
            EegBand::Delta => (0.5, 4.0),
            EegBand::Theta => (4.0, 8.0),
            EegBand::Alpha => (8.0, 12.0),
            EegBand::Beta => (12.0, 30.0),
            EegBand::Gamma => (30.0, 100.0),
        }
    }

    /// Whether a bin frequency falls inside the band (both edges inclusive)
    pub fn contains(&self, frequency: f64) -> bool {
        let (low, high) = self.range_hz();
        frequency >= low && frequency <= high
    }

    pub fn name(&self) -> &'static str {
        match self {
            EegBand::Delta => "Delta",
            EegBand::Theta => "Theta",
            EegBand::Alpha => "Alpha",
            EegBand::Beta => "Beta",
            EegBand::Gamma => "Gamma",
        }
    }
}

/// Summed spectral magnitude per EEG band
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BandPowers {
    pub delta: f64,
    pub theta: f64,
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
}

impl BandPowers {
    /// Sum magnitudes of every bin whose frequency lies in each band
    ///
    /// Bins on a shared edge (e.g. exactly 4 Hz) count towards both bands.
    pub fn from_spectrum(magnitudes: &[f64], frequencies: &[f64]) -> Self {
        let mut powers = BandPowers::default();
        for (&magnitude, &frequency) in magnitudes.iter().zip(frequencies) {
            for band in EegBand::ALL {
                if band.contains(frequency) {
                    *powers.band_mut(band) += magnitude;
                }
            }
        }
        powers
    }

    pub fn get(&self, band: EegBand) -> f64 {
        match band {
            EegBand::Delta => self.delta,
            EegBand::Theta => self.theta,
            EegBand::Alpha => self.alpha,
            EegBand::Beta => self.beta,
            EegBand::Gamma => self.gamma,
        }
    }

    fn band_mut(&mut self, band: EegBand) -> &mut f64 {
        match band {
            EegBand::Delta => &mut self.delta,
            EegBand::Theta => &mut self.theta,
            EegBand::Alpha => &mut self.alpha,
            EegBand::Beta => &mut self.beta,
            EegBand::Gamma => &mut self.gamma,
        }
    }

    /// Total across all five bands
    pub fn total(&self) -> f64 {
        self.delta + self.theta + self.alpha + self.beta + self.gamma
    }

    /// Band carrying the most power; lower bands win ties
    pub fn dominant(&self) -> EegBand {
        let mut best = EegBand::Delta;
        for band in EegBand::ALL {
            if self.get(band) > self.get(best) {
                best = band;
            }
        }
        best
    }
}

/// Magnitude-weighted moments of the bin frequencies
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SpectralMoments {
    pub centroid: f64,
    pub spread: f64,
    pub skewness: f64,
    pub kurtosis: f64,
}

impl SpectralMoments {
    /// Weighted mean, standard deviation and standardized 3rd/4th moments
    ///
    /// A spectrum with zero total magnitude yields all zeros; a zero spread
    /// yields zero skewness and kurtosis.
    pub fn from_spectrum(magnitudes: &[f64], frequencies: &[f64]) -> Self {
        let total: f64 = magnitudes.iter().sum();
        if total <= 0.0 || !total.is_finite() {
            return SpectralMoments::default();
        }

        let weighted = || magnitudes.iter().zip(frequencies);

        let centroid = weighted().map(|(&m, &f)| f * m).sum::<f64>() / total;
        let variance = weighted()
            .map(|(&m, &f)| (f - centroid).powi(2) * m)
            .sum::<f64>()
            / total;
        let spread = variance.sqrt();

        if spread <= 0.0 {
            return SpectralMoments {
                centroid,
                spread,
                ..SpectralMoments::default()
            };
        }

        let standardized = |power: i32| {
            weighted()
                .map(|(&m, &f)| ((f - centroid) / spread).powi(power) * m)
                .sum::<f64>()
                / total
        };

        SpectralMoments {
            centroid,
            spread,
            skewness: standardized(3),
            kurtosis: standardized(4),
        }
    }
}

/// Shannon entropy (nats) of a magnitude spectrum treated as a distribution
pub fn spectral_entropy(magnitudes: &[f64]) -> f64 {
    let total: f64 = magnitudes.iter().sum();
    if total <= 0.0 || !total.is_finite() {
        return 0.0;
    }

    magnitudes
        .iter()
        .filter(|&&m| m > 0.0)
        .map(|&m| {
            let p = m / total;
            -p * p.ln()
        })
        .sum()
}

/// Frequencies of the DFT bins for `n` samples at `sampling_rate`
///
/// Non-negative frequencies first, then the negative half, e.g. for n = 5:
/// `[0, 1, 2, -2, -1] * fs / n`.
pub fn frequency_bins(n: usize, sampling_rate: f64) -> Vec<f64> {
    if n == 0 {
        return Vec::new();
    }
    let resolution = sampling_rate / n as f64;
    let positive = (n + 1) / 2;
    (0..n)
        .map(|i| {
            let k = if i < positive { i as f64 } else { i as f64 - n as f64 };
            k * resolution
        })
        .collect()
}

/// FFT-based spectral analyzer with cached plans
pub struct SpectralAnalyzer {
    sampling_rate: f64,
    planner: FftPlanner<f64>,
    buffer: Vec<Complex<f64>>,
    scratch: Vec<Complex<f64>>,
}

impl SpectralAnalyzer {
    pub fn new(sampling_rate: f64) -> Self {
        Self {
            sampling_rate,
            planner: FftPlanner::new(),
            buffer: Vec::new(),
            scratch: Vec::new(),
        }
    }

    /// Absolute value of the complex DFT, same length as the input
    pub fn magnitude_spectrum(&mut self, samples: &[f64]) -> Vec<f64> {
        let n = samples.len();
        if n == 0 {
            return Vec::new();
        }

        let fft = self.planner.plan_fft_forward(n);

        self.buffer.clear();
        self.buffer.extend(samples.iter().map(|&x| Complex::new(x, 0.0)));
        self.scratch.resize(fft.get_inplace_scratch_len(), Complex::new(0.0, 0.0));

        fft.process_with_scratch(&mut self.buffer, &mut self.scratch);

        self.buffer.iter().map(|c| c.norm()).collect()
    }

    /// Bin frequencies matching `magnitude_spectrum` output of length `n`
    pub fn frequencies(&self, n: usize) -> Vec<f64> {
        frequency_bins(n, self.sampling_rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn sine(freq: f64, n: usize, fs: f64) -> Vec<f64> {
        (0..n).map(|i| (2.0 * PI * freq * i as f64 / fs).sin()).collect()
    }

    #[test]
    fn test_frequency_bins_layout() {
        assert_eq!(frequency_bins(5, 5.0), vec![0.0, 1.0, 2.0, -2.0, -1.0]);
        assert_eq!(frequency_bins(4, 4.0), vec![0.0, 1.0, -2.0, -1.0]);

        let bins = frequency_bins(125, 125.0);
        assert_eq!(bins.len(), 125);
        assert_eq!(bins[62], 62.0);
        assert_eq!(bins[63], -62.0);
        assert_eq!(bins[124], -1.0);
    }

    #[test]
    fn test_magnitude_spectrum_of_sine() {
        let mut analyzer = SpectralAnalyzer::new(125.0);
        let spectrum = analyzer.magnitude_spectrum(&sine(10.0, 125, 125.0));

        assert_eq!(spectrum.len(), 125);
        // A full-scale sine puts n/2 into each of its two mirrored bins
        assert!((spectrum[10] - 62.5).abs() < 1e-6);
        assert!((spectrum[115] - 62.5).abs() < 1e-6);
        assert!(spectrum[0].abs() < 1e-6);
    }

    #[test]
    fn test_magnitude_spectrum_of_constant() {
        let mut analyzer = SpectralAnalyzer::new(125.0);
        let spectrum = analyzer.magnitude_spectrum(&[2.0; 8]);
        assert!((spectrum[0] - 16.0).abs() < 1e-9);
        assert!(spectrum[1..].iter().all(|m| m.abs() < 1e-9));
    }

    #[test]
    fn test_band_powers_concentrate_on_sine_frequency() {
        let mut analyzer = SpectralAnalyzer::new(125.0);
        let freqs = analyzer.frequencies(125);

        for (freq, band) in [
            (2.0, EegBand::Delta),
            (6.0, EegBand::Theta),
            (10.0, EegBand::Alpha),
            (20.0, EegBand::Beta),
            (45.0, EegBand::Gamma),
        ] {
            let spectrum = analyzer.magnitude_spectrum(&sine(freq, 125, 125.0));
            let powers = BandPowers::from_spectrum(&spectrum, &freqs);
            let inside = powers.get(band);
            let outside = powers.total() - inside;
            assert!(inside > outside, "{:?} at {} Hz: {} vs {}", band, freq, inside, outside);
            assert_eq!(powers.dominant(), band);
        }
    }

    #[test]
    fn test_band_edges_are_inclusive() {
        let freqs = [4.0, 8.0, -4.0];
        let mags = [1.0, 2.0, 5.0];
        let powers = BandPowers::from_spectrum(&mags, &freqs);

        assert_eq!(powers.delta, 1.0);
        assert_eq!(powers.theta, 3.0);
        assert_eq!(powers.alpha, 2.0);
        // Negative frequencies belong to no band
        assert_eq!(powers.total(), 6.0);
    }

    #[test]
    fn test_spectral_moments_zero_spectrum() {
        let freqs = frequency_bins(16, 125.0);
        let moments = SpectralMoments::from_spectrum(&[0.0; 16], &freqs);
        assert_eq!(moments, SpectralMoments::default());
        assert_eq!(spectral_entropy(&[0.0; 16]), 0.0);
    }

    #[test]
    fn test_spectral_moments_single_bin() {
        let moments = SpectralMoments::from_spectrum(&[0.0, 3.0, 0.0], &[0.0, 5.0, -5.0]);
        assert_eq!(moments.centroid, 5.0);
        assert_eq!(moments.spread, 0.0);
        assert_eq!(moments.skewness, 0.0);
        assert_eq!(moments.kurtosis, 0.0);
    }

    #[test]
    fn test_spectral_moments_two_bins() {
        // Equal weight at -1 and +1: mean 0, spread 1, symmetric, kurtosis 1
        let moments = SpectralMoments::from_spectrum(&[1.0, 1.0], &[-1.0, 1.0]);
        assert_eq!(moments.centroid, 0.0);
        assert_eq!(moments.spread, 1.0);
        assert_eq!(moments.skewness, 0.0);
        assert_eq!(moments.kurtosis, 1.0);
    }

    #[test]
    fn test_spectral_entropy() {
        // Uniform over four bins: ln 4
        let entropy = spectral_entropy(&[2.0, 2.0, 2.0, 2.0]);
        assert!((entropy - 4.0f64.ln()).abs() < 1e-12);

        // All mass in one bin: zero
        assert_eq!(spectral_entropy(&[0.0, 7.0, 0.0]), 0.0);
    }
}
