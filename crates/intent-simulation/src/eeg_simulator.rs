//! Single-channel EEG simulator producing raw acquisition-board lines

use crate::signal_patterns::SignalPattern;
use intent_core::{config_error, IntentResult};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Full scale of the 10-bit board ADC
const ADC_MAX: f64 = 1023.0;

/// Configuration for EEG simulation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EegConfig {
    /// Sampling rate in Hz
    pub sampling_rate: f64,
    /// ADC count the signal oscillates around
    pub baseline: f64,
    /// Signal pattern to generate
    pub pattern: SignalPattern,
    /// Noise configuration
    pub noise: NoiseConfig,
    /// Power line interference (50/60Hz)
    pub powerline_freq: Option<f64>,
    /// Random seed for reproducibility
    pub seed: Option<u64>,
}

/// Noise and line-fault configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoiseConfig {
    /// Gaussian noise standard deviation in ADC counts (0.0 = no noise)
    pub gaussian_std: f64,
    /// Baseline wander amplitude
    pub baseline_wander: f64,
    /// Probability a line arrives empty
    pub dropout_prob: f64,
    /// Probability a line arrives garbled
    pub corruption_prob: f64,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            gaussian_std: 4.0,
            baseline_wander: 2.0,
            dropout_prob: 0.0,
            corruption_prob: 0.0,
        }
    }
}

impl Default for EegConfig {
    fn default() -> Self {
        Self {
            sampling_rate: 125.0,
            baseline: 512.0,
            pattern: SignalPattern::Flat,
            noise: NoiseConfig::default(),
            powerline_freq: Some(50.0),
            seed: None,
        }
    }
}

impl EegConfig {
    /// Default configuration driving the rhythm of an intent state
    pub fn for_intent(state: &str) -> IntentResult<Self> {
        let pattern = SignalPattern::for_intent(state)
            .ok_or_else(|| config_error!("no simulated pattern for intent '{}'", state))?;
        Ok(Self {
            pattern,
            ..Self::default()
        })
    }
}

/// EEG signal simulator
pub struct EegSimulator {
    config: EegConfig,
    rng: StdRng,
    normal_dist: Normal<f64>,
    sample_index: u64,
}

impl EegSimulator {
    /// Create new EEG simulator with configuration
    pub fn new(config: EegConfig) -> IntentResult<Self> {
        if !(config.sampling_rate.is_finite() && config.sampling_rate > 0.0) {
            return Err(config_error!(
                "sampling rate must be positive, got {}",
                config.sampling_rate
            ));
        }

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let normal_dist = Normal::new(0.0, config.noise.gaussian_std)
            .map_err(|e| config_error!("failed to create normal distribution: {}", e))?;

        Ok(EegSimulator {
            config,
            rng,
            normal_dist,
            sample_index: 0,
        })
    }

    /// Time of the next sample, in seconds since start
    pub fn time(&self) -> f64 {
        self.sample_index as f64 / self.config.sampling_rate
    }

    /// Next sample in ADC counts
    pub fn next_value(&mut self) -> f64 {
        let time = self.time();
        self.sample_index += 1;

        let mut value = self.config.baseline + self.config.pattern.value_at_time(time);
        value += self.normal_dist.sample(&mut self.rng);

        // Baseline wander (slow drift)
        value += self.config.noise.baseline_wander * (2.0 * PI * 0.1 * time).sin();

        if let Some(powerline_freq) = self.config.powerline_freq {
            value += 2.0 * (2.0 * PI * powerline_freq * time).sin();
        }

        value.round().clamp(0.0, ADC_MAX)
    }

    /// Generate `count` consecutive samples
    pub fn generate(&mut self, count: usize) -> Vec<f64> {
        (0..count).map(|_| self.next_value()).collect()
    }

    /// Next line as the board would print it, faults included
    pub fn next_line(&mut self) -> String {
        let value = self.next_value();

        if self.rng.gen::<f64>() < self.config.noise.dropout_prob {
            return String::new();
        }
        if self.rng.gen::<f64>() < self.config.noise.corruption_prob {
            return format!("{}?", value as i64 / 10);
        }
        format!("{}", value as i64)
    }

    /// Get current configuration
    pub fn config(&self) -> &EegConfig {
        &self.config
    }
}
