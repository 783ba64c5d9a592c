//! Pre-defined EEG rhythm patterns for intent simulation

use intent_processing::EegBand;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Oscillation frequency used to drive each band
pub fn rhythm_frequency(band: EegBand) -> f64 {
    match band {
        EegBand::Delta => 2.0,
        EegBand::Theta => 6.0,
        EegBand::Alpha => 10.0,
        EegBand::Beta => 20.0,
        EegBand::Gamma => 40.0,
    }
}

/// Predefined EEG signal patterns, as deflections around the ADC baseline
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SignalPattern {
    /// No activity
    Flat,
    /// Rhythm locked to one EEG band over a weaker alpha background
    Rhythm { band: EegBand, amplitude: f64 },
}

impl SignalPattern {
    /// Deflection at time `time` (seconds)
    pub fn value_at_time(&self, time: f64) -> f64 {
        match self {
            SignalPattern::Flat => 0.0,

            SignalPattern::Rhythm { band, amplitude } => {
                let main = amplitude * (2.0 * PI * rhythm_frequency(*band) * time).sin();
                let background = if *band == EegBand::Alpha {
                    0.0
                } else {
                    0.1 * amplitude * (2.0 * PI * rhythm_frequency(EegBand::Alpha) * time).sin()
                };
                main + background
            }
        }
    }

    /// Get pattern description
    pub fn description(&self) -> &'static str {
        match self {
            SignalPattern::Flat => "Flat line",
            SignalPattern::Rhythm { .. } => "Band-locked rhythm",
        }
    }

    /// Pattern standing in for an intent state
    ///
    /// backward -> theta, left -> alpha, right -> gamma, forward -> beta
    pub fn for_intent(state: &str) -> Option<SignalPattern> {
        let band = match state.to_ascii_lowercase().as_str() {
            "backward" => EegBand::Theta,
            "left" => EegBand::Alpha,
            "right" => EegBand::Gamma,
            "forward" => EegBand::Beta,
            "rest" => return Some(SignalPattern::Flat),
            _ => return None,
        };
        Some(SignalPattern::Rhythm {
            band,
            amplitude: 40.0,
        })
    }
}
