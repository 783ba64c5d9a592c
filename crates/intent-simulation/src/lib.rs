//! Intent-Simulation: synthetic EEG for offline runs
//!
//! Generates band-locked rhythms standing in for each intent state and
//! serves them through a `Transport` so the full pipeline can run without
//! hardware.

pub mod signal_patterns;
pub mod eeg_simulator;
pub mod simulated_link;

pub use eeg_simulator::*;
pub use signal_patterns::*;
pub use simulated_link::SimulatedLink;
