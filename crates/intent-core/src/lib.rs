//! Intent-Core: Foundation types for EEG motor-intent decoding
//!
//! Data model shared by every pipeline stage: raw and cleaned signals,
//! analysis windows, labels and decisions, the sample clock, and errors.

pub mod signal;
pub mod labels;
pub mod timestamp;
pub mod error;

pub use signal::*;
pub use labels::*;
pub use timestamp::{Clock, SystemClock, SteppedClock};
pub use error::{IntentError, IntentResult, ErrorScope};
