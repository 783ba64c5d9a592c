//! Error handling for the intent decoding pipeline
//!
//! One error type covers every stage from acquisition to classification.
//! Each variant knows whether it only invalidates a single unit of work
//! (a row, a window) or the whole acquisition cycle.

use crate::labels::Label;
use core::fmt;

/// Result type alias for pipeline operations
pub type IntentResult<T> = Result<T, IntentError>;

/// How far an error reaches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorScope {
    /// Skip the affected row or window and keep going
    Unit,
    /// Abort the current cycle; nothing is transmitted
    Cycle,
}

/// Error type for all pipeline operations
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum IntentError {
    /// A raw line could not be parsed into (timestamp, value)
    MalformedRow {
        /// 1-based line number within the batch
        line: usize,
        /// What was wrong with it
        reason: String,
    },

    /// Window too short to extract features from
    InsufficientSamples {
        /// Minimum sample count
        required: usize,
        /// Samples actually present
        actual: usize,
    },

    /// Columns expected by the classifier are missing from the feature table
    SchemaMismatch {
        /// Names of the absent columns
        missing: Vec<String>,
    },

    /// The transport produced no line within its read timeout
    TransportTimeout {
        /// Samples collected before the timeout
        collected: usize,
        /// Samples the batch needed
        expected: usize,
    },

    /// Any other transport failure (port gone, write failed)
    TransportError {
        /// Description of the failure
        reason: String,
    },

    /// Invalid configuration value
    ConfigurationError {
        /// Description of the problem
        message: String,
    },

    /// Classifier produced a label with no entry in the label map
    UnknownLabel {
        /// The unmapped label
        label: Label,
    },

    /// Classifier failed or returned an unusable prediction set
    ClassifierError {
        /// Description of the failure
        reason: String,
    },
}

impl IntentError {
    /// Scope of this error for the cycle error policy
    pub fn scope(&self) -> ErrorScope {
        match self {
            IntentError::MalformedRow { .. } | IntentError::InsufficientSamples { .. } => {
                ErrorScope::Unit
            }
            _ => ErrorScope::Cycle,
        }
    }

    /// Whether the process should keep running after a cycle failed with this error
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            IntentError::TransportTimeout { .. }
                | IntentError::MalformedRow { .. }
                | IntentError::InsufficientSamples { .. }
                | IntentError::UnknownLabel { .. }
                | IntentError::ClassifierError { .. }
        )
    }
}

impl fmt::Display for IntentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntentError::MalformedRow { line, reason } => {
                write!(f, "Malformed row {}: {}", line, reason)
            }
            IntentError::InsufficientSamples { required, actual } => {
                write!(f, "Insufficient samples: need at least {}, got {}",
                       required, actual)
            }
            IntentError::SchemaMismatch { missing } => {
                write!(f, "Schema mismatch: missing columns [{}]", missing.join(", "))
            }
            IntentError::TransportTimeout { collected, expected } => {
                write!(f, "Transport timed out after {} of {} samples",
                       collected, expected)
            }
            IntentError::TransportError { reason } => {
                write!(f, "Transport error: {}", reason)
            }
            IntentError::ConfigurationError { message } => {
                write!(f, "Configuration error: {}", message)
            }
            IntentError::UnknownLabel { label } => {
                write!(f, "Classifier produced unmapped label {}", label)
            }
            IntentError::ClassifierError { reason } => {
                write!(f, "Classifier error: {}", reason)
            }
        }
    }
}

impl std::error::Error for IntentError {}

/// Convenience macro for creating configuration errors
#[macro_export]
macro_rules! config_error {
    ($($arg:tt)*) => {
        $crate::error::IntentError::ConfigurationError {
            message: format!($($arg)*),
        }
    };
}
