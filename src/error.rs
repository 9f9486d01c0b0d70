//! Error types for the pericope extraction pipeline
//!
//! This module provides comprehensive error handling using thiserror for
//! structured error definitions and anyhow for error propagation. Pipeline
//! components degrade rather than fail where the contract allows it; the
//! variants here mark the boundaries where degradation is not possible.

use thiserror::Error;

/// Errors raised while fitting the learned scorer
///
/// Training failures are contained by the training controller: the previous
/// model (or heuristic mode) stays active and the failure is logged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TrainingError {
    /// All accumulated feedback carries the same label
    #[error("training set contains a single class")]
    SingleClass,

    /// A training vector disagrees with the expected feature shape
    #[error("training vector shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch {
        /// Expected vector length
        expected: usize,
        /// Length actually seen
        actual: usize,
    },

    /// No feedback records to fit on
    #[error("training set is empty")]
    EmptySet,
}

/// Main error type for pericope operations
#[derive(Error, Debug)]
pub enum PericopeError {
    /// Caller misuse of the facade (e.g. threshold outside [0, 1])
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Referenced document is not in the processed registry
    #[error("Document not found: {0}")]
    DocumentNotFound(String),

    /// Feature vector length disagrees with the fixed slot count
    #[error("Feature shape mismatch: expected {expected}, got {actual}")]
    FeatureShape {
        /// Expected vector length
        expected: usize,
        /// Length actually seen
        actual: usize,
    },

    /// Model fitting failed
    #[error("Training error: {0}")]
    Training(#[from] TrainingError),

    /// An optional capability (e.g. entity analysis) is absent or failed
    #[error("Capability unavailable: {0}")]
    CapabilityUnavailable(String),

    /// Invalid document ID format
    #[error("Invalid document ID: {0}")]
    InvalidDocumentId(#[from] uuid::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

/// Result type alias for pericope operations
pub type Result<T> = std::result::Result<T, PericopeError>;

/// Convert anyhow::Error to PericopeError
impl From<anyhow::Error> for PericopeError {
    fn from(err: anyhow::Error) -> Self {
        PericopeError::Other(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PericopeError::FeatureShape {
            expected: 21,
            actual: 3,
        };
        assert_eq!(err.to_string(), "Feature shape mismatch: expected 21, got 3");
    }

    #[test]
    fn test_training_error_conversion() {
        let err: PericopeError = TrainingError::SingleClass.into();
        assert!(matches!(
            err,
            PericopeError::Training(TrainingError::SingleClass)
        ));
        assert_eq!(
            err.to_string(),
            "Training error: training set contains a single class"
        );
    }

    #[test]
    fn test_error_conversion() {
        let uuid_err = uuid::Uuid::parse_str("invalid");
        assert!(uuid_err.is_err());

        let pericope_err: PericopeError = uuid_err.unwrap_err().into();
        assert!(matches!(pericope_err, PericopeError::InvalidDocumentId(_)));
    }
}
