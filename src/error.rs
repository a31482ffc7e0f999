//! Estimation errors
//!
//! Only malformed input is an error. Everything else (missing reference
//! files, unclassifiable points, unknown species, non-positive dimensions)
//! degrades to a well-defined estimate instead.

use thiserror::Error;

/// Error surfaced to callers of the estimator
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EstimationError {
    /// The pipeline cannot proceed at all with the supplied measurements
    #[error("invalid input for {field}: {reason}")]
    InvalidInput {
        field: &'static str,
        reason: String,
    },
}

impl EstimationError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        EstimationError::InvalidInput {
            field,
            reason: reason.into(),
        }
    }

    /// Name of the offending input field
    pub fn field(&self) -> &'static str {
        match self {
            EstimationError::InvalidInput { field, .. } => field,
        }
    }
}
