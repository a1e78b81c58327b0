//! Error types for the signal engine.

use thiserror::Error;

/// Construction-time faults. Detection itself never fails: missing history
/// and undefined averages are reported as a [`crate::SkipReason`].
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

/// Result type for engine construction.
pub type EngineResult<T> = Result<T, EngineError>;

pub(crate) fn invalid(message: impl Into<String>) -> EngineError {
    EngineError::InvalidConfiguration(message.into())
}

/// Reject NaN, infinite and non-positive thresholds.
pub(crate) fn require_positive(name: &str, value: f64) -> EngineResult<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(invalid(format!("{} must be positive, got {}", name, value)))
    }
}
