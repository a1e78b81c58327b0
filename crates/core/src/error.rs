//! Error types for the data model.

use thiserror::Error;

/// Errors raised while building market data values.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CoreError {
    #[error("Candle series is empty")]
    EmptySeries,

    #[error("Timestamp at index {index} is not after the previous candle")]
    NonIncreasingTimestamp { index: usize },

    #[error("Invalid candle at index {index}: {reason}")]
    InvalidCandle { index: usize, reason: String },

    #[error("Unknown timeframe: {0}")]
    UnknownTimeframe(String),

    #[error("Unknown momentum horizon: {0}")]
    UnknownHorizon(String),
}

/// Result type for data model operations.
pub type CoreResult<T> = Result<T, CoreError>;
