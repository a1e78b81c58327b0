//! Core data types for the SMA signal monitor.

pub mod candle;
pub mod error;
pub mod indicator;
pub mod signal;
pub mod timeframe;

pub use candle::*;
pub use error::*;
pub use indicator::*;
pub use signal::*;
pub use timeframe::*;
