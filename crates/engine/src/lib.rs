//! Signal detection engine.
//!
//! Moving-average computation, reverse-alignment classification, proximity
//! and momentum gates, and the per-symbol cooldown that together turn a
//! candle series into at most one signal per scan.

pub mod alignment;
pub mod cooldown;
pub mod detector;
pub mod error;
pub mod momentum;
pub mod proximity;
pub mod sma;
pub mod summary;

pub use alignment::*;
pub use cooldown::*;
pub use detector::*;
pub use error::*;
pub use momentum::*;
pub use proximity::*;
pub use sma::*;
pub use summary::*;
