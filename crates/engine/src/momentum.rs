//! Trailing price-change and turnover measurements.

use crate::error::{require_positive, EngineResult};
use serde::{Deserialize, Serialize};
use sma_monitor_core::{CandleSeries, MomentumReading};

/// Fixed look-back of the alignment confirmation check, in candles.
pub const CONFIRMATION_CANDLES: usize = 24;

/// Upper bound on any look-back window, in candles.
pub const MAX_LOOKBACK_CANDLES: usize = 1_000_000;

/// Minimum price change and turnover a reading must clear.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MomentumThresholds {
    /// Minimum price change in percent.
    pub min_price_change_pct: f64,
    /// Minimum trailing quote volume.
    pub min_trailing_volume: f64,
}

impl MomentumThresholds {
    pub fn new(min_price_change_pct: f64, min_trailing_volume: f64) -> EngineResult<Self> {
        Ok(Self {
            min_price_change_pct: require_positive("minimum price change", min_price_change_pct)?,
            min_trailing_volume: require_positive("minimum trailing volume", min_trailing_volume)?,
        })
    }

    /// Thresholds gating alignment signals (5%, 10M).
    pub fn alignment_default() -> Self {
        Self {
            min_price_change_pct: 5.0,
            min_trailing_volume: 10_000_000.0,
        }
    }

    /// Thresholds for the standalone momentum signal (15%, 100M).
    pub fn momentum_default() -> Self {
        Self {
            min_price_change_pct: 15.0,
            min_trailing_volume: 100_000_000.0,
        }
    }

    /// Both price change and volume must clear their floors.
    pub fn passes(&self, reading: &MomentumReading) -> bool {
        reading.price_change_pct >= self.min_price_change_pct
            && reading.trailing_volume >= self.min_trailing_volume
    }
}

/// Measures momentum over the tail of a candle series.
#[derive(Debug, Clone, Copy, Default)]
pub struct MomentumAnalyzer;

impl MomentumAnalyzer {
    /// Candles needed to measure a `lookback`-candle window.
    pub fn required_candles(lookback: usize) -> usize {
        lookback.saturating_add(1)
    }

    /// Price change from `close[-1-lookback]` to `close[-1]` and quote
    /// volume summed over the last `lookback` candles.
    ///
    /// Returns `None` when the series holds fewer than `lookback + 1`
    /// candles or `lookback` is zero.
    pub fn measure(series: &CandleSeries, lookback: usize) -> Option<MomentumReading> {
        if lookback == 0 || series.len() < Self::required_candles(lookback) {
            return None;
        }

        let current = series.latest().close;
        let past = series.back(lookback)?.close;
        if past <= 0.0 {
            return None;
        }

        let trailing_volume = series
            .tail(lookback)
            .iter()
            .map(|candle| candle.quote_volume())
            .sum();

        Some(MomentumReading {
            lookback,
            price_change_pct: (current - past) / past * 100.0,
            trailing_volume,
        })
    }
}
