//! OHLCV candle data.

use crate::{CoreError, CoreResult, Timeframe};
use chrono::{DateTime, Utc};
use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// A single OHLCV sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    /// Candle open time.
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    /// Traded volume in base units.
    pub volume: f64,
}

impl Candle {
    pub fn new(
        timestamp: DateTime<Utc>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Volume denominated in the quote currency (`volume * close`).
    #[inline]
    pub fn quote_volume(&self) -> f64 {
        self.volume * self.close
    }

    fn check(&self) -> Result<(), String> {
        let prices = [
            ("open", self.open),
            ("high", self.high),
            ("low", self.low),
            ("close", self.close),
        ];
        for (name, value) in prices {
            if !value.is_finite() || value <= 0.0 {
                return Err(format!("{} must be positive and finite, got {}", name, value));
            }
        }
        if !self.volume.is_finite() || self.volume < 0.0 {
            return Err(format!(
                "volume must be non-negative and finite, got {}",
                self.volume
            ));
        }
        Ok(())
    }
}

/// Ordered candles for one symbol at a fixed timeframe.
///
/// Timestamps are strictly increasing. The series is immutable once built;
/// indicator code only ever reads it. Deserialization runs the same checks
/// as [`CandleSeries::new`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCandleSeries")]
pub struct CandleSeries {
    symbol: CompactString,
    timeframe: Timeframe,
    candles: Vec<Candle>,
}

/// Unchecked wire form of [`CandleSeries`].
#[derive(Deserialize)]
struct RawCandleSeries {
    symbol: CompactString,
    timeframe: Timeframe,
    candles: Vec<Candle>,
}

impl TryFrom<RawCandleSeries> for CandleSeries {
    type Error = CoreError;

    fn try_from(raw: RawCandleSeries) -> CoreResult<Self> {
        CandleSeries::new(raw.symbol, raw.timeframe, raw.candles)
    }
}

impl CandleSeries {
    /// Build a series, validating ordering and price/volume domains.
    pub fn new(
        symbol: impl Into<CompactString>,
        timeframe: Timeframe,
        candles: Vec<Candle>,
    ) -> CoreResult<Self> {
        if candles.is_empty() {
            return Err(CoreError::EmptySeries);
        }

        for (index, candle) in candles.iter().enumerate() {
            candle
                .check()
                .map_err(|reason| CoreError::InvalidCandle { index, reason })?;
        }

        if let Some(index) = candles
            .windows(2)
            .position(|pair| pair[1].timestamp <= pair[0].timestamp)
        {
            return Err(CoreError::NonIncreasingTimestamp { index: index + 1 });
        }

        Ok(Self {
            symbol: symbol.into(),
            timeframe,
            candles,
        })
    }

    pub fn symbol(&self) -> &str {
        self.symbol.as_str()
    }

    pub fn timeframe(&self) -> Timeframe {
        self.timeframe
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    /// Always false for a validated series; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    /// Most recent candle.
    pub fn latest(&self) -> &Candle {
        // Non-empty by construction.
        &self.candles[self.candles.len() - 1]
    }

    /// Candle `offset` positions before the latest one (`0` is the latest).
    pub fn back(&self, offset: usize) -> Option<&Candle> {
        self.candles
            .len()
            .checked_sub(offset + 1)
            .map(|index| &self.candles[index])
    }

    /// Closing prices in chronological order.
    pub fn closes(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.close).collect()
    }

    /// The trailing `count` candles (fewer if the series is shorter).
    pub fn tail(&self, count: usize) -> &[Candle] {
        let start = self.candles.len().saturating_sub(count);
        &self.candles[start..]
    }
}
