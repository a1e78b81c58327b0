//! Candle sources.
//!
//! The scanner only sees the [`CandleSource`] trait. The bundled
//! [`SimulatedSource`] generates deterministic synthetic candles so the
//! monitor runs without exchange credentials.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sma_monitor_core::{Candle, CandleSeries, CoreError, Timeframe};
use sma_monitor_engine::MomentumAnalyzer;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("No candles available for {0}")]
    Empty(String),
    #[error("Source unavailable: {0}")]
    Unavailable(String),
    #[error("Invalid candle data: {0}")]
    InvalidData(#[from] CoreError),
}

pub type SourceResult<T> = Result<T, SourceError>;

/// Rolling 24-hour statistics for one symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct Ticker24h {
    pub symbol: String,
    /// Quote-currency turnover over the last 24 hours.
    pub quote_volume: f64,
    /// Price change over the last 24 hours, in percent.
    pub price_change_pct: f64,
}

/// Market-data collaborator used by the scan loop.
#[async_trait]
pub trait CandleSource: Send + Sync {
    /// Source name for logs.
    fn name(&self) -> &str;

    /// 24-hour statistics for every tradable symbol.
    async fn fetch_tickers(&self) -> SourceResult<Vec<Ticker24h>>;

    /// The most recent `limit` closed candles for `symbol`, oldest first.
    async fn fetch_candles(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> SourceResult<CandleSeries>;
}

/// Start of simulated history (2024-01-01T00:00:00Z).
const SIM_EPOCH_SECS: i64 = 1_704_067_200;

/// Quote turnover per simulated candle before modulation.
const SIM_BASE_TURNOVER: f64 = 2_000_000.0;

/// Deterministic synthetic OHLCV generator.
///
/// Each symbol gets its own base price and phase derived from its name.
/// Every fetch advances the shared clock by one candle, so repeated scans
/// see a moving market.
#[derive(Debug)]
pub struct SimulatedSource {
    symbols: Vec<String>,
    step: AtomicU64,
}

impl SimulatedSource {
    pub fn new(symbols: Vec<String>) -> Self {
        Self {
            symbols,
            step: AtomicU64::new(0),
        }
    }

    /// Default demo universe.
    pub fn demo() -> Self {
        Self::new(
            ["BTCUSDT", "ETHUSDT", "SOLUSDT", "XRPUSDT", "DOGEUSDT"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        )
    }

    pub fn step(&self) -> u64 {
        self.step.load(Ordering::Relaxed)
    }

    fn seed(symbol: &str) -> u64 {
        symbol
            .bytes()
            .fold(1469598103934665603u64, |acc, b| {
                (acc ^ b as u64).wrapping_mul(1099511628211)
            })
    }

    fn price_at(base: f64, phase: f64, t: u64) -> f64 {
        let x = t as f64;
        base * (1.0 + 0.15 * (x * 0.004 + phase).sin() + 0.03 * (x * 0.05 + phase * 2.0).sin())
    }

    /// Build `limit` candles ending at simulation step `end`.
    pub fn generate(
        symbol: &str,
        timeframe: Timeframe,
        limit: usize,
        end: u64,
    ) -> SourceResult<CandleSeries> {
        if limit == 0 {
            return Err(SourceError::Empty(symbol.to_string()));
        }

        let seed = Self::seed(symbol);
        let base = 1.0 + (seed % 50_000) as f64;
        let phase = (seed % 628) as f64 / 100.0;
        let width = Duration::minutes(timeframe.minutes() as i64);
        let epoch = DateTime::<Utc>::UNIX_EPOCH + Duration::seconds(SIM_EPOCH_SECS);

        let first = end + 1 - limit.min(end as usize + 1) as u64;
        let candles = (first..=end)
            .map(|t| {
                let open = Self::price_at(base, phase, t.saturating_sub(1));
                let close = Self::price_at(base, phase, t);
                let activity = 1.2 + (t as f64 * 0.03 + phase).sin();
                Candle::new(
                    epoch + width * t as i32,
                    open,
                    open.max(close) * 1.002,
                    open.min(close) * 0.998,
                    close,
                    SIM_BASE_TURNOVER * activity / close,
                )
            })
            .collect();

        Ok(CandleSeries::new(symbol, timeframe, candles)?)
    }
}

#[async_trait]
impl CandleSource for SimulatedSource {
    fn name(&self) -> &str {
        "simulated"
    }

    async fn fetch_tickers(&self) -> SourceResult<Vec<Ticker24h>> {
        let window = Timeframe::M15;
        let lookback = (24 * 60 / window.minutes()) as usize;
        let limit = MomentumAnalyzer::required_candles(lookback);
        let end = self.step() + limit as u64;

        self.symbols
            .iter()
            .map(|symbol| {
                let series = Self::generate(symbol, window, limit, end)?;
                let reading = MomentumAnalyzer::measure(&series, lookback)
                    .ok_or_else(|| SourceError::Empty(symbol.clone()))?;
                Ok(Ticker24h {
                    symbol: symbol.clone(),
                    quote_volume: reading.trailing_volume,
                    price_change_pct: reading.price_change_pct,
                })
            })
            .collect()
    }

    async fn fetch_candles(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> SourceResult<CandleSeries> {
        // Keep at least `limit` candles of history behind the clock.
        let step = self.step.fetch_add(1, Ordering::Relaxed);
        let end = step + limit as u64;
        debug!(symbol = symbol, limit = limit, end = end, "Generating candles");
        Self::generate(symbol, timeframe, limit, end)
    }
}
