//! Simple moving averages over candle closes.
//!
//! Averages are counted in candles, not wall-clock time, and are recomputed
//! from scratch on every call.

use crate::error::{invalid, EngineResult};
use serde::{Deserialize, Serialize};
use sma_monitor_core::{CandleSeries, SmaValues};
use std::collections::BTreeMap;

/// Ascending list of averaging windows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<usize>", into = "Vec<usize>")]
pub struct PeriodSet(Vec<usize>);

impl PeriodSet {
    /// Validate a period list: at least two entries, all positive, strictly increasing.
    pub fn new(periods: Vec<usize>) -> EngineResult<Self> {
        if periods.len() < 2 {
            return Err(invalid(format!(
                "at least 2 SMA periods are required, got {:?}",
                periods
            )));
        }
        if periods.contains(&0) {
            return Err(invalid("SMA periods must be positive"));
        }
        if periods.windows(2).any(|pair| pair[1] <= pair[0]) {
            return Err(invalid(format!(
                "SMA periods must be strictly increasing, got {:?}",
                periods
            )));
        }
        Ok(Self(periods))
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.0.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Never true for a validated set.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Longest window.
    pub fn longest(&self) -> usize {
        // At least two entries by construction.
        self.0[self.0.len() - 1]
    }

    pub fn contains(&self, period: usize) -> bool {
        self.0.binary_search(&period).is_ok()
    }
}

impl Default for PeriodSet {
    fn default() -> Self {
        Self(vec![120, 240, 480, 960])
    }
}

impl TryFrom<Vec<usize>> for PeriodSet {
    type Error = crate::EngineError;

    fn try_from(periods: Vec<usize>) -> Result<Self, Self::Error> {
        PeriodSet::new(periods)
    }
}

impl From<PeriodSet> for Vec<usize> {
    fn from(set: PeriodSet) -> Self {
        set.0
    }
}

/// Rolling simple moving average of `closes` over `period` candles.
///
/// The output is aligned index-for-index with the input; entries before
/// `period - 1` are `None`. A series shorter than `period` yields all `None`.
pub fn rolling_sma(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut track = vec![None; closes.len()];
    if period == 0 || closes.len() < period {
        return track;
    }

    let divisor = period as f64;
    for (offset, window) in closes.windows(period).enumerate() {
        track[offset + period - 1] = Some(window.iter().sum::<f64>() / divisor);
    }
    track
}

/// A candle series with one average track per configured period.
#[derive(Debug, Clone)]
pub struct AveragedSeries<'a> {
    series: &'a CandleSeries,
    tracks: BTreeMap<usize, Vec<Option<f64>>>,
}

impl<'a> AveragedSeries<'a> {
    pub fn series(&self) -> &'a CandleSeries {
        self.series
    }

    /// Average for `period` at candle `index`.
    pub fn value_at(&self, period: usize, index: usize) -> Option<f64> {
        self.tracks
            .get(&period)
            .and_then(|track| track.get(index).copied().flatten())
    }

    /// Full track for `period`, aligned with the series.
    pub fn track(&self, period: usize) -> Option<&[Option<f64>]> {
        self.tracks.get(&period).map(Vec::as_slice)
    }

    /// Average for `period` at the latest candle.
    pub fn latest(&self, period: usize) -> Option<f64> {
        self.value_at(period, self.series.len() - 1)
    }

    /// Snapshot of every configured average at the latest candle.
    pub fn latest_values(&self) -> SmaValues {
        self.tracks
            .keys()
            .map(|&period| (period, self.latest(period)))
            .collect()
    }
}

/// Computes moving-average tracks for a fixed [`PeriodSet`].
#[derive(Debug, Clone)]
pub struct RollingAverageEngine {
    periods: PeriodSet,
}

impl RollingAverageEngine {
    pub fn new(periods: PeriodSet) -> Self {
        Self { periods }
    }

    pub fn periods(&self) -> &PeriodSet {
        &self.periods
    }

    /// Candles to request per symbol: the longest window plus `buffer`.
    pub fn required_candles(&self, buffer: usize) -> usize {
        self.periods.longest().saturating_add(buffer)
    }

    /// Single average track over the series closes.
    pub fn sma(&self, series: &CandleSeries, period: usize) -> Vec<Option<f64>> {
        rolling_sma(&series.closes(), period)
    }

    /// Augment `series` with one track per configured period.
    pub fn compute<'a>(&self, series: &'a CandleSeries) -> AveragedSeries<'a> {
        let closes = series.closes();
        let tracks = self
            .periods
            .iter()
            .map(|period| (period, rolling_sma(&closes, period)))
            .collect();
        AveragedSeries { series, tracks }
    }

    /// `SMA120: 1.2345 | SMA240: N/A | ...` for logs.
    pub fn format_sma_values(&self, values: &SmaValues) -> String {
        if values.is_empty() {
            return "N/A".to_string();
        }

        self.periods
            .iter()
            .filter(|&period| values.contains(period))
            .map(|period| match values.get(period) {
                Some(value) => format!("SMA{}: {:.4}", period, value),
                None => format!("SMA{}: N/A", period),
            })
            .collect::<Vec<_>>()
            .join(" | ")
    }
}

impl Default for RollingAverageEngine {
    fn default() -> Self {
        Self::new(PeriodSet::default())
    }
}
