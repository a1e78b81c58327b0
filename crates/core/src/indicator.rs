//! Derived indicator values.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Latest moving-average value per period.
///
/// Every configured period has an entry; the value is `None` when the series
/// is shorter than the period. Keys iterate in ascending period order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SmaValues(BTreeMap<usize, Option<f64>>);

impl SmaValues {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn insert(&mut self, period: usize, value: Option<f64>) {
        self.0.insert(period, value);
    }

    /// Defined value for `period`. Undefined and NaN entries both read as `None`.
    pub fn get(&self, period: usize) -> Option<f64> {
        self.0
            .get(&period)
            .copied()
            .flatten()
            .filter(|v| v.is_finite())
    }

    /// Whether `period` has an entry at all (defined or not).
    pub fn contains(&self, period: usize) -> bool {
        self.0.contains_key(&period)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Entries in ascending period order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, Option<f64>)> + '_ {
        self.0.iter().map(|(period, value)| (*period, *value))
    }

    pub fn periods(&self) -> impl Iterator<Item = usize> + '_ {
        self.0.keys().copied()
    }
}

impl FromIterator<(usize, Option<f64>)> for SmaValues {
    fn from_iter<I: IntoIterator<Item = (usize, Option<f64>)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Trailing price change and turnover over a look-back window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MomentumReading {
    /// Window length in candles.
    pub lookback: usize,
    /// `(close[-1] - close[-1-lookback]) / close[-1-lookback] * 100`
    pub price_change_pct: f64,
    /// Sum of `volume * close` over the last `lookback` candles.
    pub trailing_volume: f64,
}
