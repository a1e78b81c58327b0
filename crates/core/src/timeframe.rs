//! Candle timeframes and momentum horizons.

use crate::CoreError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

/// Fixed candle width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Timeframe {
    #[serde(rename = "1m")]
    M1,
    #[serde(rename = "3m")]
    M3,
    #[serde(rename = "5m")]
    M5,
    #[serde(rename = "15m")]
    #[default]
    M15,
    #[serde(rename = "30m")]
    M30,
    #[serde(rename = "1h")]
    H1,
    #[serde(rename = "2h")]
    H2,
    #[serde(rename = "4h")]
    H4,
    #[serde(rename = "6h")]
    H6,
    #[serde(rename = "8h")]
    H8,
    #[serde(rename = "12h")]
    H12,
    #[serde(rename = "1d")]
    D1,
}

impl Timeframe {
    pub const ALL: [Timeframe; 12] = [
        Timeframe::M1,
        Timeframe::M3,
        Timeframe::M5,
        Timeframe::M15,
        Timeframe::M30,
        Timeframe::H1,
        Timeframe::H2,
        Timeframe::H4,
        Timeframe::H6,
        Timeframe::H8,
        Timeframe::H12,
        Timeframe::D1,
    ];

    /// Candle width in minutes.
    pub fn minutes(self) -> u64 {
        match self {
            Timeframe::M1 => 1,
            Timeframe::M3 => 3,
            Timeframe::M5 => 5,
            Timeframe::M15 => 15,
            Timeframe::M30 => 30,
            Timeframe::H1 => 60,
            Timeframe::H2 => 120,
            Timeframe::H4 => 240,
            Timeframe::H6 => 360,
            Timeframe::H8 => 480,
            Timeframe::H12 => 720,
            Timeframe::D1 => 1440,
        }
    }

    pub fn duration(self) -> Duration {
        Duration::from_secs(self.minutes() * 60)
    }

    /// Exchange-style label, e.g. `15m`.
    pub fn as_str(self) -> &'static str {
        match self {
            Timeframe::M1 => "1m",
            Timeframe::M3 => "3m",
            Timeframe::M5 => "5m",
            Timeframe::M15 => "15m",
            Timeframe::M30 => "30m",
            Timeframe::H1 => "1h",
            Timeframe::H2 => "2h",
            Timeframe::H4 => "4h",
            Timeframe::H6 => "6h",
            Timeframe::H8 => "8h",
            Timeframe::H12 => "12h",
            Timeframe::D1 => "1d",
        }
    }
}

impl FromStr for Timeframe {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let label = s.trim().to_lowercase();
        Timeframe::ALL
            .into_iter()
            .find(|tf| tf.as_str() == label)
            .ok_or_else(|| CoreError::UnknownTimeframe(s.to_string()))
    }
}

impl std::fmt::Display for Timeframe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Look-back horizon for the standalone momentum signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum MomentumHorizon {
    #[serde(rename = "4h")]
    H4,
    #[serde(rename = "6h")]
    H6,
    #[serde(rename = "12h")]
    H12,
    #[serde(rename = "24h")]
    #[default]
    H24,
}

impl MomentumHorizon {
    pub const ALL: [MomentumHorizon; 4] = [
        MomentumHorizon::H4,
        MomentumHorizon::H6,
        MomentumHorizon::H12,
        MomentumHorizon::H24,
    ];

    pub fn minutes(self) -> u64 {
        match self {
            MomentumHorizon::H4 => 4 * 60,
            MomentumHorizon::H6 => 6 * 60,
            MomentumHorizon::H12 => 12 * 60,
            MomentumHorizon::H24 => 24 * 60,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MomentumHorizon::H4 => "4h",
            MomentumHorizon::H6 => "6h",
            MomentumHorizon::H12 => "12h",
            MomentumHorizon::H24 => "24h",
        }
    }

    /// Number of candles of `timeframe` spanned by this horizon.
    ///
    /// Returns `None` when the horizon is not a whole, non-zero multiple of
    /// the timeframe (e.g. a 4h horizon on daily candles).
    pub fn candles(self, timeframe: Timeframe) -> Option<usize> {
        let width = timeframe.minutes();
        let span = self.minutes();
        if span < width || span % width != 0 {
            return None;
        }
        Some((span / width) as usize)
    }
}

impl FromStr for MomentumHorizon {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let label = s.trim().to_lowercase();
        MomentumHorizon::ALL
            .into_iter()
            .find(|h| h.as_str() == label)
            .ok_or_else(|| CoreError::UnknownHorizon(s.to_string()))
    }
}

impl std::fmt::Display for MomentumHorizon {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
