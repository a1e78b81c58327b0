//! Signal events emitted by the detector.

use crate::{MomentumHorizon, MomentumReading, SmaValues};
use chrono::{DateTime, Utc};
use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// Which detection path produced a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalKind {
    Alignment,
    Momentum,
}

impl SignalKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SignalKind::Alignment => "ALIGNMENT",
            SignalKind::Momentum => "MOMENTUM",
        }
    }
}

impl std::fmt::Display for SignalKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Reverse-alignment classification.
///
/// Consumers key behaviour off this label; new partial variants may be added.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[non_exhaustive]
pub enum AlignmentType {
    /// Every shorter average sits strictly below the target average.
    Full,
}

impl AlignmentType {
    pub fn as_str(self) -> &'static str {
        match self {
            AlignmentType::Full => "FULL",
        }
    }
}

impl std::fmt::Display for AlignmentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Kind-specific payload of a signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalDetail {
    Alignment {
        target_period: usize,
        target_average: f64,
        alignment: AlignmentType,
        /// Snapshot of every configured average at detection time.
        sma_values: SmaValues,
        /// Confirmation momentum that gated the signal.
        confirmation: MomentumReading,
    },
    Momentum {
        horizon: MomentumHorizon,
        reading: MomentumReading,
    },
}

/// A detected signal for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalEvent {
    pub symbol: CompactString,
    /// Timestamp of the latest candle.
    pub timestamp: DateTime<Utc>,
    /// Latest close.
    pub price: f64,
    pub detail: SignalDetail,
}

impl SignalEvent {
    pub fn kind(&self) -> SignalKind {
        match self.detail {
            SignalDetail::Alignment { .. } => SignalKind::Alignment,
            SignalDetail::Momentum { .. } => SignalKind::Momentum,
        }
    }

    /// Price change over the gating/horizon window.
    pub fn price_change_pct(&self) -> f64 {
        match &self.detail {
            SignalDetail::Alignment { confirmation, .. } => confirmation.price_change_pct,
            SignalDetail::Momentum { reading, .. } => reading.price_change_pct,
        }
    }

    /// Quote-currency turnover over the gating/horizon window.
    pub fn trailing_volume(&self) -> f64 {
        match &self.detail {
            SignalDetail::Alignment { confirmation, .. } => confirmation.trailing_volume,
            SignalDetail::Momentum { reading, .. } => reading.trailing_volume,
        }
    }

    /// Target period and average for alignment signals.
    pub fn target(&self) -> Option<(usize, f64)> {
        match self.detail {
            SignalDetail::Alignment {
                target_period,
                target_average,
                ..
            } => Some((target_period, target_average)),
            SignalDetail::Momentum { .. } => None,
        }
    }

    pub fn alignment(&self) -> Option<AlignmentType> {
        match self.detail {
            SignalDetail::Alignment { alignment, .. } => Some(alignment),
            SignalDetail::Momentum { .. } => None,
        }
    }

    pub fn horizon(&self) -> Option<MomentumHorizon> {
        match self.detail {
            SignalDetail::Momentum { horizon, .. } => Some(horizon),
            SignalDetail::Alignment { .. } => None,
        }
    }
}
