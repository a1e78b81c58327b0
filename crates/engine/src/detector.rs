//! Signal detector.
//!
//! Runs the alignment and momentum paths over one symbol's candle series and
//! records emitted alerts in the shared cooldown registry.

use crate::error::{invalid, EngineResult};
use crate::summary::format_signal_summary;
use crate::{
    AlignmentAnalyzer, CooldownRegistry, MomentumAnalyzer, MomentumThresholds, PeriodSet,
    ProximityCheck, RollingAverageEngine, TargetPolicy, CONFIRMATION_CANDLES,
    DEFAULT_COOLDOWN_SECS, DEFAULT_TOLERANCE_PCT, MAX_LOOKBACK_CANDLES,
};
use chrono::{DateTime, Duration, Utc};
use sma_monitor_core::{CandleSeries, MomentumHorizon, SignalDetail, SignalEvent, Timeframe};
use tracing::{debug, info};

/// Standalone momentum path settings.
#[derive(Debug, Clone, PartialEq)]
pub struct MomentumConfig {
    /// Whether the scan runs the momentum path at all.
    pub enabled: bool,
    pub horizon: MomentumHorizon,
    pub thresholds: MomentumThresholds,
}

impl Default for MomentumConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            horizon: MomentumHorizon::H24,
            thresholds: MomentumThresholds::momentum_default(),
        }
    }
}

/// Configuration for the signal detector. Immutable once the detector is built.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectorConfig {
    pub periods: PeriodSet,
    pub target_policy: TargetPolicy,
    /// Candle width of the series handed to the detector.
    pub timeframe: Timeframe,
    /// Proximity band around the target average, in percent.
    pub proximity_tolerance_pct: f64,
    /// Minimum seconds between alerts for one symbol.
    pub cooldown_secs: u64,
    /// Confirmation look-back in candles, independent of the timeframe.
    pub confirmation_candles: usize,
    /// Floors the confirmation reading must clear.
    pub alignment_thresholds: MomentumThresholds,
    pub momentum: MomentumConfig,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            periods: PeriodSet::default(),
            target_policy: TargetPolicy::Longest,
            timeframe: Timeframe::M15,
            proximity_tolerance_pct: DEFAULT_TOLERANCE_PCT,
            cooldown_secs: DEFAULT_COOLDOWN_SECS,
            confirmation_candles: CONFIRMATION_CANDLES,
            alignment_thresholds: MomentumThresholds::alignment_default(),
            momentum: MomentumConfig::default(),
        }
    }
}

impl DetectorConfig {
    /// Check every construction-time invariant.
    pub fn validate(&self) -> EngineResult<()> {
        ProximityCheck::new(self.proximity_tolerance_pct)?;
        CooldownRegistry::from_secs(self.cooldown_secs)?;
        if self.confirmation_candles == 0 || self.confirmation_candles > MAX_LOOKBACK_CANDLES {
            return Err(invalid(format!(
                "confirmation candle count must be between 1 and {}, got {}",
                MAX_LOOKBACK_CANDLES, self.confirmation_candles
            )));
        }
        MomentumThresholds::new(
            self.alignment_thresholds.min_price_change_pct,
            self.alignment_thresholds.min_trailing_volume,
        )?;
        MomentumThresholds::new(
            self.momentum.thresholds.min_price_change_pct,
            self.momentum.thresholds.min_trailing_volume,
        )?;
        if self.momentum.enabled && self.momentum_lookback().is_none() {
            return Err(invalid(format!(
                "momentum horizon {} is not a whole number of {} candles",
                self.momentum.horizon, self.timeframe
            )));
        }
        Ok(())
    }

    /// Momentum look-back in candles for the configured timeframe.
    pub fn momentum_lookback(&self) -> Option<usize> {
        self.momentum.horizon.candles(self.timeframe)
    }
}

/// Why a detection path produced no event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SkipReason {
    /// The target average is undefined (insufficient history).
    NoTarget,
    NotAligned,
    OutsideBand { deviation_pct: f64 },
    InsufficientData { required: usize, available: usize },
    BelowThreshold { price_change_pct: f64, trailing_volume: f64 },
    InCooldown,
    /// The momentum horizon does not resolve for this timeframe.
    Disabled,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::NoTarget => write!(f, "no eligible target average"),
            SkipReason::NotAligned => write!(f, "not reverse aligned"),
            SkipReason::OutsideBand { deviation_pct } => {
                write!(f, "close {:+.2}% from target, outside band", deviation_pct)
            }
            SkipReason::InsufficientData {
                required,
                available,
            } => write!(f, "need {} candles, have {}", required, available),
            SkipReason::BelowThreshold {
                price_change_pct,
                trailing_volume,
            } => write!(
                f,
                "below threshold (change {:+.2}%, volume {:.0})",
                price_change_pct, trailing_volume
            ),
            SkipReason::InCooldown => write!(f, "in cooldown"),
            SkipReason::Disabled => write!(f, "momentum path disabled"),
        }
    }
}

/// Signal detector for reverse alignment and momentum bursts.
#[derive(Debug)]
pub struct SignalDetector {
    config: DetectorConfig,
    averages: RollingAverageEngine,
    alignment: AlignmentAnalyzer,
    proximity: ProximityCheck,
    cooldowns: CooldownRegistry,
}

impl SignalDetector {
    /// Create a detector around an existing cooldown registry.
    ///
    /// The registry must enforce exactly `config.cooldown_secs`.
    pub fn new(config: DetectorConfig, cooldowns: CooldownRegistry) -> EngineResult<Self> {
        config.validate()?;
        if cooldowns.cooldown() != Duration::seconds(config.cooldown_secs as i64) {
            return Err(invalid(format!(
                "cooldown registry enforces {}s but configuration says {}s",
                cooldowns.cooldown().num_seconds(),
                config.cooldown_secs
            )));
        }
        let proximity = ProximityCheck::new(config.proximity_tolerance_pct)?;

        info!(
            periods = ?config.periods.as_slice(),
            timeframe = %config.timeframe,
            tolerance_pct = config.proximity_tolerance_pct,
            cooldown_secs = config.cooldown_secs,
            momentum_enabled = config.momentum.enabled,
            "Signal detector initialized"
        );

        Ok(Self {
            averages: RollingAverageEngine::new(config.periods.clone()),
            alignment: AlignmentAnalyzer::new(config.periods.clone(), config.target_policy),
            proximity,
            cooldowns,
            config,
        })
    }

    /// Create a detector with a fresh registry using `config.cooldown_secs`.
    pub fn with_config(config: DetectorConfig) -> EngineResult<Self> {
        let cooldowns = CooldownRegistry::from_secs(config.cooldown_secs)?;
        Self::new(config, cooldowns)
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    pub fn averages(&self) -> &RollingAverageEngine {
        &self.averages
    }

    pub fn cooldowns(&self) -> &CooldownRegistry {
        &self.cooldowns
    }

    pub fn cooldowns_mut(&mut self) -> &mut CooldownRegistry {
        &mut self.cooldowns
    }

    /// Candles the caller should fetch per symbol.
    pub fn required_candles(&self, buffer: usize) -> usize {
        self.averages.required_candles(buffer)
    }

    /// Alignment path. Predicates short-circuit in order; the cooldown is
    /// consulted last and recorded only when an event is emitted.
    pub fn evaluate_alignment(
        &mut self,
        series: &CandleSeries,
        now: DateTime<Utc>,
    ) -> Result<SignalEvent, SkipReason> {
        let symbol = series.symbol();
        let averaged = self.averages.compute(series);
        let sma_values = averaged.latest_values();

        let target = self
            .alignment
            .select_target(&sma_values)
            .ok_or(SkipReason::NoTarget)?;
        let alignment = self.alignment.classify(&sma_values, target.period);

        let close = series.latest().close;
        let near = self.proximity.is_near(close, target.average);
        if near {
            info!(
                symbol = symbol,
                close = close,
                target_period = target.period,
                target = target.average,
                diff_pct = ProximityCheck::deviation_pct(close, target.average).unwrap_or(0.0),
                alignment = alignment.map(|a| a.as_str()).unwrap_or("NONE"),
                "Close near target average"
            );
        }

        let alignment = alignment.ok_or(SkipReason::NotAligned)?;
        if !near {
            return Err(SkipReason::OutsideBand {
                deviation_pct: ProximityCheck::deviation_pct(close, target.average).unwrap_or(0.0),
            });
        }

        let lookback = self.config.confirmation_candles;
        let confirmation =
            MomentumAnalyzer::measure(series, lookback).ok_or(SkipReason::InsufficientData {
                required: MomentumAnalyzer::required_candles(lookback),
                available: series.len(),
            })?;
        if !self.config.alignment_thresholds.passes(&confirmation) {
            return Err(SkipReason::BelowThreshold {
                price_change_pct: confirmation.price_change_pct,
                trailing_volume: confirmation.trailing_volume,
            });
        }

        if !self.cooldowns.can_alert(symbol, now) {
            return Err(SkipReason::InCooldown);
        }

        let smas = self.averages.format_sma_values(&sma_values);
        let event = SignalEvent {
            symbol: symbol.into(),
            timestamp: series.latest().timestamp,
            price: close,
            detail: SignalDetail::Alignment {
                target_period: target.period,
                target_average: target.average,
                alignment,
                sma_values,
                confirmation,
            },
        };
        self.cooldowns.record(symbol, now);

        info!(
            symbol = symbol,
            price = close,
            alignment = alignment.as_str(),
            smas = %smas,
            "Alignment signal"
        );
        Ok(event)
    }

    /// Alignment path, collapsing skip reasons to `None`.
    pub fn detect_alignment(
        &mut self,
        series: &CandleSeries,
        now: DateTime<Utc>,
    ) -> Option<SignalEvent> {
        match self.evaluate_alignment(series, now) {
            Ok(event) => Some(event),
            Err(reason) => {
                debug!(symbol = series.symbol(), reason = %reason, "No alignment signal");
                None
            }
        }
    }

    /// Momentum path. The cooldown is consulted first.
    pub fn evaluate_momentum(
        &mut self,
        series: &CandleSeries,
        now: DateTime<Utc>,
    ) -> Result<SignalEvent, SkipReason> {
        let symbol = series.symbol();
        if !self.cooldowns.can_alert(symbol, now) {
            return Err(SkipReason::InCooldown);
        }

        let lookback = self.config.momentum_lookback().ok_or(SkipReason::Disabled)?;
        let reading =
            MomentumAnalyzer::measure(series, lookback).ok_or(SkipReason::InsufficientData {
                required: MomentumAnalyzer::required_candles(lookback),
                available: series.len(),
            })?;

        if !self.config.momentum.thresholds.passes(&reading) {
            return Err(SkipReason::BelowThreshold {
                price_change_pct: reading.price_change_pct,
                trailing_volume: reading.trailing_volume,
            });
        }

        let horizon = self.config.momentum.horizon;
        let price = series.latest().close;
        let event = SignalEvent {
            symbol: symbol.into(),
            timestamp: series.latest().timestamp,
            price,
            detail: SignalDetail::Momentum { horizon, reading },
        };
        self.cooldowns.record(symbol, now);

        info!(
            symbol = symbol,
            horizon = %horizon,
            change_pct = reading.price_change_pct,
            volume = reading.trailing_volume,
            "Momentum signal"
        );
        Ok(event)
    }

    /// Momentum path, collapsing skip reasons to `None`.
    pub fn detect_momentum(
        &mut self,
        series: &CandleSeries,
        now: DateTime<Utc>,
    ) -> Option<SignalEvent> {
        match self.evaluate_momentum(series, now) {
            Ok(event) => Some(event),
            Err(reason) => {
                debug!(symbol = series.symbol(), reason = %reason, "No momentum signal");
                None
            }
        }
    }

    /// One scan step for a symbol: the alignment path, then the momentum
    /// path when enabled. Both share the cooldown, so at most one event is
    /// returned.
    pub fn analyze(&mut self, series: &CandleSeries, now: DateTime<Utc>) -> Option<SignalEvent> {
        let alignment = self.detect_alignment(series, now);
        let momentum = if self.config.momentum.enabled {
            self.detect_momentum(series, now)
        } else {
            None
        };
        alignment.or(momentum)
    }

    /// Text block for notifiers.
    pub fn summarize(&self, event: &SignalEvent) -> String {
        format_signal_summary(event, self.config.proximity_tolerance_pct)
    }
}
