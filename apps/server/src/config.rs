//! Application configuration.

use serde::{Deserialize, Serialize};
use sma_monitor_core::{MomentumHorizon, Timeframe};
use sma_monitor_engine::{
    DetectorConfig, EngineError, MomentumConfig, MomentumThresholds, PeriodSet, TargetPolicy,
    CONFIRMATION_CANDLES, DEFAULT_COOLDOWN_SECS, DEFAULT_TOLERANCE_PCT,
};
use crate::universe::{UniverseMode, UniverseSettings};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error(transparent)]
    Invalid(#[from] EngineError),
    #[error("Invalid monitor settings: {0}")]
    Monitor(String),
}

/// Application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub monitor: MonitorSettings,
    pub sma: SmaSettings,
    pub signal: SignalSettings,
    pub logging: LoggingSettings,
}

impl AppConfig {
    /// Load and validate a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Check monitor settings and the detector conversion.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.monitor.interval_secs == 0 {
            return Err(ConfigError::Monitor("interval must be positive".to_string()));
        }
        if self.monitor.refresh_every == 0 {
            return Err(ConfigError::Monitor(
                "symbol refresh interval must be positive".to_string(),
            ));
        }
        if self.monitor.universe.mode == UniverseMode::Specific && self.monitor.symbols.is_empty() {
            return Err(ConfigError::Monitor(
                "SPECIFIC universe needs at least one symbol".to_string(),
            ));
        }
        self.monitor
            .universe
            .validate()
            .map_err(ConfigError::Monitor)?;
        DetectorConfig::try_from(self)?;
        Ok(())
    }
}

/// Scan loop settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorSettings {
    /// Seconds between scans.
    pub interval_secs: u64,
    pub timeframe: Timeframe,
    /// Symbols scanned in `SPECIFIC` universe mode.
    pub symbols: Vec<String>,
    pub universe: UniverseSettings,
    /// Pause between symbols within one scan.
    pub symbol_delay_ms: u64,
    /// Extra candles fetched beyond the longest period.
    pub candle_buffer: usize,
    /// Refresh the symbol list every N iterations.
    pub refresh_every: u64,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            interval_secs: 60,
            timeframe: Timeframe::M15,
            symbols: Vec::new(),
            universe: UniverseSettings::default(),
            symbol_delay_ms: 100,
            candle_buffer: 100,
            refresh_every: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmaSettings {
    pub periods: Vec<usize>,
    pub target_policy: TargetPolicy,
}

impl Default for SmaSettings {
    fn default() -> Self {
        Self {
            periods: PeriodSet::default().into(),
            target_policy: TargetPolicy::Longest,
        }
    }
}

/// Signal gating settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalSettings {
    pub cooldown_secs: u64,
    pub proximity_tolerance_pct: f64,
    pub confirmation_candles: usize,
    pub alignment_min_price_change_pct: f64,
    pub alignment_min_volume: f64,
    pub momentum: MomentumSettings,
}

impl Default for SignalSettings {
    fn default() -> Self {
        let thresholds = MomentumThresholds::alignment_default();
        Self {
            cooldown_secs: DEFAULT_COOLDOWN_SECS,
            proximity_tolerance_pct: DEFAULT_TOLERANCE_PCT,
            confirmation_candles: CONFIRMATION_CANDLES,
            alignment_min_price_change_pct: thresholds.min_price_change_pct,
            alignment_min_volume: thresholds.min_trailing_volume,
            momentum: MomentumSettings::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MomentumSettings {
    pub enabled: bool,
    /// One of "4h", "6h", "12h", "24h".
    pub horizon: MomentumHorizon,
    pub min_price_change_pct: f64,
    pub min_volume: f64,
}

impl Default for MomentumSettings {
    fn default() -> Self {
        let thresholds = MomentumThresholds::momentum_default();
        Self {
            enabled: false,
            horizon: MomentumHorizon::H24,
            min_price_change_pct: thresholds.min_price_change_pct,
            min_volume: thresholds.min_trailing_volume,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
    /// Also append log lines to this file when set.
    pub file: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

impl TryFrom<&AppConfig> for DetectorConfig {
    type Error = EngineError;

    fn try_from(config: &AppConfig) -> Result<Self, Self::Error> {
        let signal = &config.signal;
        let detector = DetectorConfig {
            periods: PeriodSet::new(config.sma.periods.clone())?,
            target_policy: config.sma.target_policy,
            timeframe: config.monitor.timeframe,
            proximity_tolerance_pct: signal.proximity_tolerance_pct,
            cooldown_secs: signal.cooldown_secs,
            confirmation_candles: signal.confirmation_candles,
            alignment_thresholds: MomentumThresholds::new(
                signal.alignment_min_price_change_pct,
                signal.alignment_min_volume,
            )?,
            momentum: MomentumConfig {
                enabled: signal.momentum.enabled,
                horizon: signal.momentum.horizon,
                thresholds: MomentumThresholds::new(
                    signal.momentum.min_price_change_pct,
                    signal.momentum.min_volume,
                )?,
            },
        };
        detector.validate()?;
        Ok(detector)
    }
}
