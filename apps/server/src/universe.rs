//! Symbol universe selection.

use crate::source::Ticker24h;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Only symbols quoted in this asset are scanned.
pub const QUOTE_ASSET: &str = "USDT";

/// How the scanner picks the symbols it analyzes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UniverseMode {
    /// Every quoted symbol above a small turnover floor.
    All,
    /// The `top_n` symbols by 24h turnover.
    TopVolume,
    /// Symbols clearing both the turnover and 24h change floors.
    #[default]
    Filtered,
    /// The configured symbol list, as is.
    Specific,
}

impl UniverseMode {
    /// Whether selection needs 24h tickers from the source.
    pub fn needs_tickers(self) -> bool {
        !matches!(self, UniverseMode::Specific)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UniverseSettings {
    pub mode: UniverseMode,
    /// Symbol count kept in `TOP_VOLUME` mode.
    pub top_n: usize,
    /// 24h quote volume floor in `FILTERED` mode.
    pub min_volume: f64,
    /// 24h price change floor in `FILTERED` mode, in percent.
    pub min_price_change_pct: f64,
    /// 24h quote volume floor in `ALL` mode.
    pub all_min_volume: f64,
}

impl Default for UniverseSettings {
    fn default() -> Self {
        Self {
            mode: UniverseMode::Filtered,
            top_n: 50,
            min_volume: 100_000_000.0,
            min_price_change_pct: 7.0,
            all_min_volume: 2_000_000.0,
        }
    }
}

impl UniverseSettings {
    pub fn validate(&self) -> Result<(), String> {
        if self.mode == UniverseMode::TopVolume && self.top_n == 0 {
            return Err("top_n must be positive".to_string());
        }
        let floors = [
            ("min_volume", self.min_volume),
            ("min_price_change_pct", self.min_price_change_pct),
            ("all_min_volume", self.all_min_volume),
        ];
        for (name, value) in floors {
            if !value.is_finite() {
                return Err(format!("{} must be finite, got {}", name, value));
            }
        }
        Ok(())
    }

    /// Pick symbols for the configured mode.
    ///
    /// `specific` is used only in `SPECIFIC` mode and `tickers` only in the
    /// others. Ticker-driven modes keep `USDT`-quoted symbols and return
    /// them by 24h quote volume, highest first.
    pub fn select(&self, specific: &[String], tickers: &[Ticker24h]) -> Vec<String> {
        if self.mode == UniverseMode::Specific {
            return specific.to_vec();
        }

        let mut candidates: Vec<&Ticker24h> = tickers
            .iter()
            .filter(|t| t.symbol.ends_with(QUOTE_ASSET))
            .filter(|t| t.quote_volume.is_finite() && t.price_change_pct.is_finite())
            .filter(|t| match self.mode {
                UniverseMode::All => t.quote_volume >= self.all_min_volume,
                UniverseMode::Filtered => {
                    t.quote_volume >= self.min_volume
                        && t.price_change_pct >= self.min_price_change_pct
                }
                UniverseMode::TopVolume | UniverseMode::Specific => true,
            })
            .collect();
        candidates.sort_by(|a, b| b.quote_volume.total_cmp(&a.quote_volume));

        if self.mode == UniverseMode::TopVolume {
            candidates.truncate(self.top_n);
        }

        for ticker in &candidates {
            debug!(
                symbol = %ticker.symbol,
                volume = ticker.quote_volume,
                change_pct = ticker.price_change_pct,
                "Symbol selected"
            );
        }
        candidates.into_iter().map(|t| t.symbol.clone()).collect()
    }
}
