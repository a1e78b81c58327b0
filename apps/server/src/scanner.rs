//! Scan loop: fetch candles per symbol, run the detector, deliver signals.

use crate::config::{AppConfig, MonitorSettings};
use crate::notifier::{MessageLevel, NotifyError, SignalNotifier};
use crate::source::{CandleSource, SourceError};
use crate::state::SharedState;
use chrono::Utc;
use sma_monitor_engine::{DetectorConfig, EngineError, SignalDetector};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info, warn};

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Source error: {0}")]
    Source(#[from] SourceError),
    #[error("Notification error: {0}")]
    Notify(#[from] NotifyError),
    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Slice used when sleeping so a stop request is noticed quickly.
const STOP_POLL: Duration = Duration::from_millis(100);

/// Drives the detector over the symbol universe.
pub struct Scanner {
    detector: SignalDetector,
    source: Arc<dyn CandleSource>,
    notifier: Arc<dyn SignalNotifier>,
    state: SharedState,
    settings: MonitorSettings,
    symbols: Vec<String>,
}

impl Scanner {
    pub fn new(
        config: &AppConfig,
        source: Arc<dyn CandleSource>,
        notifier: Arc<dyn SignalNotifier>,
        state: SharedState,
    ) -> Result<Self, ScanError> {
        let detector = SignalDetector::with_config(DetectorConfig::try_from(config)?)?;
        Ok(Self {
            detector,
            source,
            notifier,
            state,
            settings: config.monitor.clone(),
            symbols: config.monitor.symbols.clone(),
        })
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn detector(&self) -> &SignalDetector {
        &self.detector
    }

    /// Reload the symbol universe for the configured mode.
    pub async fn refresh_symbols(&mut self) -> Result<usize, ScanError> {
        let universe = &self.settings.universe;
        let tickers = if universe.mode.needs_tickers() {
            self.source.fetch_tickers().await?
        } else {
            Vec::new()
        };
        self.symbols = universe.select(&self.settings.symbols, &tickers);
        info!(
            source = self.source.name(),
            mode = ?universe.mode,
            count = self.symbols.len(),
            "Symbol list updated"
        );
        Ok(self.symbols.len())
    }

    /// Analyze one symbol and deliver every emitted signal.
    ///
    /// Returns the number of signals delivered.
    pub async fn analyze_symbol(&mut self, symbol: &str) -> Result<usize, ScanError> {
        let limit = self.detector.required_candles(self.settings.candle_buffer);
        let series = self
            .source
            .fetch_candles(symbol, self.settings.timeframe, limit)
            .await?;
        debug!(symbol = symbol, candles = series.len(), "Candles fetched");

        let now = Utc::now();
        let mut events = Vec::new();
        events.extend(self.detector.detect_alignment(&series, now));
        if self.detector.config().momentum.enabled {
            events.extend(self.detector.detect_momentum(&series, now));
        }

        for event in &events {
            let summary = self.detector.summarize(event);
            self.notifier.notify(event, &summary).await?;
        }
        Ok(events.len())
    }

    /// One pass over every symbol. A failing symbol is logged and counted,
    /// never fatal to the pass.
    pub async fn scan_all(&mut self) -> usize {
        let symbols = self.symbols.clone();
        let total = symbols.len();
        info!(count = total, "Scan started");

        let mut signal_count = 0;
        for (i, symbol) in symbols.iter().enumerate() {
            if !self.state.is_running() {
                warn!("Scan interrupted");
                break;
            }
            debug!(symbol = %symbol, progress = %format!("{}/{}", i + 1, total), "Analyzing");

            match self.analyze_symbol(symbol).await {
                Ok(count) => {
                    self.state.stats.record_analyzed();
                    self.state.stats.record_signals(count as u64);
                    signal_count += count;
                }
                Err(e) => {
                    self.state.stats.record_failure();
                    error!(symbol = %symbol, error = %e, "Analysis failed");
                }
            }

            if self.settings.symbol_delay_ms > 0 && i + 1 < total {
                tokio::time::sleep(Duration::from_millis(self.settings.symbol_delay_ms)).await;
            }
        }

        info!(signals = signal_count, "Scan complete");
        signal_count
    }

    /// Scan until the shared state is stopped, or for `max_iterations`.
    pub async fn run(&mut self, max_iterations: Option<u64>) {
        self.system_message("Monitoring started", MessageLevel::Info)
            .await;
        if let Err(e) = self.refresh_symbols().await {
            warn!(error = %e, "Initial symbol refresh failed");
        }

        let mut iteration = 0u64;
        while self.state.is_running() {
            iteration += 1;
            info!(iteration = iteration, "Scan iteration");

            if iteration % self.settings.refresh_every == 0 {
                if let Err(e) = self.refresh_symbols().await {
                    warn!(error = %e, "Symbol refresh failed, keeping previous list");
                }
            }

            let signals = self.scan_all().await;
            self.state.stats.record_iteration();
            if signals == 0 {
                info!("No signals");
            }

            if max_iterations.is_some_and(|max| iteration >= max) {
                break;
            }
            debug!(secs = self.settings.interval_secs, "Waiting for next scan");
            self.sleep_while_running(Duration::from_secs(self.settings.interval_secs))
                .await;
        }

        self.system_message("Monitoring stopped", MessageLevel::Warning)
            .await;
    }

    async fn sleep_while_running(&self, duration: Duration) {
        let mut remaining = duration;
        while !remaining.is_zero() && self.state.is_running() {
            let slice = remaining.min(STOP_POLL);
            tokio::time::sleep(slice).await;
            remaining -= slice;
        }
    }

    async fn system_message(&self, message: &str, level: MessageLevel) {
        if let Err(e) = self.notifier.system_message(message, level).await {
            warn!(error = %e, "System message delivery failed");
        }
    }

    /// Human-readable configuration and registry status.
    pub fn status_report(&self) -> String {
        let config = self.detector.config();
        let momentum = if config.momentum.enabled {
            format!(
                "on ({}, >= {}%, >= {})",
                config.momentum.horizon,
                config.momentum.thresholds.min_price_change_pct,
                config.momentum.thresholds.min_trailing_volume
            )
        } else {
            "off".to_string()
        };

        [
            format!("Universe: {:?}", self.settings.universe.mode),
            format!("Symbols monitored: {}", self.symbols.len()),
            format!("Scan interval: {}s", self.settings.interval_secs),
            format!("Timeframe: {}", config.timeframe),
            format!("SMA periods: {:?}", config.periods.as_slice()),
            format!(
                "Target: SMA{} (±{}%)",
                config.periods.longest(),
                config.proximity_tolerance_pct
            ),
            format!("Cooldown: {}s", config.cooldown_secs),
            format!("Momentum: {}", momentum),
            format!("Alert history: {}", self.detector.cooldowns().len()),
        ]
        .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::Ticker24h;
    use crate::state::create_state;
    use crate::universe::UniverseMode;
    use async_trait::async_trait;
    use chrono::{DateTime, TimeZone};
    use pretty_assertions::assert_eq;
    use sma_monitor_core::{Candle, CandleSeries, SignalEvent, SignalKind, Timeframe};
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Serves fixed series; unknown symbols fail.
    struct ScriptedSource {
        series: HashMap<String, CandleSeries>,
    }

    #[async_trait]
    impl CandleSource for ScriptedSource {
        fn name(&self) -> &str {
            "scripted"
        }

        /// Turnover and change are derived from the last close so tests
        /// can rank symbols by price.
        async fn fetch_tickers(&self) -> Result<Vec<Ticker24h>, SourceError> {
            let mut tickers: Vec<Ticker24h> = self
                .series
                .values()
                .map(|series| Ticker24h {
                    symbol: series.symbol().to_string(),
                    quote_volume: series.latest().close * 1_000_000.0,
                    price_change_pct: series.latest().close / 10.0,
                })
                .collect();
            tickers.sort_by(|a, b| a.symbol.cmp(&b.symbol));
            Ok(tickers)
        }

        async fn fetch_candles(
            &self,
            symbol: &str,
            _timeframe: Timeframe,
            _limit: usize,
        ) -> Result<CandleSeries, SourceError> {
            self.series
                .get(symbol)
                .cloned()
                .ok_or_else(|| SourceError::Unavailable(symbol.to_string()))
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        events: Mutex<Vec<SignalEvent>>,
        messages: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl SignalNotifier for RecordingNotifier {
        async fn notify(&self, event: &SignalEvent, _summary: &str) -> Result<(), NotifyError> {
            self.events.lock().unwrap().push(event.clone());
            Ok(())
        }

        async fn system_message(
            &self,
            message: &str,
            _level: MessageLevel,
        ) -> Result<(), NotifyError> {
            self.messages.lock().unwrap().push(message.to_string());
            Ok(())
        }
    }

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    fn build_series(symbol: &str, closes: &[f64], quote: f64) -> CandleSeries {
        let candles = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| {
                Candle::new(
                    start() + chrono::Duration::minutes(15 * i as i64),
                    close,
                    close * 1.001,
                    close * 0.999,
                    close,
                    quote / close,
                )
            })
            .collect();
        CandleSeries::new(symbol, Timeframe::M15, candles).unwrap()
    }

    /// Reverse-aligned series sitting 2.5% under SMA960 after a 6% rise.
    fn aligned_series(symbol: &str) -> CandleSeries {
        let mut closes = vec![100.0; 600];
        for i in 0..376 {
            closes.push(100.0 - 10.0 * (i + 1) as f64 / 376.0);
        }
        for k in 1..=24 {
            closes.push(90.0 * (1.0 + 0.06 * k as f64 / 24.0));
        }
        build_series(symbol, &closes, 625_000.0)
    }

    /// 20% rise over 96 candles with 150M turnover.
    fn momentum_series(symbol: &str) -> CandleSeries {
        let mut closes = vec![100.0; 4];
        for k in 1..=96 {
            closes.push(100.0 + 20.0 * k as f64 / 96.0);
        }
        build_series(symbol, &closes, 1_562_500.0)
    }

    fn flat_series(symbol: &str) -> CandleSeries {
        build_series(symbol, &[100.0; 1000], 625_000.0)
    }

    fn test_config(symbols: &[&str]) -> AppConfig {
        let mut config = AppConfig::default();
        config.monitor.symbols = symbols.iter().map(|s| s.to_string()).collect();
        config.monitor.universe.mode = UniverseMode::Specific;
        config.monitor.symbol_delay_ms = 0;
        config.monitor.interval_secs = 1;
        config
    }

    fn scanner(
        config: &AppConfig,
        series: Vec<CandleSeries>,
    ) -> (Scanner, Arc<RecordingNotifier>, SharedState) {
        let source = ScriptedSource {
            series: series
                .into_iter()
                .map(|s| (s.symbol().to_string(), s))
                .collect(),
        };
        let notifier = Arc::new(RecordingNotifier::default());
        let state = create_state();
        state.start();
        let scanner = Scanner::new(config, Arc::new(source), notifier.clone(), state.clone())
            .unwrap();
        (scanner, notifier, state)
    }

    #[tokio::test]
    async fn test_analyze_symbol_delivers_alignment() {
        let config = test_config(&["BTCUSDT"]);
        let (mut scanner, notifier, _) = scanner(&config, vec![aligned_series("BTCUSDT")]);

        assert_eq!(scanner.analyze_symbol("BTCUSDT").await.unwrap(), 1);
        assert_eq!(scanner.analyze_symbol("BTCUSDT").await.unwrap(), 0);

        let events = notifier.events.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind(), SignalKind::Alignment);
        assert_eq!(events[0].symbol.as_str(), "BTCUSDT");
    }

    #[tokio::test]
    async fn test_momentum_only_when_enabled() {
        let mut config = test_config(&["SOLUSDT"]);
        let (mut disabled, _, _) = scanner(&config, vec![momentum_series("SOLUSDT")]);
        assert_eq!(disabled.analyze_symbol("SOLUSDT").await.unwrap(), 0);

        config.signal.momentum.enabled = true;
        let (mut enabled, notifier, _) = scanner(&config, vec![momentum_series("SOLUSDT")]);
        assert_eq!(enabled.analyze_symbol("SOLUSDT").await.unwrap(), 1);
        assert_eq!(
            notifier.events.lock().unwrap()[0].kind(),
            SignalKind::Momentum
        );
    }

    #[tokio::test]
    async fn test_scan_all_isolates_failures() {
        let config = test_config(&["BTCUSDT", "MISSINGUSDT", "ETHUSDT"]);
        let (mut scanner, notifier, state) = scanner(
            &config,
            vec![aligned_series("BTCUSDT"), flat_series("ETHUSDT")],
        );
        scanner.refresh_symbols().await.unwrap();

        assert_eq!(scanner.scan_all().await, 1);

        let summary = state.stats.summary();
        assert_eq!(summary.symbols_analyzed, 2);
        assert_eq!(summary.failures, 1);
        assert_eq!(summary.signals_emitted, 1);
        assert_eq!(notifier.events.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_refresh_specific_uses_configured_symbols() {
        let config = test_config(&["ETHUSDT"]);
        let (mut configured, _, _) = scanner(
            &config,
            vec![flat_series("BTCUSDT"), flat_series("ETHUSDT")],
        );
        assert_eq!(configured.refresh_symbols().await.unwrap(), 1);
        assert_eq!(configured.symbols(), &["ETHUSDT".to_string()]);
    }

    #[tokio::test]
    async fn test_refresh_ranks_tickers_by_mode() {
        let market = || {
            vec![
                build_series("BTCUSDT", &[50.0; 10], 1.0),
                build_series("ETHUSDT", &[200.0; 10], 1.0),
                build_series("SOLUSDT", &[120.0; 10], 1.0),
                build_series("ETHBTC", &[900.0; 10], 1.0),
            ]
        };

        // BTC has 50M turnover and 5% change, below both default floors.
        let mut config = test_config(&[]);
        config.monitor.universe.mode = UniverseMode::Filtered;
        let (mut filtered, _, _) = scanner(&config, market());
        assert_eq!(filtered.refresh_symbols().await.unwrap(), 2);
        assert_eq!(filtered.symbols(), &["ETHUSDT", "SOLUSDT"]);

        config.monitor.universe.mode = UniverseMode::TopVolume;
        config.monitor.universe.top_n = 1;
        let (mut top, _, _) = scanner(&config, market());
        assert_eq!(top.refresh_symbols().await.unwrap(), 1);
        assert_eq!(top.symbols(), &["ETHUSDT"]);

        config.monitor.universe.mode = UniverseMode::All;
        let (mut all, _, _) = scanner(&config, market());
        assert_eq!(all.refresh_symbols().await.unwrap(), 3);
        assert_eq!(all.symbols(), &["ETHUSDT", "SOLUSDT", "BTCUSDT"]);
        assert!(all.status_report().contains("Universe: All"));
    }

    #[tokio::test]
    async fn test_send_test_reaches_notifier() {
        let notifier = RecordingNotifier::default();
        notifier.send_test().await.unwrap();
        assert_eq!(
            *notifier.messages.lock().unwrap(),
            vec![crate::notifier::TEST_NOTIFICATION]
        );
    }

    #[tokio::test]
    async fn test_run_bounded_iterations() {
        let config = test_config(&["BTCUSDT"]);
        let (mut scanner, notifier, state) = scanner(&config, vec![aligned_series("BTCUSDT")]);

        scanner.run(Some(2)).await;

        let summary = state.stats.summary();
        assert_eq!(summary.iterations, 2);
        assert_eq!(summary.signals_emitted, 1);
        assert_eq!(
            *notifier.messages.lock().unwrap(),
            vec!["Monitoring started", "Monitoring stopped"]
        );
    }

    #[tokio::test]
    async fn test_run_stops_when_state_stopped() {
        let config = test_config(&["BTCUSDT"]);
        let (mut scanner, _, state) = scanner(&config, vec![flat_series("BTCUSDT")]);
        state.stop();

        scanner.run(None).await;
        assert_eq!(state.stats.summary().iterations, 0);
    }

    #[tokio::test]
    async fn test_status_report() {
        let config = test_config(&["BTCUSDT"]);
        let (mut scanner, _, _) = scanner(&config, vec![aligned_series("BTCUSDT")]);
        scanner.analyze_symbol("BTCUSDT").await.unwrap();

        let report = scanner.status_report();
        assert!(report.contains("Symbols monitored: 1"));
        assert!(report.contains("Timeframe: 15m"));
        assert!(report.contains("SMA periods: [120, 240, 480, 960]"));
        assert!(report.contains("Target: SMA960 (±5%)"));
        assert!(report.contains("Momentum: off"));
        assert!(report.contains("Alert history: 1"));
    }
}
