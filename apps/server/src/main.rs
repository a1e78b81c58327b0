//! SMA Monitor - Headless Server
//!
//! Scans candle series for reverse moving-average alignment near the
//! long-period average and for strong momentum bursts.

mod config;
mod notifier;
mod scanner;
mod source;
mod state;
mod universe;

use clap::Parser;
use config::AppConfig;
use notifier::{ConsoleNotifier, SignalNotifier};
use scanner::Scanner;
use source::SimulatedSource;
use state::create_state;
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{error, info, warn, Level};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// SMA Monitor CLI
#[derive(Parser, Debug)]
#[command(name = "sma-monitor")]
#[command(about = "Moving-average alignment and momentum monitor", long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config.json")]
    config: String,

    /// Log level: trace, debug, info, warn, error (overrides the config file)
    #[arg(short, long)]
    log_level: Option<String>,

    /// Analyze a single symbol and exit, e.g. BTC or BTCUSDT
    #[arg(long, value_name = "SYMBOL")]
    test: Option<String>,

    /// Print configuration status and exit
    #[arg(long, default_value_t = false)]
    status: bool,

    /// Run a single scan over all symbols and exit
    #[arg(long, default_value_t = false)]
    once: bool,

    /// Send a test message through the notifier and exit
    #[arg(long, default_value_t = false)]
    test_notification: bool,
}

fn parse_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" | "warning" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

/// Console logging, plus plain-text lines appended to `file` when given.
/// `RUST_LOG` overrides `level` when set.
fn init_logging(level: &str, file: Option<&Path>) -> std::io::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::default().add_directive(LevelFilter::from_level(parse_level(level)).into())
    });

    let file_layer = match file {
        Some(path) => {
            if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
                std::fs::create_dir_all(dir)?;
            }
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_target(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .with(file_layer);

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");
    Ok(())
}

/// Upper-case `symbol` and append the USDT quote when missing.
fn normalize_symbol(symbol: &str) -> String {
    let symbol = symbol.trim().to_uppercase();
    if symbol.ends_with("USDT") {
        symbol
    } else {
        format!("{}USDT", symbol)
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let config = match AppConfig::load(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let level = args.log_level.as_deref().unwrap_or(&config.logging.level);
    if let Err(e) = init_logging(level, config.logging.file.as_deref()) {
        eprintln!("Failed to open log file: {}", e);
        std::process::exit(1);
    }

    info!("🚀 SMA Monitor starting...");
    info!("  Config: {}", args.config);
    info!("  Timeframe: {}", config.monitor.timeframe);
    info!("  SMA periods: {:?}", config.sma.periods);
    info!("  Universe: {:?}", config.monitor.universe.mode);
    info!("  Momentum: {}", config.signal.momentum.enabled);

    let source = Arc::new(SimulatedSource::demo());
    let notifier = Arc::new(ConsoleNotifier::new());

    if args.test_notification {
        match notifier.send_test().await {
            Ok(()) => info!("Test notification sent"),
            Err(e) => error!("Test notification failed: {}", e),
        }
        return;
    }

    let state = create_state();
    state.start();

    let mut scanner = match Scanner::new(&config, source, notifier, state.clone()) {
        Ok(scanner) => scanner,
        Err(e) => {
            error!("Failed to initialize scanner: {}", e);
            std::process::exit(1);
        }
    };

    if let Some(symbol) = args.test.as_deref() {
        let symbol = normalize_symbol(symbol);
        info!("{} test analysis", symbol);
        match scanner.analyze_symbol(&symbol).await {
            Ok(count) => info!(symbol = %symbol, signals = count, "Test analysis complete"),
            Err(e) => error!(symbol = %symbol, error = %e, "Test analysis failed"),
        }
        return;
    }

    if args.status {
        if let Err(e) = scanner.refresh_symbols().await {
            warn!("Symbol refresh failed: {}", e);
        }
        println!("{}", notifier::format_console_block(&scanner.status_report()));
        return;
    }

    if args.once {
        if let Err(e) = scanner.refresh_symbols().await {
            error!("Symbol refresh failed: {}", e);
            return;
        }
        let signals = scanner.scan_all().await;
        info!("Single scan complete: {} signals", signals);
        return;
    }

    // Handle shutdown
    info!("Press Ctrl+C to stop...");
    let shutdown_state = state.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to listen for Ctrl+C");
        warn!("Shutdown signal received");
        shutdown_state.stop();
    });

    scanner.run(None).await;

    // Final stats
    let summary = state.stats.summary();
    info!("📈 Final Stats:");
    info!("  Total uptime: {} seconds", summary.uptime_secs);
    info!("  Iterations: {}", summary.iterations);
    info!("  Symbols analyzed: {}", summary.symbols_analyzed);
    info!("  Signals: {}", summary.signals_emitted);
    info!("  Failures: {}", summary.failures);

    info!("👋 SMA Monitor stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_symbol() {
        assert_eq!(normalize_symbol("btc"), "BTCUSDT");
        assert_eq!(normalize_symbol("ethusdt"), "ETHUSDT");
        assert_eq!(normalize_symbol(" SOL "), "SOLUSDT");
    }

    #[test]
    fn test_args_parse() {
        let args = Args::parse_from(["sma-monitor", "--test", "btc", "--log-level", "debug"]);
        assert_eq!(args.config, "config.json");
        assert_eq!(args.test.as_deref(), Some("btc"));
        assert_eq!(args.log_level.as_deref(), Some("debug"));
        assert!(!args.status);
        assert!(!args.once);
        assert!(!args.test_notification);

        let args = Args::parse_from(["sma-monitor", "--test-notification"]);
        assert!(args.test_notification);
        assert_eq!(args.test, None);
    }

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("DEBUG"), Level::DEBUG);
        assert_eq!(parse_level("warning"), Level::WARN);
        assert_eq!(parse_level("verbose"), Level::INFO);
    }

    #[tokio::test]
    async fn test_simulated_scan_integration() {
        let mut config = AppConfig::default();
        config.monitor.symbols = vec!["BTCUSDT".to_string(), "ETHUSDT".to_string()];
        config.monitor.universe.mode = universe::UniverseMode::Specific;
        config.monitor.symbol_delay_ms = 0;

        let state = create_state();
        state.start();
        let mut scanner = Scanner::new(
            &config,
            Arc::new(SimulatedSource::demo()),
            Arc::new(ConsoleNotifier::new()),
            state.clone(),
        )
        .unwrap();

        scanner.refresh_symbols().await.unwrap();
        scanner.scan_all().await;

        let summary = state.stats.summary();
        assert_eq!(summary.symbols_analyzed, 2);
        assert_eq!(summary.failures, 0);
    }

    #[tokio::test]
    async fn test_simulated_all_universe() {
        let mut config = AppConfig::default();
        config.monitor.symbol_delay_ms = 0;
        config.monitor.universe.mode = universe::UniverseMode::All;
        config.monitor.universe.all_min_volume = 0.0;

        let mut scanner = Scanner::new(
            &config,
            Arc::new(SimulatedSource::demo()),
            Arc::new(ConsoleNotifier::new()),
            create_state(),
        )
        .unwrap();

        assert_eq!(scanner.refresh_symbols().await.unwrap(), 5);
        assert!(scanner.symbols().iter().all(|s| s.ends_with("USDT")));
    }
}
