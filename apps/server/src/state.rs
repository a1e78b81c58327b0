//! Scan statistics and run flag shared with the shutdown handler.

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// Counters for the scan loop.
#[derive(Debug)]
pub struct ScanStats {
    /// Completed scan iterations.
    pub iterations: AtomicU64,
    /// Symbols analyzed without error.
    pub symbols_analyzed: AtomicU64,
    /// Signals delivered to the notifier.
    pub signals_emitted: AtomicU64,
    /// Symbols whose analysis failed.
    pub failures: AtomicU64,
    started_at: DateTime<Utc>,
}

impl Default for ScanStats {
    fn default() -> Self {
        Self::new()
    }
}

impl ScanStats {
    pub fn new() -> Self {
        Self {
            iterations: AtomicU64::new(0),
            symbols_analyzed: AtomicU64::new(0),
            signals_emitted: AtomicU64::new(0),
            failures: AtomicU64::new(0),
            started_at: Utc::now(),
        }
    }

    pub fn record_iteration(&self) {
        self.iterations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_analyzed(&self) {
        self.symbols_analyzed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_signals(&self, count: u64) {
        self.signals_emitted.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn uptime_secs(&self) -> u64 {
        (Utc::now() - self.started_at).num_seconds().max(0) as u64
    }

    pub fn summary(&self) -> StatsSummary {
        StatsSummary {
            iterations: self.iterations.load(Ordering::Relaxed),
            symbols_analyzed: self.symbols_analyzed.load(Ordering::Relaxed),
            signals_emitted: self.signals_emitted.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            uptime_secs: self.uptime_secs(),
        }
    }
}

/// Snapshot of [`ScanStats`].
#[derive(Debug, Clone, PartialEq)]
pub struct StatsSummary {
    pub iterations: u64,
    pub symbols_analyzed: u64,
    pub signals_emitted: u64,
    pub failures: u64,
    pub uptime_secs: u64,
}

/// State shared between the scanner and the shutdown handler.
#[derive(Debug, Default)]
pub struct MonitorState {
    pub stats: ScanStats,
    running: AtomicBool,
}

impl MonitorState {
    pub fn start(&self) {
        self.running.store(true, Ordering::SeqCst);
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

pub type SharedState = Arc<MonitorState>;

pub fn create_state() -> SharedState {
    Arc::new(MonitorState::default())
}
