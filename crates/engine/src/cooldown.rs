//! Per-symbol alert cooldown.
//!
//! One registry is shared by every detection path so an alert from either
//! path suppresses both for the cooldown window. The registry is plain owned
//! state; concurrent scanners would need to shard it by symbol.

use crate::error::{invalid, EngineResult};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use tracing::debug;

/// Default re-alert interval in seconds.
pub const DEFAULT_COOLDOWN_SECS: u64 = 3600;

/// Largest cooldown chrono can represent in milliseconds.
pub const MAX_COOLDOWN_SECS: u64 = i64::MAX as u64 / 1000;

/// Alert state of one symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CooldownState {
    NeverAlerted,
    InCooldown { remaining: Duration },
    Eligible,
}

impl CooldownState {
    pub fn can_alert(&self) -> bool {
        !matches!(self, CooldownState::InCooldown { .. })
    }
}

/// Last alert time per symbol.
#[derive(Debug, Clone)]
pub struct CooldownRegistry {
    cooldown: Duration,
    last_alert: HashMap<String, DateTime<Utc>>,
}

impl CooldownRegistry {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last_alert: HashMap::new(),
        }
    }

    /// Registry with a positive cooldown of `secs` seconds.
    pub fn from_secs(secs: u64) -> EngineResult<Self> {
        if secs == 0 || secs > MAX_COOLDOWN_SECS {
            return Err(invalid(format!(
                "cooldown must be between 1 and {} seconds, got {}",
                MAX_COOLDOWN_SECS, secs
            )));
        }
        let cooldown = Duration::try_seconds(secs as i64)
            .ok_or_else(|| invalid(format!("cooldown of {} seconds is out of range", secs)))?;
        Ok(Self::new(cooldown))
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// State of `symbol` at `now`.
    ///
    /// A `now` earlier than the last alert (clock moved backwards) counts as
    /// still cooling down.
    pub fn state_at(&self, symbol: &str, now: DateTime<Utc>) -> CooldownState {
        let Some(&last) = self.last_alert.get(symbol) else {
            return CooldownState::NeverAlerted;
        };

        let elapsed = now - last;
        if elapsed >= self.cooldown {
            CooldownState::Eligible
        } else {
            CooldownState::InCooldown {
                remaining: self.cooldown.checked_sub(&elapsed).unwrap_or(self.cooldown),
            }
        }
    }

    pub fn can_alert(&self, symbol: &str, now: DateTime<Utc>) -> bool {
        let state = self.state_at(symbol, now);
        if let CooldownState::InCooldown { remaining } = state {
            debug!(
                symbol = symbol,
                remaining_secs = remaining.num_seconds(),
                "In cooldown"
            );
        }
        state.can_alert()
    }

    /// Start (or restart) the cooldown window for `symbol`.
    pub fn record(&mut self, symbol: &str, now: DateTime<Utc>) {
        self.last_alert.insert(symbol.to_string(), now);
        debug!(symbol = symbol, "Alert recorded");
    }

    pub fn last_alert(&self, symbol: &str) -> Option<DateTime<Utc>> {
        self.last_alert.get(symbol).copied()
    }

    /// Number of symbols that have ever alerted.
    pub fn len(&self) -> usize {
        self.last_alert.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last_alert.is_empty()
    }

    /// Forget every alert. Intended for tests and explicit restarts.
    pub fn reset(&mut self) {
        self.last_alert.clear();
    }
}

impl Default for CooldownRegistry {
    fn default() -> Self {
        Self::new(Duration::seconds(DEFAULT_COOLDOWN_SECS as i64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_never_alerted() {
        let registry = CooldownRegistry::default();
        assert_eq!(registry.state_at("BTCUSDT", t0()), CooldownState::NeverAlerted);
        assert!(registry.can_alert("BTCUSDT", t0()));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_cooldown_transitions() {
        let mut registry = CooldownRegistry::from_secs(3600).unwrap();
        registry.record("BTCUSDT", t0());

        let later = t0() + Duration::seconds(600);
        assert_eq!(
            registry.state_at("BTCUSDT", later),
            CooldownState::InCooldown {
                remaining: Duration::seconds(3000)
            }
        );
        assert!(!registry.can_alert("BTCUSDT", later));

        let boundary = t0() + Duration::seconds(3600);
        assert_eq!(registry.state_at("BTCUSDT", boundary), CooldownState::Eligible);
        assert!(registry.can_alert("BTCUSDT", boundary));
    }

    #[test]
    fn test_symbols_are_independent() {
        let mut registry = CooldownRegistry::default();
        registry.record("BTCUSDT", t0());
        assert!(registry.can_alert("ETHUSDT", t0()));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_record_overwrites() {
        let mut registry = CooldownRegistry::from_secs(60).unwrap();
        registry.record("BTCUSDT", t0());
        let second = t0() + Duration::seconds(120);
        registry.record("BTCUSDT", second);

        assert_eq!(registry.last_alert("BTCUSDT"), Some(second));
        assert_eq!(registry.len(), 1);
        assert!(!registry.can_alert("BTCUSDT", second + Duration::seconds(30)));
    }

    #[test]
    fn test_clock_skew_counts_as_cooldown() {
        let mut registry = CooldownRegistry::from_secs(60).unwrap();
        registry.record("BTCUSDT", t0());
        assert!(!registry.can_alert("BTCUSDT", t0() - Duration::seconds(5)));
    }

    #[test]
    fn test_from_secs_bounds() {
        assert!(CooldownRegistry::from_secs(0).is_err());
        assert!(CooldownRegistry::from_secs(u64::MAX).is_err());
        assert!(CooldownRegistry::from_secs(10_000_000_000_000_000).is_err());

        let longest = CooldownRegistry::from_secs(MAX_COOLDOWN_SECS).unwrap();
        assert!(longest.cooldown() > Duration::zero());
        assert_eq!(
            CooldownRegistry::default().cooldown(),
            Duration::seconds(3600)
        );
    }

    #[test]
    fn test_reset() {
        let mut registry = CooldownRegistry::default();
        registry.record("BTCUSDT", t0());
        registry.reset();
        assert!(registry.is_empty());
        assert!(registry.can_alert("BTCUSDT", t0()));
    }
}
