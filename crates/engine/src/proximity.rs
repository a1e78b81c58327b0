//! Price proximity to a target average.

use crate::error::{require_positive, EngineResult};

/// Default tolerance band around the target average, in percent.
pub const DEFAULT_TOLERANCE_PCT: f64 = 5.0;

/// Inclusive tolerance band around a target value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProximityCheck {
    tolerance_pct: f64,
}

impl ProximityCheck {
    pub fn new(tolerance_pct: f64) -> EngineResult<Self> {
        let tolerance_pct = require_positive("proximity tolerance", tolerance_pct)?;
        Ok(Self { tolerance_pct })
    }

    pub fn tolerance_pct(&self) -> f64 {
        self.tolerance_pct
    }

    /// Lower and upper bounds of the band around `target`.
    pub fn band(&self, target: f64) -> (f64, f64) {
        (
            target * (1.0 - self.tolerance_pct / 100.0),
            target * (1.0 + self.tolerance_pct / 100.0),
        )
    }

    /// True iff `lower <= close <= upper`. Undefined inputs are never near.
    pub fn is_near(&self, close: f64, target: f64) -> bool {
        if !close.is_finite() || !target.is_finite() {
            return false;
        }
        let (lower, upper) = self.band(target);
        lower <= close && close <= upper
    }

    /// Signed distance of `close` from `target` in percent.
    pub fn deviation_pct(close: f64, target: f64) -> Option<f64> {
        if !close.is_finite() || !target.is_finite() || target == 0.0 {
            return None;
        }
        Some((close - target) / target * 100.0)
    }
}

impl Default for ProximityCheck {
    fn default() -> Self {
        Self {
            tolerance_pct: DEFAULT_TOLERANCE_PCT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_invalid_tolerance() {
        assert!(ProximityCheck::new(0.0).is_err());
        assert!(ProximityCheck::new(-1.0).is_err());
        assert!(ProximityCheck::new(f64::NAN).is_err());
        assert!(ProximityCheck::new(3.0).is_ok());
    }

    #[test]
    fn test_inside_band() {
        let check = ProximityCheck::default();
        assert!(check.is_near(100.0, 100.0));
        assert!(check.is_near(97.0, 100.0));
        assert!(check.is_near(104.9, 100.0));
        assert!(!check.is_near(108.0, 100.0));
        assert!(!check.is_near(94.0, 100.0));
    }

    #[test]
    fn test_band_edges_are_inclusive() {
        let t = 5.0;
        let target = 123.456;
        let check = ProximityCheck::new(t).unwrap();

        assert!(check.is_near(target * (1.0 + t / 100.0), target));
        assert!(check.is_near(target * (1.0 - t / 100.0), target));
        assert!(!check.is_near(target * (1.0 + t / 100.0 + 1e-9), target));
        assert!(!check.is_near(target * (1.0 - t / 100.0 - 1e-9), target));
    }

    #[test]
    fn test_undefined_inputs() {
        let check = ProximityCheck::default();
        assert!(!check.is_near(f64::NAN, 100.0));
        assert!(!check.is_near(100.0, f64::NAN));
        assert!(!check.is_near(100.0, f64::INFINITY));
    }

    #[test]
    fn test_deviation_pct() {
        let dev = ProximityCheck::deviation_pct(103.0, 100.0).unwrap();
        assert!((dev - 3.0).abs() < 1e-9);
        assert_eq!(ProximityCheck::deviation_pct(1.0, 0.0), None);
    }
}
