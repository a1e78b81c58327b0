//! Reverse-alignment classification of moving averages.

use crate::PeriodSet;
use serde::{Deserialize, Serialize};
use sma_monitor_core::{AlignmentType, SmaValues};

/// Which long-period average may serve as the detection target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetPolicy {
    /// Only the single longest configured period.
    #[default]
    Longest,
}

/// Selected target average.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Target {
    pub period: usize,
    pub average: f64,
}

/// Classifies the latest averages of a symbol.
#[derive(Debug, Clone)]
pub struct AlignmentAnalyzer {
    periods: PeriodSet,
    policy: TargetPolicy,
}

impl AlignmentAnalyzer {
    pub fn new(periods: PeriodSet, policy: TargetPolicy) -> Self {
        Self { periods, policy }
    }

    pub fn periods(&self) -> &PeriodSet {
        &self.periods
    }

    pub fn policy(&self) -> TargetPolicy {
        self.policy
    }

    /// Pick the eligible target average, or `None` if it is undefined.
    pub fn select_target(&self, values: &SmaValues) -> Option<Target> {
        let period = match self.policy {
            TargetPolicy::Longest => self.periods.longest(),
        };
        values.get(period).map(|average| Target { period, average })
    }

    /// Classify alignment against `target_period`.
    ///
    /// `Full` iff the target average is defined and every configured period
    /// shorter than it has a defined average strictly below it. Anything
    /// else, including undefined or NaN averages, is not aligned.
    pub fn classify(&self, values: &SmaValues, target_period: usize) -> Option<AlignmentType> {
        // The target needs at least one shorter period to compare against.
        if !self.periods.contains(target_period) || target_period == self.periods.as_slice()[0] {
            return None;
        }
        let target = values.get(target_period)?;

        let shorter = self.periods.iter().filter(|&period| period < target_period);
        for period in shorter {
            match values.get(period) {
                Some(average) if average < target => {}
                _ => return None,
            }
        }

        Some(AlignmentType::Full)
    }

    pub fn is_reverse_aligned(&self, values: &SmaValues, target_period: usize) -> bool {
        self.classify(values, target_period).is_some()
    }

    /// Share (0-100) of adjacent period pairs where the shorter average is
    /// strictly below the longer one.
    ///
    /// Pairs with an undefined side are skipped; a snapshot that does not
    /// cover every configured period scores 0.
    pub fn alignment_score(&self, values: &SmaValues) -> f64 {
        if values.len() != self.periods.len() {
            return 0.0;
        }

        let pairs = self.periods.len() - 1;
        let aligned = self
            .periods
            .as_slice()
            .windows(2)
            .filter(|pair| match (values.get(pair[0]), values.get(pair[1])) {
                (Some(shorter), Some(longer)) => shorter < longer,
                _ => false,
            })
            .count();

        aligned as f64 / pairs as f64 * 100.0
    }
}

impl Default for AlignmentAnalyzer {
    fn default() -> Self {
        Self::new(PeriodSet::default(), TargetPolicy::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn values(entries: &[(usize, Option<f64>)]) -> SmaValues {
        entries.iter().copied().collect()
    }

    #[test]
    fn test_select_target_longest() {
        let analyzer = AlignmentAnalyzer::default();
        let v = values(&[
            (120, Some(1.0)),
            (240, Some(2.0)),
            (480, Some(3.0)),
            (960, Some(4.0)),
        ]);
        assert_eq!(
            analyzer.select_target(&v),
            Some(Target {
                period: 960,
                average: 4.0
            })
        );
    }

    #[test]
    fn test_select_target_missing_longest() {
        let analyzer = AlignmentAnalyzer::default();
        let v = values(&[(120, Some(1.0)), (240, Some(2.0)), (480, Some(3.0)), (960, None)]);
        assert_eq!(analyzer.select_target(&v), None);
    }

    #[test]
    fn test_classify_full() {
        let analyzer = AlignmentAnalyzer::default();
        let v = values(&[
            (120, Some(90.0)),
            (240, Some(95.0)),
            (480, Some(92.0)),
            (960, Some(100.0)),
        ]);
        // Shorter averages need only sit below the target, not be ordered.
        assert_eq!(analyzer.classify(&v, 960), Some(AlignmentType::Full));
        assert!(analyzer.is_reverse_aligned(&v, 960));
    }

    #[test]
    fn test_classify_equal_is_not_aligned() {
        let analyzer = AlignmentAnalyzer::default();
        let v = values(&[
            (120, Some(90.0)),
            (240, Some(95.0)),
            (480, Some(100.0)),
            (960, Some(100.0)),
        ]);
        assert_eq!(analyzer.classify(&v, 960), None);
    }

    #[test]
    fn test_classify_above_target_is_not_aligned() {
        let analyzer = AlignmentAnalyzer::default();
        let v = values(&[
            (120, Some(101.0)),
            (240, Some(95.0)),
            (480, Some(92.0)),
            (960, Some(100.0)),
        ]);
        assert_eq!(analyzer.classify(&v, 960), None);
    }

    #[test]
    fn test_classify_missing_or_nan_is_not_aligned() {
        let analyzer = AlignmentAnalyzer::default();
        let missing = values(&[(120, Some(90.0)), (480, Some(92.0)), (960, Some(100.0))]);
        assert_eq!(analyzer.classify(&missing, 960), None);

        let undefined = values(&[
            (120, Some(90.0)),
            (240, None),
            (480, Some(92.0)),
            (960, Some(100.0)),
        ]);
        assert_eq!(analyzer.classify(&undefined, 960), None);

        let nan = values(&[
            (120, Some(90.0)),
            (240, Some(f64::NAN)),
            (480, Some(92.0)),
            (960, Some(100.0)),
        ]);
        assert_eq!(analyzer.classify(&nan, 960), None);

        let nan_target = values(&[
            (120, Some(90.0)),
            (240, Some(91.0)),
            (480, Some(92.0)),
            (960, Some(f64::NAN)),
        ]);
        assert_eq!(analyzer.classify(&nan_target, 960), None);
    }

    #[test]
    fn test_classify_only_shorter_periods_participate() {
        let analyzer = AlignmentAnalyzer::default();
        let v = values(&[
            (120, Some(90.0)),
            (240, Some(95.0)),
            (480, Some(100.0)),
            (960, Some(200.0)),
        ]);
        assert_eq!(analyzer.classify(&v, 480), Some(AlignmentType::Full));
    }

    #[test]
    fn test_classify_unknown_or_shortest_target() {
        let analyzer = AlignmentAnalyzer::default();
        let v = values(&[
            (120, Some(90.0)),
            (240, Some(95.0)),
            (480, Some(97.0)),
            (960, Some(100.0)),
        ]);
        assert_eq!(analyzer.classify(&v, 500), None);
        assert_eq!(analyzer.classify(&v, 120), None);
    }

    #[test]
    fn test_alignment_score() {
        let analyzer = AlignmentAnalyzer::default();
        let perfect = values(&[
            (120, Some(1.0)),
            (240, Some(2.0)),
            (480, Some(3.0)),
            (960, Some(4.0)),
        ]);
        assert_eq!(analyzer.alignment_score(&perfect), 100.0);

        let partial = values(&[
            (120, Some(1.0)),
            (240, Some(2.0)),
            (480, Some(5.0)),
            (960, Some(4.0)),
        ]);
        let score = analyzer.alignment_score(&partial);
        assert!((score - 200.0 / 3.0).abs() < 1e-9);

        let incomplete = values(&[(120, Some(1.0)), (240, Some(2.0))]);
        assert_eq!(analyzer.alignment_score(&incomplete), 0.0);
    }
}
