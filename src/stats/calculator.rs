//! Statistics Calculator Module
//! Two-proportion z-test and significance verdicts.

use statrs::distribution::{ContinuousCDF, Normal};
use std::fmt;
use thiserror::Error;

/// Significance levels offered by default.
pub const DEFAULT_SIGNIFICANCE_LEVELS: [f64; 3] = [0.001, 0.01, 0.05];

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StatsError {
    #[error("Number of trials must be positive (got {0})")]
    EmptyTrials(i64),
    #[error("Number of successes must not be negative (got {0})")]
    NegativeSuccesses(i64),
    #[error("Successes ({successes}) exceed trials ({trials})")]
    SuccessExceedsTotal { successes: i64, trials: i64 },
    #[error("Pooled proportion is {0}, the test statistic is undefined")]
    DegenerateVariance(f64),
    #[error("Normal distribution error: {0}")]
    Distribution(String),
}

/// A (successes, trials) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Proportion {
    pub successes: i64,
    pub trials: i64,
}

impl Proportion {
    pub fn new(successes: i64, trials: i64) -> Self {
        Self { successes, trials }
    }

    /// Share of successes, `None` without trials.
    pub fn share(&self) -> Option<f64> {
        (self.trials != 0).then(|| self.successes as f64 / self.trials as f64)
    }

    fn validate(&self) -> Result<(), StatsError> {
        if self.trials <= 0 {
            return Err(StatsError::EmptyTrials(self.trials));
        }
        if self.successes < 0 {
            return Err(StatsError::NegativeSuccesses(self.successes));
        }
        if self.successes > self.trials {
            return Err(StatsError::SuccessExceedsTotal {
                successes: self.successes,
                trials: self.trials,
            });
        }
        Ok(())
    }
}

/// Outcome of a two-sided two-proportion z-test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZTestResult {
    pub z: f64,
    pub p_value: f64,
}

/// Decision at one significance level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Verdict {
    pub alpha: f64,
    pub p_value: f64,
    pub rejected: bool,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.rejected {
            write!(
                f,
                "p = {} < α = {} ⇒ the hypothesis of equal proportions is rejected",
                self.p_value, self.alpha
            )
        } else {
            write!(
                f,
                "p = {} ≥ α = {} ⇒ the hypothesis of equal proportions is not rejected",
                self.p_value, self.alpha
            )
        }
    }
}

/// Handles statistical calculations.
pub struct StatsCalculator;

impl StatsCalculator {
    /// Two-proportion z-test with pooled variance, two-sided, null difference 0.
    pub fn proportions_ztest(first: Proportion, second: Proportion) -> Result<ZTestResult, StatsError> {
        first.validate()?;
        second.validate()?;

        let (s1, n1) = (first.successes as f64, first.trials as f64);
        let (s2, n2) = (second.successes as f64, second.trials as f64);

        let pooled = (s1 + s2) / (n1 + n2);
        let variance = pooled * (1.0 - pooled) * (1.0 / n1 + 1.0 / n2);
        if variance <= 0.0 {
            return Err(StatsError::DegenerateVariance(pooled));
        }

        let z = (s1 / n1 - s2 / n2) / variance.sqrt();
        let normal = Normal::new(0.0, 1.0).map_err(|e| StatsError::Distribution(e.to_string()))?;
        let p_value = 2.0 * normal.sf(z.abs());

        Ok(ZTestResult { z, p_value })
    }

    /// One verdict per level, in the given order. `p == α` is not a rejection.
    pub fn verdicts(p_value: f64, significance_levels: &[f64]) -> Vec<Verdict> {
        significance_levels
            .iter()
            .map(|&alpha| Verdict {
                alpha,
                p_value,
                rejected: p_value < alpha,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn matches_reference_values() {
        let r = StatsCalculator::proportions_ztest(Proportion::new(10, 100), Proportion::new(20, 100)).unwrap();
        assert!(close(r.z, -1.980_295_085_953_348_8));
        assert!(close(r.p_value, 0.047_670_380_656_161_44));
    }

    #[test]
    fn equal_proportions_give_zero() {
        let r = StatsCalculator::proportions_ztest(Proportion::new(45, 1000), Proportion::new(45, 1000)).unwrap();
        assert!(close(r.z, 0.0));
        assert!(close(r.p_value, 1.0));
    }

    #[test]
    fn swapping_flips_sign_only() {
        let a = Proportion::new(130, 4100);
        let b = Proportion::new(71, 1560);
        let ab = StatsCalculator::proportions_ztest(a, b).unwrap();
        let ba = StatsCalculator::proportions_ztest(b, a).unwrap();
        assert!(close(ab.z, -ba.z));
        assert!(close(ab.p_value, ba.p_value));
    }

    #[test]
    fn zero_trials_is_an_error() {
        let err = StatsCalculator::proportions_ztest(Proportion::new(0, 0), Proportion::new(3, 10)).unwrap_err();
        assert_eq!(err, StatsError::EmptyTrials(0));
    }

    #[test]
    fn no_successes_anywhere_is_degenerate() {
        let err = StatsCalculator::proportions_ztest(Proportion::new(0, 10), Proportion::new(0, 20)).unwrap_err();
        assert!(matches!(err, StatsError::DegenerateVariance(p) if p == 0.0));
    }

    #[test]
    fn successes_above_trials_is_an_error() {
        let err = StatsCalculator::proportions_ztest(Proportion::new(5, 10), Proportion::new(30, 20)).unwrap_err();
        assert!(matches!(err, StatsError::SuccessExceedsTotal { successes: 30, trials: 20 }));
    }

    #[test]
    fn verdict_at_boundary_is_not_rejected() {
        let verdicts = StatsCalculator::verdicts(0.01, &DEFAULT_SIGNIFICANCE_LEVELS);
        let rejected: Vec<bool> = verdicts.iter().map(|v| v.rejected).collect();
        assert_eq!(rejected, vec![false, false, true]);
        assert!(verdicts[1].to_string().contains("not rejected"));
        assert!(verdicts[2].to_string().ends_with("is rejected"));
    }

    #[test]
    fn share_without_trials_is_none() {
        assert_eq!(Proportion::new(1, 0).share(), None);
        assert_eq!(Proportion::new(1, 4).share(), Some(0.25));
    }
}
