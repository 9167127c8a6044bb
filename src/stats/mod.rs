//! Stats module - proportion test

mod calculator;

pub use calculator::{
    Proportion, StatsCalculator, StatsError, Verdict, ZTestResult, DEFAULT_SIGNIFICANCE_LEVELS,
};
