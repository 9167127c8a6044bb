//! Shared comparison workflow used by both the dashboard and the `report` command.
//!
//! validate period -> aggregate both regions -> z-test -> verdicts

use crate::config::Settings;
use crate::data::{CovidTable, DataProcessor, DateRange, Metric, PopulationTable, ProcessorError};
use crate::stats::{Proportion, StatsCalculator, StatsError, Verdict, ZTestResult};
use chrono::{Days, NaiveDate};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("The dataset is empty")]
    EmptyTable,
    #[error("Region \"{0}\" is not present in the data")]
    UnknownRegion(String),
    #[error("There is no data for part of this period (data ends on {last}, period ends on {end}). Please choose a shorter period.")]
    RangeBeyondData { end: NaiveDate, last: NaiveDate },
    #[error("The period starts on {start}, before the first available date {first}")]
    RangeBeforeData { start: NaiveDate, first: NaiveDate },
    #[error("The period must be at least one day long")]
    EmptyPeriod,
    #[error("A period of {days} days starting on {start} runs past the end of the calendar")]
    PeriodOutOfCalendar { start: NaiveDate, days: u32 },
}

/// Everything a user selects for one comparison.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonRequest {
    pub first_region: String,
    pub second_region: String,
    pub range: DateRange,
    pub success_metrics: Vec<Metric>,
    pub trial_metrics: Vec<Metric>,
    pub significance_levels: Vec<f64>,
}

impl ComparisonRequest {
    /// Initial selection for a freshly loaded table.
    pub fn from_settings(table: &CovidTable, settings: &Settings) -> Result<Self, AnalysisError> {
        let (first_region, second_region) =
            default_regions(table, &settings.first_region, &settings.second_region)
                .ok_or(AnalysisError::EmptyTable)?;
        let start = default_start(table, settings.period_days).ok_or(AnalysisError::EmptyTable)?;
        let range = period_from_start(start, settings.period_days)?;

        Ok(Self {
            first_region,
            second_region,
            range,
            success_metrics: settings.success_metrics.clone(),
            trial_metrics: settings.trial_metrics.clone(),
            significance_levels: settings.significance_levels.clone(),
        })
    }
}

/// Summed counts for one region over the selected period.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionAggregate {
    pub region: String,
    pub successes: i64,
    pub trials: i64,
    /// Success metrics per day, for charting.
    pub daily_successes: Vec<(NaiveDate, i64)>,
}

impl RegionAggregate {
    pub fn proportion(&self) -> Proportion {
        Proportion::new(self.successes, self.trials)
    }

    /// `successes / trials * 100`, `None` without trials.
    pub fn success_percent(&self) -> Option<f64> {
        self.proportion().share().map(|s| s * 100.0)
    }
}

/// Result of comparing two regions.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonResult {
    pub first: RegionAggregate,
    pub second: RegionAggregate,
    pub range: DateRange,
    /// A failed test still leaves the counts worth showing.
    pub test: Result<ZTestResult, StatsError>,
    pub verdicts: Vec<Verdict>,
    /// Problems that zeroed an aggregate without stopping the comparison.
    pub warnings: Vec<ProcessorError>,
}

/// Run one comparison.
pub fn run_comparison(
    table: &CovidTable,
    request: &ComparisonRequest,
    populations: &PopulationTable,
) -> Result<ComparisonResult, AnalysisError> {
    let (first_date, last_date) = table
        .first_date()
        .zip(table.last_date())
        .ok_or(AnalysisError::EmptyTable)?;

    if request.range.end > last_date {
        return Err(AnalysisError::RangeBeyondData {
            end: request.range.end,
            last: last_date,
        });
    }
    if request.range.start < first_date {
        return Err(AnalysisError::RangeBeforeData {
            start: request.range.start,
            first: first_date,
        });
    }
    for region in [&request.first_region, &request.second_region] {
        if !table.has_region(region) {
            return Err(AnalysisError::UnknownRegion(region.clone()));
        }
    }

    let ((first, first_warnings), (second, second_warnings)) = rayon::join(
        || aggregate_region(table, &request.first_region, request, populations),
        || aggregate_region(table, &request.second_region, request, populations),
    );

    let mut warnings = first_warnings;
    warnings.extend(second_warnings);

    let test = StatsCalculator::proportions_ztest(first.proportion(), second.proportion());
    let verdicts = match &test {
        Ok(result) => StatsCalculator::verdicts(result.p_value, &request.significance_levels),
        Err(_) => Vec::new(),
    };

    match &test {
        Ok(result) => info!(
            first = %first.region,
            second = %second.region,
            start = %request.range.start,
            end = %request.range.end,
            z = result.z,
            p_value = result.p_value,
            "comparison computed"
        ),
        Err(e) => warn!(error = %e, "proportion test not computed"),
    }

    Ok(ComparisonResult {
        first,
        second,
        range: request.range,
        test,
        verdicts,
        warnings,
    })
}

fn aggregate_region(
    table: &CovidTable,
    region: &str,
    request: &ComparisonRequest,
    populations: &PopulationTable,
) -> (RegionAggregate, Vec<ProcessorError>) {
    let rows = DataProcessor::filter_region_range(table.records(), region, request.range);
    let mut warnings = Vec::new();

    let mut sum = |metrics: &[Metric]| match DataProcessor::sum_metrics(&rows, region, metrics, populations) {
        Ok(total) => total,
        Err(e) => {
            warn!(region, error = %e, "metric sum replaced by zero");
            if !warnings.contains(&e) {
                warnings.push(e);
            }
            0
        }
    };
    let successes = sum(&request.success_metrics);
    let trials = sum(&request.trial_metrics);

    let aggregate = RegionAggregate {
        region: region.to_string(),
        successes,
        trials,
        daily_successes: DataProcessor::daily_sums(&rows, &request.success_metrics),
    };
    (aggregate, warnings)
}

/// Preferred regions when present, otherwise the first two in the file.
pub fn default_regions(
    table: &CovidTable,
    preferred_first: &str,
    preferred_second: &str,
) -> Option<(String, String)> {
    let regions = table.regions();
    let pick = |preferred: &str, fallback: usize| -> Option<String> {
        if table.has_region(preferred) {
            Some(preferred.to_string())
        } else {
            regions.get(fallback).or_else(|| regions.first()).cloned()
        }
    };
    Some((pick(preferred_first, 0)?, pick(preferred_second, 1)?))
}

/// `days` days from `start`, inclusive.
pub fn period_from_start(start: NaiveDate, days: u32) -> Result<DateRange, AnalysisError> {
    if days == 0 {
        return Err(AnalysisError::EmptyPeriod);
    }
    DateRange::from_start(start, days).ok_or(AnalysisError::PeriodOutOfCalendar { start, days })
}

/// `period_days` before the last date, clamped to the first date.
pub fn default_start(table: &CovidTable, period_days: u32) -> Option<NaiveDate> {
    let first = table.first_date()?;
    let last = table.last_date()?;
    let start = last
        .checked_sub_days(Days::new(u64::from(period_days)))
        .unwrap_or(first);
    Some(start.max(first))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::DailyRecord;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2021, 5, d).unwrap()
    }

    fn table() -> CovidTable {
        let mut records = Vec::new();
        for day in 1..=31 {
            records.push(DailyRecord {
                region: "Москва".to_string(),
                date: date(day),
                deaths: 70 + i64::from(day),
                infections: 2000,
                recoveries: 1800,
            });
            records.push(DailyRecord {
                region: "Санкт-Петербург".to_string(),
                date: date(day),
                deaths: 30,
                infections: 700,
                recoveries: 650,
            });
            records.push(DailyRecord {
                region: "Тюменская обл.".to_string(),
                date: date(day),
                deaths: 2,
                infections: 90,
                recoveries: 80,
            });
        }
        CovidTable::from_records(records).unwrap()
    }

    fn request(first: &str, second: &str, from: u32, to: u32) -> ComparisonRequest {
        ComparisonRequest {
            first_region: first.to_string(),
            second_region: second.to_string(),
            range: DateRange::new(date(from), date(to)),
            success_metrics: vec![Metric::Deaths],
            trial_metrics: vec![Metric::Infections],
            significance_levels: vec![0.001, 0.01, 0.05],
        }
    }

    #[test]
    fn aggregates_both_regions() {
        let result = run_comparison(
            &table(),
            &request("Москва", "Санкт-Петербург", 1, 7),
            &PopulationTable::default(),
        )
        .unwrap();

        assert_eq!(result.first.successes, 7 * 70 + (1..=7).sum::<i64>());
        assert_eq!(result.first.trials, 7 * 2000);
        assert_eq!(result.second.successes, 7 * 30);
        assert_eq!(result.second.trials, 7 * 700);
        assert_eq!(result.first.daily_successes.len(), 7);
        assert!(result.test.is_ok());
        assert_eq!(result.verdicts.len(), 3);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn swapping_regions_flips_z() {
        let populations = PopulationTable::default();
        let ab = run_comparison(&table(), &request("Москва", "Санкт-Петербург", 3, 20), &populations).unwrap();
        let ba = run_comparison(&table(), &request("Санкт-Петербург", "Москва", 3, 20), &populations).unwrap();
        let (ab, ba) = (ab.test.unwrap(), ba.test.unwrap());
        assert!((ab.z + ba.z).abs() < 1e-12);
        assert!((ab.p_value - ba.p_value).abs() < 1e-12);
    }

    #[test]
    fn period_past_last_date_is_rejected() {
        let up_to_last = run_comparison(
            &table(),
            &request("Москва", "Санкт-Петербург", 25, 31),
            &PopulationTable::default(),
        );
        assert!(up_to_last.is_ok());

        let mut beyond = request("Москва", "Санкт-Петербург", 25, 31);
        beyond.range = DateRange::from_start(date(25), 8).unwrap();
        let err = run_comparison(&table(), &beyond, &PopulationTable::default()).unwrap_err();
        assert!(matches!(err, AnalysisError::RangeBeyondData { .. }));
    }

    #[test]
    fn unmapped_population_zeroes_the_total() {
        let mut req = request("Тюменская обл.", "Москва", 1, 7);
        req.trial_metrics = vec![Metric::Population];
        let result = run_comparison(&table(), &req, &PopulationTable::default()).unwrap();

        assert_eq!(result.first.trials, 0);
        assert_eq!(result.second.trials, 12_655_050);
        assert_eq!(
            result.warnings,
            vec![ProcessorError::PopulationUnknown {
                region: "Тюменская обл.".to_string()
            }]
        );
        assert_eq!(result.test, Err(StatsError::EmptyTrials(0)));
        assert!(result.verdicts.is_empty());
        assert_eq!(result.first.success_percent(), None);
    }

    #[test]
    fn unknown_region_is_rejected() {
        let err = run_comparison(
            &table(),
            &request("Москва", "Атлантида", 1, 7),
            &PopulationTable::default(),
        )
        .unwrap_err();
        assert_eq!(err, AnalysisError::UnknownRegion("Атлантида".to_string()));
    }

    #[test]
    fn defaults_follow_settings() {
        let req = ComparisonRequest::from_settings(&table(), &Settings::default()).unwrap();
        assert_eq!(req.first_region, "Москва");
        assert_eq!(req.second_region, "Санкт-Петербург");
        assert_eq!(req.range.start, date(17));
        assert_eq!(req.range.end, date(30));
        assert_eq!(req.success_metrics, vec![Metric::Deaths]);
        assert_eq!(req.trial_metrics, vec![Metric::Infections]);
    }

    #[test]
    fn default_regions_fall_back_to_file_order() {
        let (first, second) = default_regions(&table(), "Казань", "Уфа").unwrap();
        assert_eq!(first, "Москва");
        assert_eq!(second, "Санкт-Петербург");
        assert!(default_regions(&CovidTable::default(), "Москва", "Уфа").is_none());
    }

    #[test]
    fn oversized_period_is_not_reported_as_empty() {
        let settings = Settings {
            period_days: 4_000_000_000,
            ..Settings::default()
        };
        let err = ComparisonRequest::from_settings(&table(), &settings).unwrap_err();
        assert_eq!(
            err,
            AnalysisError::PeriodOutOfCalendar {
                start: date(1),
                days: 4_000_000_000
            }
        );

        let settings = Settings {
            period_days: 0,
            ..Settings::default()
        };
        let err = ComparisonRequest::from_settings(&table(), &settings).unwrap_err();
        assert_eq!(err, AnalysisError::EmptyPeriod);
    }

    #[test]
    fn default_start_is_clamped() {
        assert_eq!(default_start(&table(), 100), Some(date(1)));
    }
}
