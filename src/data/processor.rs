//! Data Processor Module
//! Filters records by region and period and sums the selected metrics.

use crate::data::metric::{Metric, PopulationTable};
use crate::data::table::{DailyRecord, DateRange};
use chrono::NaiveDate;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProcessorError {
    #[error("No population figure for region \"{region}\"")]
    PopulationUnknown { region: String },
}

/// Handles filtering and summing of daily records.
pub struct DataProcessor;

impl DataProcessor {
    /// Records of `region` whose date lies in the closed interval.
    pub fn filter_region_range<'a>(
        records: &'a [DailyRecord],
        region: &str,
        range: DateRange,
    ) -> Vec<&'a DailyRecord> {
        records
            .iter()
            .filter(|r| r.region == region && range.contains(r.date))
            .collect()
    }

    /// Sum each metric across `rows`, substituting the region's population
    /// for [`Metric::Population`].
    ///
    /// Population is looked up for `region` rather than from the rows, so it
    /// is available even for an empty period.
    pub fn sum_metrics(
        rows: &[&DailyRecord],
        region: &str,
        metrics: &[Metric],
        populations: &PopulationTable,
    ) -> Result<i64, ProcessorError> {
        metrics.iter().try_fold(0i64, |total, &metric| {
            let part = match metric {
                Metric::Population => {
                    let population = populations.get(region).ok_or_else(|| {
                        ProcessorError::PopulationUnknown {
                            region: region.to_string(),
                        }
                    })?;
                    i64::try_from(population).unwrap_or(i64::MAX)
                }
                column => rows.iter().filter_map(|r| r.value(column)).sum(),
            };
            Ok(total.saturating_add(part))
        })
    }

    /// Per-day sum of the given metrics, skipping population.
    pub fn daily_sums(rows: &[&DailyRecord], metrics: &[Metric]) -> Vec<(NaiveDate, i64)> {
        let mut by_date: BTreeMap<NaiveDate, i64> = BTreeMap::new();
        for row in rows {
            let value: i64 = metrics.iter().filter_map(|&m| row.value(m)).sum();
            *by_date.entry(row.date).or_insert(0) += value;
        }
        by_date.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2021, 5, d).unwrap()
    }

    fn records() -> Vec<DailyRecord> {
        let mut out = Vec::new();
        for day in 1..=10 {
            out.push(DailyRecord {
                region: "Москва".to_string(),
                date: date(day),
                deaths: i64::from(day),
                infections: 100 * i64::from(day),
                recoveries: 10,
            });
            out.push(DailyRecord {
                region: "Тюменская обл.".to_string(),
                date: date(day),
                deaths: 1,
                infections: 20,
                recoveries: 3,
            });
        }
        out
    }

    #[test]
    fn filter_keeps_closed_interval_for_region() {
        let data = records();
        let range = DateRange::new(date(1), date(7));
        let rows = DataProcessor::filter_region_range(&data, "Москва", range);
        assert_eq!(rows.len(), 7);
        assert!(rows.iter().all(|r| r.region == "Москва" && range.contains(r.date)));
    }

    #[test]
    fn seven_day_deaths_sum() {
        let data = records();
        let range = DateRange::new(date(1), date(7));
        let rows = DataProcessor::filter_region_range(&data, "Москва", range);
        let deaths: Metric = "Смерти".parse().unwrap();
        let total =
            DataProcessor::sum_metrics(&rows, "Москва", &[deaths], &PopulationTable::default()).unwrap();
        assert_eq!(total, 1 + 2 + 3 + 4 + 5 + 6 + 7);
    }

    #[test]
    fn several_metrics_add_up() {
        let data = records();
        let rows = DataProcessor::filter_region_range(&data, "Москва", DateRange::new(date(1), date(2)));
        let total = DataProcessor::sum_metrics(
            &rows,
            "Москва",
            &[Metric::Deaths, Metric::Recoveries],
            &PopulationTable::default(),
        )
        .unwrap();
        assert_eq!(total, (1 + 2) + (10 + 10));
    }

    #[test]
    fn no_matching_rows_sum_to_zero() {
        let data = records();
        let range = DateRange::new(date(20), date(25));
        for region in ["Москва", "Атлантида"] {
            let rows = DataProcessor::filter_region_range(&data, region, range);
            assert!(rows.is_empty());
            for metric in Metric::SUCCESS_OPTIONS {
                let total =
                    DataProcessor::sum_metrics(&rows, region, &[metric], &PopulationTable::default()).unwrap();
                assert_eq!(total, 0);
            }
        }
    }

    #[test]
    fn disjoint_ranges_sum_to_union() {
        let data = records();
        let populations = PopulationTable::default();
        let sum = |from, to| {
            let rows = DataProcessor::filter_region_range(&data, "Москва", DateRange::new(date(from), date(to)));
            DataProcessor::sum_metrics(&rows, "Москва", &[Metric::Infections], &populations).unwrap()
        };
        assert_eq!(sum(1, 4) + sum(5, 10), sum(1, 10));
    }

    #[test]
    fn population_is_added_once() {
        let data = records();
        let rows = DataProcessor::filter_region_range(&data, "Москва", DateRange::new(date(1), date(10)));
        let total = DataProcessor::sum_metrics(
            &rows,
            "Москва",
            &[Metric::Population],
            &PopulationTable::default(),
        )
        .unwrap();
        assert_eq!(total, 12_655_050);
    }

    #[test]
    fn population_for_unmapped_region_fails() {
        let data = records();
        let rows =
            DataProcessor::filter_region_range(&data, "Тюменская обл.", DateRange::new(date(1), date(3)));
        let err = DataProcessor::sum_metrics(
            &rows,
            "Тюменская обл.",
            &[Metric::Infections, Metric::Population],
            &PopulationTable::default(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            ProcessorError::PopulationUnknown {
                region: "Тюменская обл.".to_string()
            }
        );
    }

    #[test]
    fn daily_sums_follow_dates() {
        let data = records();
        let rows = DataProcessor::filter_region_range(&data, "Москва", DateRange::new(date(2), date(3)));
        let daily = DataProcessor::daily_sums(&rows, &[Metric::Deaths, Metric::Population]);
        assert_eq!(daily, vec![(date(2), 2), (date(3), 3)]);
    }
}
