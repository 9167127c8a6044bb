//! Typed daily records and the in-memory table built from the CSV.

use crate::data::loader::LoaderError;
use crate::data::metric::Metric;
use chrono::{Days, NaiveDate};
use std::collections::HashSet;

/// One row of the dataset: a region's counts for a single day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyRecord {
    pub region: String,
    pub date: NaiveDate,
    pub deaths: i64,
    pub infections: i64,
    pub recoveries: i64,
}

impl DailyRecord {
    /// Daily value of a column metric. Population is not a daily value.
    pub fn value(&self, metric: Metric) -> Option<i64> {
        match metric {
            Metric::Deaths => Some(self.deaths),
            Metric::Infections => Some(self.infections),
            Metric::Recoveries => Some(self.recoveries),
            Metric::Population => None,
        }
    }
}

/// Inclusive date interval `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Bounds are reordered if given backwards.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        if start <= end {
            Self { start, end }
        } else {
            Self { start: end, end: start }
        }
    }

    /// Period of `days` days beginning at `start`. `None` for zero days.
    pub fn from_start(start: NaiveDate, days: u32) -> Option<Self> {
        let last_offset = days.checked_sub(1)?;
        let end = start.checked_add_days(Days::new(u64::from(last_offset)))?;
        Some(Self { start, end })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Number of calendar days covered.
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

/// All records loaded from one file.
#[derive(Debug, Clone, Default)]
pub struct CovidTable {
    records: Vec<DailyRecord>,
    regions: Vec<String>,
}

impl CovidTable {
    /// Build a table, rejecting a second row for the same region and date.
    pub fn from_records(records: Vec<DailyRecord>) -> Result<Self, LoaderError> {
        let mut regions: Vec<String> = Vec::new();
        {
            let mut seen: HashSet<(&str, NaiveDate)> = HashSet::with_capacity(records.len());
            for record in &records {
                if !seen.insert((record.region.as_str(), record.date)) {
                    return Err(LoaderError::DuplicateRow {
                        region: record.region.clone(),
                        date: record.date,
                    });
                }
                if !regions.iter().any(|r| r == &record.region) {
                    regions.push(record.region.clone());
                }
            }
        }

        Ok(Self { records, regions })
    }

    pub fn records(&self) -> &[DailyRecord] {
        &self.records
    }

    /// Distinct region names in first-seen order.
    pub fn regions(&self) -> &[String] {
        &self.regions
    }

    pub fn has_region(&self, region: &str) -> bool {
        self.regions.iter().any(|r| r == region)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Earliest date across all regions.
    pub fn first_date(&self) -> Option<NaiveDate> {
        self.records.iter().map(|r| r.date).min()
    }

    /// Latest date across all regions.
    pub fn last_date(&self) -> Option<NaiveDate> {
        self.records.iter().map(|r| r.date).max()
    }
}
