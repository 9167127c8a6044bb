//! CSV Data Loader Module
//! Reads the daily statistics CSV with Polars and converts it into typed records.

use crate::data::metric::{Metric, DATE_COLUMN, DATE_FORMAT, REGION_COLUMN};
use crate::data::table::{CovidTable, DailyRecord};
use chrono::NaiveDate;
use polars::prelude::*;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Failed to load CSV: {0}")]
    CsvError(#[from] PolarsError),
    #[error("Missing required column: `{0}`")]
    MissingColumn(String),
    #[error("Line {line}: missing value in `{column}`")]
    MissingValue { line: usize, column: String },
    #[error("Line {line}: invalid date '{value}' (expected DD.MM.YYYY)")]
    InvalidDate { line: usize, value: String },
    #[error("Line {line}: invalid count '{value}' in `{column}`")]
    InvalidCount {
        line: usize,
        column: String,
        value: String,
    },
    #[error("Duplicate row for region '{region}' on {date}")]
    DuplicateRow { region: String, date: NaiveDate },
}

/// Metrics read from their own CSV column.
const COUNT_METRICS: [Metric; 3] = [Metric::Deaths, Metric::Infections, Metric::Recoveries];

/// Holds the loaded table and where it came from.
pub struct DataLoader {
    table: Option<CovidTable>,
    file_path: Option<PathBuf>,
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DataLoader {
    pub fn new() -> Self {
        Self {
            table: None,
            file_path: None,
        }
    }

    /// Read a CSV file into a table without touching loader state.
    ///
    /// Used directly by the background loading thread.
    pub fn read_table(file_path: &str) -> Result<CovidTable, LoaderError> {
        let df = Self::read_dataframe(file_path)?;
        let table = Self::table_from_dataframe(&df)?;
        info!(
            path = file_path,
            rows = table.len(),
            regions = table.regions().len(),
            "loaded daily statistics"
        );
        Ok(table)
    }

    /// Read the raw CSV with Polars.
    ///
    /// Schema inference is off so every column arrives as text and a bad
    /// count cell can be reported instead of turning into null.
    pub fn read_dataframe(file_path: &str) -> Result<DataFrame, LoaderError> {
        let df = LazyCsvReader::new(file_path)
            .with_has_header(true)
            .with_infer_schema_length(Some(0))
            .finish()?
            .collect()?;
        debug!(height = df.height(), width = df.width(), "csv parsed");
        Ok(df)
    }

    /// Convert a DataFrame with the dataset's columns into typed records.
    ///
    /// Empty counts are read as zero; null regions or dates and
    /// non-integer counts are errors.
    pub fn table_from_dataframe(df: &DataFrame) -> Result<CovidTable, LoaderError> {
        let regions = Self::string_column(df, REGION_COLUMN)?;
        let dates = Self::string_column(df, DATE_COLUMN)?;

        let mut counts: Vec<Vec<Option<String>>> = Vec::with_capacity(COUNT_METRICS.len());
        let mut count_names: Vec<&str> = Vec::with_capacity(COUNT_METRICS.len());
        for metric in COUNT_METRICS {
            // Population has no column, every COUNT_METRICS entry does.
            let name = metric.column_name().unwrap_or_default();
            counts.push(Self::string_column(df, name)?);
            count_names.push(name);
        }

        let mut records = Vec::with_capacity(df.height());
        for i in 0..df.height() {
            // +2: one header line, 1-based line numbers.
            let line = i + 2;

            let region = regions[i].clone().ok_or_else(|| LoaderError::MissingValue {
                line,
                column: REGION_COLUMN.to_string(),
            })?;
            let raw_date = dates[i].as_deref().ok_or_else(|| LoaderError::MissingValue {
                line,
                column: DATE_COLUMN.to_string(),
            })?;
            let date = parse_date(raw_date).ok_or_else(|| LoaderError::InvalidDate {
                line,
                value: raw_date.to_string(),
            })?;

            let mut values = [0i64; 3];
            for (k, value) in values.iter_mut().enumerate() {
                let raw = counts[k][i].as_deref().unwrap_or_default();
                *value = parse_count(raw).ok_or_else(|| LoaderError::InvalidCount {
                    line,
                    column: count_names[k].to_string(),
                    value: raw.to_string(),
                })?;
            }
            let [deaths, infections, recoveries] = values;

            records.push(DailyRecord {
                region,
                date,
                deaths,
                infections,
                recoveries,
            });
        }

        CovidTable::from_records(records)
    }

    fn string_column(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>, LoaderError> {
        let column = df
            .column(name)
            .map_err(|_| LoaderError::MissingColumn(name.to_string()))?;
        let column = column.cast(&DataType::String)?;
        let series = column.as_materialized_series();
        let values = series
            .str()?
            .into_iter()
            .map(|v| v.map(|s| s.trim().to_string()))
            .collect();
        Ok(values)
    }

    /// Get a reference to the loaded table.
    pub fn get_table(&self) -> Option<&CovidTable> {
        self.table.as_ref()
    }

    /// Get file path.
    pub fn get_file_path(&self) -> Option<&PathBuf> {
        self.file_path.as_ref()
    }

    /// Set table directly (used for async loading)
    pub fn set_table(&mut self, table: CovidTable, file_path: PathBuf) {
        self.table = Some(table);
        self.file_path = Some(file_path);
    }
}

/// Parse a `DD.MM.YYYY` date.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).ok()
}

/// Parse a daily count. Empty is zero; a float is accepted only when it
/// holds a whole number (`150.0`, `1.5e2`).
pub fn parse_count(value: &str) -> Option<i64> {
    let value = value.trim();
    if value.is_empty() {
        return Some(0);
    }
    if let Ok(n) = value.parse::<i64>() {
        return Some(n);
    }
    let f = value.parse::<f64>().ok()?;
    if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}
