//! Settings file handling.
//!
//! All fields are optional in the JSON file; anything missing falls back to
//! the dashboard defaults.

use crate::data::{Metric, PopulationTable};
use crate::stats::DEFAULT_SIGNIFICANCE_LEVELS;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Longest accepted period, about a century.
pub const MAX_PERIOD_DAYS: u32 = 36_500;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("period_days must be at least 1")]
    EmptyPeriod,
    #[error("period_days is {0}, the limit is {max}", max = MAX_PERIOD_DAYS)]
    PeriodTooLong(u32),
    #[error("Significance level {0} is outside (0, 1)")]
    SignificanceOutOfRange(f64),
    #[error("Population metric cannot be a success metric")]
    PopulationAsSuccess,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// CSV opened at startup.
    pub csv_path: Option<PathBuf>,
    pub first_region: String,
    pub second_region: String,
    /// Length of the compared period in days.
    pub period_days: u32,
    pub success_metrics: Vec<Metric>,
    pub trial_metrics: Vec<Metric>,
    pub significance_levels: Vec<f64>,
    /// Extra region populations, merged over the built-in ones.
    pub populations: BTreeMap<String, u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            csv_path: Some(PathBuf::from("russia_covid.csv")),
            first_region: "Москва".to_string(),
            second_region: "Санкт-Петербург".to_string(),
            period_days: 14,
            success_metrics: vec![Metric::Deaths],
            trial_metrics: vec![Metric::Infections],
            significance_levels: DEFAULT_SIGNIFICANCE_LEVELS.to_vec(),
            populations: BTreeMap::new(),
        }
    }
}

impl Settings {
    /// Load and validate a JSON settings file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let settings: Settings = serde_json::from_str(text)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.period_days == 0 {
            return Err(ConfigError::EmptyPeriod);
        }
        if self.period_days > MAX_PERIOD_DAYS {
            return Err(ConfigError::PeriodTooLong(self.period_days));
        }
        if let Some(&alpha) = self
            .significance_levels
            .iter()
            .find(|&&a| !(a > 0.0 && a < 1.0))
        {
            return Err(ConfigError::SignificanceOutOfRange(alpha));
        }
        if self.success_metrics.contains(&Metric::Population) {
            return Err(ConfigError::PopulationAsSuccess);
        }
        Ok(())
    }

    /// Built-in populations extended with the configured ones.
    pub fn population_table(&self) -> PopulationTable {
        let mut table = PopulationTable::default();
        table.extend(self.populations.clone());
        table
    }
}
