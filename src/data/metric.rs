//! Metric vocabulary and region population lookups.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Region name column.
pub const REGION_COLUMN: &str = "Регион";
/// Date column, formatted as `DD.MM.YYYY`.
pub const DATE_COLUMN: &str = "Дата";
/// Format of the date column.
pub const DATE_FORMAT: &str = "%d.%m.%Y";

/// A quantity that can be summed into a success or trial count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Deaths,
    Infections,
    Recoveries,
    /// Fixed population of the region, added once regardless of period length.
    Population,
}

impl Metric {
    /// Metrics that may be counted as "successes".
    pub const SUCCESS_OPTIONS: [Metric; 3] = [Metric::Deaths, Metric::Infections, Metric::Recoveries];

    /// Metrics that may be counted as "trials".
    pub const TRIAL_OPTIONS: [Metric; 4] = [
        Metric::Deaths,
        Metric::Infections,
        Metric::Recoveries,
        Metric::Population,
    ];

    /// CSV column holding the daily value, `None` for population.
    pub fn column_name(self) -> Option<&'static str> {
        match self {
            Metric::Deaths => Some("Смертей за день"),
            Metric::Infections => Some("Заражений за день"),
            Metric::Recoveries => Some("Выздоровлений за день"),
            Metric::Population => None,
        }
    }

    /// Option label as shown in the source dataset's vocabulary.
    pub fn option_label(self) -> &'static str {
        match self {
            Metric::Deaths => "Смерти",
            Metric::Infections => "Заражения",
            Metric::Recoveries => "Выздоровления",
            Metric::Population => "Население",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Metric::Deaths => "Deaths",
            Metric::Infections => "Infections",
            Metric::Recoveries => "Recoveries",
            Metric::Population => "Population",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown metric '{0}' (expected deaths, infections, recoveries or population)")]
pub struct UnknownMetric(pub String);

impl FromStr for Metric {
    type Err = UnknownMetric;

    /// Accepts the English name, the dataset option label or the CSV column name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Metric::TRIAL_OPTIONS
            .into_iter()
            .find(|m| {
                m.display_name().to_lowercase() == wanted
                    || m.option_label().to_lowercase() == wanted
                    || m.column_name().is_some_and(|c| c.to_lowercase() == wanted)
            })
            .ok_or_else(|| UnknownMetric(s.to_string()))
    }
}

/// Region name to population mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopulationTable {
    by_region: BTreeMap<String, u64>,
}

impl Default for PopulationTable {
    fn default() -> Self {
        let mut by_region = BTreeMap::new();
        by_region.insert("Санкт-Петербург".to_string(), 5_384_342);
        by_region.insert("Москва".to_string(), 12_655_050);
        Self { by_region }
    }
}

impl PopulationTable {
    /// Population of a region, if known.
    pub fn get(&self, region: &str) -> Option<u64> {
        self.by_region.get(region).copied()
    }

    /// Add or override entries.
    pub fn extend<I>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (String, u64)>,
    {
        self.by_region.extend(entries);
    }
}
