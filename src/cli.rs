//! Command-line parsing.

use crate::config::{Settings, MAX_PERIOD_DAYS};
use crate::data::Metric;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "covid-ab",
    about = "Compare COVID-19 outcome proportions between two regions",
    version,
    long_about = None
)]
pub struct Cli {
    /// JSON settings file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Open the interactive dashboard (default)
    Gui(GuiArgs),
    /// Print a comparison to stdout
    Report(ReportArgs),
}

#[derive(Args, Debug, Default)]
pub struct GuiArgs {
    /// CSV file to open at startup
    #[arg(long)]
    pub csv: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct ReportArgs {
    /// CSV file with daily statistics
    #[arg(long)]
    pub csv: Option<PathBuf>,

    /// First region
    #[arg(long)]
    pub first: Option<String>,

    /// Second region
    #[arg(long)]
    pub second: Option<String>,

    /// First day of the period (YYYY-MM-DD)
    #[arg(long)]
    pub start: Option<NaiveDate>,

    /// Number of days in the period
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_PERIOD_DAYS)))]
    pub days: Option<u32>,

    /// Metric counted as a success (repeatable)
    #[arg(long = "success")]
    pub success: Vec<Metric>,

    /// Metric counted as a trial (repeatable)
    #[arg(long = "trials")]
    pub trials: Vec<Metric>,

    /// Significance level (repeatable)
    #[arg(long = "alpha")]
    pub alpha: Vec<f64>,
}

impl GuiArgs {
    pub fn apply_to(&self, settings: &mut Settings) {
        if let Some(csv) = &self.csv {
            settings.csv_path = Some(csv.clone());
        }
    }
}

impl ReportArgs {
    /// Overlay flags on settings. The start date is handled separately
    /// because its default depends on the loaded data.
    pub fn apply_to(&self, settings: &mut Settings) {
        if let Some(csv) = &self.csv {
            settings.csv_path = Some(csv.clone());
        }
        if let Some(first) = &self.first {
            settings.first_region = first.clone();
        }
        if let Some(second) = &self.second {
            settings.second_region = second.clone();
        }
        if let Some(days) = self.days {
            settings.period_days = days;
        }
        if !self.success.is_empty() {
            settings.success_metrics = self.success.clone();
        }
        if !self.trials.is_empty() {
            settings.trial_metrics = self.trials.clone();
        }
        if !self.alpha.is_empty() {
            settings.significance_levels = self.alpha.clone();
        }
    }
}
