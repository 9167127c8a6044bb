//! covid-ab - COVID-19 proportion test dashboard
//!
//! Opens the interactive dashboard by default; `report` prints the same
//! comparison as text.

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use covid_ab::analysis::{period_from_start, run_comparison, ComparisonRequest};
use covid_ab::cli::{Cli, Command, GuiArgs, ReportArgs};
use covid_ab::config::Settings;
use covid_ab::data::DataLoader;
use covid_ab::gui::DashboardApp;
use covid_ab::report::format_comparison;
use eframe::egui;
use tracing_subscriber::EnvFilter;

fn setup_logging(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let mut settings = match &cli.config {
        Some(path) => Settings::load(path)
            .with_context(|| format!("Failed to load settings from {}", path.display()))?,
        None => Settings::default(),
    };

    match cli.command {
        Some(Command::Report(args)) => run_report(&args, &mut settings),
        Some(Command::Gui(args)) => run_gui(&args, settings),
        None => run_gui(&GuiArgs::default(), settings),
    }
}

fn run_gui(args: &GuiArgs, mut settings: Settings) -> Result<()> {
    args.apply_to(&mut settings);

    // Configure native options
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([900.0, 600.0])
            .with_title("covid-ab"),
        ..Default::default()
    };

    eframe::run_native(
        "covid-ab",
        options,
        Box::new(|cc| Ok(Box::new(DashboardApp::new(cc, settings)))),
    )
    .map_err(|e| anyhow!("Dashboard failed: {e}"))
}

fn run_report(args: &ReportArgs, settings: &mut Settings) -> Result<()> {
    args.apply_to(settings);
    settings.validate().context("Invalid report options")?;

    let Some(csv_path) = settings.csv_path.clone() else {
        bail!("No CSV file given (use --csv)");
    };
    let table = DataLoader::read_table(&csv_path.to_string_lossy())
        .with_context(|| format!("Failed to load {}", csv_path.display()))?;

    let mut request = ComparisonRequest::from_settings(&table, settings)?;
    // Explicit regions must not fall back to the file's first regions.
    if let Some(first) = &args.first {
        request.first_region = first.clone();
    }
    if let Some(second) = &args.second {
        request.second_region = second.clone();
    }
    if let Some(start) = args.start {
        request.range = period_from_start(start, settings.period_days)?;
    }

    let result = run_comparison(&table, &request, &settings.population_table())?;
    print!("{}", format_comparison(&request, &result));
    Ok(())
}
