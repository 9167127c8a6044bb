//! Dashboard Main Application
//! Main window with control panel and results viewer.

use crate::analysis::{run_comparison, ComparisonRequest};
use crate::config::Settings;
use crate::data::{CovidTable, DataLoader, PopulationTable};
use crate::gui::{ControlPanel, ControlPanelAction, Outcome, ResultsViewer};
use egui::SidePanel;
use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver};
use std::thread;
use tracing::{error, info};

/// CSV loading result from background thread
enum LoadResult {
    Progress(String),
    Complete { table: CovidTable, path: PathBuf },
    Error(String),
}

/// Main application window.
pub struct DashboardApp {
    loader: DataLoader,
    settings: Settings,
    populations: PopulationTable,
    control_panel: ControlPanel,
    results_viewer: ResultsViewer,

    /// Selection the current outcome was computed for.
    last_request: Option<Result<ComparisonRequest, String>>,

    // Async CSV loading
    load_rx: Option<Receiver<LoadResult>>,
    is_loading: bool,
}

impl DashboardApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, settings: Settings) -> Self {
        Self::with_settings(settings)
    }

    fn with_settings(settings: Settings) -> Self {
        let mut app = Self {
            loader: DataLoader::new(),
            populations: settings.population_table(),
            control_panel: ControlPanel::new(&settings),
            results_viewer: ResultsViewer::new(),
            settings,
            last_request: None,
            load_rx: None,
            is_loading: false,
        };

        match app.settings.csv_path.clone() {
            Some(path) if path.exists() => app.start_loading(path),
            Some(path) => app
                .control_panel
                .set_status(&format!("{} not found, browse for a CSV file", path.display())),
            None => {}
        }

        app
    }

    /// Handle CSV file selection
    fn handle_browse_csv(&mut self) {
        if self.is_loading {
            return; // Already loading
        }

        if let Some(path) = rfd::FileDialog::new()
            .add_filter("CSV Files", &["csv"])
            .pick_file()
        {
            self.start_loading(path);
        }
    }

    /// Load CSV in a background thread
    fn start_loading(&mut self, path: PathBuf) {
        self.results_viewer.clear();
        self.last_request = None;
        self.control_panel.csv_path = Some(path.clone());
        self.control_panel.set_status("Loading CSV file...");
        self.is_loading = true;

        let (tx, rx) = channel();
        self.load_rx = Some(rx);

        thread::spawn(move || {
            let _ = tx.send(LoadResult::Progress("Reading CSV file...".to_string()));

            let path_str = path.to_string_lossy().to_string();
            match DataLoader::read_table(&path_str) {
                Ok(table) => {
                    let _ = tx.send(LoadResult::Complete { table, path });
                }
                Err(e) => {
                    let _ = tx.send(LoadResult::Error(e.to_string()));
                }
            }
        });
    }

    /// Check for CSV loading results
    fn check_load_results(&mut self) {
        let rx = self.load_rx.take();
        if let Some(rx) = rx {
            let mut should_keep_receiver = true;

            while let Ok(result) = rx.try_recv() {
                match result {
                    LoadResult::Progress(status) => {
                        self.control_panel.set_status(&status);
                    }
                    LoadResult::Complete { table, path } => {
                        self.handle_table_loaded(table, path);
                        self.is_loading = false;
                        should_keep_receiver = false;
                    }
                    LoadResult::Error(e) => {
                        error!(error = %e, "csv load failed");
                        self.control_panel.set_status(&format!("Error: {}", e));
                        self.restore_previous_table();
                        self.is_loading = false;
                        should_keep_receiver = false;
                    }
                }
            }

            if should_keep_receiver {
                self.load_rx = Some(rx);
            }
        }
    }

    fn handle_table_loaded(&mut self, table: CovidTable, path: PathBuf) {
        let request = ComparisonRequest::from_settings(&table, &self.settings);
        if let Ok(request) = &request {
            self.control_panel.reset_for_table(&table, request);
        }

        info!(path = %path.display(), "dashboard data ready");
        self.results_viewer.data_as_of = table.last_date();
        self.loader.set_table(table, path);
        self.last_request = None;

        let status = match request {
            Ok(_) => self.loaded_status(),
            Err(e) => format!("Error: {}", e),
        };
        self.control_panel.set_status(&status);
    }

    fn loaded_status(&self) -> String {
        let Some(table) = self.loader.get_table() else {
            return "No data loaded".to_string();
        };
        let file = self
            .loader
            .get_file_path()
            .and_then(|p| p.file_name())
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        format!(
            "Loaded {} rows, {} regions from {}",
            table.len(),
            table.regions().len(),
            file
        )
    }

    /// A failed load keeps the table that was already shown.
    fn restore_previous_table(&mut self) {
        if let Some(table) = self.loader.get_table() {
            self.results_viewer.data_as_of = table.last_date();
        }
        self.control_panel.csv_path = self.loader.get_file_path().cloned();
        self.last_request = None;
    }

    /// Re-run the comparison whenever a widget value changed.
    fn refresh_results(&mut self) {
        // The loader still holds the previous file until the new one arrives.
        if self.is_loading {
            return;
        }
        let Some(table) = self.loader.get_table() else {
            return;
        };
        if table.is_empty() {
            return;
        }

        let request = self.control_panel.request();
        if self.last_request.as_ref() == Some(&request) {
            return;
        }

        let outcome = match &request {
            Ok(request) => match run_comparison(table, request, &self.populations) {
                Ok(result) => Outcome::Computed(result),
                Err(e) => Outcome::Skipped(e.to_string()),
            },
            Err(message) => Outcome::Skipped(message.clone()),
        };

        self.results_viewer.set_outcome(outcome);
        self.last_request = Some(request);
    }
}

impl eframe::App for DashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Check for background results
        self.check_load_results();

        // Request repaint while loading
        if self.is_loading {
            ctx.request_repaint();
        }

        // Left panel - Control Panel
        SidePanel::left("control_panel")
            .min_width(300.0)
            .max_width(350.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    let action = self.control_panel.show(ui);

                    match action {
                        ControlPanelAction::BrowseCsv => self.handle_browse_csv(),
                        ControlPanelAction::None => {}
                    }
                });
            });

        self.refresh_results();

        // Central panel - Results
        egui::CentralPanel::default().show(ctx, |ui| {
            self.results_viewer.show(ui);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::DailyRecord;
    use chrono::NaiveDate;
    use std::time::Duration;
    use tempfile::tempdir;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2021, 5, d).unwrap()
    }

    fn table() -> CovidTable {
        let mut records = Vec::new();
        for d in 1..=10 {
            for (region, deaths, infections) in [("Москва", 70, 2000), ("Санкт-Петербург", 30, 700)] {
                records.push(DailyRecord {
                    region: region.to_string(),
                    date: date(d),
                    deaths,
                    infections,
                    recoveries: 0,
                });
            }
        }
        CovidTable::from_records(records).unwrap()
    }

    fn app() -> DashboardApp {
        DashboardApp::with_settings(Settings {
            csv_path: None,
            period_days: 5,
            ..Settings::default()
        })
    }

    fn wait_for_load(app: &mut DashboardApp) {
        for _ in 0..500 {
            app.check_load_results();
            if !app.is_loading {
                return;
            }
            thread::sleep(Duration::from_millis(10));
        }
        panic!("background load did not finish");
    }

    #[test]
    fn status_names_the_loaded_file() {
        let mut app = app();
        app.handle_table_loaded(table(), PathBuf::from("/data/russia_covid.csv"));
        assert_eq!(
            app.control_panel.status,
            "Loaded 20 rows, 2 regions from russia_covid.csv"
        );
        assert_eq!(app.results_viewer.data_as_of, Some(date(10)));
    }

    #[test]
    fn no_recompute_against_old_table_while_loading() {
        let dir = tempdir().unwrap();
        let mut app = app();
        let old_path = dir.path().join("old.csv");
        app.handle_table_loaded(table(), old_path.clone());
        app.refresh_results();
        assert!(matches!(app.results_viewer.outcome, Some(Outcome::Computed(_))));

        app.start_loading(dir.path().join("missing.csv"));
        assert!(app.is_loading);
        app.refresh_results();
        assert!(app.results_viewer.outcome.is_none());
        assert!(app.last_request.is_none());

        wait_for_load(&mut app);
        assert!(app.control_panel.status.starts_with("Error"));
        assert_eq!(app.results_viewer.data_as_of, Some(date(10)));
        assert_eq!(app.control_panel.csv_path, Some(old_path));

        // The previous table is shown again.
        app.refresh_results();
        assert!(matches!(app.results_viewer.outcome, Some(Outcome::Computed(_))));
    }
}
