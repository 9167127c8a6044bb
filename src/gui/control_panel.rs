//! Control Panel Widget
//! Left side panel with data source, region, period and metric selectors.

use crate::analysis::{period_from_start, ComparisonRequest};
use crate::config::Settings;
use crate::data::{CovidTable, Metric};
use crate::stats::DEFAULT_SIGNIFICANCE_LEVELS;
use chrono::NaiveDate;
use egui::{Color32, ComboBox, RichText};
use std::path::PathBuf;

/// Format of the start date text field.
const INPUT_DATE_FORMAT: &str = "%Y-%m-%d";

/// Left side control panel. Widget values are read back into a
/// [`ComparisonRequest`] every frame.
pub struct ControlPanel {
    pub csv_path: Option<PathBuf>,
    pub regions: Vec<String>,
    pub first_region: String,
    pub second_region: String,
    pub start_text: String,
    pub period_days: u32,
    /// First and last date in the loaded table.
    pub date_bounds: Option<(NaiveDate, NaiveDate)>,
    /// Parallel to [`Metric::SUCCESS_OPTIONS`].
    pub success_selected: Vec<bool>,
    /// Parallel to [`Metric::TRIAL_OPTIONS`].
    pub trial_selected: Vec<bool>,
    pub alpha_options: Vec<f64>,
    pub alpha_selected: Vec<bool>,
    pub status: String,
}

impl ControlPanel {
    pub fn new(settings: &Settings) -> Self {
        let mut alpha_options = DEFAULT_SIGNIFICANCE_LEVELS.to_vec();
        for &alpha in &settings.significance_levels {
            if !alpha_options.contains(&alpha) {
                alpha_options.push(alpha);
            }
        }
        alpha_options.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        let alpha_selected = alpha_options
            .iter()
            .map(|a| settings.significance_levels.contains(a))
            .collect();

        Self {
            csv_path: settings.csv_path.clone(),
            regions: Vec::new(),
            first_region: settings.first_region.clone(),
            second_region: settings.second_region.clone(),
            start_text: String::new(),
            period_days: settings.period_days,
            date_bounds: None,
            success_selected: selection_mask(&Metric::SUCCESS_OPTIONS, &settings.success_metrics),
            trial_selected: selection_mask(&Metric::TRIAL_OPTIONS, &settings.trial_metrics),
            alpha_options,
            alpha_selected,
            status: "Ready".to_string(),
        }
    }

    /// Populate selectors for a freshly loaded table.
    pub fn reset_for_table(&mut self, table: &CovidTable, request: &ComparisonRequest) {
        self.regions = table.regions().to_vec();
        self.date_bounds = table.first_date().zip(table.last_date());
        self.first_region = request.first_region.clone();
        self.second_region = request.second_region.clone();
        self.start_text = request.range.start.format(INPUT_DATE_FORMAT).to_string();
        self.period_days = u32::try_from(request.range.days()).unwrap_or(1);
    }

    /// Read the current widget values. Input problems come back as a message.
    pub fn request(&self) -> Result<ComparisonRequest, String> {
        let start = NaiveDate::parse_from_str(self.start_text.trim(), INPUT_DATE_FORMAT)
            .map_err(|_| format!("Invalid start date '{}', expected YYYY-MM-DD", self.start_text))?;

        if let Some((first, last)) = self.date_bounds {
            if start < first || start > last {
                return Err(format!("The start date must be between {first} and {last}"));
            }
        }

        let range = period_from_start(start, self.period_days).map_err(|e| e.to_string())?;

        Ok(ComparisonRequest {
            first_region: self.first_region.clone(),
            second_region: self.second_region.clone(),
            range,
            success_metrics: selected(&Metric::SUCCESS_OPTIONS, &self.success_selected),
            trial_metrics: selected(&Metric::TRIAL_OPTIONS, &self.trial_selected),
            significance_levels: selected(&self.alpha_options, &self.alpha_selected),
        })
    }

    /// Draw the control panel
    pub fn show(&mut self, ui: &mut egui::Ui) -> ControlPanelAction {
        let mut action = ControlPanelAction::None;

        // Title
        ui.vertical_centered(|ui| {
            ui.add_space(5.0);
            ui.label(
                RichText::new("😷 covid-ab")
                    .size(22.0)
                    .color(Color32::from_rgb(100, 149, 237)),
            );
            ui.label(
                RichText::new("Test for proportions")
                    .size(11.0)
                    .color(Color32::GRAY),
            );
        });
        ui.add_space(10.0);
        ui.separator();
        ui.add_space(5.0);

        // ===== CSV File Section =====
        ui.label(RichText::new("📁 Data Source").size(14.0).strong());
        ui.add_space(5.0);

        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    let path_text = self
                        .csv_path
                        .as_ref()
                        .and_then(|p| p.file_name())
                        .map(|n| n.to_string_lossy().to_string())
                        .unwrap_or_else(|| "No file selected".to_string());

                    ui.label(RichText::new(&path_text).size(12.0).color(
                        if self.csv_path.is_some() {
                            Color32::WHITE
                        } else {
                            Color32::GRAY
                        },
                    ));

                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.button("📂 Browse").clicked() {
                            action = ControlPanelAction::BrowseCsv;
                        }
                    });
                });
            });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Regions =====
        ui.label(RichText::new("🗺 Regions").size(14.0).strong());
        ui.add_space(8.0);

        let label_width = 90.0;
        let combo_width = 180.0;

        ui.horizontal(|ui| {
            ui.add_sized([label_width, 20.0], egui::Label::new("First:"));
            ComboBox::from_id_salt("first_region")
                .width(combo_width)
                .selected_text(&self.first_region)
                .show_ui(ui, |ui| {
                    for region in &self.regions {
                        ui.selectable_value(&mut self.first_region, region.clone(), region);
                    }
                });
        });

        ui.add_space(5.0);

        ui.horizontal(|ui| {
            ui.add_sized([label_width, 20.0], egui::Label::new("Second:"));
            ComboBox::from_id_salt("second_region")
                .width(combo_width)
                .selected_text(&self.second_region)
                .show_ui(ui, |ui| {
                    for region in &self.regions {
                        ui.selectable_value(&mut self.second_region, region.clone(), region);
                    }
                });
        });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Period =====
        ui.label(RichText::new("📅 Period").size(14.0).strong());
        ui.add_space(8.0);

        ui.horizontal(|ui| {
            ui.add_sized([label_width, 20.0], egui::Label::new("Start date:"));
            ui.add(egui::TextEdit::singleline(&mut self.start_text).desired_width(110.0));
        });

        ui.add_space(5.0);

        ui.horizontal(|ui| {
            ui.add_sized([label_width, 20.0], egui::Label::new("Days:"));
            ui.add(
                egui::DragValue::new(&mut self.period_days)
                    .range(1..=3650)
                    .speed(0.2),
            );
        });

        if let Some((first, last)) = self.date_bounds {
            ui.label(
                RichText::new(format!("Data available {first} to {last}"))
                    .size(11.0)
                    .color(Color32::GRAY),
            );
        }

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Metrics =====
        ui.label(RichText::new("✅ Successes").size(14.0).strong());
        ui.label(
            RichText::new("Summed over the period")
                .size(11.0)
                .color(Color32::GRAY),
        );
        for (metric, checked) in Metric::SUCCESS_OPTIONS.iter().zip(self.success_selected.iter_mut()) {
            ui.checkbox(checked, metric_label(*metric));
        }

        ui.add_space(10.0);

        ui.label(RichText::new("🔢 Trials").size(14.0).strong());
        ui.label(
            RichText::new("Summed over the period, population is added once")
                .size(11.0)
                .color(Color32::GRAY),
        );
        for (metric, checked) in Metric::TRIAL_OPTIONS.iter().zip(self.trial_selected.iter_mut()) {
            ui.checkbox(checked, metric_label(*metric));
        }

        ui.add_space(10.0);

        ui.label(RichText::new("α Significance levels").size(14.0).strong());
        ui.horizontal_wrapped(|ui| {
            for (alpha, checked) in self.alpha_options.iter().zip(self.alpha_selected.iter_mut()) {
                ui.checkbox(checked, alpha.to_string());
            }
        });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Status =====
        let status_color = if self.status.starts_with("Error") {
            Color32::from_rgb(220, 53, 69)
        } else if self.status.starts_with("Loaded") {
            Color32::from_rgb(40, 167, 69)
        } else {
            Color32::GRAY
        };
        ui.label(RichText::new(&self.status).size(11.0).color(status_color));

        action
    }

    /// Set status line
    pub fn set_status(&mut self, status: &str) {
        self.status = status.to_string();
    }
}

fn metric_label(metric: Metric) -> String {
    format!("{} ({})", metric.display_name(), metric.option_label())
}

fn selection_mask<T: PartialEq>(options: &[T], chosen: &[T]) -> Vec<bool> {
    options.iter().map(|o| chosen.contains(o)).collect()
}

fn selected<T: Clone>(options: &[T], mask: &[bool]) -> Vec<T> {
    options
        .iter()
        .zip(mask)
        .filter(|(_, &on)| on)
        .map(|(o, _)| o.clone())
        .collect()
}

/// Actions triggered by control panel
#[derive(Debug, Clone, PartialEq)]
pub enum ControlPanelAction {
    None,
    BrowseCsv,
}
