//! Results Viewer Widget
//! Central panel with the counts table, test statistics, verdicts and daily chart.

use crate::analysis::ComparisonResult;
use crate::charts::{ChartPlotter, ALERT_COLOR};
use chrono::NaiveDate;
use egui::{Color32, RichText, ScrollArea};

const NOT_REJECTED_COLOR: Color32 = Color32::from_rgb(40, 167, 69);

/// What the last comparison produced.
#[derive(Debug, Clone)]
pub enum Outcome {
    Computed(ComparisonResult),
    /// The comparison was skipped; the message explains why.
    Skipped(String),
}

/// Scrollable results area.
#[derive(Default)]
pub struct ResultsViewer {
    pub outcome: Option<Outcome>,
    pub data_as_of: Option<NaiveDate>,
}

impl ResultsViewer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.outcome = None;
        self.data_as_of = None;
    }

    pub fn set_outcome(&mut self, outcome: Outcome) {
        self.outcome = Some(outcome);
    }

    /// Draw the results panel
    pub fn show(&mut self, ui: &mut egui::Ui) {
        ScrollArea::vertical().auto_shrink([false, false]).show(ui, |ui| {
            ui.vertical_centered(|ui| {
                ui.label(RichText::new("A/B testing").size(26.0).strong());
                ui.label(RichText::new("Test for proportions").size(22.0).strong());
                ui.label(RichText::new("😷 COVID-19 in Russia").size(18.0));
                if let Some(date) = self.data_as_of {
                    ui.label(
                        RichText::new(format!("Data as of {}", date.format("%d.%m.%Y")))
                            .size(12.0)
                            .color(Color32::GRAY),
                    );
                }
            });

            ui.add_space(10.0);
            Self::draw_period_notes(ui);
            ui.add_space(10.0);

            match &self.outcome {
                None => {
                    ui.centered_and_justified(|ui| {
                        ui.label(RichText::new("No Data").size(20.0));
                    });
                }
                Some(Outcome::Skipped(message)) => {
                    ui.label(RichText::new(message).size(14.0).color(ALERT_COLOR));
                }
                Some(Outcome::Computed(result)) => Self::draw_result(ui, result),
            }
        });
    }

    fn draw_result(ui: &mut egui::Ui, result: &ComparisonResult) {
        for warning in &result.warnings {
            ui.label(RichText::new(warning.to_string()).size(14.0).color(ALERT_COLOR));
        }

        ui.vertical_centered(|ui| {
            ui.label(RichText::new("Result").size(20.0).strong());
        });
        ui.add_space(8.0);

        ChartPlotter::draw_results_table(ui, result);
        ui.add_space(10.0);

        match &result.test {
            Ok(test) => {
                ui.label(RichText::new(format!("Z-statistic: {}", test.z)).size(14.0).strong());
                ui.label(RichText::new(format!("P-value: {}", test.p_value)).size(14.0).strong());
                ui.add_space(6.0);
                for verdict in &result.verdicts {
                    let color = if verdict.rejected {
                        ALERT_COLOR
                    } else {
                        NOT_REJECTED_COLOR
                    };
                    ui.label(RichText::new(verdict.to_string()).size(13.0).color(color));
                }
                if result.verdicts.is_empty() {
                    ui.label(
                        RichText::new("No significance level selected")
                            .size(12.0)
                            .color(Color32::GRAY),
                    );
                }
            }
            Err(e) => {
                ui.label(
                    RichText::new(format!("Test not computed: {e}"))
                        .size(14.0)
                        .color(ALERT_COLOR),
                );
            }
        }

        ui.add_space(12.0);
        ui.label(RichText::new("Successes per day").size(14.0).strong());
        ChartPlotter::draw_daily_chart(ui, result);
    }

    fn draw_period_notes(ui: &mut egui::Ui) {
        egui::CollapsingHeader::new("Notes on choosing the period")
            .default_open(false)
            .show(ui, |ui| {
                ui.label(
                    "1 May: many people gather together, so many get infected.",
                );
                ui.label(
                    "Suppose the most vulnerable die fairly quickly (about a week), \
                     while recovery is slow (about two weeks).",
                );
                ui.label(
                    "7 May: suppose people have stayed home since, so few new infections.",
                );
                ui.label(
                    "On 7 May there are then many deaths but few recoveries and few infections. \
                     That does not mean a high fatality rate: the counts describe different people, \
                     and those infected on 1 May will recover much later and are not counted yet. \
                     A single day is a poor window; a longer period gives a fairer comparison.",
                );
            });
    }
}
