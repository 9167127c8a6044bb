//! Chart Plotter Module
//! Daily success chart and results table using egui_plot and egui grids.

use crate::analysis::{ComparisonResult, RegionAggregate};
use chrono::{Days, NaiveDate};
use egui::{Color32, RichText};
use egui_plot::{Legend, Line, Plot, PlotPoints, Points};

/// First region color
pub const FIRST_COLOR: Color32 = Color32::from_rgb(52, 152, 219); // Blue
/// Second region color
pub const SECOND_COLOR: Color32 = Color32::from_rgb(231, 76, 60); // Red
/// Rejected hypothesis / error text
pub const ALERT_COLOR: Color32 = Color32::from_rgb(220, 53, 69);

/// Draws the comparison views.
pub struct ChartPlotter;

impl ChartPlotter {
    /// Points `[day offset, value]` relative to `start`.
    pub fn daily_points(start: NaiveDate, daily: &[(NaiveDate, i64)]) -> Vec<[f64; 2]> {
        daily
            .iter()
            .map(|&(date, value)| [(date - start).num_days() as f64, value as f64])
            .collect()
    }

    /// Daily success counts of both regions over the period.
    pub fn draw_daily_chart(ui: &mut egui::Ui, result: &ComparisonResult) {
        let start = result.range.start;
        let last_offset = (result.range.days() - 1) as f64;

        Plot::new("daily_successes")
            .height(260.0)
            .legend(Legend::default())
            .allow_scroll(false)
            .include_x(0.0)
            .include_x(last_offset)
            .include_y(0.0)
            .x_axis_label("Date")
            .y_axis_label("Successes per day")
            .x_axis_formatter(move |mark, _range| {
                let offset = mark.value.round();
                if offset < 0.0 || offset > last_offset || (mark.value - offset).abs() > 1e-6 {
                    return String::new();
                }
                start
                    .checked_add_days(Days::new(offset as u64))
                    .map(|d| d.format("%d.%m").to_string())
                    .unwrap_or_default()
            })
            .show(ui, |plot_ui| {
                for (aggregate, color) in [(&result.first, FIRST_COLOR), (&result.second, SECOND_COLOR)] {
                    let points = Self::daily_points(start, &aggregate.daily_successes);
                    if points.is_empty() {
                        continue;
                    }

                    plot_ui.line(
                        Line::new(PlotPoints::from_iter(points.iter().copied()))
                            .color(color)
                            .width(1.5)
                            .name(&aggregate.region),
                    );
                    plot_ui.points(
                        Points::new(PlotPoints::from_iter(points.iter().copied()))
                            .radius(3.0)
                            .color(color),
                    );
                }
            });
    }

    /// Successes, trials and success share per region.
    pub fn draw_results_table(ui: &mut egui::Ui, result: &ComparisonResult) {
        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                egui::Grid::new("results_table")
                    .striped(true)
                    .min_col_width(90.0)
                    .spacing([12.0, 4.0])
                    .show(ui, |ui| {
                        // Headers
                        ui.label(RichText::new("Region").strong().size(13.0));
                        ui.label(RichText::new("Successes").strong().size(13.0));
                        ui.label(RichText::new("Trials").strong().size(13.0));
                        ui.label(RichText::new("Success %").strong().size(13.0));
                        ui.end_row();

                        Self::draw_row(ui, &result.first, FIRST_COLOR);
                        Self::draw_row(ui, &result.second, SECOND_COLOR);
                    });
            });
    }

    fn draw_row(ui: &mut egui::Ui, aggregate: &RegionAggregate, color: Color32) {
        ui.label(RichText::new(&aggregate.region).size(13.0).color(color));
        ui.label(RichText::new(aggregate.successes.to_string()).size(13.0));
        ui.label(RichText::new(aggregate.trials.to_string()).size(13.0));
        let percent = aggregate
            .success_percent()
            .map(|p| format!("{p:.4}"))
            .unwrap_or_else(|| "-".to_string());
        ui.label(RichText::new(percent).size(13.0));
        ui.end_row();
    }
}
