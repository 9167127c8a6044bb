//! Charts module - comparison chart and table rendering

mod plotter;

pub use plotter::{ChartPlotter, ALERT_COLOR, FIRST_COLOR, SECOND_COLOR};
