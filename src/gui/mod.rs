//! GUI module - User interface components

mod app;
mod control_panel;
mod results_viewer;

pub use app::DashboardApp;
pub use control_panel::{ControlPanel, ControlPanelAction};
pub use results_viewer::{Outcome, ResultsViewer};
