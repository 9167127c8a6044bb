//! covid-ab - two-region proportion test for daily COVID-19 statistics
//!
//! The binary is a thin wrapper: the dashboard and the `report` command both
//! go through [`analysis::run_comparison`].

pub mod analysis;
pub mod charts;
pub mod cli;
pub mod config;
pub mod data;
pub mod gui;
pub mod report;
pub mod stats;
