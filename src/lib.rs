//! runqa - run-by-run quality assurance for FemtoDst profile histograms
//!
//! This library checks per-run profiles (the per-run mean of event and track
//! quantities) for anomalous runs: any run whose profile content or error
//! lies more than three standard deviations from the population mean is
//! flagged as bad. Bad runs from every monitored profile are merged into one
//! sorted list, and before/after comparison plots can be rendered.

pub mod batch;
pub mod cli;
pub mod config;
pub mod csv_output;
pub mod detector;
pub mod display;
pub mod energy;
pub mod error;
pub mod json_output;
pub mod monitored;
pub mod profile;
pub mod stats;
pub mod store;
pub mod svg_output;
