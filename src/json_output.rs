//! JSON output format for bad-run reports

use crate::batch::{BatchReport, ProfileFailure};
use crate::detector::FlaggedRun;
use crate::stats::PopulationStatistics;
use serde::Serialize;

/// Statistics and flagged runs of one profile
#[derive(Debug, Clone, Serialize)]
pub struct JsonProfile<'a> {
    pub name: &'a str,
    pub statistics: &'a PopulationStatistics,
    pub flagged: &'a [FlaggedRun],
}

/// Complete bad-run report
#[derive(Debug, Clone, Serialize)]
pub struct JsonReport<'a> {
    pub energy: String,
    pub sigma_threshold: f64,
    pub profiles: Vec<JsonProfile<'a>>,
    pub failures: &'a [ProfileFailure],
    pub bad_runs: &'a [i64],
}

impl<'a> JsonReport<'a> {
    pub fn new(report: &'a BatchReport) -> Self {
        Self {
            energy: report.energy.to_string(),
            sigma_threshold: report.sigma_threshold,
            profiles: report
                .checks
                .iter()
                .map(|c| JsonProfile {
                    name: &c.profile,
                    statistics: &c.statistics,
                    flagged: &c.flagged,
                })
                .collect(),
            failures: &report.failures,
            bad_runs: report.bad_runs.as_slice(),
        }
    }

    /// Serialize to pretty-printed JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
