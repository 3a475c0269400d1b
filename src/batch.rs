//! Bad-run pass over every monitored profile of a store
//!
//! Profiles are checked one at a time. A profile that is missing from the
//! store or has too little data is recorded as a failure and the pass moves
//! on to the next one.

use crate::config::QaConfig;
use crate::detector::{BadRunList, ProfileCheck, RunQualityAnalyzer};
use crate::energy::Energy;
use crate::error::QaError;
use crate::monitored::MonitoredQuantity;
use crate::store::ProfileStore;
use crate::svg_output::ComparisonPlot;
use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use tracing::{info, warn};

/// A profile whose check could not be completed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileFailure {
    pub profile: String,
    pub reason: String,
}

impl ProfileFailure {
    fn new(profile: &str, err: &QaError) -> Self {
        Self {
            profile: profile.to_string(),
            reason: err.to_string(),
        }
    }
}

/// Result of one bad-run pass
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub energy: Energy,
    pub sigma_threshold: f64,
    pub checks: Vec<ProfileCheck>,
    pub failures: Vec<ProfileFailure>,
    /// Sorted, deduplicated union of the flagged runs of every check
    pub bad_runs: BadRunList,
}

impl BatchReport {
    pub fn check(&self, profile: &str) -> Option<&ProfileCheck> {
        self.checks.iter().find(|c| c.profile == profile)
    }
}

/// Names of the monitored profiles selected by `config`, in visiting order
pub fn selected_profiles(config: &QaConfig) -> Vec<String> {
    MonitoredQuantity::all()
        .iter()
        .map(|q| q.profile_name())
        .filter(|name| config.selects(name))
        .collect()
}

/// Check every selected monitored profile of `store`
pub fn run_batch(store: &ProfileStore, config: &QaConfig) -> BatchReport {
    let analyzer =
        RunQualityAnalyzer::new(config.sigma_threshold).with_policy(config.missing_data);
    let mut bad_runs = BadRunList::new();
    let mut checks = Vec::new();
    let mut failures = Vec::new();

    for name in selected_profiles(config) {
        let outcome = store
            .get(&name)
            .and_then(|profile| analyzer.check_into(&profile, &mut bad_runs));
        match outcome {
            Ok(check) => checks.push(check),
            Err(err) => {
                warn!(profile = %name, "skipping profile: {}", err);
                failures.push(ProfileFailure::new(&name, &err));
            }
        }
    }

    let bad_runs = bad_runs.finalize();
    info!(
        checked = checks.len(),
        failed = failures.len(),
        bad_runs = bad_runs.len(),
        "bad-run pass complete"
    );

    BatchReport {
        energy: config.energy,
        sigma_threshold: config.sigma_threshold,
        checks,
        failures,
        bad_runs,
    }
}

/// Plots written by a comparison pass
#[derive(Debug, Clone, Default)]
pub struct ComparisonOutcome {
    pub written: Vec<PathBuf>,
    pub failures: Vec<ProfileFailure>,
}

/// Render a before/after plot for every successful check of `report`
///
/// Files are named `{profile}.{ext}` under `config.pics_dir`. A profile
/// missing from the after-QA store is a per-profile failure; I/O errors
/// abort the pass.
pub fn write_comparison_plots(
    report: &BatchReport,
    before: &ProfileStore,
    after: &ProfileStore,
    config: &QaConfig,
) -> Result<ComparisonOutcome> {
    fs::create_dir_all(&config.pics_dir)
        .with_context(|| format!("Failed to create {}", config.pics_dir.display()))?;

    let mut outcome = ComparisonOutcome::default();
    for check in &report.checks {
        let pair = before
            .get(&check.profile)
            .and_then(|b| after.get(&check.profile).map(|a| (b, a)));
        let (before_profile, after_profile) = match pair {
            Ok(pair) => pair,
            Err(err) => {
                warn!(profile = %check.profile, "no comparison plot: {}", err);
                outcome
                    .failures
                    .push(ProfileFailure::new(&check.profile, &err));
                continue;
            }
        };

        let plot = ComparisonPlot::new(&before_profile, &after_profile, check);
        let path = config.pics_dir.join(format!(
            "{}.{}",
            check.profile,
            config.plot_format.extension()
        ));
        fs::write(&path, plot.render(config.plot_format))
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!(path = %path.display(), "wrote comparison plot");
        outcome.written.push(path);
    }
    Ok(outcome)
}
