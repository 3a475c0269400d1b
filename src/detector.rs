//! Bad-run detection over run profiles
//!
//! Two passes per profile: estimate [`PopulationStatistics`] from every valid
//! run (outliers included), then re-scan the profile and flag each valid run
//! whose content or error lies more than `threshold` sigmas from the mean.
//! A run is bad if it trips either test.

use crate::error::Result;
use crate::profile::RunProfile;
use crate::stats::{MissingDataPolicy, PopulationStatistics, ValidSample};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use tracing::{debug, info};

/// Default flagging threshold in standard deviations
pub const DEFAULT_SIGMA_THRESHOLD: f64 = 3.0;

/// Which of the two consistency tests a run failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagReason {
    Content,
    Error,
    Both,
}

/// A run that failed the consistency check of one profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlaggedRun {
    pub run: i64,
    pub content: f64,
    pub error: f64,
    /// `(content - mean) / sigma`; `None` when the content sigma is zero
    pub content_z: Option<f64>,
    /// `(error - mean_error) / sigma_error`; `None` when that sigma is zero
    pub error_z: Option<f64>,
    pub reason: FlagReason,
}

/// Outcome of checking one profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileCheck {
    pub profile: String,
    pub statistics: PopulationStatistics,
    pub sigma_threshold: f64,
    pub flagged: Vec<FlaggedRun>,
}

impl ProfileCheck {
    pub fn flagged_runs(&self) -> impl Iterator<Item = i64> + '_ {
        self.flagged.iter().map(|f| f.run)
    }
}

/// Accumulates flagged run ids across profiles
///
/// Duplicates are expected while profiles are being processed; [`finalize`]
/// sorts and removes them.
///
/// [`finalize`]: BadRunList::finalize
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BadRunList {
    runs: Vec<i64>,
}

impl BadRunList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, run: i64) {
        self.runs.push(run);
    }

    pub fn extend<I: IntoIterator<Item = i64>>(&mut self, runs: I) {
        self.runs.extend(runs);
    }

    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    pub fn as_slice(&self) -> &[i64] {
        &self.runs
    }

    pub fn contains(&self, run: i64) -> bool {
        self.runs.contains(&run)
    }

    /// Sort ascending and drop duplicates
    pub fn finalize(mut self) -> Self {
        self.runs.sort_unstable();
        self.runs.dedup();
        self
    }

    /// Comma-separated run ids, `per_line` values per line
    ///
    /// Every value but the last is followed by a comma; a newline starts
    /// each group after the first. No trailing newline.
    pub fn format_wrapped(&self, per_line: usize) -> String {
        let per_line = per_line.max(1);
        let mut out = String::new();
        for (i, run) in self.runs.iter().enumerate() {
            if i != 0 && i % per_line == 0 {
                out.push('\n');
            }
            let _ = write!(out, "{}", run);
            if i + 1 < self.runs.len() {
                out.push(',');
            }
        }
        out
    }
}

impl IntoIterator for BadRunList {
    type Item = i64;
    type IntoIter = std::vec::IntoIter<i64>;

    fn into_iter(self) -> Self::IntoIter {
        self.runs.into_iter()
    }
}

/// Per-profile 3-sigma consistency check
#[derive(Debug, Clone, Copy)]
pub struct RunQualityAnalyzer {
    threshold: f64,
    policy: MissingDataPolicy,
}

impl Default for RunQualityAnalyzer {
    fn default() -> Self {
        Self::new(DEFAULT_SIGMA_THRESHOLD)
    }
}

impl RunQualityAnalyzer {
    /// Create an analyzer flagging deviations beyond `threshold` sigmas
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            policy: MissingDataPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: MissingDataPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn policy(&self) -> MissingDataPolicy {
        self.policy
    }

    /// Estimate statistics and flag the outlying runs of `profile`
    ///
    /// Fails with `InsufficientData` when fewer than two runs carry data.
    pub fn check(&self, profile: &RunProfile) -> Result<ProfileCheck> {
        info!("Working on {}", profile.name());

        let sample = ValidSample::collect(profile, self.policy);
        let statistics = PopulationStatistics::from_sample(&sample)?;
        debug!(
            profile = profile.name(),
            n = statistics.n,
            mean = statistics.mean_content,
            sigma = statistics.sigma_content,
            mean_error = statistics.mean_error,
            sigma_error = statistics.sigma_error,
            "population statistics"
        );

        let mut flagged = Vec::new();
        for (run, bin) in profile.iter() {
            if self.policy.is_missing(bin) {
                continue;
            }
            let content_dev = (bin.content - statistics.mean_content).abs();
            let error_dev = (bin.error - statistics.mean_error).abs();
            let content_bad = exceeds(content_dev, statistics.sigma_content, self.threshold);
            let error_bad = exceeds(error_dev, statistics.sigma_error, self.threshold);

            let reason = match (content_bad, error_bad) {
                (true, true) => FlagReason::Both,
                (true, false) => FlagReason::Content,
                (false, true) => FlagReason::Error,
                (false, false) => continue,
            };

            flagged.push(FlaggedRun {
                run,
                content: bin.content,
                error: bin.error,
                content_z: z_score(bin.content, statistics.mean_content, statistics.sigma_content),
                error_z: z_score(bin.error, statistics.mean_error, statistics.sigma_error),
                reason,
            });
        }

        info!(
            profile = profile.name(),
            flagged = flagged.len(),
            "Done!"
        );

        Ok(ProfileCheck {
            profile: profile.name().to_string(),
            statistics,
            sigma_threshold: self.threshold,
            flagged,
        })
    }

    /// Check `profile` and append its flagged runs to `bad_runs`
    ///
    /// On error `bad_runs` is left untouched.
    pub fn check_into(&self, profile: &RunProfile, bad_runs: &mut BadRunList) -> Result<ProfileCheck> {
        let check = self.check(profile)?;
        bad_runs.extend(check.flagged_runs());
        Ok(check)
    }
}

/// A zero sigma means every valid run agrees, so nothing can deviate
fn exceeds(deviation: f64, sigma: f64, threshold: f64) -> bool {
    sigma > 0.0 && deviation > threshold * sigma
}

fn z_score(value: f64, mean: f64, sigma: f64) -> Option<f64> {
    (sigma > 0.0).then(|| (value - mean) / sigma)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::energy::RunRange;
    use crate::error::QaError;
    use crate::profile::ProfileBin;

    fn uniform_with(range: RunRange, content: f64, error: f64) -> Vec<(i64, ProfileBin)> {
        (range.low..range.high)
            .map(|run| (run, ProfileBin::new(content, error)))
            .collect()
    }

    #[test]
    fn test_all_empty_profile_is_insufficient() {
        let profile = RunProfile::empty("hEventProfile_0", RunRange::new(1000, 1100));
        let err = RunQualityAnalyzer::default().check(&profile).unwrap_err();
        assert!(matches!(err, QaError::InsufficientData { actual: 0, .. }));
    }

    #[test]
    fn test_single_valid_run_is_an_error() {
        let profile = RunProfile::from_entries(
            "hEventProfile_0",
            RunRange::new(1000, 1100),
            [(1042, ProfileBin::new(3.0, 0.2))],
        )
        .unwrap();
        let err = RunQualityAnalyzer::default().check(&profile).unwrap_err();
        assert!(matches!(err, QaError::InsufficientData { actual: 1, .. }));
    }

    #[test]
    fn test_uniform_profile_flags_nothing() {
        let range = RunRange::new(2000, 2040);
        let profile =
            RunProfile::from_entries("p", range, uniform_with(range, 2.0, 0.5)).unwrap();
        let check = RunQualityAnalyzer::default().check(&profile).unwrap();
        assert_eq!(check.statistics.sigma_content, 0.0);
        assert_eq!(check.statistics.sigma_error, 0.0);
        assert!(check.flagged.is_empty());
    }

    #[test]
    fn test_uniform_inexact_values_flag_nothing() {
        let range = RunRange::new(2000, 2037);
        let profile =
            RunProfile::from_entries("p", range, uniform_with(range, 1.1, 0.3)).unwrap();
        let check = RunQualityAnalyzer::default().check(&profile).unwrap();
        assert!(check.flagged.is_empty());
    }

    #[test]
    fn test_single_outlier_is_flagged() {
        let range = RunRange::new(5000, 5050);
        let mut entries = uniform_with(range, 10.0, 1.0);
        entries[17].1.content = 10.0 + 100.0;
        let profile = RunProfile::from_entries("p", range, entries).unwrap();

        let check = RunQualityAnalyzer::default().check(&profile).unwrap();
        assert_eq!(check.flagged.len(), 1);
        assert_eq!(check.flagged[0].run, 5017);
        assert_eq!(check.flagged[0].reason, FlagReason::Content);
        assert!(check.flagged[0].content_z.unwrap() > 3.0);
    }

    #[test]
    fn test_error_outlier_is_flagged() {
        let range = RunRange::new(0, 30);
        let mut entries = uniform_with(range, 10.0, 1.0);
        entries[4].1.error = 40.0;
        let profile = RunProfile::from_entries("p", range, entries).unwrap();

        let check = RunQualityAnalyzer::default().check(&profile).unwrap();
        assert_eq!(check.flagged_runs().collect::<Vec<_>>(), vec![4]);
        assert_eq!(check.flagged[0].reason, FlagReason::Error);
        assert_eq!(check.flagged[0].content_z, None);
    }

    #[test]
    fn test_outlier_inflates_sigma_for_small_samples() {
        // With ten runs a single outlier sits at most 2.85 sigma from the
        // outlier-inclusive mean, so nothing is flagged.
        let range = RunRange::new(0, 10);
        let mut entries = uniform_with(range, 10.0, 1.0);
        entries[0].1.content = 1000.0;
        let profile = RunProfile::from_entries("p", range, entries).unwrap();

        let check = RunQualityAnalyzer::default().check(&profile).unwrap();
        assert!(check.flagged.is_empty());
    }

    #[test]
    fn test_empty_bins_are_never_flagged() {
        let range = RunRange::new(0, 60);
        let entries: Vec<_> = (0..60)
            .filter(|r| r % 2 == 0)
            .map(|r| (r, ProfileBin::new(5.0 + (r % 3) as f64 * 0.01, 0.1)))
            .collect();
        let profile = RunProfile::from_entries("p", range, entries).unwrap();

        let check = RunQualityAnalyzer::default().check(&profile).unwrap();
        assert_eq!(check.statistics.n, 30);
        assert!(check.flagged.iter().all(|f| f.run % 2 == 0));
    }

    #[test]
    fn test_check_into_is_idempotent_after_finalize() {
        let range = RunRange::new(5000, 5050);
        let mut entries = uniform_with(range, 10.0, 1.0);
        entries[3].1.content = 500.0;
        let profile = RunProfile::from_entries("p", range, entries).unwrap();
        let analyzer = RunQualityAnalyzer::default();

        let mut once = BadRunList::new();
        once.push(4999);
        analyzer.check_into(&profile, &mut once).unwrap();

        let mut twice = once.clone();
        analyzer.check_into(&profile, &mut twice).unwrap();

        assert_eq!(twice.len(), once.len() + 1);
        assert_eq!(once.finalize(), twice.finalize());
    }

    #[test]
    fn test_check_into_leaves_list_untouched_on_error() {
        let profile = RunProfile::empty("p", RunRange::new(0, 5));
        let mut bad = BadRunList::new();
        bad.push(1);
        assert!(RunQualityAnalyzer::default()
            .check_into(&profile, &mut bad)
            .is_err());
        assert_eq!(bad.as_slice(), &[1]);
    }

    #[test]
    fn test_keep_all_policy_counts_zero_bins() {
        let range = RunRange::new(0, 4);
        let profile = RunProfile::from_entries(
            "p",
            range,
            [(0, ProfileBin::new(1.0, 0.1)), (1, ProfileBin::new(1.0, 0.1))],
        )
        .unwrap();
        let analyzer = RunQualityAnalyzer::default().with_policy(MissingDataPolicy::KeepAll);
        let check = analyzer.check(&profile).unwrap();
        assert_eq!(check.statistics.n, 4);
    }

    #[test]
    fn test_finalize_sorts_and_dedups() {
        let mut list = BadRunList::new();
        list.extend([15045010, 15045002, 15045010, 15045007, 15045002]);
        let list = list.finalize();
        assert_eq!(list.as_slice(), &[15045002, 15045007, 15045010]);
    }

    #[test]
    fn test_format_wrapped_five_per_line() {
        let mut list = BadRunList::new();
        list.extend(1..=12);
        assert_eq!(
            list.format_wrapped(5),
            "1,2,3,4,5,\n6,7,8,9,10,\n11,12"
        );
    }

    #[test]
    fn test_format_wrapped_empty_and_single() {
        assert_eq!(BadRunList::new().format_wrapped(5), "");
        let mut list = BadRunList::new();
        list.push(42);
        assert_eq!(list.format_wrapped(5), "42");
    }

    #[test]
    fn test_custom_threshold() {
        let range = RunRange::new(0, 20);
        let mut entries = uniform_with(range, 10.0, 1.0);
        entries[0].1.content = 12.0;
        entries[1].1.content = 8.0;
        let profile = RunProfile::from_entries("p", range, entries).unwrap();

        let strict = RunQualityAnalyzer::new(1.0).check(&profile).unwrap();
        let loose = RunQualityAnalyzer::new(5.0).check(&profile).unwrap();
        assert_eq!(strict.flagged.len(), 2);
        assert!(loose.flagged.is_empty());
    }
}
