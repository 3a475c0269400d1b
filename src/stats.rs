//! Population statistics over the valid runs of a profile
//!
//! The dispersion estimate is `(Σx² − n·mean²) / (n − 1)`, evaluated exactly
//! in that form. It equals the textbook sample variance only in exact
//! arithmetic; for large means with small spread the two drift apart in
//! floating point, and the flagging thresholds follow this form.

use crate::error::{QaError, Result};
use crate::profile::{ProfileBin, RunProfile};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Minimum number of valid runs for a dispersion estimate
pub const MIN_VALID_RUNS: usize = 2;

/// How bins without data are recognised
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingDataPolicy {
    /// A bin with `content == 0` or `error == 0` has no data and is skipped
    #[default]
    ZeroMeansMissing,
    /// Every bin is a measurement, zeros included
    KeepAll,
}

impl MissingDataPolicy {
    pub fn is_missing(self, bin: ProfileBin) -> bool {
        match self {
            MissingDataPolicy::ZeroMeansMissing => bin.content == 0.0 || bin.error == 0.0,
            MissingDataPolicy::KeepAll => false,
        }
    }
}

/// The bins of a profile that carry data, in run order
#[derive(Debug, Clone, Default)]
pub struct ValidSample {
    /// Name of the profile the sample was taken from
    pub profile: String,
    pub runs: Vec<i64>,
    pub contents: Vec<f64>,
    pub errors: Vec<f64>,
}

impl ValidSample {
    pub fn collect(profile: &RunProfile, policy: MissingDataPolicy) -> Self {
        let mut sample = Self {
            profile: profile.name().to_string(),
            ..Self::default()
        };
        for (run, bin) in profile.iter() {
            if policy.is_missing(bin) {
                continue;
            }
            sample.runs.push(run);
            sample.contents.push(bin.content);
            sample.errors.push(bin.error);
        }
        sample
    }

    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }
}

/// Mean and dispersion of bin contents and bin errors
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PopulationStatistics {
    /// Number of valid runs
    pub n: usize,
    pub mean_content: f64,
    pub mean_error: f64,
    pub var_content: f64,
    pub var_error: f64,
    pub sigma_content: f64,
    pub sigma_error: f64,
}

impl PopulationStatistics {
    /// Estimate from a valid sample; needs at least two runs
    ///
    /// Fails with `NonFiniteStatistics` when a mean or variance is NaN or
    /// infinite (non-finite bins, or sums that overflow f64).
    pub fn from_sample(sample: &ValidSample) -> Result<Self> {
        let n = sample.len();
        if n < MIN_VALID_RUNS {
            return Err(QaError::InsufficientData {
                required: MIN_VALID_RUNS,
                actual: n,
            });
        }

        let nf = n as f64;
        let mean_content = sample.contents.iter().sum::<f64>() / nf;
        let mean_error = sample.errors.iter().sum::<f64>() / nf;

        let var_content = variance_like(&sample.contents, mean_content);
        let var_error = variance_like(&sample.errors, mean_error);

        let moments = [mean_content, mean_error, var_content, var_error];
        if moments.iter().any(|m| !m.is_finite()) {
            return Err(QaError::NonFiniteStatistics {
                profile: sample.profile.clone(),
            });
        }

        Ok(Self {
            n,
            mean_content,
            mean_error,
            var_content,
            var_error,
            sigma_content: var_content.sqrt(),
            sigma_error: var_error.sqrt(),
        })
    }

    /// Lower and upper edge of the `k`-sigma content band
    pub fn content_band(&self, k: f64) -> (f64, f64) {
        (
            self.mean_content - k * self.sigma_content,
            self.mean_content + k * self.sigma_content,
        )
    }
}

/// `(Σx² − n·mean²) / (n − 1)`, clamped at zero; NaN passes through
fn variance_like(values: &[f64], mean: f64) -> f64 {
    let n = values.len() as f64;
    let sum_sq: f64 = values.iter().map(|x| x * x).sum();
    let var = (sum_sq - n * mean * mean) / (n - 1.0);
    if var < 0.0 {
        debug!(var, "negative variance from cancellation, clamping to zero");
        return 0.0;
    }
    var
}
