//! Run-indexed profiles: one `(content, error)` pair per run id
//!
//! A [`RunProfile`] is the per-run mean-and-error summary of one monitored
//! quantity. Bin `b` (1-based, `1..=n_bins`) holds run `low + b - 1`; runs
//! without data hold `(0, 0)`.
//!
//! [`RunProfileBuilder`] fills a profile from individual samples the same way
//! the QA event loop fills its per-run profiles: bin content is the sample
//! mean and bin error is the spread divided by `sqrt(N)`.

use crate::energy::RunRange;
use crate::error::{QaError, Result};
use serde::{Deserialize, Serialize};

/// Content and error of a single run bin
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileBin {
    pub content: f64,
    pub error: f64,
}

impl ProfileBin {
    pub fn new(content: f64, error: f64) -> Self {
        Self { content, error }
    }
}

/// Immutable per-run profile over a contiguous run-id range
#[derive(Debug, Clone, PartialEq)]
pub struct RunProfile {
    name: String,
    title: String,
    range: RunRange,
    bins: Vec<ProfileBin>,
}

impl RunProfile {
    /// Create an empty profile (every bin `(0, 0)`)
    pub fn empty(name: impl Into<String>, range: RunRange) -> Self {
        Self {
            name: name.into(),
            title: String::new(),
            range,
            bins: vec![ProfileBin::default(); range.len()],
        }
    }

    /// Build a profile from sparse `(run, bin)` entries
    ///
    /// Runs not listed stay empty. A run outside the range is rejected.
    pub fn from_entries<I>(name: impl Into<String>, range: RunRange, entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (i64, ProfileBin)>,
    {
        let mut profile = Self::empty(name, range);
        for (run, bin) in entries {
            if !range.contains(run) {
                return Err(QaError::RunOutOfRange {
                    name: profile.name.clone(),
                    run,
                    low: range.low,
                    high: range.high,
                });
            }
            profile.bins[(run - range.low) as usize] = bin;
        }
        Ok(profile)
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn range(&self) -> RunRange {
        self.range
    }

    pub fn n_bins(&self) -> usize {
        self.bins.len()
    }

    /// Bin by 1-based index; `None` outside `1..=n_bins`
    pub fn bin(&self, bin: usize) -> Option<ProfileBin> {
        bin.checked_sub(1).and_then(|i| self.bins.get(i)).copied()
    }

    /// Bin holding `run`
    pub fn bin_for_run(&self, run: i64) -> Option<ProfileBin> {
        if !self.range.contains(run) {
            return None;
        }
        self.bins.get((run - self.range.low) as usize).copied()
    }

    /// Run id held by a 1-based bin index
    pub fn run_of_bin(&self, bin: usize) -> i64 {
        self.range.low + bin as i64 - 1
    }

    /// Iterate `(run, bin)` over the whole range, in run order
    pub fn iter(&self) -> impl Iterator<Item = (i64, ProfileBin)> + '_ {
        self.bins
            .iter()
            .enumerate()
            .map(move |(i, bin)| (self.range.low + i as i64, *bin))
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Accumulator {
    entries: u64,
    sum: f64,
    sum_sq: f64,
}

/// Fills a [`RunProfile`] one sample at a time
#[derive(Debug, Clone)]
pub struct RunProfileBuilder {
    name: String,
    title: String,
    range: RunRange,
    cells: Vec<Accumulator>,
    /// Samples outside the range (counted, not stored)
    out_of_range: u64,
}

impl RunProfileBuilder {
    pub fn new(name: impl Into<String>, range: RunRange) -> Self {
        Self {
            name: name.into(),
            title: String::new(),
            range,
            cells: vec![Accumulator::default(); range.len()],
            out_of_range: 0,
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Record one sample of the monitored quantity for `run`
    pub fn fill(&mut self, run: i64, value: f64) {
        if !self.range.contains(run) {
            self.out_of_range += 1;
            return;
        }
        let cell = &mut self.cells[(run - self.range.low) as usize];
        cell.entries += 1;
        cell.sum += value;
        cell.sum_sq += value * value;
    }

    /// Number of samples dropped because their run was outside the range
    pub fn out_of_range(&self) -> u64 {
        self.out_of_range
    }

    /// Freeze into a profile: content = mean, error = spread / sqrt(N)
    pub fn build(self) -> RunProfile {
        let bins = self
            .cells
            .iter()
            .map(|cell| {
                if cell.entries == 0 {
                    return ProfileBin::default();
                }
                let n = cell.entries as f64;
                let mean = cell.sum / n;
                let spread = (cell.sum_sq / n - mean * mean).max(0.0).sqrt();
                ProfileBin::new(mean, spread / n.sqrt())
            })
            .collect();

        RunProfile {
            name: self.name,
            title: self.title,
            range: self.range,
            bins,
        }
    }
}
