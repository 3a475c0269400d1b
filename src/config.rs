//! Run-QA configuration and `runqa.toml` loading
//!
//! # Example runqa.toml
//!
//! ```toml
//! energy = "14GeV"
//! sigma_threshold = 3.0
//! missing_data = "zero_means_missing"
//! profiles = "^h(Event|Track)Profile_"
//! pics_dir = "pics"
//! plot_format = "svg"
//! ```
//!
//! Every key is optional. Command-line flags override file values.

use crate::detector::DEFAULT_SIGMA_THRESHOLD;
use crate::energy::Energy;
use crate::stats::MissingDataPolicy;
use anyhow::{bail, Context, Result};
use clap::ValueEnum;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Image container for comparison plots
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlotFormat {
    /// Standalone SVG image (default)
    #[default]
    Svg,
    /// HTML page embedding the SVG
    Html,
}

impl PlotFormat {
    pub fn extension(self) -> &'static str {
        match self {
            PlotFormat::Svg => "svg",
            PlotFormat::Html => "html",
        }
    }
}

/// Values read from `runqa.toml`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub energy: Option<String>,
    pub sigma_threshold: Option<f64>,
    pub missing_data: Option<MissingDataPolicy>,
    pub profiles: Option<String>,
    pub pics_dir: Option<PathBuf>,
    pub plot_format: Option<PlotFormat>,
}

impl FileConfig {
    /// Load from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse TOML")
    }
}

/// Resolved settings for one bad-run pass
#[derive(Debug, Clone)]
pub struct QaConfig {
    pub energy: Energy,
    pub sigma_threshold: f64,
    pub missing_data: MissingDataPolicy,
    /// Only monitored profiles whose name matches are checked
    pub profile_filter: Option<Regex>,
    pub pics_dir: PathBuf,
    pub plot_format: PlotFormat,
}

impl Default for QaConfig {
    fn default() -> Self {
        Self {
            energy: Energy::Gev14,
            sigma_threshold: DEFAULT_SIGMA_THRESHOLD,
            missing_data: MissingDataPolicy::default(),
            profile_filter: None,
            pics_dir: PathBuf::from("."),
            plot_format: PlotFormat::default(),
        }
    }
}

impl QaConfig {
    /// Apply file values on top of the defaults
    pub fn from_file_config(file: FileConfig) -> Result<Self> {
        let mut config = Self::default();
        if let Some(energy) = file.energy {
            config.energy = energy.parse()?;
        }
        if let Some(sigma) = file.sigma_threshold {
            config.set_sigma_threshold(sigma)?;
        }
        if let Some(policy) = file.missing_data {
            config.missing_data = policy;
        }
        if let Some(pattern) = file.profiles {
            config.set_profile_filter(&pattern)?;
        }
        if let Some(dir) = file.pics_dir {
            config.pics_dir = dir;
        }
        if let Some(format) = file.plot_format {
            config.plot_format = format;
        }
        Ok(config)
    }

    pub fn set_sigma_threshold(&mut self, sigma: f64) -> Result<()> {
        if !sigma.is_finite() || sigma <= 0.0 {
            bail!("Invalid sigma threshold: {} (must be > 0)", sigma);
        }
        self.sigma_threshold = sigma;
        Ok(())
    }

    pub fn set_profile_filter(&mut self, pattern: &str) -> Result<()> {
        let regex = Regex::new(pattern)
            .with_context(|| format!("Invalid profile pattern: {}", pattern))?;
        self.profile_filter = Some(regex);
        Ok(())
    }

    /// Whether a monitored profile is selected by the filter
    pub fn selects(&self, profile_name: &str) -> bool {
        self.profile_filter
            .as_ref()
            .map_or(true, |re| re.is_match(profile_name))
    }
}
