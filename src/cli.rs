//! CLI argument parsing for runqa

use crate::config::PlotFormat;
use crate::energy::Energy;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Output format for the bad-run report
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Comma-separated run list, five per line (default)
    Text,
    /// JSON format for machine parsing
    Json,
    /// CSV format for spreadsheet analysis
    Csv,
}

#[derive(Parser, Debug)]
#[command(name = "runqa")]
#[command(version)]
#[command(about = "Find bad runs in per-run QA profiles with a 3-sigma rule", long_about = None)]
pub struct Cli {
    /// Profile store produced before RunQA (JSON)
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Profile store produced after RunQA; enables comparison plots
    #[arg(short = 'a', long = "after-qa", value_name = "FILE")]
    pub after_qa: Option<PathBuf>,

    /// Collision energy selecting the run-id range
    #[arg(short = 'e', long = "energy", value_enum, ignore_case = true)]
    pub energy: Option<Energy>,

    /// Directory for comparison plots
    #[arg(short = 'o', long = "pics-dir", value_name = "DIR")]
    pub pics_dir: Option<PathBuf>,

    /// Image format for comparison plots
    #[arg(long = "plot-format", value_enum)]
    pub plot_format: Option<PlotFormat>,

    /// Report format
    #[arg(long = "format", value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Flagging threshold in standard deviations (default: 3.0)
    #[arg(long = "sigma", value_name = "SIGMA")]
    pub sigma: Option<f64>,

    /// Only check monitored profiles whose name matches this regex
    #[arg(long = "profiles", value_name = "REGEX")]
    pub profiles: Option<String>,

    /// Configuration file (runqa.toml)
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable trace-level logging on stderr
    #[arg(long = "debug")]
    pub debug: bool,
}
