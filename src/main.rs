use anyhow::{Context, Result};
use clap::Parser;
use runqa::batch::{self, BatchReport};
use runqa::cli::{Cli, OutputFormat};
use runqa::config::{FileConfig, QaConfig};
use runqa::csv_output::CsvOutput;
use runqa::json_output::JsonReport;
use runqa::store::ProfileStore;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Bad runs per line in the text report
const RUNS_PER_LINE: usize = 5;

/// Initialize tracing subscriber; `--debug` raises the level to TRACE
fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into())
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Merge `runqa.toml` (if any) and command-line flags; flags win
fn resolve_config(args: &Cli) -> Result<QaConfig> {
    let file = match &args.config {
        Some(path) => FileConfig::from_file(path)?,
        None => FileConfig::default(),
    };
    let mut config = QaConfig::from_file_config(file)?;

    if let Some(energy) = args.energy {
        config.energy = energy;
    }
    if let Some(sigma) = args.sigma {
        config.set_sigma_threshold(sigma)?;
    }
    if let Some(pattern) = &args.profiles {
        config.set_profile_filter(pattern)?;
    }
    if let Some(dir) = &args.pics_dir {
        config.pics_dir = dir.clone();
    }
    if let Some(format) = args.plot_format {
        config.plot_format = format;
    }
    Ok(config)
}

fn print_report(report: &BatchReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            println!("{}", report.bad_runs.format_wrapped(RUNS_PER_LINE));
        }
        OutputFormat::Json => {
            let json = JsonReport::new(report)
                .to_json()
                .context("Failed to serialize report")?;
            println!("{}", json);
        }
        OutputFormat::Csv => {
            print!("{}", CsvOutput::new(report).to_csv());
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Cli::parse();

    init_tracing(args.debug);

    let config = resolve_config(&args)?;
    let range = config.energy.run_range();
    info!(energy = %config.energy, low = range.low, high = range.high, "run range");

    let before = ProfileStore::from_file(&args.input, Some(range))?;
    let report = batch::run_batch(&before, &config);

    match &args.after_qa {
        // Comparison mode: plots only, like the before/after macro
        Some(after_path) => {
            let after = ProfileStore::from_file(after_path, Some(range))?;
            let outcome = batch::write_comparison_plots(&report, &before, &after, &config)?;
            info!(
                written = outcome.written.len(),
                failed = outcome.failures.len(),
                dir = %config.pics_dir.display(),
                "comparison plots done"
            );
        }
        None => print_report(&report, args.format)?,
    }

    Ok(())
}
