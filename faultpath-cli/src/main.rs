//! FaultPath CLI: evaluate rupture sets against a path plausibility filter.
//!
//! Commands:
//! - `evaluate`: run the configured filter over every rupture and summarize
//! - `values`: print per-nucleation scalar values for a scalar filter

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use faultpath_core::factory::BuiltFilter;
use faultpath_runner::{
    evaluate_batch, export_json, export_values_csv, export_verdicts_csv, nucleation_values,
    BatchSummary, RunConfig, RuptureSet, VerdictReport,
};

#[derive(Parser)]
#[command(
    name = "faultpath",
    about = "FaultPath CLI: path-based plausibility filtering for multi-fault ruptures"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate every rupture in a document and print a summary.
    Evaluate {
        /// Path to the TOML run config.
        #[arg(long)]
        config: PathBuf,

        /// Path to the JSON rupture document.
        #[arg(long)]
        ruptures: PathBuf,

        /// Log every nucleation point and path addition.
        #[arg(long, default_value_t = false)]
        verbose: bool,

        /// Write the verdict report as JSON.
        #[arg(long)]
        output: Option<PathBuf>,

        /// Write verdicts as CSV.
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Print the scalar value of every nucleation cluster (scalar filters only).
    Values {
        /// Path to the TOML run config.
        #[arg(long)]
        config: PathBuf,

        /// Path to the JSON rupture document.
        #[arg(long)]
        ruptures: PathBuf,

        /// Print JSON instead of one line per rupture.
        #[arg(long, default_value_t = false)]
        json: bool,

        /// Write values as CSV.
        #[arg(long)]
        csv: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Evaluate {
            config,
            ruptures,
            verbose,
            output,
            csv,
        } => run_evaluate(&config, &ruptures, verbose, output, csv),
        Commands::Values {
            config,
            ruptures,
            json,
            csv,
        } => run_values(&config, &ruptures, json, csv),
    }
}

/// Loads the run config, builds its filter, and loads the rupture set.
fn load(config_path: &Path, ruptures_path: &Path) -> Result<(RunConfig, BuiltFilter, RuptureSet)> {
    let config = RunConfig::from_file(config_path)
        .with_context(|| format!("loading config {}", config_path.display()))?;
    let base_dir = config_path.parent().unwrap_or_else(|| Path::new("."));
    let filter = config.build_filter(base_dir)?;
    let set = RuptureSet::from_file(ruptures_path)
        .with_context(|| format!("loading ruptures {}", ruptures_path.display()))?;
    tracing::info!(ruptures = set.len(), "loaded rupture set");
    Ok((config, filter, set))
}

fn run_evaluate(
    config_path: &Path,
    ruptures_path: &Path,
    verbose: bool,
    output: Option<PathBuf>,
    csv: Option<PathBuf>,
) -> Result<()> {
    let (config, filter, set) = load(config_path, ruptures_path)?;
    let verdicts = evaluate_batch(&filter, &set, verbose)?;

    let summary = BatchSummary::from_verdicts(&verdicts);
    summary.display(filter.name());

    if let Some(path) = csv {
        std::fs::write(&path, export_verdicts_csv(&verdicts)?)
            .with_context(|| format!("writing {}", path.display()))?;
        println!("Verdicts written to: {}", path.display());
    }

    if let Some(path) = output {
        let report = VerdictReport::new(config.fingerprint()?, filter.name(), verdicts);
        std::fs::write(&path, export_json(&report)?)
            .with_context(|| format!("writing {}", path.display()))?;
        println!("Report written to: {}", path.display());
    }

    Ok(())
}

fn run_values(config_path: &Path, ruptures_path: &Path, json: bool, csv: Option<PathBuf>) -> Result<()> {
    let (_, filter, set) = load(config_path, ruptures_path)?;
    let values = nucleation_values(&filter, &set)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&values)?);
    } else if let Some(scalar) = filter.as_scalar() {
        let units = scalar.scalar_units().map(|u| format!(" ({u})")).unwrap_or_default();
        println!("{}{units} per nucleation cluster:", scalar.scalar_name());
        for rupture in &values {
            let row: Vec<String> = rupture.values.iter().map(|v| format!("{v:.4}")).collect();
            println!("  {:>5}: [{}]", rupture.index, row.join(", "));
        }
    }

    if let Some(path) = csv {
        std::fs::write(&path, export_values_csv(&values)?)
            .with_context(|| format!("writing {}", path.display()))?;
        println!("Values written to: {}", path.display());
    }

    Ok(())
}
