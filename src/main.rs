use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};

use solar_insight::config::AnalysisConfig;
use solar_insight::ingest::csv::{dataset_display_name, load_csv, write_csv, CsvOptions};
use solar_insight::logging::{init_logger, Component};
use solar_insight::report::{print_summary, run_diagnostics};
use solar_insight::{clip, replace_outliers, zero_negatives, DatasetTable, Result};

/// Data-quality diagnostics for solar station CSV exports.
#[derive(Parser)]
#[command(name = "solar-insight", author, version, about, long_about = None)]
struct Cli {
    /// Station export to analyze.
    input: PathBuf,

    /// TOML config file. Defaults to $SOLAR_INSIGHT_CONFIG, then built-in defaults.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the report as JSON instead of text.
    #[arg(long)]
    json: bool,

    /// Header of the timestamp column.
    #[arg(long, default_value = "Timestamp")]
    timestamp_column: String,

    /// Write a cleaned copy (clipped, negatives zeroed, outliers replaced) here.
    #[arg(long, value_name = "PATH")]
    clean_output: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AnalysisConfig::load(path),
        None => AnalysisConfig::from_env(),
    };
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            return ExitCode::FAILURE;
        }
    };
    init_logger(config.logging.level, config.logging.timestamps);

    match run(&cli, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(component = %Component::System, "{}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli, config: &AnalysisConfig) -> Result<()> {
    let options = CsvOptions { timestamp_column: cli.timestamp_column.clone(), ..CsvOptions::default() };
    let table = load_csv(&cli.input, &options)?;
    let name = display_name(&cli.input);

    let report = run_diagnostics(&name, &table, config)?;
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_summary(&report);
    }

    if let Some(output) = &cli.clean_output {
        let cleaned = clean(&table, config)?;
        write_csv(&cleaned, output, &options.timestamp_column)?;
        info!(component = %Component::Remediation, path = %output.display(), "cleaned copy written");
    }
    Ok(())
}

/// Clip to configured ranges, zero remaining negatives, then replace outliers.
fn clean(table: &DatasetTable, config: &AnalysisConfig) -> Result<DatasetTable> {
    let clipped = clip(table, &config.range_spec()?);
    let non_negative = zero_negatives(&clipped);
    replace_outliers(&non_negative, config.outliers.replacement, config.outliers.threshold)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|f| dataset_display_name(&f.to_string_lossy()))
        .unwrap_or_else(|| path.display().to_string())
}
