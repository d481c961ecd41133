//! Glacier albedo extractor.
//!
//! Loads a run configuration, validates it, processes every date in the range
//! and writes the report as JSON:
//! - observations in date order
//! - a status for every requested date
//! - summary counts of ok, no-data, degenerate and failed dates

use std::path::{Path, PathBuf};

use albedo_common::time::parse_date;
use anyhow::{Context, Result};
use clap::Parser;
use pipeline::{Pipeline, RunConfig, RunReport};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "extractor")]
#[command(about = "Extract a daily glacier albedo time series")]
struct Args {
    /// Run configuration (YAML)
    #[arg(short, long, env = "ALBEDO_CONFIG", default_value = "run.yaml")]
    config: PathBuf,

    /// Override the first date (YYYY-MM-DD)
    #[arg(long)]
    start: Option<String>,

    /// Override the last date (YYYY-MM-DD)
    #[arg(long)]
    end: Option<String>,

    /// Override the quality tier (strict, balanced, relaxed, custom)
    #[arg(long, env = "ALBEDO_TIER")]
    tier: Option<String>,

    /// Override the minimum accounted cell count
    #[arg(long)]
    min_count: Option<usize>,

    /// Override the number of dates processed at once
    #[arg(long, env = "ALBEDO_MAX_CONCURRENCY")]
    max_concurrency: Option<usize>,

    /// Write the report here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Log level
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,
}

impl Args {
    /// Apply command-line overrides on top of the file configuration.
    fn apply_overrides(&self, config: &mut RunConfig) -> Result<()> {
        if let Some(start) = &self.start {
            config.start_date = parse_date(start).context("Invalid --start")?;
        }
        if let Some(end) = &self.end {
            config.end_date = parse_date(end).context("Invalid --end")?;
        }
        if let Some(tier) = &self.tier {
            config.quality_tier = tier.clone();
        }
        if let Some(min_count) = self.min_count {
            config.min_count = min_count;
        }
        if let Some(max_concurrency) = self.max_concurrency {
            config.max_concurrency = max_concurrency;
        }
        Ok(())
    }
}

fn log_level(name: &str) -> Level {
    match name.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

async fn write_report(report: &RunReport, output: Option<&Path>) -> Result<()> {
    let json = report
        .to_json_pretty()
        .context("Failed to serialize report")?;

    match output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(path, json)
                .await
                .with_context(|| format!("Failed to write report: {}", path.display()))?;
            info!(path = %path.display(), "Report written");
        }
        None => println!("{}", json),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level(&args.log_level))
        .with_target(true)
        .with_thread_ids(true)
        .json()
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!(config = %args.config.display(), "Starting glacier albedo extractor");

    let mut config = RunConfig::load(&args.config)?;
    args.apply_overrides(&mut config)?;

    let pipeline = Pipeline::from_config(&config).context("Invalid run configuration")?;
    let dates = config.date_range()?;

    // Cancel outstanding dates on ctrl-c; finished dates are still reported
    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling remaining dates");
            on_signal.cancel();
        }
    });

    let report = pipeline.run(&dates, &cancel).await;

    if report.summary.failed > 0 {
        error!(
            failed = report.summary.failed,
            dates = ?report.failed_dates(),
            "Some dates failed"
        );
    }
    info!(
        ok = report.summary.ok,
        no_data = report.summary.no_data,
        degenerate = report.summary.degenerate,
        failed = report.summary.failed,
        "Run summary"
    );

    write_report(&report, args.output.as_deref()).await
}
