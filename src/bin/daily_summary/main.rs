use abposterior_utils::config::EngineConfig;
use abposterior_utils::filter::TrialSet;
use abposterior_utils::record::load_trial_records;
use abposterior_utils::summary::WeeklySummary;
use anyhow::{anyhow, bail, Result};
use clap::Parser;
use env_logger::Env;
use log::{info, warn};
use std::path::Path;

mod cli;
mod io;

fn daily_summary(args: &cli::Cli, out_path: &Path) -> Result<()> {
    let config = match &args.config {
        Some(path) => EngineConfig::from_json_file(Path::new(path))?,
        None => EngineConfig::default(),
    };
    config.validate()?;

    let records = match load_trial_records(Path::new(&args.input)) {
        Ok(report) => report.records,
        Err(e) => {
            warn!("Trial records unavailable, continuing without data: {}", e);
            TrialSet::default()
        }
    };
    let summary = WeeklySummary::from_records(&records, &config);

    let mut writer = io::DailySummaryWriter::new(&out_path.join("daily_summary.tsv"))?;
    writer.write_header()?;
    writer.write_summary(&summary)?;

    match summary.best_performing_day() {
        Some(day) => info!("Best performing day: {}", day),
        None => warn!("No ad-arm data on any day"),
    }
    if let Some(day) = summary.highest_exposure_day() {
        info!("Highest exposure day: {}", day);
    }
    if let Some(rate) = summary.average_ad_rate() {
        info!("Average ad conversion rate: {:.2}%", rate * 100.0);
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = cli::Cli::parse();
    // Set up logging level
    match args.verbosity {
        cli::LogLevel::silent => {
            env_logger::Builder::from_env(Env::default().default_filter_or("off")).init();
        }
        cli::LogLevel::normal => {
            env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
        }
        cli::LogLevel::verbose => {
            env_logger::Builder::from_env(Env::default().default_filter_or("debug")).init();
        }
    }

    info!("Running daily summary");
    let out_path = Path::new(&args.out);
    if out_path.exists() {
        bail!("Output directory already exists: {}", out_path.display());
    }
    std::fs::create_dir(out_path)
        .map_err(|e| anyhow!("Could not create output directory: {}", e))?;
    info!("Created output directory");

    daily_summary(&args, out_path)?;
    info!("Finished daily summary");
    Ok(())
}
