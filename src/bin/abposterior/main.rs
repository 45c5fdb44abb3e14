use abposterior_utils::analysis::{AnalysisOutcome, AnalysisSession};
use abposterior_utils::arm::Arm;
use abposterior_utils::config::EngineConfig;
use abposterior_utils::estimator::EstimationMode;
use abposterior_utils::filter::Selector;
use abposterior_utils::record::load_trial_records;
use anyhow::{anyhow, bail, Result};
use clap::Parser;
use env_logger::Env;
use log::{info, warn};
use std::path::Path;
use std::time::Instant;
use strum::IntoEnumIterator;

mod cli;
mod io;

fn engine_config(args: &cli::Cli) -> Result<EngineConfig> {
    let mut config = match &args.config {
        Some(path) => EngineConfig::from_json_file(Path::new(path))?,
        None => EngineConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = Some(seed);
    }
    if let Some(samples) = args.samples {
        config.sample_size = samples;
    }
    if let Some(bins) = args.bins {
        config.histogram_bins = bins;
    }
    config.validate()?;
    Ok(config)
}

fn abposterior(args: &cli::Cli, out_path: &Path) -> Result<()> {
    let config = engine_config(args)?;
    let rng = config.rng();
    let load = load_trial_records(Path::new(&args.input)).map(|report| report.records);
    let mut session = AnalysisSession::from_load(load, config, rng);

    let selector = match args.hour {
        Some(hour) => Selector::day_hour(args.day, hour),
        None => Selector::day(args.day),
    };
    let mode = EstimationMode::from(args.mode);
    info!("Analysing {} with {} posterior", selector, mode);
    let start = Instant::now();
    let outcome = session.analyze(selector, mode)?;
    info!("Analysis finished in {:.2?}", start.elapsed());

    let mut summary_writer = io::ArmSummaryWriter::new(&out_path.join("summary.tsv"))?;
    summary_writer.write_header()?;
    summary_writer.write_outcome(outcome)?;
    io::write_analysis_json(outcome, &out_path.join("analysis.json"))?;

    match outcome {
        AnalysisOutcome::Complete(result) => {
            io::write_density_curve(result, &out_path.join("density_curve.tsv"))?;
            for arm in Arm::iter() {
                let analysis = result.arm(arm);
                info!(
                    "{}: {:.2}% [{:.2}%, {:.2}%] from {}/{}",
                    arm.label(),
                    analysis.mean * 100.0,
                    analysis.interval.lower * 100.0,
                    analysis.interval.upper * 100.0,
                    analysis.summary.statistics.successes,
                    analysis.summary.statistics.trials
                );
            }
            info!(
                "P(ad > psa) = {:.3} ({:?})",
                result.superiority.probability, result.superiority.method
            );
        }
        AnalysisOutcome::NoData { .. } => {
            let missing: Vec<&str> = outcome.missing_arms().iter().map(|a| a.to_code()).collect();
            warn!("No data for {} in arm(s): {}", selector, missing.join(", "));
        }
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

    // Create output directory
    info!("Running posterior analysis");
    let out_path = Path::new(&args.out);
    if out_path.exists() {
        bail!("Output directory already exists: {}", out_path.display());
    }
    std::fs::create_dir(out_path)
        .map_err(|e| anyhow!("Could not create output directory: {}", e))?;
    info!("Created output directory");

    abposterior(&args, out_path)?;
    info!("Finished posterior analysis");
    Ok(())
}
