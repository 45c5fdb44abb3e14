use abposterior_utils::estimator::EstimationMode;
use abposterior_utils::weekday::Weekday;
use clap::{Parser, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "abposterior", version, about = "Posterior comparison of ad and psa conversion rates")]
pub struct Cli {
    #[arg(
        long,
        short = 'i',
        value_name = "TRIALS",
        help = "File path to the CSV file with one row per user"
    )]
    pub input: String,

    #[arg(
        long,
        short = 'd',
        value_name = "DAY",
        help = "Weekday to analyse (Monday..Sunday)"
    )]
    pub day: Weekday,

    #[arg(
        long,
        value_name = "HOUR",
        value_parser = clap::value_parser!(u8).range(0..24),
        help = "Restrict the analysis to one hour of the day (0-23)"
    )]
    pub hour: Option<u8>,

    #[arg(
        value_enum,
        long,
        short = 'm',
        default_value = "analytic",
        value_name = "MODE",
        help = "Estimation mode"
    )]
    pub mode: Mode,

    #[arg(
        long,
        short = 'o',
        default_value = "abposterior",
        value_name = "OUT",
        help = "Output path"
    )]
    pub out: String,

    #[arg(
        long,
        value_name = "CONFIG",
        help = "JSON file with engine settings; flags below override it"
    )]
    pub config: Option<String>,

    #[arg(long, value_name = "SEED", help = "Seed for Monte Carlo sampling")]
    pub seed: Option<u64>,

    #[arg(long, value_name = "SAMPLES", help = "Monte Carlo draws per arm")]
    pub samples: Option<usize>,

    #[arg(long, value_name = "BINS", help = "Histogram bins in Monte Carlo mode")]
    pub bins: Option<usize>,

    #[arg(
        value_enum,
        long,
        default_value = "normal",
        value_name = "VERBOSITY",
        help = "Verbosity level"
    )]
    pub verbosity: LogLevel,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum Mode {
    Analytic,
    MonteCarlo,
}

impl From<Mode> for EstimationMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Analytic => EstimationMode::Analytic,
            Mode::MonteCarlo => EstimationMode::MonteCarlo,
        }
    }
}

#[allow(non_camel_case_types)]
#[derive(ValueEnum, Clone, Debug)]
pub enum LogLevel {
    verbose,
    normal,
    silent,
}
