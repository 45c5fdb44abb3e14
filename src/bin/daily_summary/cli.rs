use clap::{Parser, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "daily_summary", version, about = "Per-weekday comparison of ad and psa conversion")]
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
        short = 'o',
        default_value = "daily_summary",
        value_name = "OUT",
        help = "Output path"
    )]
    pub out: String,

    #[arg(
        long,
        value_name = "CONFIG",
        help = "JSON file with engine settings"
    )]
    pub config: Option<String>,

    #[arg(
        value_enum,
        long,
        default_value = "normal",
        value_name = "VERBOSITY",
        help = "Verbosity level"
    )]
    pub verbosity: LogLevel,
}

#[allow(non_camel_case_types)]
#[derive(ValueEnum, Clone, Debug)]
pub enum LogLevel {
    verbose,
    normal,
    silent,
}
