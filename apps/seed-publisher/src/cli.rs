use std::path::PathBuf;

use clap::Parser;

use crate::telemetry::logging::LogLevel;

#[derive(Debug, Parser)]
#[command(
    name = "seed-publisher",
    about = "Mines for world seeds and banks them for later use.",
    author,
    version
)]
pub struct Cli {
    /// Location of the configuration file.
    #[arg(short, long, default_value = "SeedPublisher.toml")]
    pub config: PathBuf,

    /// Number of worker threads. Zero or negative means all available cores.
    #[arg(short, long, default_value_t = 0, allow_negative_numbers = true)]
    pub threads: i32,

    /// Submit this many seeds, then exit. Zero runs until the queue is drained.
    #[arg(short, long, default_value_t = 0)]
    pub seeds: usize,

    #[arg(long, value_enum, default_value_t = LogLevel::Info, env = "SEEDBANK_LOG_LEVEL")]
    pub log_level: LogLevel,

    /// Append logs to this file instead of stderr.
    #[arg(long, env = "SEEDBANK_LOG_FILE")]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    pub fn seed_limit(&self) -> Option<usize> {
        (self.seeds > 0).then_some(self.seeds)
    }
}
