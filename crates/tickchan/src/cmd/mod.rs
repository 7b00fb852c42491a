use clap::{Args, Subcommand};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::exit::{CliError, CliResult, INTERNAL, USAGE};
use crate::output::OutputFormat;

pub mod info;
pub mod simulate;
pub mod tail;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Append simulated records at a fixed tick rate.
    Simulate(SimulateArgs),
    /// Poll a channel and print the newest record as it arrives.
    Tail(TailArgs),
    /// Show the shape of a channel file and its last record.
    Info(InfoArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Simulate(args) => simulate::run(args),
        Command::Tail(args) => tail::run(args, format),
        Command::Info(args) => info::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct SimulateArgs {
    /// Channel file to append to (created if missing).
    pub path: PathBuf,
    /// Samples per record.
    #[arg(long, short = 'n', default_value_t = 2, env = "TICKCHAN_CHANNELS")]
    pub channels: usize,
    /// Ticks per second.
    #[arg(long, default_value_t = 50.0)]
    pub frequency: f64,
    /// Stop after N ticks.
    #[arg(long)]
    pub count: Option<u64>,
}

#[derive(Args, Debug)]
pub struct TailArgs {
    /// Channel file to poll (must exist).
    pub path: PathBuf,
    /// Samples per record.
    #[arg(long, short = 'n', default_value_t = 2, env = "TICKCHAN_CHANNELS")]
    pub channels: usize,
    /// Poll interval (e.g. 5ms, 1s).
    #[arg(long, default_value = "5ms")]
    pub interval: String,
    /// Exit after printing N records.
    #[arg(long)]
    pub count: Option<u64>,
}

#[derive(Args, Debug)]
pub struct InfoArgs {
    /// Channel file to inspect.
    pub path: PathBuf,
    /// Samples per record.
    #[arg(long, short = 'n', default_value_t = 2, env = "TICKCHAN_CHANNELS")]
    pub channels: usize,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Parse `150ms`, `2s`, or a bare number of seconds.
pub(crate) fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        _ => Ok(Duration::from_secs(value)),
    }
}

/// Reject `--count 0`; the command loops act once before checking the count.
pub(crate) fn validate_count(count: Option<u64>) -> CliResult<()> {
    if count == Some(0) {
        return Err(CliError::new(USAGE, "--count must be greater than zero"));
    }
    Ok(())
}

/// Flip `running` to false on Ctrl-C.
pub(crate) fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}
