use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tickchan_channel::ChannelWriter;
use tracing::{info, warn};

use crate::cmd::{install_ctrlc_handler, validate_count, SimulateArgs};
use crate::exit::{channel_error, CliError, CliResult, SUCCESS, USAGE};
use crate::pacing::Ticker;

/// Steps in one ramp period.
const RAMP_STEPS: u64 = 60;

/// Ticks between effective-rate log lines.
const RATE_LOG_INTERVAL: u64 = 100;

/// Deterministic ramp source: channel `c` at tick `t` is `(t mod 60) / (c + 1)`.
#[derive(Debug, Clone, Copy)]
pub struct Ramp {
    channels: usize,
}

impl Ramp {
    pub fn new(channels: usize) -> Self {
        Self { channels }
    }

    pub fn sample(&self, tick: u64) -> Vec<f32> {
        let step = (tick % RAMP_STEPS) as f32;
        (0..self.channels)
            .map(|channel| step / (channel + 1) as f32)
            .collect()
    }
}

pub fn run(args: SimulateArgs) -> CliResult<i32> {
    validate_count(args.count)?;
    if !args.frequency.is_finite() || args.frequency <= 0.0 {
        return Err(CliError::new(
            USAGE,
            format!("frequency must be a positive number of Hz: {}", args.frequency),
        ));
    }
    let period = Duration::from_secs_f64(1.0 / args.frequency);

    let mut writer = ChannelWriter::open(&args.path, args.channels)
        .map_err(|err| channel_error("open failed", err))?;

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let ramp = Ramp::new(args.channels);
    let mut ticker = Ticker::new(period);
    let mut tick = 0u64;
    let mut skipped = 0u64;
    let mut window = Instant::now();

    info!(
        path = ?args.path,
        frequency_hz = args.frequency,
        "simulating"
    );

    while running.load(Ordering::SeqCst) {
        if let Err(err) = writer.write(&ramp.sample(tick)) {
            warn!(tick, %err, "write failed; skipping tick");
            skipped += 1;
        }
        tick += 1;

        if tick % RATE_LOG_INTERVAL == 0 {
            let elapsed = window.elapsed().as_secs_f64();
            if elapsed > 0.0 {
                info!(
                    tick,
                    frequency_hz = RATE_LOG_INTERVAL as f64 / elapsed,
                    "simulation rate"
                );
            }
            window = Instant::now();
        }

        if args.count.is_some_and(|count| tick >= count) {
            break;
        }
        ticker.wait();
    }

    info!(
        ticks = tick,
        written = writer.records_written(),
        skipped,
        len = writer.len(),
        "simulation stopped"
    );
    writer.close();

    Ok(SUCCESS)
}
