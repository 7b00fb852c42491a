use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tickchan_channel::{ChannelError, ChannelReader};
use tracing::{debug, info, warn};

use crate::cmd::{install_ctrlc_handler, parse_duration, validate_count, TailArgs};
use crate::exit::{channel_error, CliResult, SUCCESS};
use crate::output::{print_record, OutputFormat};
use crate::pacing::Ticker;

/// Misaligned polls between repeated warnings.
const MISALIGNED_WARN_INTERVAL: u64 = 1000;

/// Trailing bytes past the last whole record, when the channel holds at
/// least one record but its length is off the record grid.
///
/// That state does not clear with more appends. A channel shorter than one
/// record is only a writer that has not finished its first append.
fn misaligned_tail(err: &ChannelError) -> Option<(u64, usize)> {
    match *err {
        ChannelError::TruncatedChannel {
            length,
            record_size,
        } if length >= record_size as u64 => Some((length % record_size as u64, record_size)),
        _ => None,
    }
}

pub fn run(args: TailArgs, format: OutputFormat) -> CliResult<i32> {
    validate_count(args.count)?;
    let interval = parse_duration(&args.interval)?;
    let mut reader = ChannelReader::open(&args.path, args.channels)
        .map_err(|err| channel_error("open failed", err))?;

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let mut ticker = Ticker::new(interval);
    let mut printed = 0u64;
    let mut misaligned_polls = 0u64;

    while running.load(Ordering::SeqCst) {
        match reader.poll() {
            Ok(Some(record)) => {
                misaligned_polls = 0;
                print_record(&record, printed, reader.cursor(), format);
                printed += 1;
                if args.count.is_some_and(|count| printed >= count) {
                    break;
                }
            }
            Ok(None) => {}
            Err(err) if err.is_transient() => match misaligned_tail(&err) {
                Some((trailing_bytes, record_size)) => {
                    if misaligned_polls % MISALIGNED_WARN_INTERVAL == 0 {
                        warn!(
                            path = ?args.path,
                            record_size,
                            trailing_bytes,
                            "channel length is not a whole number of records; check --channels or a crashed writer"
                        );
                    }
                    misaligned_polls += 1;
                }
                None => debug!(%err, "channel not ready; retrying on next poll"),
            },
            Err(err) => {
                reader.close();
                return Err(channel_error("poll failed", err));
            }
        }
        ticker.wait();
    }

    info!(
        printed,
        skipped = reader.skipped_records(),
        "tail stopped"
    );
    reader.close();

    Ok(SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_record_race_is_not_misaligned() {
        let err = ChannelError::TruncatedChannel {
            length: 5,
            record_size: 8,
        };
        assert_eq!(misaligned_tail(&err), None);
    }

    #[test]
    fn off_grid_length_is_misaligned() {
        let err = ChannelError::TruncatedChannel {
            length: 20,
            record_size: 8,
        };
        assert_eq!(misaligned_tail(&err), Some((4, 8)));
    }

    #[test]
    fn other_errors_are_not_misaligned() {
        assert_eq!(misaligned_tail(&ChannelError::InvalidChannelCount), None);
    }
}
