//! Monitor example: a 50 Hz writer thread and a 10 Hz reader on one channel.
//!
//! The reader polls five times slower than the writer ticks, so each poll
//! shows the newest record and skips the rest.
//!
//! Run with:
//!   cargo run --example monitor

use std::fs;
use std::thread;
use std::time::Duration;

use tickchan::channel::{ChannelReader, ChannelWriter};

const CHANNELS: usize = 2;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let dir = std::env::temp_dir().join(format!("tickchan-monitor-{}", std::process::id()));
    fs::create_dir_all(&dir)?;
    let path = dir.join("data.bin");
    let _ = fs::remove_file(&path);

    let mut writer = ChannelWriter::open(&path, CHANNELS)?;
    let mut reader = ChannelReader::open(&path, CHANNELS)?;

    let producer = thread::spawn(
        move || -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
            for tick in 0..100u32 {
                let step = (tick % 60) as f32;
                writer.write(&[step, step * 0.5])?;
                thread::sleep(Duration::from_millis(20));
            }
            eprintln!("[writer] {} records, {} bytes", writer.records_written(), writer.len());
            writer.close();
            Ok(())
        },
    );

    for poll in 0..22 {
        match reader.poll() {
            Ok(Some(record)) => eprintln!("[reader] poll {poll}: {:?}", record.samples()),
            Ok(None) => eprintln!("[reader] poll {poll}: no new data"),
            Err(err) if err.is_transient() => eprintln!("[reader] poll {poll}: {err}"),
            Err(err) => return Err(err.into()),
        }
        thread::sleep(Duration::from_millis(100));
    }

    producer
        .join()
        .map_err(|_| "writer thread panicked")?
        .map_err(|err| err.to_string())?;
    eprintln!("[reader] skipped {} records", reader.skipped_records());
    reader.close();

    let _ = fs::remove_dir_all(&dir);
    Ok(())
}
