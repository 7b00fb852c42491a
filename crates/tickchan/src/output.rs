use std::io::{IsTerminal, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use tickchan_channel::{ChannelStat, Record};
use tickchan_record::encode_to_vec;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Pretty
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct RecordOutput<'a> {
    seq: u64,
    cursor: u64,
    channel_count: usize,
    samples: &'a Record,
    timestamp: String,
}

/// Print one polled record. `seq` counts records printed so far.
pub fn print_record(record: &Record, seq: u64, cursor: u64, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = RecordOutput {
                seq,
                cursor,
                channel_count: record.len(),
                samples: record,
                timestamp: now_unix_millis(),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut header = vec!["SEQ".to_string(), "CURSOR".to_string()];
            header.extend((0..record.len()).map(|i| format!("CH{i}")));
            let mut row = vec![seq.to_string(), cursor.to_string()];
            row.extend(record.samples().iter().map(|v| format!("{v:.3}")));

            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(header)
                .add_row(row);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!("{seq}: cursor={cursor} [ {} ]", sample_list(record));
        }
        OutputFormat::Raw => {
            if let Ok(bytes) = encode_to_vec(record.samples(), record.len()) {
                print_raw(&bytes);
            }
        }
    }
}

#[derive(Serialize)]
struct InfoOutput<'a> {
    path: &'a str,
    length: u64,
    record_size: usize,
    complete_records: u64,
    trailing_bytes: u64,
    aligned: bool,
    last_record: Option<&'a Record>,
}

pub fn print_info(path: &str, stat: &ChannelStat, last: Option<&Record>, format: OutputFormat) {
    match format {
        OutputFormat::Json | OutputFormat::Raw => {
            let out = InfoOutput {
                path,
                length: stat.length,
                record_size: stat.record_size,
                complete_records: stat.complete_records,
                trailing_bytes: stat.trailing_bytes,
                aligned: stat.is_aligned(),
                last_record: last,
            };
            println!(
                "{}",
                serde_json::to_string_pretty(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["FIELD", "VALUE"]);
            table.add_row(vec!["path".to_string(), path.to_string()]);
            table.add_row(vec!["length".to_string(), stat.length.to_string()]);
            table.add_row(vec!["record_size".to_string(), stat.record_size.to_string()]);
            table.add_row(vec![
                "complete_records".to_string(),
                stat.complete_records.to_string(),
            ]);
            table.add_row(vec![
                "trailing_bytes".to_string(),
                stat.trailing_bytes.to_string(),
            ]);
            table.add_row(vec!["aligned".to_string(), stat.is_aligned().to_string()]);
            table.add_row(vec![
                "last_record".to_string(),
                last.map(sample_list).unwrap_or_else(|| "-".to_string()),
            ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!("path: {path}");
            println!("length: {} bytes", stat.length);
            println!("record_size: {} bytes", stat.record_size);
            println!("complete_records: {}", stat.complete_records);
            println!(
                "trailing_bytes: {}{}",
                stat.trailing_bytes,
                if stat.is_aligned() { "" } else { " (misaligned)" }
            );
            match last {
                Some(record) => println!("last_record: [ {} ]", sample_list(record)),
                None => println!("last_record: -"),
            }
        }
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

fn sample_list(record: &Record) -> String {
    record
        .samples()
        .iter()
        .map(|v| format!("{v:.1}"))
        .collect::<Vec<_>>()
        .join(" ")
}

fn now_unix_millis() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis().to_string())
        .unwrap_or_else(|_| "0".to_string())
}
