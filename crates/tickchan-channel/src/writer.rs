use std::fs::File;
use std::path::{Path, PathBuf};

use bytes::BytesMut;
use tickchan_record::{encode_record, Record};
use tracing::{debug, info, trace, warn};

use crate::config::ChannelConfig;
use crate::error::{ChannelError, Result};
use crate::file::{append_all, file_len, open_append};

/// Appends fixed-size records to a channel file.
///
/// Each [`write`](Self::write) returns only after the OS has accepted the
/// whole record, so at most one append is ever in flight. Readers taking a
/// length snapshot therefore never see two records interleaved.
///
/// The file is released when the writer is closed or dropped.
#[derive(Debug)]
pub struct ChannelWriter {
    file: File,
    path: PathBuf,
    config: ChannelConfig,
    len: u64,
    records_written: u64,
}

impl ChannelWriter {
    /// Open `path` for appending records of `channel_count` samples.
    ///
    /// Creates the file if it is missing; never truncates existing content.
    pub fn open(path: impl AsRef<Path>, channel_count: usize) -> Result<Self> {
        Self::open_with_config(path, ChannelConfig::new(channel_count))
    }

    /// Open with explicit configuration.
    pub fn open_with_config(path: impl AsRef<Path>, config: ChannelConfig) -> Result<Self> {
        config.validate()?;
        let path = path.as_ref().to_path_buf();
        let file = open_append(&path)?;
        let len = file_len(&file)?;

        let record_size = config.record_size() as u64;
        if len % record_size != 0 {
            warn!(
                ?path,
                len,
                record_size,
                "channel length is not a whole number of records; readers will report truncation"
            );
        }

        info!(
            ?path,
            channel_count = config.channel_count,
            len,
            "channel writer open"
        );

        Ok(Self {
            file,
            path,
            config,
            len,
            records_written: 0,
        })
    }

    /// Encode and append one record, blocking until the append completes.
    pub fn write(&mut self, samples: &[f32]) -> Result<()> {
        let mut buf = BytesMut::with_capacity(self.config.record_size());
        encode_record(samples, self.config.channel_count, &mut buf)?;

        append_all(&mut self.file, &buf).map_err(ChannelError::Write)?;

        self.len += buf.len() as u64;
        self.records_written += 1;
        trace!(len = self.len, "record appended");
        Ok(())
    }

    /// Append an already-built record.
    pub fn write_record(&mut self, record: &Record) -> Result<()> {
        self.write(record.samples())
    }

    /// Push appended data through to the storage device.
    pub fn sync(&mut self) -> Result<()> {
        self.file.sync_data().map_err(ChannelError::Write)
    }

    /// Release the file. Consuming the writer makes a second close impossible.
    pub fn close(self) {
        debug!(
            path = ?self.path,
            records_written = self.records_written,
            "closing channel writer"
        );
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Channel configuration.
    pub fn config(&self) -> &ChannelConfig {
        &self.config
    }

    /// File length as of the last completed append.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Records appended through this handle.
    pub fn records_written(&self) -> u64 {
        self.records_written
    }
}
