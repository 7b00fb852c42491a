use std::fs::File;
use std::path::{Path, PathBuf};

use tickchan_record::{decode_record, Record};
use tracing::{debug, info, trace, warn};

use crate::config::ChannelConfig;
use crate::error::{ChannelError, Result};
use crate::file::{file_len, last_record_offset, open_read, read_exact_at};

/// Tails a channel file, yielding only the newest record on each poll.
///
/// The cursor starts at the file length seen at open, so data already in the
/// file is never replayed. Records appended between two polls are dropped in
/// favour of the last one.
#[derive(Debug)]
pub struct ChannelReader {
    file: File,
    path: PathBuf,
    config: ChannelConfig,
    cursor: u64,
    skipped_records: u64,
}

impl ChannelReader {
    /// Open an existing channel of `channel_count` samples per record.
    ///
    /// Fails with [`ChannelError::NotFound`] when the file is absent; the
    /// reader never creates a channel.
    pub fn open(path: impl AsRef<Path>, channel_count: usize) -> Result<Self> {
        Self::open_with_config(path, ChannelConfig::new(channel_count))
    }

    /// Open with explicit configuration.
    pub fn open_with_config(path: impl AsRef<Path>, config: ChannelConfig) -> Result<Self> {
        config.validate()?;
        let path = path.as_ref().to_path_buf();
        let file = open_read(&path)?;
        let cursor = file_len(&file)?;

        info!(
            ?path,
            channel_count = config.channel_count,
            cursor,
            "channel reader open"
        );

        Ok(Self {
            file,
            path,
            config,
            cursor,
            skipped_records: 0,
        })
    }

    /// Check for growth and decode the most recent record if there is any.
    ///
    /// Returns `Ok(None)` when nothing was appended since the last successful
    /// poll. On error the cursor is left untouched, so the same growth is
    /// examined again on the next call.
    pub fn poll(&mut self) -> Result<Option<Record>> {
        let length = file_len(&self.file)?;

        if length < self.cursor {
            warn!(
                path = ?self.path,
                cursor = self.cursor,
                length,
                "channel shrank; resynchronizing cursor"
            );
            self.cursor = length;
            return Ok(None);
        }

        let growth = length - self.cursor;
        if growth == 0 {
            return Ok(None);
        }

        let record_size = self.config.record_size();
        let offset = last_record_offset(length, record_size)?;

        let mut buf = vec![0u8; record_size];
        read_exact_at(&self.file, &mut buf, offset).map_err(ChannelError::Read)?;
        let record = decode_record(&buf, self.config.channel_count)?;

        let skipped = (growth / record_size as u64).saturating_sub(1);
        if skipped > 0 {
            debug!(skipped, "skipping intermediate records");
            self.skipped_records += skipped;
        }
        self.cursor = length;
        trace!(offset, cursor = self.cursor, "record read");

        Ok(Some(record))
    }

    /// Release the file. Consuming the reader makes a second close impossible.
    pub fn close(self) {
        debug!(
            path = ?self.path,
            cursor = self.cursor,
            "closing channel reader"
        );
    }

    /// Channel length consumed so far.
    pub fn cursor(&self) -> u64 {
        self.cursor
    }

    /// Whole records dropped because a newer one arrived before the poll.
    pub fn skipped_records(&self) -> u64 {
        self.skipped_records
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Channel configuration.
    pub fn config(&self) -> &ChannelConfig {
        &self.config
    }
}
