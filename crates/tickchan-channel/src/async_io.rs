//! Tokio variants of the channel handles.
//!
//! Same contract as the blocking handles: one request in flight, awaited to
//! completion. Each request is bounded by [`ChannelConfig::io_timeout`]; on
//! expiry the call fails with [`ChannelError::Timeout`]. A timed-out append
//! may still land, and the next call on the handle waits for it first.

use std::future::Future;
use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use std::time::Duration;

use bytes::BytesMut;
use tickchan_record::{decode_record, encode_record, Record};
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tracing::{debug, info, warn};

use crate::config::ChannelConfig;
use crate::error::{ChannelError, Result};
use crate::file::{last_record_offset, open_append, open_read};

async fn bounded<T, F>(limit: Option<Duration>, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match limit {
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| ChannelError::Timeout(limit))?,
        None => fut.await,
    }
}

async fn current_len(file: &File) -> Result<u64> {
    file.metadata()
        .await
        .map(|meta| meta.len())
        .map_err(ChannelError::Stat)
}

/// Async counterpart of [`ChannelWriter`](crate::ChannelWriter).
#[derive(Debug)]
pub struct AsyncChannelWriter {
    file: File,
    path: PathBuf,
    config: ChannelConfig,
    len: u64,
    records_written: u64,
    /// Bytes handed to the file whose append has not been confirmed.
    in_flight: Option<u64>,
}

impl AsyncChannelWriter {
    pub async fn open(path: impl AsRef<Path>, channel_count: usize) -> Result<Self> {
        Self::open_with_config(path, ChannelConfig::new(channel_count)).await
    }

    pub async fn open_with_config(path: impl AsRef<Path>, config: ChannelConfig) -> Result<Self> {
        config.validate()?;
        let path = path.as_ref().to_path_buf();
        let file = File::from_std(open_append(&path)?);
        let len = current_len(&file).await?;

        if len % config.record_size() as u64 != 0 {
            warn!(?path, len, "channel length is not a whole number of records");
        }
        info!(
            ?path,
            channel_count = config.channel_count,
            len,
            "async channel writer open"
        );

        Ok(Self {
            file,
            path,
            config,
            len,
            records_written: 0,
            in_flight: None,
        })
    }

    /// Encode and append one record, resolving once the append completes.
    ///
    /// An append left in flight by an earlier timeout is settled first; if it
    /// still has not completed, this call fails with the timeout and appends
    /// nothing.
    pub async fn write(&mut self, samples: &[f32]) -> Result<()> {
        let mut buf = BytesMut::with_capacity(self.config.record_size());
        encode_record(samples, self.config.channel_count, &mut buf)?;

        self.settle().await?;

        // The file is idle after settling, so this only hands the buffer to
        // tokio's blocking worker.
        self.file
            .write_all(&buf)
            .await
            .map_err(ChannelError::Write)?;
        self.in_flight = Some(buf.len() as u64);

        self.settle().await
    }

    pub async fn write_record(&mut self, record: &Record) -> Result<()> {
        self.write(record.samples()).await
    }

    /// Wait, within `io_timeout`, for the pending append to complete and
    /// account for it.
    ///
    /// A no-op when nothing is in flight. On [`ChannelError::Timeout`] the
    /// append stays pending; on any other error it is dropped uncounted.
    pub async fn settle(&mut self) -> Result<()> {
        let Some(pending) = self.in_flight else {
            return Ok(());
        };

        let file = &mut self.file;
        let flushed = bounded(self.config.io_timeout, async {
            file.flush().await.map_err(ChannelError::Write)
        })
        .await;

        match flushed {
            Ok(()) => {
                self.in_flight = None;
                self.len += pending;
                self.records_written += 1;
                Ok(())
            }
            Err(err @ ChannelError::Timeout(_)) => {
                debug!(path = ?self.path, pending, "append still in flight");
                Err(err)
            }
            Err(err) => {
                self.in_flight = None;
                Err(err)
            }
        }
    }

    /// Settle any in-flight append without a deadline and release the file.
    pub async fn close(mut self) -> Result<()> {
        self.config.io_timeout = None;
        self.settle().await?;
        debug!(
            path = ?self.path,
            records_written = self.records_written,
            "closing async channel writer"
        );
        Ok(())
    }

    /// Whether an append is waiting on [`settle`](Self::settle).
    pub fn is_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Channel length as of the last confirmed append. An in-flight append
    /// is not counted until it settles.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Appends confirmed through this handle. Like [`len`](Self::len), an
    /// in-flight append is counted once it settles.
    pub fn records_written(&self) -> u64 {
        self.records_written
    }

    pub fn config(&self) -> &ChannelConfig {
        &self.config
    }
}

/// Async counterpart of [`ChannelReader`](crate::ChannelReader).
#[derive(Debug)]
pub struct AsyncChannelReader {
    file: File,
    path: PathBuf,
    config: ChannelConfig,
    cursor: u64,
}

impl AsyncChannelReader {
    pub async fn open(path: impl AsRef<Path>, channel_count: usize) -> Result<Self> {
        Self::open_with_config(path, ChannelConfig::new(channel_count)).await
    }

    pub async fn open_with_config(path: impl AsRef<Path>, config: ChannelConfig) -> Result<Self> {
        config.validate()?;
        let path = path.as_ref().to_path_buf();
        let file = File::from_std(open_read(&path)?);
        let cursor = current_len(&file).await?;

        info!(
            ?path,
            channel_count = config.channel_count,
            cursor,
            "async channel reader open"
        );

        Ok(Self {
            file,
            path,
            config,
            cursor,
        })
    }

    /// Same algorithm as [`ChannelReader::poll`](crate::ChannelReader::poll).
    pub async fn poll(&mut self) -> Result<Option<Record>> {
        let length = current_len(&self.file).await?;

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
        if length == self.cursor {
            return Ok(None);
        }

        let record_size = self.config.record_size();
        let offset = last_record_offset(length, record_size)?;

        let file = &mut self.file;
        let buf = bounded(self.config.io_timeout, async {
            let mut buf = vec![0u8; record_size];
            file.seek(SeekFrom::Start(offset))
                .await
                .map_err(ChannelError::Read)?;
            file.read_exact(&mut buf).await.map_err(ChannelError::Read)?;
            Ok(buf)
        })
        .await?;

        let record = decode_record(&buf, self.config.channel_count)?;
        self.cursor = length;
        Ok(Some(record))
    }

    pub fn close(self) {
        debug!(path = ?self.path, cursor = self.cursor, "closing async channel reader");
    }

    pub fn cursor(&self) -> u64 {
        self.cursor
    }

    pub fn config(&self) -> &ChannelConfig {
        &self.config
    }
}
