use std::path::PathBuf;
use std::time::Duration;

use tickchan_record::RecordError;

/// Errors that can occur on a channel file.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    /// The channel file could not be created or opened.
    #[error("failed to open channel {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A reader was pointed at a channel that does not exist yet.
    #[error("channel not found: {path}")]
    NotFound { path: PathBuf },

    /// A channel must carry at least one sample per record.
    #[error("channel count must be at least 1")]
    InvalidChannelCount,

    /// Encoding or decoding a record failed.
    #[error("record error: {0}")]
    Record(#[from] RecordError),

    /// The OS reported a failed append.
    #[error("channel write failed: {0}")]
    Write(std::io::Error),

    /// The OS reported a failed read.
    #[error("channel read failed: {0}")]
    Read(std::io::Error),

    /// Querying the channel length failed.
    #[error("channel stat failed: {0}")]
    Stat(std::io::Error),

    /// The channel length does not hold a whole number of records.
    #[error("truncated channel ({length} bytes is not a whole number of {record_size}-byte records)")]
    TruncatedChannel { length: u64, record_size: usize },

    /// An async request did not complete within the configured bound.
    #[error("channel I/O timed out after {0:?}")]
    Timeout(Duration),
}

impl ChannelError {
    /// True for conditions that may clear up on the next poll.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ChannelError::TruncatedChannel { .. }
                | ChannelError::Record(RecordError::TruncatedRecord { .. })
        )
    }
}

pub type Result<T> = std::result::Result<T, ChannelError>;
