use std::time::Duration;

use tickchan_record::record_size;

use crate::error::{ChannelError, Result};

/// Default number of channels per record.
pub const DEFAULT_CHANNEL_COUNT: usize = 2;

/// Shape and timing of a channel, agreed out-of-band by writer and readers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelConfig {
    /// Samples per record. Every writer and reader of a file must agree.
    pub channel_count: usize,
    /// Upper bound on a single async write or read. `None` waits forever.
    /// Blocking handles ignore it.
    pub io_timeout: Option<Duration>,
}

impl ChannelConfig {
    pub fn new(channel_count: usize) -> Self {
        Self {
            channel_count,
            io_timeout: None,
        }
    }

    pub fn with_io_timeout(mut self, timeout: Duration) -> Self {
        self.io_timeout = Some(timeout);
        self
    }

    /// Bytes per record for this channel count.
    pub fn record_size(&self) -> usize {
        record_size(self.channel_count)
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.channel_count == 0 {
            return Err(ChannelError::InvalidChannelCount);
        }
        Ok(())
    }
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self::new(DEFAULT_CHANNEL_COUNT)
    }
}
