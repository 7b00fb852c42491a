//! Append/tail channel over a shared binary file.
//!
//! One writer appends fixed-size records; any number of readers poll the file
//! length and decode only the newest complete record. The filesystem is the
//! only thing the two sides share:
//! - the writer never has more than one append in flight
//! - a reader infers new data purely from length growth
//! - intermediate records between two polls are skipped, never queued

pub mod config;
pub mod error;
pub mod file;
pub mod reader;
pub mod writer;

#[cfg(feature = "async")]
pub mod async_io;

pub use config::ChannelConfig;
pub use error::{ChannelError, Result};
pub use file::{stat_channel, ChannelStat};
pub use reader::ChannelReader;
pub use writer::ChannelWriter;

#[cfg(feature = "async")]
pub use async_io::{AsyncChannelReader, AsyncChannelWriter};

pub use tickchan_record::{Record, RecordError};
