//! Fixed-size multi-channel sample records.
//!
//! A record is one simulation tick across every monitored channel. On disk it
//! is a bare run of 32-bit floats:
//! - `channel_count` samples, little-endian IEEE-754 binary32
//! - no header, no padding, no framing byte
//!
//! The channel count is agreed out-of-band; nothing in the bytes records it.

pub mod codec;
pub mod error;

pub use codec::{
    decode_record, encode_record, encode_to_vec, record_size, Record, RECORD_FIELD_SIZE,
};
pub use error::{RecordError, Result};
