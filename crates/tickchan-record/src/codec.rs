use bytes::{Buf, BufMut, BytesMut};

use crate::error::{RecordError, Result};

/// Width of one sample on the wire: a little-endian binary32.
pub const RECORD_FIELD_SIZE: usize = 4;

/// One tick's worth of samples, one per channel.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize), serde(transparent))]
pub struct Record {
    samples: Vec<f32>,
}

impl Record {
    /// Create a record from owned samples.
    pub fn new(samples: Vec<f32>) -> Self {
        Self { samples }
    }

    /// The samples in channel order.
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Number of channels in this record.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// The encoded size of this record.
    pub fn wire_size(&self) -> usize {
        record_size(self.samples.len())
    }

    /// Consume the record and return its samples.
    pub fn into_samples(self) -> Vec<f32> {
        self.samples
    }
}

impl From<Vec<f32>> for Record {
    fn from(samples: Vec<f32>) -> Self {
        Self::new(samples)
    }
}

impl AsRef<[f32]> for Record {
    fn as_ref(&self) -> &[f32] {
        &self.samples
    }
}

/// Size in bytes of one record carrying `channel_count` samples.
pub fn record_size(channel_count: usize) -> usize {
    channel_count * RECORD_FIELD_SIZE
}

/// Encode one record into the wire format, appending to `dst`.
///
/// Wire format (`channel_count` = N):
/// ```text
/// ┌────────────┬────────────┬─────┬──────────────┐
/// │ sample 0   │ sample 1   │ ... │ sample N-1   │
/// │ (4B f32 LE)│ (4B f32 LE)│     │ (4B f32 LE)  │
/// └────────────┴────────────┴─────┴──────────────┘
/// ```
pub fn encode_record(samples: &[f32], expected_count: usize, dst: &mut BytesMut) -> Result<()> {
    if samples.len() != expected_count {
        return Err(RecordError::SizeMismatch {
            expected: expected_count,
            actual: samples.len(),
        });
    }
    dst.reserve(record_size(expected_count));
    for &sample in samples {
        dst.put_f32_le(sample);
    }
    Ok(())
}

/// Encode one record into a freshly allocated buffer.
pub fn encode_to_vec(samples: &[f32], expected_count: usize) -> Result<Vec<u8>> {
    let mut buf = BytesMut::with_capacity(record_size(expected_count));
    encode_record(samples, expected_count, &mut buf)?;
    Ok(buf.to_vec())
}

/// Decode one record from the front of `src`.
///
/// Bytes past the first record are ignored.
pub fn decode_record(src: &[u8], expected_count: usize) -> Result<Record> {
    let expected = record_size(expected_count);
    if src.len() < expected {
        return Err(RecordError::TruncatedRecord {
            len: src.len(),
            expected,
        });
    }

    let mut cursor = &src[..expected];
    let mut samples = Vec::with_capacity(expected_count);
    while cursor.has_remaining() {
        samples.push(cursor.get_f32_le());
    }
    Ok(Record { samples })
}
