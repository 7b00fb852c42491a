/// Errors that can occur during record encoding/decoding.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordError {
    /// The caller supplied the wrong number of samples for the channel.
    #[error("sample count mismatch (expected {expected}, got {actual})")]
    SizeMismatch { expected: usize, actual: usize },

    /// The buffer is shorter than one full record.
    #[error("truncated record ({len} bytes, need {expected})")]
    TruncatedRecord { len: usize, expected: usize },
}

pub type Result<T> = std::result::Result<T, RecordError>;
