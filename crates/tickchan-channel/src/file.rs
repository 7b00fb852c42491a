//! File-state helpers shared by the writer and reader roles.

use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::Path;

use tickchan_record::{decode_record, Record};

use crate::config::ChannelConfig;
use crate::error::{ChannelError, Result};

/// Open (or create) a channel for appending. Existing content is preserved.
pub(crate) fn open_append(path: &Path) -> Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| ChannelError::Open {
            path: path.to_path_buf(),
            source,
        })
}

/// Open an existing channel read-only. Never creates the file.
pub(crate) fn open_read(path: &Path) -> Result<File> {
    File::open(path).map_err(|source| match source.kind() {
        ErrorKind::NotFound => ChannelError::NotFound {
            path: path.to_path_buf(),
        },
        _ => ChannelError::Open {
            path: path.to_path_buf(),
            source,
        },
    })
}

/// Current length of an open channel, taken from the descriptor.
pub(crate) fn file_len(file: &File) -> Result<u64> {
    file.metadata()
        .map(|meta| meta.len())
        .map_err(ChannelError::Stat)
}

/// Write all of `buf` at the end of an append-mode file.
pub(crate) fn append_all(file: &mut File, buf: &[u8]) -> std::io::Result<()> {
    let mut offset = 0usize;
    while offset < buf.len() {
        match file.write(&buf[offset..]) {
            Ok(0) => return Err(std::io::Error::from(ErrorKind::WriteZero)),
            Ok(n) => offset += n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        }
    }
    Ok(())
}

/// Fill `buf` from `offset` without touching the descriptor's file position.
#[cfg(unix)]
pub(crate) fn read_exact_at(file: &File, buf: &mut [u8], offset: u64) -> std::io::Result<()> {
    use std::os::unix::fs::FileExt;

    file.read_exact_at(buf, offset)
}

#[cfg(windows)]
pub(crate) fn read_exact_at(file: &File, mut buf: &mut [u8], mut offset: u64) -> std::io::Result<()> {
    use std::os::windows::fs::FileExt;

    while !buf.is_empty() {
        match file.seek_read(buf, offset) {
            Ok(0) => return Err(std::io::Error::from(ErrorKind::UnexpectedEof)),
            Ok(n) => {
                buf = &mut buf[n..];
                offset += n as u64;
            }
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        }
    }
    Ok(())
}

/// Offset of the last whole record in a channel of `length` bytes.
///
/// Fails when the length cannot hold a whole number of records: either no
/// record has landed yet, or a writer stopped mid-append.
pub(crate) fn last_record_offset(length: u64, record_size: usize) -> Result<u64> {
    let size = record_size as u64;
    if length < size || length % size != 0 {
        return Err(ChannelError::TruncatedChannel {
            length,
            record_size,
        });
    }
    Ok(length - size)
}

/// Snapshot of a channel file's shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelStat {
    /// Total bytes in the file.
    pub length: u64,
    /// Bytes per record for the supplied channel count.
    pub record_size: usize,
    /// Whole records in the file.
    pub complete_records: u64,
    /// Bytes past the last whole record.
    pub trailing_bytes: u64,
}

impl ChannelStat {
    pub fn from_length(length: u64, record_size: usize) -> Self {
        let size = record_size.max(1) as u64;
        Self {
            length,
            record_size,
            complete_records: length / size,
            trailing_bytes: length % size,
        }
    }

    /// True when the file holds only whole records.
    pub fn is_aligned(&self) -> bool {
        self.trailing_bytes == 0
    }
}

/// Inspect a channel file without registering a reader cursor.
///
/// Returns the shape of the file and its last whole record, if any.
pub fn stat_channel(
    path: impl AsRef<Path>,
    channel_count: usize,
) -> Result<(ChannelStat, Option<Record>)> {
    let config = ChannelConfig::new(channel_count);
    config.validate()?;

    let file = open_read(path.as_ref())?;
    let length = file_len(&file)?;
    let stat = ChannelStat::from_length(length, config.record_size());

    if stat.complete_records == 0 {
        return Ok((stat, None));
    }

    // Last whole record, even when trailing garbage follows it.
    let offset = (stat.complete_records - 1) * stat.record_size as u64;
    let mut buf = vec![0u8; stat.record_size];
    read_exact_at(&file, &mut buf, offset).map_err(ChannelError::Read)?;
    let record = decode_record(&buf, channel_count)?;

    Ok((stat, Some(record)))
}

#[cfg(test)]
mod tests {
    use tickchan_record::encode_to_vec;

    use super::*;

    #[test]
    fn open_read_missing_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.bin");

        let err = open_read(&path).unwrap_err();
        assert!(matches!(err, ChannelError::NotFound { .. }));
        assert!(!path.exists());
    }

    #[test]
    fn open_append_creates_and_preserves() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chan.bin");

        let mut file = open_append(&path).unwrap();
        append_all(&mut file, b"abcd").unwrap();
        drop(file);

        let mut file = open_append(&path).unwrap();
        append_all(&mut file, b"ef").unwrap();
        assert_eq!(file_len(&file).unwrap(), 6);
        assert_eq!(std::fs::read(&path).unwrap(), b"abcdef");
    }

    #[test]
    fn open_append_fails_for_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no-such-dir").join("chan.bin");

        let err = open_append(&path).unwrap_err();
        assert!(matches!(err, ChannelError::Open { .. }));
    }

    #[test]
    fn positional_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chan.bin");
        std::fs::write(&path, b"0123456789").unwrap();

        let file = open_read(&path).unwrap();
        let mut buf = [0u8; 3];
        read_exact_at(&file, &mut buf, 4).unwrap();
        assert_eq!(&buf, b"456");

        let err = read_exact_at(&file, &mut buf, 9).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnexpectedEof);
    }

    #[test]
    fn last_record_offset_rules() {
        assert_eq!(last_record_offset(8, 8).unwrap(), 0);
        assert_eq!(last_record_offset(24, 8).unwrap(), 16);
        assert!(matches!(
            last_record_offset(4, 8),
            Err(ChannelError::TruncatedChannel { length: 4, .. })
        ));
        assert!(matches!(
            last_record_offset(20, 8),
            Err(ChannelError::TruncatedChannel { length: 20, .. })
        ));
    }

    #[test]
    fn stat_reports_shape_and_last_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chan.bin");
        let mut bytes = encode_to_vec(&[1.0, 0.5], 2).unwrap();
        bytes.extend(encode_to_vec(&[2.0, 1.0], 2).unwrap());
        bytes.extend_from_slice(&[0xAA; 3]);
        std::fs::write(&path, &bytes).unwrap();

        let (stat, last) = stat_channel(&path, 2).unwrap();
        assert_eq!(stat.length, 19);
        assert_eq!(stat.record_size, 8);
        assert_eq!(stat.complete_records, 2);
        assert_eq!(stat.trailing_bytes, 3);
        assert!(!stat.is_aligned());
        assert_eq!(last.unwrap().samples(), &[2.0, 1.0]);
    }

    #[test]
    fn stat_empty_channel() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chan.bin");
        std::fs::write(&path, b"").unwrap();

        let (stat, last) = stat_channel(&path, 4).unwrap();
        assert_eq!(stat.complete_records, 0);
        assert!(stat.is_aligned());
        assert!(last.is_none());
    }

    #[test]
    fn stat_rejects_zero_channels() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chan.bin");
        std::fs::write(&path, b"").unwrap();

        assert!(matches!(
            stat_channel(&path, 0),
            Err(ChannelError::InvalidChannelCount)
        ));
    }
}
