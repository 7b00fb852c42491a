//! Stream periodic multi-channel samples between processes through an
//! append-only file.
//!
//! # Crate Structure
//!
//! - [`record`]: Fixed-size little-endian `f32` records
//! - [`channel`]: Append writer and newest-record tail reader over a file
//!   (async variants behind the `async` feature)

/// Re-export record types.
pub mod record {
    pub use tickchan_record::*;
}

/// Re-export channel types.
pub mod channel {
    pub use tickchan_channel::*;
}
