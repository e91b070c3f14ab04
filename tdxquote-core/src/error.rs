//! Decoder error types.
//!
//! Failures are never recovered inside the decoder. A caller that wants to
//! skip a file or a record does so explicitly at the call site.

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced while decoding a vendor quote file.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The file could not be read (missing, unreadable, permission denied).
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Total length is not a multiple of the record width. Raised before any
    /// record is produced.
    #[error("malformed file: {len} bytes is not a multiple of the {width}-byte record width")]
    MalformedFile { len: usize, width: usize },

    /// A single record decoded to an invalid date or time. Raised when the
    /// sequence reaches that record.
    #[error("malformed record #{index} at byte offset {offset}: {fault}")]
    MalformedRecord {
        index: usize,
        offset: usize,
        fault: RecordFault,
    },
}

impl DecodeError {
    /// True for errors that only affect one record; the rest of the sequence
    /// is still usable.
    pub fn is_record_level(&self) -> bool {
        matches!(self, DecodeError::MalformedRecord { .. })
    }
}

/// Why a single record was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordFault {
    #[error("date value {raw} is not a valid YYYYMMDD calendar date")]
    InvalidDate { raw: u32 },

    #[error("packed date {raw} decodes to {year:04}-{month:02}-{day:02}, which is not a calendar date")]
    InvalidPackedDate {
        raw: u16,
        year: i32,
        month: u32,
        day: u32,
    },

    #[error("minute-of-day {minutes} is outside 0..1440")]
    InvalidTime { minutes: u16 },
}
