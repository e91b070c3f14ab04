//! Fixed-width record decoding.
//!
//! One generic routine walks a whole-file buffer in layout-sized strides and
//! applies a per-kind transform to each stride. The daily and minute decoders
//! are just a layout plus a transform function:
//!
//! ```text
//! path ──read──▶ Vec<u8> ──length check──▶ Records<T> ──next()──▶ Result<T, DecodeError>
//! ```
//!
//! Every call to `read_*` reads the file again and returns a fresh sequence
//! starting at offset 0. Sequences own their buffer, so independent consumers
//! never share cursor state.

pub mod daily;
pub mod minute;

use std::iter::FusedIterator;
use std::path::Path;
use tracing::debug;

use crate::domain::{FileKind, QuoteSeries};
use crate::error::{DecodeError, RecordFault};
use crate::layout::RecordLayout;
use crate::record::RawRecord;

pub use daily::{read_daily, DailyReader, RawDailyRecord};
pub use minute::{read_minute, MinuteReader, RawMinuteRecord};

/// Per-kind conversion from one raw stride to a decoded value.
pub type Transform<T> = fn(&RawRecord<'_>) -> Result<T, RecordFault>;

/// Lazy, finite sequence of decoded records in file order.
///
/// Yields exactly `buffer length / record width` items. A record that fails
/// its transform yields `Err(MalformedRecord)` and the sequence moves on to the
/// next stride, so the caller decides whether to skip it or stop pulling.
pub struct Records<T> {
    buf: Vec<u8>,
    layout: &'static RecordLayout,
    transform: Transform<T>,
    index: usize,
    count: usize,
}

impl<T> Records<T> {
    /// Validate the buffer length against the layout and set up the sequence.
    ///
    /// Fails with `MalformedFile` before any record is produced.
    pub fn new(
        buf: Vec<u8>,
        layout: &'static RecordLayout,
        transform: Transform<T>,
    ) -> Result<Self, DecodeError> {
        let count = layout.record_count(buf.len())?;
        Ok(Self {
            buf,
            layout,
            transform,
            index: 0,
            count,
        })
    }

    pub fn layout(&self) -> &'static RecordLayout {
        self.layout
    }

    /// Total number of records in the buffer, consumed or not.
    pub fn record_count(&self) -> usize {
        self.count
    }
}

impl<T> std::fmt::Debug for Records<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Records")
            .field("layout", &self.layout.name)
            .field("bytes", &self.buf.len())
            .field("index", &self.index)
            .field("count", &self.count)
            .finish()
    }
}

impl<T> Iterator for Records<T> {
    type Item = Result<T, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.count {
            return None;
        }
        let width = self.layout.width();
        let index = self.index;
        let offset = index * width;
        self.index += 1;

        let record = RawRecord::new(self.layout, &self.buf[offset..offset + width]);
        Some((self.transform)(&record).map_err(|fault| {
            debug!(layout = self.layout.name, index, offset, fault = %fault, "record rejected");
            DecodeError::MalformedRecord { index, offset, fault }
        }))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.count - self.index;
        (remaining, Some(remaining))
    }
}

impl<T> ExactSizeIterator for Records<T> {}

impl<T> FusedIterator for Records<T> {}

/// Read a whole file into memory as one bounded operation.
pub fn read_file(path: &Path) -> Result<Vec<u8>, DecodeError> {
    let buf = std::fs::read(path).map_err(|source| DecodeError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), bytes = buf.len(), "read quote file");
    Ok(buf)
}

/// Read and validate `path`, then lazily decode it with `transform`.
pub fn decode_file<T>(
    path: &Path,
    layout: &'static RecordLayout,
    transform: Transform<T>,
) -> Result<Records<T>, DecodeError> {
    let records = Records::new(read_file(path)?, layout, transform)?;
    debug!(
        path = %path.display(),
        layout = layout.name,
        records = records.record_count(),
        "decoding quote file"
    );
    Ok(records)
}

/// Decode an entire file eagerly, failing on the first malformed record.
pub fn decode_series(path: &Path, kind: FileKind) -> Result<QuoteSeries, DecodeError> {
    match kind {
        FileKind::Daily => read_daily(path)?
            .collect::<Result<Vec<_>, _>>()
            .map(QuoteSeries::Daily),
        FileKind::Minute => read_minute(path)?
            .collect::<Result<Vec<_>, _>>()
            .map(QuoteSeries::Minute),
    }
}
