//! Batch decoding across many quote files.
//!
//! Each file is read into its own buffer and decoded independently, so the
//! batch parallelizes with rayon without any shared state. What happens when
//! a file or a single record is bad is an explicit [`ErrorPolicy`].

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use tdxquote_core::decode::daily::daily_records;
use tdxquote_core::decode::minute::minute_records;
use tdxquote_core::decode::read_file;
use tdxquote_core::{DecodeError, FileKind, QuoteSeries, Records};

/// What to do when a file or record fails to decode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPolicy {
    /// Stop at the first failing file (in input order) and return its error.
    #[default]
    Abort,
    /// Record failing files in the summary and keep going.
    SkipFile,
    /// Drop malformed records and count them. Unreadable or truncated files
    /// still fail, and are then handled as under `SkipFile`.
    SkipRecord,
}

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("batch aborted at {}: {source}", .path.display())]
    Aborted {
        path: PathBuf,
        #[source]
        source: DecodeError,
    },
}

/// One successfully decoded file.
#[derive(Debug, Clone, PartialEq)]
pub struct FileOutcome {
    pub path: PathBuf,
    pub series: QuoteSeries,
    pub skipped_records: usize,
    /// BLAKE3 hex digest of the exact bytes `series` was decoded from.
    pub source_hash: String,
}

/// Result of a batch run.
#[derive(Debug, Default)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped_records: usize,
    /// Decoded files in input order.
    pub outputs: Vec<FileOutcome>,
    pub errors: Vec<(PathBuf, DecodeError)>,
}

impl BatchSummary {
    /// True when every file decoded, even if some records were skipped.
    pub fn all_succeeded(&self) -> bool {
        self.failed == 0 && self.succeeded == self.total
    }

    fn absorb(&mut self, path: &Path, result: Result<FileOutcome, DecodeError>) {
        match result {
            Ok(outcome) => {
                self.succeeded += 1;
                self.skipped_records += outcome.skipped_records;
                self.outputs.push(outcome);
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "skipping file");
                self.failed += 1;
                self.errors.push((path.to_path_buf(), err));
            }
        }
    }
}

/// BLAKE3 hex digest of a source buffer.
pub fn source_digest(bytes: &[u8]) -> String {
    blake3::hash(bytes).to_hex().to_string()
}

/// Decode one file eagerly under `policy`.
///
/// The file is read once; the digest in the outcome is taken from that same
/// buffer.
pub fn decode_one(path: &Path, kind: FileKind, policy: ErrorPolicy) -> Result<FileOutcome, DecodeError> {
    let buf = read_file(path)?;
    let source_hash = source_digest(&buf);
    let (series, skipped_records) = match kind {
        FileKind::Daily => {
            let (quotes, skipped) = collect_records(path, daily_records(buf)?, policy)?;
            (QuoteSeries::Daily(quotes), skipped)
        }
        FileKind::Minute => {
            let (quotes, skipped) = collect_records(path, minute_records(buf)?, policy)?;
            (QuoteSeries::Minute(quotes), skipped)
        }
    };
    Ok(FileOutcome {
        path: path.to_path_buf(),
        series,
        skipped_records,
        source_hash,
    })
}

fn collect_records<T>(
    path: &Path,
    records: Records<T>,
    policy: ErrorPolicy,
) -> Result<(Vec<T>, usize), DecodeError> {
    let mut quotes = Vec::with_capacity(records.len());
    let mut skipped = 0;
    for item in records {
        match item {
            Ok(quote) => quotes.push(quote),
            Err(err) if policy == ErrorPolicy::SkipRecord && err.is_record_level() => {
                warn!(path = %path.display(), error = %err, "skipping record");
                skipped += 1;
            }
            Err(err) => return Err(err),
        }
    }
    Ok((quotes, skipped))
}

/// Decode every file in `files` as `kind`.
///
/// With `parallel` the files are decoded on the rayon pool; results are
/// still reported in input order. Under `Abort` the first failure in input
/// order is returned, and a sequential run stops reading further files.
pub fn decode_batch(
    files: &[PathBuf],
    kind: FileKind,
    policy: ErrorPolicy,
    parallel: bool,
) -> Result<BatchSummary, BatchError> {
    let summary = if parallel {
        let results: Vec<_> = files
            .par_iter()
            .map(|path| decode_one(path, kind, policy))
            .collect();
        summarize(files, results, policy)?
    } else {
        summarize(files, files.iter().map(|path| decode_one(path, kind, policy)), policy)?
    };

    info!(
        kind = %kind,
        files = summary.total,
        succeeded = summary.succeeded,
        failed = summary.failed,
        skipped_records = summary.skipped_records,
        "batch decode finished"
    );
    Ok(summary)
}

fn summarize(
    files: &[PathBuf],
    results: impl IntoIterator<Item = Result<FileOutcome, DecodeError>>,
    policy: ErrorPolicy,
) -> Result<BatchSummary, BatchError> {
    let mut summary = BatchSummary {
        total: files.len(),
        ..BatchSummary::default()
    };
    for (path, result) in files.iter().zip(results) {
        match result {
            Err(source) if policy == ErrorPolicy::Abort => {
                return Err(BatchError::Aborted {
                    path: path.clone(),
                    source,
                });
            }
            result => summary.absorb(path, result),
        }
    }
    Ok(summary)
}
