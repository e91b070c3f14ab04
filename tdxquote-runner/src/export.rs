//! Export of decoded quotes to CSV, JSON or Parquet.
//!
//! Layout: `{out_dir}/{stem}.{ext}` plus `{out_dir}/{stem}.meta.json`, where
//! the stem is the source file name with dots replaced, e.g.
//! `sh600000.day` → `sh600000_day.parquet`.
//!
//! Data files are written to `.tmp` and renamed into place. The source files
//! are only ever read.

use chrono::{NaiveDate, NaiveDateTime};
use polars::prelude::{ParquetWriter, PolarsError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use tdxquote_core::data::{series_frame, FrameError, QuoteSchema, SchemaError};
use tdxquote_core::{DecodeError, FileKind, QuoteSeries};

use crate::batch::{decode_one, BatchSummary, ErrorPolicy, FileOutcome};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Frame(#[from] FrameError),

    #[error("frame does not match the {kind} quote schema: {source}")]
    Schema {
        kind: FileKind,
        #[source]
        source: SchemaError,
    },

    #[error("Parquet error: {0}")]
    Parquet(#[from] PolarsError),

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> ExportError + '_ {
    move |source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    Csv,
    #[default]
    Parquet,
    Json,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Parquet => "parquet",
            ExportFormat::Json => "json",
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "parquet" | "pq" => Ok(ExportFormat::Parquet),
            "json" => Ok(ExportFormat::Json),
            other => Err(format!("unknown export format '{other}' (expected csv, parquet or json)")),
        }
    }
}

/// Metadata sidecar written next to every export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportMeta {
    pub source: PathBuf,
    pub output: PathBuf,
    pub kind: FileKind,
    pub format: ExportFormat,
    pub record_count: usize,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// BLAKE3 hex digest of the source file bytes.
    pub source_hash: String,
    pub exported_at: NaiveDateTime,
}

/// Output stem for a source file: `sh600000.day` → `sh600000_day`.
pub fn export_stem(source: &Path) -> String {
    source
        .file_name()
        .map(|n| n.to_string_lossy().replace('.', "_"))
        .unwrap_or_else(|| "quotes".to_string())
}

pub fn meta_path(out_dir: &Path, stem: &str) -> PathBuf {
    out_dir.join(format!("{stem}.meta.json"))
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

fn commit(tmp: &Path, path: &Path) -> Result<(), ExportError> {
    fs::rename(tmp, path).map_err(|source| {
        let _ = fs::remove_file(tmp);
        ExportError::Io {
            path: path.to_path_buf(),
            source,
        }
    })
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), ExportError> {
    let tmp = tmp_path(path);
    fs::write(&tmp, bytes).map_err(io_error(&tmp))?;
    commit(&tmp, path)
}

fn csv_bytes<T: Serialize>(rows: &[T]) -> Result<Vec<u8>, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in rows {
        writer.serialize(row)?;
    }
    writer
        .into_inner()
        .map_err(|e| ExportError::Csv(csv::Error::from(e.into_error())))
}

fn write_series(series: &QuoteSeries, path: &Path, format: ExportFormat) -> Result<(), ExportError> {
    match format {
        ExportFormat::Csv => {
            let bytes = match series {
                QuoteSeries::Daily(q) => csv_bytes(q)?,
                QuoteSeries::Minute(q) => csv_bytes(q)?,
            };
            write_atomic(path, &bytes)
        }
        ExportFormat::Json => {
            let bytes = match series {
                QuoteSeries::Daily(q) => serde_json::to_vec_pretty(q)?,
                QuoteSeries::Minute(q) => serde_json::to_vec_pretty(q)?,
            };
            write_atomic(path, &bytes)
        }
        ExportFormat::Parquet => {
            let mut df = series_frame(series)?;
            QuoteSchema::validate(&df, series.kind()).map_err(|source| ExportError::Schema {
                kind: series.kind(),
                source,
            })?;
            let tmp = tmp_path(path);
            let file = fs::File::create(&tmp).map_err(io_error(&tmp))?;
            if let Err(e) = ParquetWriter::new(file).finish(&mut df) {
                let _ = fs::remove_file(&tmp);
                return Err(e.into());
            }
            commit(&tmp, path)
        }
    }
}

/// Write `series`, decoded from `source`, to `out_dir` as `{stem}.{ext}`
/// together with its metadata sidecar.
///
/// `source_hash` must be the digest of the bytes `series` came from; the
/// source file is not read again, since the vendor terminal may have
/// appended to it since.
pub fn export_series(
    series: &QuoteSeries,
    source: &Path,
    source_hash: &str,
    out_dir: &Path,
    stem: &str,
    format: ExportFormat,
) -> Result<ExportMeta, ExportError> {
    fs::create_dir_all(out_dir).map_err(io_error(out_dir))?;

    let output = out_dir.join(format!("{stem}.{}", format.extension()));
    write_series(series, &output, format)?;

    let meta = ExportMeta {
        source: source.to_path_buf(),
        output: output.clone(),
        kind: series.kind(),
        format,
        record_count: series.len(),
        start_date: series.first_date(),
        end_date: series.last_date(),
        source_hash: source_hash.to_string(),
        exported_at: chrono::Local::now().naive_local(),
    };
    write_atomic(&meta_path(out_dir, stem), &serde_json::to_vec_pretty(&meta)?)?;

    debug!(
        source = %source.display(),
        output = %output.display(),
        records = meta.record_count,
        "exported quotes"
    );
    Ok(meta)
}

/// Decode `source` as `kind` (failing on the first bad record) and export it.
pub fn export_file(
    source: &Path,
    kind: FileKind,
    out_dir: &Path,
    format: ExportFormat,
) -> Result<ExportMeta, ExportError> {
    let outcome = decode_one(source, kind, ErrorPolicy::Abort)?;
    export_outcome(&outcome, out_dir, format)
}

/// Export one decoded file under its default stem.
pub fn export_outcome(
    outcome: &FileOutcome,
    out_dir: &Path,
    format: ExportFormat,
) -> Result<ExportMeta, ExportError> {
    export_series(
        &outcome.series,
        &outcome.path,
        &outcome.source_hash,
        out_dir,
        &export_stem(&outcome.path),
        format,
    )
}

/// Export every decoded file in a batch summary.
pub fn export_batch(
    summary: &BatchSummary,
    out_dir: &Path,
    format: ExportFormat,
) -> Result<Vec<ExportMeta>, ExportError> {
    let metas = summary
        .outputs
        .iter()
        .map(|o| export_outcome(o, out_dir, format))
        .collect::<Result<Vec<_>, _>>()?;
    info!(
        files = metas.len(),
        format = %format,
        out_dir = %out_dir.display(),
        "batch export finished"
    );
    Ok(metas)
}

/// Load a sidecar written by [`export_series`].
pub fn read_meta(path: &Path) -> Result<ExportMeta, ExportError> {
    let content = fs::read_to_string(path).map_err(io_error(path))?;
    Ok(serde_json::from_str(&content)?)
}
