//! tdxquote runner — batch jobs over whole vendor directories.
//!
//! This crate builds on `tdxquote-core` to provide:
//! - TOML job configuration and file discovery
//! - Parallel batch decoding with an explicit error policy
//! - Export to CSV / Parquet / JSON with a metadata sidecar

pub mod batch;
pub mod config;
pub mod export;

pub use batch::{
    decode_batch, decode_one, source_digest, BatchError, BatchSummary, ErrorPolicy, FileOutcome,
};
pub use config::{BatchConfig, ConfigError, OutputConfig};
pub use export::{
    export_batch, export_file, export_outcome, export_series, export_stem, read_meta, ExportError,
    ExportFormat, ExportMeta,
};
