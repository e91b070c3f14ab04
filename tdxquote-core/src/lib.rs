//! tdxquote core — decoding of the vendor's fixed-width quote files.
//!
//! This crate contains the binary contract and everything built directly on it:
//! - Layout descriptors for the 32-byte daily and minute records
//! - Raw record windows and a generic field unpacker
//! - Daily decoder (YYYYMMDD dates, hundredths-scaled prices)
//! - Minute decoder (packed 16-bit dates, minute-of-day clock)
//! - The lazy `Records` sequence shared by both decoders
//! - Polars frame conversion and the vendor directory convention

pub mod data;
pub mod decode;
pub mod domain;
pub mod error;
pub mod layout;
pub mod record;

pub use decode::{decode_series, read_daily, read_minute, DailyReader, MinuteReader, Records};
pub use domain::{DailyQuote, FileKind, MinuteQuote, QuoteSeries};
pub use error::{DecodeError, RecordFault};
pub use layout::{RecordLayout, DAILY_LAYOUT, MINUTE_LAYOUT, RECORD_WIDTH};
