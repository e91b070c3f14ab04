//! Daily (`.day`) file decoder.
//!
//! Each 32-byte record holds a `YYYYMMDD` date as a plain `u32`, four prices
//! in hundredths, a float turnover, a share volume and the previous close.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::{decode_file, Records};
use crate::domain::DailyQuote;
use crate::error::{DecodeError, RecordFault};
use crate::layout::DAILY_LAYOUT;
use crate::record::RawRecord;

/// Fixed-point scale of on-disk prices (hundredths).
pub const PRICE_SCALE: u32 = 2;

/// All eight daily fields exactly as stored, before any transform.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawDailyRecord {
    pub date: u32,
    pub open_cents: u32,
    pub high_cents: u32,
    pub low_cents: u32,
    pub close_cents: u32,
    pub amount: f32,
    pub volume: u32,
    pub prev_close_cents: u32,
}

impl RawDailyRecord {
    pub fn unpack(record: &RawRecord<'_>) -> Self {
        let mut r = record.reader();
        Self {
            date: r.u32(),
            open_cents: r.u32(),
            high_cents: r.u32(),
            low_cents: r.u32(),
            close_cents: r.u32(),
            amount: r.f32(),
            volume: r.u32(),
            prev_close_cents: r.u32(),
        }
    }

    /// Apply the daily transforms: date reconstruction and price scaling.
    pub fn to_quote(&self) -> Result<DailyQuote, RecordFault> {
        Ok(DailyQuote {
            date: decode_yyyymmdd(self.date)?,
            open: scale_price(self.open_cents),
            high: scale_price(self.high_cents),
            low: scale_price(self.low_cents),
            close: scale_price(self.close_cents),
            amount: f64::from(self.amount),
            volume: u64::from(self.volume),
        })
    }

    /// Previous session's close, scaled like the other prices.
    pub fn prev_close(&self) -> Decimal {
        scale_price(self.prev_close_cents)
    }
}

/// Interpret `raw` as an 8-digit `YYYYMMDD` integer.
pub fn decode_yyyymmdd(raw: u32) -> Result<NaiveDate, RecordFault> {
    if !(10_000_000..=99_999_999).contains(&raw) {
        return Err(RecordFault::InvalidDate { raw });
    }
    let year = (raw / 10_000) as i32;
    let month = raw / 100 % 100;
    let day = raw % 100;
    NaiveDate::from_ymd_opt(year, month, day).ok_or(RecordFault::InvalidDate { raw })
}

/// Hundredths to an exact two-decimal price: `123456` -> `1234.56`.
pub fn scale_price(cents: u32) -> Decimal {
    Decimal::new(i64::from(cents), PRICE_SCALE)
}

/// Transform for the daily layout.
pub fn decode_daily_record(record: &RawRecord<'_>) -> Result<DailyQuote, RecordFault> {
    RawDailyRecord::unpack(record).to_quote()
}

fn unpack_daily_record(record: &RawRecord<'_>) -> Result<RawDailyRecord, RecordFault> {
    Ok(RawDailyRecord::unpack(record))
}

/// Lazily decode an in-memory daily buffer.
pub fn daily_records(buf: Vec<u8>) -> Result<Records<DailyQuote>, DecodeError> {
    Records::new(buf, &DAILY_LAYOUT, decode_daily_record)
}

/// Untransformed view of an in-memory daily buffer.
pub fn raw_daily_records(buf: Vec<u8>) -> Result<Records<RawDailyRecord>, DecodeError> {
    Records::new(buf, &DAILY_LAYOUT, unpack_daily_record)
}

/// Read `path` and lazily decode it as a daily file.
pub fn read_daily(path: impl AsRef<Path>) -> Result<Records<DailyQuote>, DecodeError> {
    decode_file(path.as_ref(), &DAILY_LAYOUT, decode_daily_record)
}

/// A daily file on disk. Each call to [`quotes`](Self::quotes) performs a
/// fresh read and starts a new, independent sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyReader {
    path: PathBuf,
}

impl DailyReader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn quotes(&self) -> Result<Records<DailyQuote>, DecodeError> {
        read_daily(&self.path)
    }

    pub fn raw(&self) -> Result<Records<RawDailyRecord>, DecodeError> {
        decode_file(&self.path, &DAILY_LAYOUT, unpack_daily_record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(date: u32, prices: [u32; 4], amount: f32, volume: u32, prev: u32) -> Vec<u8> {
        let mut buf = Vec::with_capacity(32);
        buf.extend_from_slice(&date.to_le_bytes());
        for p in prices {
            buf.extend_from_slice(&p.to_le_bytes());
        }
        buf.extend_from_slice(&amount.to_le_bytes());
        buf.extend_from_slice(&volume.to_le_bytes());
        buf.extend_from_slice(&prev.to_le_bytes());
        buf
    }

    #[test]
    fn scales_prices_exactly() {
        assert_eq!(scale_price(123_456), "1234.56".parse::<Decimal>().unwrap());
        assert_eq!(scale_price(1010).to_string(), "10.10");
        assert_eq!(scale_price(0), Decimal::ZERO);
    }

    #[test]
    fn decodes_valid_dates() {
        assert_eq!(decode_yyyymmdd(20200102), Ok(NaiveDate::from_ymd_opt(2020, 1, 2).unwrap()));
        assert_eq!(decode_yyyymmdd(20000229), Ok(NaiveDate::from_ymd_opt(2000, 2, 29).unwrap()));
    }

    #[test]
    fn rejects_invalid_dates() {
        for raw in [20201301, 20200230, 20190229, 20200100, 20200132, 0, 1231, 100_000_000] {
            assert_eq!(decode_yyyymmdd(raw), Err(RecordFault::InvalidDate { raw }), "{raw}");
        }
    }

    #[test]
    fn decodes_one_record() {
        let bytes = record(20200102, [1000, 1050, 990, 1020], 1_250_000.0, 125_000, 995);
        let mut quotes = daily_records(bytes).unwrap();
        let q = quotes.next().unwrap().unwrap();
        assert_eq!(q.date, NaiveDate::from_ymd_opt(2020, 1, 2).unwrap());
        assert_eq!(q.open.to_string(), "10.00");
        assert_eq!(q.high.to_string(), "10.50");
        assert_eq!(q.low.to_string(), "9.90");
        assert_eq!(q.close.to_string(), "10.20");
        assert_eq!(q.amount, 1_250_000.0);
        assert_eq!(q.volume, 125_000);
        assert!(quotes.next().is_none());
    }

    #[test]
    fn raw_view_keeps_prev_close() {
        let bytes = record(20200102, [1000, 1050, 990, 1020], 1.0, 1, 995);
        let raw = raw_daily_records(bytes).unwrap().next().unwrap().unwrap();
        assert_eq!(raw.prev_close_cents, 995);
        assert_eq!(raw.prev_close().to_string(), "9.95");
        assert_eq!(raw.date, 20200102);
    }

    #[test]
    fn bad_date_is_malformed_record() {
        let bytes = record(20201301, [1, 1, 1, 1], 0.0, 0, 0);
        let err = daily_records(bytes).unwrap().next().unwrap().unwrap_err();
        assert!(matches!(
            err,
            DecodeError::MalformedRecord {
                index: 0,
                offset: 0,
                fault: RecordFault::InvalidDate { raw: 20201301 }
            }
        ));
    }
}
