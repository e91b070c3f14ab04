//! Minute (`.lc5` / `.lc1`) file decoder.
//!
//! The date is packed into a `u16` as `(year - 2004) * 2048 + month * 100 + day`
//! and the clock as minutes since midnight. Prices and turnover are stored as
//! native `f32` and are not rescaled.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::{decode_file, Records};
use crate::domain::MinuteQuote;
use crate::error::{DecodeError, RecordFault};
use crate::layout::MINUTE_LAYOUT;
use crate::record::RawRecord;

/// Year encoded by a packed date of zero.
pub const PACKED_YEAR_BASE: i32 = 2004;

const PACKED_YEAR_DIVISOR: u16 = 2048;
const MINUTES_PER_DAY: u16 = 24 * 60;

/// All nine minute fields exactly as stored, before any transform.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawMinuteRecord {
    pub packed_date: u16,
    pub minutes: u16,
    pub open: f32,
    pub high: f32,
    pub low: f32,
    pub close: f32,
    pub amount: f32,
    pub volume: u32,
    pub reserved: u32,
}

impl RawMinuteRecord {
    pub fn unpack(record: &RawRecord<'_>) -> Self {
        let mut r = record.reader();
        Self {
            packed_date: r.u16(),
            minutes: r.u16(),
            open: r.f32(),
            high: r.f32(),
            low: r.f32(),
            close: r.f32(),
            amount: r.f32(),
            volume: r.u32(),
            reserved: r.u32(),
        }
    }

    /// Apply the minute transforms: packed date and clock reconstruction.
    pub fn to_quote(&self) -> Result<MinuteQuote, RecordFault> {
        Ok(MinuteQuote {
            date: decode_packed_date(self.packed_date)?,
            time: decode_minute_of_day(self.minutes)?,
            open: f64::from(self.open),
            high: f64::from(self.high),
            low: f64::from(self.low),
            close: f64::from(self.close),
            amount: f64::from(self.amount),
            volume: u64::from(self.volume),
        })
    }
}

/// Split a packed date into its `(year, month, day)` parts without validating.
pub fn unpack_date_parts(raw: u16) -> (i32, u32, u32) {
    let year = i32::from(raw / PACKED_YEAR_DIVISOR) + PACKED_YEAR_BASE;
    let rest = u32::from(raw % PACKED_YEAR_DIVISOR);
    (year, rest / 100, rest % 100)
}

/// Decode the vendor's packed `u16` date.
pub fn decode_packed_date(raw: u16) -> Result<NaiveDate, RecordFault> {
    let (year, month, day) = unpack_date_parts(raw);
    NaiveDate::from_ymd_opt(year, month, day).ok_or(RecordFault::InvalidPackedDate {
        raw,
        year,
        month,
        day,
    })
}

/// Inverse of [`decode_packed_date`], for building fixtures and tooling.
///
/// Returns `None` for dates the 16-bit encoding cannot represent.
pub fn pack_date(date: NaiveDate) -> Option<u16> {
    use chrono::Datelike;
    let offset = date.year() - PACKED_YEAR_BASE;
    if offset < 0 {
        return None;
    }
    let packed = offset as u32 * u32::from(PACKED_YEAR_DIVISOR) + date.month() * 100 + date.day();
    u16::try_from(packed).ok()
}

/// Decode minutes since midnight; 1440 and above are rejected.
pub fn decode_minute_of_day(minutes: u16) -> Result<NaiveTime, RecordFault> {
    if minutes >= MINUTES_PER_DAY {
        return Err(RecordFault::InvalidTime { minutes });
    }
    NaiveTime::from_hms_opt(u32::from(minutes / 60), u32::from(minutes % 60), 0)
        .ok_or(RecordFault::InvalidTime { minutes })
}

/// Transform for the minute layout.
pub fn decode_minute_record(record: &RawRecord<'_>) -> Result<MinuteQuote, RecordFault> {
    RawMinuteRecord::unpack(record).to_quote()
}

fn unpack_minute_record(record: &RawRecord<'_>) -> Result<RawMinuteRecord, RecordFault> {
    Ok(RawMinuteRecord::unpack(record))
}

/// Lazily decode an in-memory minute buffer.
pub fn minute_records(buf: Vec<u8>) -> Result<Records<MinuteQuote>, DecodeError> {
    Records::new(buf, &MINUTE_LAYOUT, decode_minute_record)
}

/// Untransformed view of an in-memory minute buffer.
pub fn raw_minute_records(buf: Vec<u8>) -> Result<Records<RawMinuteRecord>, DecodeError> {
    Records::new(buf, &MINUTE_LAYOUT, unpack_minute_record)
}

/// Read `path` and lazily decode it as a minute file.
pub fn read_minute(path: impl AsRef<Path>) -> Result<Records<MinuteQuote>, DecodeError> {
    decode_file(path.as_ref(), &MINUTE_LAYOUT, decode_minute_record)
}

/// A minute file on disk; see [`DailyReader`](super::DailyReader).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MinuteReader {
    path: PathBuf,
}

impl MinuteReader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn quotes(&self) -> Result<Records<MinuteQuote>, DecodeError> {
        read_minute(&self.path)
    }

    pub fn raw(&self) -> Result<Records<RawMinuteRecord>, DecodeError> {
        decode_file(&self.path, &MINUTE_LAYOUT, unpack_minute_record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(packed: u16, minutes: u16, prices: [f32; 5], volume: u32, reserved: u32) -> Vec<u8> {
        let mut buf = Vec::with_capacity(32);
        buf.extend_from_slice(&packed.to_le_bytes());
        buf.extend_from_slice(&minutes.to_le_bytes());
        for p in prices {
            buf.extend_from_slice(&p.to_le_bytes());
        }
        buf.extend_from_slice(&volume.to_le_bytes());
        buf.extend_from_slice(&reserved.to_le_bytes());
        buf
    }

    #[test]
    fn packed_zero_is_rejected() {
        assert_eq!(unpack_date_parts(0), (2004, 0, 0));
        assert_eq!(
            decode_packed_date(0),
            Err(RecordFault::InvalidPackedDate {
                raw: 0,
                year: 2004,
                month: 0,
                day: 0
            })
        );
    }

    #[test]
    fn packed_date_decodes() {
        // 2021 -> 17 * 2048 = 34816; June 18 -> 618
        assert_eq!(
            decode_packed_date(34816 + 618),
            Ok(NaiveDate::from_ymd_opt(2021, 6, 18).unwrap())
        );
        assert_eq!(
            decode_packed_date(101),
            Ok(NaiveDate::from_ymd_opt(2004, 1, 1).unwrap())
        );
    }

    #[test]
    fn packed_date_rejects_impossible_days() {
        // 2005-02-30
        assert!(decode_packed_date(2048 + 230).is_err());
        // month 13
        assert!(decode_packed_date(1301).is_err());
    }

    #[test]
    fn pack_date_inverts_decode() {
        let date = NaiveDate::from_ymd_opt(2019, 12, 31).unwrap();
        let packed = pack_date(date).unwrap();
        assert_eq!(decode_packed_date(packed), Ok(date));
        assert_eq!(pack_date(NaiveDate::from_ymd_opt(2003, 12, 31).unwrap()), None);
        assert_eq!(pack_date(NaiveDate::from_ymd_opt(2040, 1, 1).unwrap()), None);
    }

    #[test]
    fn minute_of_day_bounds() {
        assert_eq!(decode_minute_of_day(0), Ok(NaiveTime::from_hms_opt(0, 0, 0).unwrap()));
        assert_eq!(decode_minute_of_day(575), Ok(NaiveTime::from_hms_opt(9, 35, 0).unwrap()));
        assert_eq!(decode_minute_of_day(1439), Ok(NaiveTime::from_hms_opt(23, 59, 0).unwrap()));
        assert_eq!(
            decode_minute_of_day(1440),
            Err(RecordFault::InvalidTime { minutes: 1440 })
        );
        assert!(decode_minute_of_day(u16::MAX).is_err());
    }

    #[test]
    fn decodes_one_record_unscaled() {
        let bytes = record(34816 + 618, 575, [10.5, 10.75, 10.25, 10.5, 31_800.0], 3_000, 7);
        let q = minute_records(bytes).unwrap().next().unwrap().unwrap();
        assert_eq!(q.date, NaiveDate::from_ymd_opt(2021, 6, 18).unwrap());
        assert_eq!(q.time, NaiveTime::from_hms_opt(9, 35, 0).unwrap());
        assert_eq!(q.open, 10.5);
        assert_eq!(q.high, 10.75);
        assert_eq!(q.low, 10.25);
        assert_eq!(q.close, 10.5);
        assert_eq!(q.amount, 31_800.0);
        assert_eq!(q.volume, 3_000);
    }

    #[test]
    fn raw_view_keeps_reserved() {
        let bytes = record(0, 1440, [0.0; 5], 0, 0xABCD);
        let raw = raw_minute_records(bytes).unwrap().next().unwrap().unwrap();
        assert_eq!(raw.reserved, 0xABCD);
        assert_eq!(raw.minutes, 1440);
    }

    #[test]
    fn reserved_field_does_not_affect_decoding() {
        let a = record(34816 + 618, 575, [1.0; 5], 1, 0);
        let b = record(34816 + 618, 575, [1.0; 5], 1, u32::MAX);
        let qa = minute_records(a).unwrap().next().unwrap().unwrap();
        let qb = minute_records(b).unwrap().next().unwrap().unwrap();
        assert_eq!(qa, qb);
    }

    #[test]
    fn bad_time_is_malformed_record() {
        let mut bytes = record(34816 + 618, 575, [1.0; 5], 1, 0);
        bytes.extend(record(34816 + 618, 1440, [1.0; 5], 1, 0));
        let mut quotes = minute_records(bytes).unwrap();
        assert!(quotes.next().unwrap().is_ok());
        let err = quotes.next().unwrap().unwrap_err();
        assert!(matches!(
            err,
            DecodeError::MalformedRecord {
                index: 1,
                offset: 32,
                fault: RecordFault::InvalidTime { minutes: 1440 }
            }
        ));
    }
}
