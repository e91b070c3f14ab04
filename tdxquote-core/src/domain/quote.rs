//! Quote records, the values produced by decoding one vendor record.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::FileKind;

/// One trading day for a single security.
///
/// Prices are exact two-decimal fixed-point values; the file stores them as
/// integer hundredths. `amount` is the turnover in currency units and
/// `volume` the share count, both unscaled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyQuote {
    pub date: NaiveDate,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    #[serde(with = "float_text")]
    pub amount: f64,
    pub volume: u64,
}

impl DailyQuote {
    /// Basic OHLC sanity: non-negative prices, high >= low, open/close inside the range.
    ///
    /// The decoder never rejects on this; the bytes are authoritative.
    pub fn is_sane(&self) -> bool {
        self.low >= Decimal::ZERO
            && self.high >= self.low
            && self.open >= self.low
            && self.open <= self.high
            && self.close >= self.low
            && self.close <= self.high
    }
}

/// One intraday bar (5-minute or 1-minute) for a single security.
///
/// Prices are stored as native floats in the file and are passed through
/// unscaled. NaN and infinite values survive serialization as the strings
/// `"NaN"`, `"inf"` and `"-inf"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinuteQuote {
    pub date: NaiveDate,
    pub time: NaiveTime,
    #[serde(with = "float_text")]
    pub open: f64,
    #[serde(with = "float_text")]
    pub high: f64,
    #[serde(with = "float_text")]
    pub low: f64,
    #[serde(with = "float_text")]
    pub close: f64,
    #[serde(with = "float_text")]
    pub amount: f64,
    pub volume: u64,
}

impl MinuteQuote {
    pub fn timestamp(&self) -> NaiveDateTime {
        self.date.and_time(self.time)
    }

    /// Returns true if any price field is NaN.
    pub fn is_void(&self) -> bool {
        self.open.is_nan() || self.high.is_nan() || self.low.is_nan() || self.close.is_nan()
    }

    pub fn is_sane(&self) -> bool {
        if self.is_void() {
            return false;
        }
        self.low >= 0.0
            && self.high >= self.low
            && self.open >= self.low
            && self.open <= self.high
            && self.close >= self.low
            && self.close <= self.high
    }
}

/// Finite floats as numbers, non-finite ones as their `Display` text.
///
/// JSON has no NaN or infinity, and serde_json would otherwise write `null`.
mod float_text {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_finite() {
            serializer.serialize_f64(*value)
        } else {
            serializer.serialize_str(&value.to_string())
        }
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Number(f64),
        Text(String),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        match Repr::deserialize(deserializer)? {
            Repr::Number(v) => Ok(v),
            Repr::Text(s) => s.parse().map_err(serde::de::Error::custom),
        }
    }
}

/// A fully decoded file, tagged by kind.
#[derive(Debug, Clone, PartialEq)]
pub enum QuoteSeries {
    Daily(Vec<DailyQuote>),
    Minute(Vec<MinuteQuote>),
}

impl QuoteSeries {
    pub fn kind(&self) -> FileKind {
        match self {
            QuoteSeries::Daily(_) => FileKind::Daily,
            QuoteSeries::Minute(_) => FileKind::Minute,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            QuoteSeries::Daily(q) => q.len(),
            QuoteSeries::Minute(q) => q.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Date of the first record in file order.
    pub fn first_date(&self) -> Option<NaiveDate> {
        match self {
            QuoteSeries::Daily(q) => q.first().map(|r| r.date),
            QuoteSeries::Minute(q) => q.first().map(|r| r.date),
        }
    }

    /// Date of the last record in file order.
    pub fn last_date(&self) -> Option<NaiveDate> {
        match self {
            QuoteSeries::Daily(q) => q.last().map(|r| r.date),
            QuoteSeries::Minute(q) => q.last().map(|r| r.date),
        }
    }
}
