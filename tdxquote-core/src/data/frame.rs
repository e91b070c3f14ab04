//! Conversion of decoded quotes into Polars DataFrames.

use chrono::{NaiveDate, Timelike};
use polars::prelude::*;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::domain::{DailyQuote, MinuteQuote, QuoteSeries};

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("dataframe error: {0}")]
    Polars(#[from] PolarsError),
}

fn epoch_days(date: NaiveDate) -> i32 {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or_default();
    (date - epoch).num_days() as i32
}

fn price(d: Decimal) -> f64 {
    d.to_f64().unwrap_or(f64::NAN)
}

/// Daily quotes as a frame with columns `date, open, high, low, close, amount, volume`.
pub fn daily_frame(quotes: &[DailyQuote]) -> Result<DataFrame, FrameError> {
    let dates: Vec<i32> = quotes.iter().map(|q| epoch_days(q.date)).collect();
    let opens: Vec<f64> = quotes.iter().map(|q| price(q.open)).collect();
    let highs: Vec<f64> = quotes.iter().map(|q| price(q.high)).collect();
    let lows: Vec<f64> = quotes.iter().map(|q| price(q.low)).collect();
    let closes: Vec<f64> = quotes.iter().map(|q| price(q.close)).collect();
    let amounts: Vec<f64> = quotes.iter().map(|q| q.amount).collect();
    let volumes: Vec<u64> = quotes.iter().map(|q| q.volume).collect();

    let df = DataFrame::new(vec![
        Column::new("date".into(), dates).cast(&DataType::Date)?,
        Column::new("open".into(), opens),
        Column::new("high".into(), highs),
        Column::new("low".into(), lows),
        Column::new("close".into(), closes),
        Column::new("amount".into(), amounts),
        Column::new("volume".into(), volumes),
    ])?;
    Ok(df)
}

/// Minute quotes as a frame. The clock is carried both as a millisecond
/// `timestamp` and as the raw `minute_of_day`.
pub fn minute_frame(quotes: &[MinuteQuote]) -> Result<DataFrame, FrameError> {
    let dates: Vec<i32> = quotes.iter().map(|q| epoch_days(q.date)).collect();
    let timestamps: Vec<i64> = quotes
        .iter()
        .map(|q| q.timestamp().and_utc().timestamp_millis())
        .collect();
    let minutes: Vec<u32> = quotes
        .iter()
        .map(|q| q.time.hour() * 60 + q.time.minute())
        .collect();
    let opens: Vec<f64> = quotes.iter().map(|q| q.open).collect();
    let highs: Vec<f64> = quotes.iter().map(|q| q.high).collect();
    let lows: Vec<f64> = quotes.iter().map(|q| q.low).collect();
    let closes: Vec<f64> = quotes.iter().map(|q| q.close).collect();
    let amounts: Vec<f64> = quotes.iter().map(|q| q.amount).collect();
    let volumes: Vec<u64> = quotes.iter().map(|q| q.volume).collect();

    let df = DataFrame::new(vec![
        Column::new("date".into(), dates).cast(&DataType::Date)?,
        Column::new("timestamp".into(), timestamps)
            .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?,
        Column::new("minute_of_day".into(), minutes),
        Column::new("open".into(), opens),
        Column::new("high".into(), highs),
        Column::new("low".into(), lows),
        Column::new("close".into(), closes),
        Column::new("amount".into(), amounts),
        Column::new("volume".into(), volumes),
    ])?;
    Ok(df)
}

pub fn series_frame(series: &QuoteSeries) -> Result<DataFrame, FrameError> {
    match series {
        QuoteSeries::Daily(q) => daily_frame(q),
        QuoteSeries::Minute(q) => minute_frame(q),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::schema::QuoteSchema;
    use crate::domain::FileKind;
    use chrono::NaiveTime;

    fn daily() -> Vec<DailyQuote> {
        (0..3)
            .map(|i| DailyQuote {
                date: NaiveDate::from_ymd_opt(2020, 1, 2 + i).unwrap(),
                open: Decimal::new(1000 + i64::from(i) * 10, 2),
                high: Decimal::new(1100, 2),
                low: Decimal::new(900, 2),
                close: Decimal::new(1050, 2),
                amount: 1_000.0,
                volume: 100,
            })
            .collect()
    }

    fn minute() -> Vec<MinuteQuote> {
        vec![MinuteQuote {
            date: NaiveDate::from_ymd_opt(2021, 6, 18).unwrap(),
            time: NaiveTime::from_hms_opt(9, 35, 0).unwrap(),
            open: 10.5,
            high: 10.75,
            low: 10.25,
            close: 10.5,
            amount: 31_800.0,
            volume: 3_000,
        }]
    }

    #[test]
    fn daily_frame_matches_schema() {
        let df = daily_frame(&daily()).unwrap();
        assert_eq!(df.height(), 3);
        QuoteSchema::validate(&df, FileKind::Daily).unwrap();

        let opens = df.column("open").unwrap().f64().unwrap();
        assert_eq!(opens.get(0), Some(10.0));
        assert!((opens.get(1).unwrap() - 10.1).abs() < 1e-9);
    }

    #[test]
    fn minute_frame_matches_schema() {
        let df = minute_frame(&minute()).unwrap();
        assert_eq!(df.height(), 1);
        QuoteSchema::validate(&df, FileKind::Minute).unwrap();

        let minutes = df.column("minute_of_day").unwrap().u32().unwrap();
        assert_eq!(minutes.get(0), Some(575));
    }

    #[test]
    fn empty_series_is_empty_frame() {
        let df = series_frame(&QuoteSeries::Daily(vec![])).unwrap();
        assert_eq!(df.height(), 0);
        assert_eq!(df.width(), 7);
    }
}
