use polars::prelude::*;

use crate::domain::FileKind;

/// Column schema of the quote frames built by [`crate::data::frame`].
pub struct QuoteSchema;

impl QuoteSchema {
    /// Daily frame: one row per trading day.
    pub fn daily() -> Schema {
        Schema::from_iter(vec![
            Field::new("date".into(), DataType::Date),
            Field::new("open".into(), DataType::Float64),
            Field::new("high".into(), DataType::Float64),
            Field::new("low".into(), DataType::Float64),
            Field::new("close".into(), DataType::Float64),
            Field::new("amount".into(), DataType::Float64),
            Field::new("volume".into(), DataType::UInt64),
        ])
    }

    /// Minute frame: one row per intraday bar.
    pub fn minute() -> Schema {
        Schema::from_iter(vec![
            Field::new("date".into(), DataType::Date),
            Field::new(
                "timestamp".into(),
                DataType::Datetime(TimeUnit::Milliseconds, None),
            ),
            Field::new("minute_of_day".into(), DataType::UInt32),
            Field::new("open".into(), DataType::Float64),
            Field::new("high".into(), DataType::Float64),
            Field::new("low".into(), DataType::Float64),
            Field::new("close".into(), DataType::Float64),
            Field::new("amount".into(), DataType::Float64),
            Field::new("volume".into(), DataType::UInt64),
        ])
    }

    pub fn for_kind(kind: FileKind) -> Schema {
        match kind {
            FileKind::Daily => Self::daily(),
            FileKind::Minute => Self::minute(),
        }
    }

    /// Validate DataFrame against the schema for `kind`
    pub fn validate(df: &DataFrame, kind: FileKind) -> Result<(), SchemaError> {
        let expected = Self::for_kind(kind);
        let actual = df.schema();

        for field in expected.iter_fields() {
            let actual_dtype = actual
                .get(field.name())
                .ok_or_else(|| SchemaError::MissingColumn(field.name().to_string()))?;
            if actual_dtype != field.dtype() {
                return Err(SchemaError::TypeMismatch {
                    column: field.name().to_string(),
                    expected: field.dtype().clone(),
                    actual: actual_dtype.clone(),
                });
            }
        }

        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("Missing required column: {0}")]
    MissingColumn(String),

    #[error("Type mismatch in column {column}: expected {expected:?}, got {actual:?}")]
    TypeMismatch {
        column: String,
        expected: DataType,
        actual: DataType,
    },
}
