//! Domain types for decoded vendor quotes

pub mod kind;
pub mod quote;

pub use kind::FileKind;
pub use quote::{DailyQuote, MinuteQuote, QuoteSeries};
