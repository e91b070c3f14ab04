//! Tabular conversion and vendor directory helpers

pub mod frame;
pub mod paths;
pub mod schema;

pub use frame::{daily_frame, minute_frame, series_frame, FrameError};
pub use paths::{Exchange, Granularity, PathError, SecurityFile, VendorRoot};
pub use schema::{QuoteSchema, SchemaError};
