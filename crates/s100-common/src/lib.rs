//! Common types shared across the S-100 tiling crates.

pub mod bbox;
pub mod cell;
pub mod station;
pub mod time;

pub use bbox::BoundingBox;
pub use cell::{CellError, TileCell};
pub use station::{SeriesCode, StationHeader, StationRecord, TimeSeries};
pub use time::{
    format_issue_date, format_issue_time, format_s100_datetime, parse_timestamp, TimeParseError,
};
