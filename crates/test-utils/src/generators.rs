//! Synthetic time-series generators.
//!
//! These generators create predictable, verifiable series that can be
//! used across the test suite. All series start at [`base_time`] unless
//! stated otherwise.

use chrono::{DateTime, Duration, TimeZone, Utc};
use s100_common::TimeSeries;

/// Fixed reference time used by every generator (2021-12-06T00:00:00Z).
pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2021, 12, 6, 0, 0, 0)
        .single()
        .unwrap_or_default()
}

/// `count` timestamps spaced `interval_secs` apart, starting at `start`.
pub fn time_axis(start: DateTime<Utc>, interval_secs: i64, count: usize) -> Vec<DateTime<Utc>> {
    (0..count)
        .map(|i| start + Duration::seconds(interval_secs * i as i64))
        .collect()
}

/// A series holding the same value at every timestamp.
///
/// # Example
///
/// ```
/// use test_utils::{base_time, constant_series};
///
/// let series = constant_series(base_time(), 900, 10, 1.5);
/// assert_eq!(series.len(), 10);
/// assert!(series.iter().all(|(_, v)| *v == 1.5));
/// ```
pub fn constant_series(
    start: DateTime<Utc>,
    interval_secs: i64,
    count: usize,
    value: f64,
) -> TimeSeries {
    time_axis(start, interval_secs, count)
        .into_iter()
        .map(|t| (t, value))
        .collect()
}

/// A series increasing by `step` per sample from `first`.
///
/// The least-squares slope of any window of this series against sample
/// index is exactly `step`.
pub fn linear_series(
    start: DateTime<Utc>,
    interval_secs: i64,
    count: usize,
    first: f64,
    step: f64,
) -> TimeSeries {
    time_axis(start, interval_secs, count)
        .into_iter()
        .enumerate()
        .map(|(i, t)| (t, first + step * i as f64))
        .collect()
}

/// A copy of `series` with the samples at `missing` indices removed.
pub fn gapped_series(series: &TimeSeries, missing: &[usize]) -> TimeSeries {
    series
        .iter()
        .enumerate()
        .filter(|(i, _)| !missing.contains(i))
        .map(|(_, sample)| *sample)
        .collect()
}
