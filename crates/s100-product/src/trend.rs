//! Trend Calculator for water-level tables.
//!
//! Each station column is classified independently from the slope of an
//! ordinary least-squares fit over a centered one-hour rolling window.
//! For a window of `w` samples the row at `i` uses samples
//! `i + (w-1)/2 - (w-1) ..= i + (w-1)/2`; a window that runs off either end
//! of the table or contains a missing sample has no slope.

use serde::{Deserialize, Serialize};

use crate::config::TrendConfig;
use crate::series::AssembledSeries;

/// Trend classification of one water-level sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i8)]
pub enum TrendFlag {
    Steady = 0,
    Decreasing = 1,
    Increasing = 2,
    Unknown = 3,
}

impl TrendFlag {
    /// Classify a slope. `NaN` means no slope could be fitted.
    pub fn from_slope(slope: f64, threshold: f64) -> Self {
        if slope.is_nan() {
            Self::Unknown
        } else if slope > threshold {
            Self::Increasing
        } else if slope < -threshold {
            Self::Decreasing
        } else {
            Self::Steady
        }
    }

    /// Value stored in the `waterLevelTrend` field.
    pub fn code(self) -> i8 {
        self as i8
    }
}

/// Trend flags shaped like the table they were computed from.
#[derive(Debug, Clone, PartialEq)]
pub struct TrendTable {
    columns: Vec<Vec<TrendFlag>>,
}

impl TrendTable {
    pub fn column(&self, index: usize) -> &[TrendFlag] {
        self.columns.get(index).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn columns(&self) -> &[Vec<TrendFlag>] {
        &self.columns
    }
}

/// Rolling window width: whole samples per hour at this interval.
pub fn samples_per_hour(interval_secs: i64) -> usize {
    if interval_secs <= 0 {
        return 0;
    }
    (3600 / interval_secs) as usize
}

/// Compute trend flags for every cell of a water-level table.
///
/// Tables with fewer than two samples per hour, or with a single row,
/// cannot be fitted and are all [`TrendFlag::Unknown`].
pub fn compute_trends(series: &AssembledSeries, config: &TrendConfig) -> TrendTable {
    let window = series.interval_secs().map(samples_per_hour).unwrap_or(0);

    let columns = series
        .columns()
        .iter()
        .map(|column| {
            let values = if config.interpolate_gaps {
                interpolate_gaps(&column.values)
            } else {
                column.values.clone()
            };
            rolling_slopes(&values, window)
                .into_iter()
                .map(|slope| TrendFlag::from_slope(slope, config.threshold))
                .collect()
        })
        .collect();

    TrendTable { columns }
}

/// Centered rolling least-squares slope; `NaN` where the window is
/// incomplete.
pub fn rolling_slopes(values: &[Option<f64>], window: usize) -> Vec<f64> {
    let n = values.len();
    if window < 2 {
        return vec![f64::NAN; n];
    }

    let offset = (window - 1) / 2;
    let mut buf = Vec::with_capacity(window);

    (0..n)
        .map(|i| {
            let end = i + offset;
            if end >= n || end + 1 < window {
                return f64::NAN;
            }
            let start = end + 1 - window;

            buf.clear();
            for v in &values[start..=end] {
                match v {
                    Some(v) => buf.push(*v),
                    None => return f64::NAN,
                }
            }
            ols_slope(&buf)
        })
        .collect()
}

/// Slope of the least-squares line through `(i, ys[i])`.
pub fn ols_slope(ys: &[f64]) -> f64 {
    let n = ys.len();
    if n < 2 {
        return f64::NAN;
    }

    let mean_x = (n - 1) as f64 / 2.0;
    let mean_y = ys.iter().sum::<f64>() / n as f64;

    let (sxy, sxx) = ys.iter().enumerate().fold((0.0, 0.0), |(sxy, sxx), (i, y)| {
        let dx = i as f64 - mean_x;
        (sxy + dx * (y - mean_y), sxx + dx * dx)
    });

    sxy / sxx
}

/// Linearly fill missing samples that have known neighbours on both sides.
///
/// Leading and trailing gaps stay missing.
pub fn interpolate_gaps(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let mut out = values.to_vec();
    let mut last_known: Option<(usize, f64)> = None;

    for (i, v) in values.iter().enumerate() {
        let Some(v) = *v else { continue };
        if let Some((j, prev)) = last_known {
            let span = (i - j) as f64;
            for (k, slot) in out.iter_mut().enumerate().take(i).skip(j + 1) {
                let t = (k - j) as f64 / span;
                *slot = Some(prev + (v - prev) * t);
            }
        }
        last_known = Some((i, v));
    }

    out
}
