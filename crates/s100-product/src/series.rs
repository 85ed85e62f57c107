//! Station Series Assembler.
//!
//! Joins the per-station series of one code into a single table sharing a
//! time index. Column order is the station iteration order; positions and
//! station groups are derived from it and must never be re-sorted.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use s100_common::{SeriesCode, StationHeader, StationRecord};

/// One station's samples aligned to an [`AssembledSeries`] index.
#[derive(Debug, Clone, PartialEq)]
pub struct StationColumn {
    pub header: StationHeader,
    /// `None` where the station has no sample at that index entry.
    pub values: Vec<Option<f64>>,
}

/// A time-indexed table with one column per contributing station.
///
/// The index is strictly increasing. An empty table (no columns) means
/// the dataset type is absent from the tile.
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledSeries {
    code: SeriesCode,
    index: Vec<DateTime<Utc>>,
    columns: Vec<StationColumn>,
}

impl AssembledSeries {
    pub fn empty(code: SeriesCode) -> Self {
        Self {
            code,
            index: Vec::new(),
            columns: Vec::new(),
        }
    }

    /// Outer-join the `code` series of every station that carries one.
    ///
    /// Stations with an empty series are left out. Duplicate timestamps
    /// within a station keep the last sample.
    pub fn assemble(code: SeriesCode, stations: &[&StationRecord]) -> Self {
        let per_station: Vec<(&StationHeader, BTreeMap<DateTime<Utc>, f64>)> = stations
            .iter()
            .filter(|s| s.has_series(code))
            .map(|s| (&s.header, s.series(code).iter().copied().collect()))
            .collect();

        if per_station.is_empty() {
            return Self::empty(code);
        }

        let index: Vec<DateTime<Utc>> = per_station
            .iter()
            .flat_map(|(_, samples)| samples.keys().copied())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let columns = per_station
            .into_iter()
            .map(|(header, samples)| StationColumn {
                header: header.clone(),
                values: index.iter().map(|t| samples.get(t).copied()).collect(),
            })
            .collect();

        Self {
            code,
            index,
            columns,
        }
    }

    pub fn code(&self) -> SeriesCode {
        self.code
    }

    pub fn index(&self) -> &[DateTime<Utc>] {
        &self.index
    }

    pub fn columns(&self) -> &[StationColumn] {
        &self.columns
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Number of index entries.
    pub fn num_times(&self) -> usize {
        self.index.len()
    }

    pub fn num_stations(&self) -> usize {
        self.columns.len()
    }

    /// Sampling interval in seconds, taken from the first two index entries.
    ///
    /// `None` when the table has fewer than two entries.
    pub fn interval_secs(&self) -> Option<i64> {
        match self.index.as_slice() {
            [first, second, ..] => Some((*second - *first).num_seconds()),
            _ => None,
        }
    }

    /// Station latitudes and longitudes, in column order.
    pub fn positions(&self) -> (Vec<f64>, Vec<f64>) {
        self.columns
            .iter()
            .map(|c| (c.header.latitude, c.header.longitude))
            .unzip()
    }

    /// Smallest observed value over all columns.
    pub fn min_value(&self) -> Option<f64> {
        self.observed().reduce(f64::min)
    }

    /// Largest observed value over all columns.
    pub fn max_value(&self) -> Option<f64> {
        self.observed().reduce(f64::max)
    }

    fn observed(&self) -> impl Iterator<Item = f64> + '_ {
        self.columns
            .iter()
            .flat_map(|c| c.values.iter().flatten().copied())
    }

    /// Column values with missing samples replaced by `fill`.
    pub fn filled_column(&self, column: usize, fill: f64) -> Vec<f64> {
        self.columns
            .get(column)
            .map(|c| c.values.iter().map(|v| v.unwrap_or(fill)).collect())
            .unwrap_or_default()
    }

    /// Re-express this table on `other`'s index and column order.
    ///
    /// Columns are matched by station code. Stations of `other` missing
    /// here get an all-missing column; stations only present here are
    /// dropped.
    pub fn reindex_like(&self, other: &AssembledSeries) -> AssembledSeries {
        let rows: HashMap<DateTime<Utc>, usize> = self
            .index
            .iter()
            .enumerate()
            .map(|(i, t)| (*t, i))
            .collect();

        let columns = other
            .columns
            .iter()
            .map(|target| {
                let source = self
                    .columns
                    .iter()
                    .find(|c| c.header.code == target.header.code);
                let values = other
                    .index
                    .iter()
                    .map(|t| {
                        let row = rows.get(t)?;
                        source.and_then(|c| c.values[*row])
                    })
                    .collect();
                StationColumn {
                    header: target.header.clone(),
                    values,
                }
            })
            .collect();

        AssembledSeries {
            code: self.code,
            index: other.index.clone(),
            columns,
        }
    }
}
