//! Product-specific formatting of a cell's stations into write-ready arrays.
//!
//! This is the only place where the two product families take different
//! paths before writing: water level builds one instance per available
//! series code and derives trends; surface current pairs speed with
//! direction in a single instance.

use chrono::{DateTime, Utc};
use s100_common::{SeriesCode, StationHeader, StationRecord};
use tracing::debug;

use crate::config::TrendConfig;
use crate::profile::Product;
use crate::records::{PositionRecord, SurfaceCurrentRecord, WaterLevelRecord};
use crate::series::AssembledSeries;
use crate::trend::compute_trends;

/// Time bounds shared by every station of one instance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeAxis {
    pub first: DateTime<Utc>,
    pub last: DateTime<Utc>,
    pub count: usize,
    /// Seconds between consecutive records; 0 for a single record.
    pub interval_secs: i64,
}

impl TimeAxis {
    fn of(series: &AssembledSeries) -> Option<Self> {
        let index = series.index();
        Some(Self {
            first: *index.first()?,
            last: *index.last()?,
            count: index.len(),
            interval_secs: series.interval_secs().unwrap_or(0),
        })
    }
}

/// The `values` dataset of one station group.
#[derive(Debug, Clone, PartialEq)]
pub enum StationValues {
    WaterLevel(Vec<WaterLevelRecord>),
    SurfaceCurrent(Vec<SurfaceCurrentRecord>),
}

impl StationValues {
    pub fn len(&self) -> usize {
        match self {
            Self::WaterLevel(v) => v.len(),
            Self::SurfaceCurrent(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StationGroupData {
    pub header: StationHeader,
    pub values: StationValues,
}

/// One instance group: a dataset type and its stations, in column order.
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceData {
    pub code: SeriesCode,
    pub times: TimeAxis,
    pub stations: Vec<StationGroupData>,
}

impl InstanceData {
    /// Positioning entries, index-aligned with `stations`.
    pub fn positions(&self) -> Vec<PositionRecord> {
        self.stations
            .iter()
            .map(|s| PositionRecord {
                latitude: s.header.latitude,
                longitude: s.header.longitude,
            })
            .collect()
    }
}

/// Everything the writer needs for one cell.
#[derive(Debug, Clone, PartialEq)]
pub struct TileData {
    pub product: Product,
    /// Extremes of the raw values before fill substitution.
    pub dataset_min: f64,
    pub dataset_max: f64,
    /// Threshold the trend flags were derived with (water level only).
    pub trend_threshold: Option<f64>,
    /// Present dataset types only; never contains an empty instance.
    pub instances: Vec<InstanceData>,
}

impl TileData {
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Total number of station groups over all instances.
    pub fn station_groups(&self) -> usize {
        self.instances.iter().map(|i| i.stations.len()).sum()
    }
}

impl Product {
    /// Format the stations of one cell for writing.
    pub fn format(&self, stations: &[&StationRecord], trend: &TrendConfig) -> TileData {
        match self {
            Self::WaterLevel => format_water_level(stations, trend),
            Self::SurfaceCurrent => format_surface_current(stations),
        }
    }
}

fn extremes<'a>(tables: impl IntoIterator<Item = &'a AssembledSeries>) -> (f64, f64) {
    tables.into_iter().fold((f64::NAN, f64::NAN), |(lo, hi), t| {
        (
            t.min_value().map_or(lo, |v| v.min(lo)),
            t.max_value().map_or(hi, |v| v.max(hi)),
        )
    })
}

fn format_water_level(stations: &[&StationRecord], trend: &TrendConfig) -> TileData {
    let profile = Product::WaterLevel.profile();
    let tables: Vec<AssembledSeries> = profile
        .series_codes
        .iter()
        .map(|code| AssembledSeries::assemble(*code, stations))
        .collect();

    let (dataset_min, dataset_max) = extremes(&tables);

    let instances = tables
        .iter()
        .filter_map(|table| {
            let times = TimeAxis::of(table)?;
            let trends = compute_trends(table, trend);

            let stations = table
                .columns()
                .iter()
                .enumerate()
                .map(|(i, column)| {
                    let records = table
                        .filled_column(i, profile.fill_value)
                        .into_iter()
                        .zip(trends.column(i))
                        .map(|(height, flag)| WaterLevelRecord {
                            height,
                            trend: flag.code(),
                        })
                        .collect();
                    StationGroupData {
                        header: column.header.clone(),
                        values: StationValues::WaterLevel(records),
                    }
                })
                .collect();

            debug!(
                code = %table.code(),
                stations = table.num_stations(),
                times = times.count,
                "Formatted water level instance"
            );
            Some(InstanceData {
                code: table.code(),
                times,
                stations,
            })
        })
        .collect();

    TileData {
        product: Product::WaterLevel,
        dataset_min,
        dataset_max,
        trend_threshold: Some(trend.threshold),
        instances,
    }
}

fn format_surface_current(stations: &[&StationRecord]) -> TileData {
    let profile = Product::SurfaceCurrent.profile();
    let speeds = AssembledSeries::assemble(SeriesCode::Wcs, stations);
    let directions = AssembledSeries::assemble(SeriesCode::Wcd, stations).reindex_like(&speeds);

    let (dataset_min, dataset_max) = extremes([&speeds]);

    let instances = TimeAxis::of(&speeds)
        .filter(|_| !speeds.is_empty())
        .map(|times| {
            let stations = speeds
                .columns()
                .iter()
                .enumerate()
                .map(|(i, column)| {
                    let records = speeds
                        .filled_column(i, profile.fill_value)
                        .into_iter()
                        .zip(directions.filled_column(i, profile.fill_value))
                        .map(|(speed, direction)| SurfaceCurrentRecord { speed, direction })
                        .collect();
                    StationGroupData {
                        header: column.header.clone(),
                        values: StationValues::SurfaceCurrent(records),
                    }
                })
                .collect();

            debug!(
                stations = speeds.num_stations(),
                times = times.count,
                "Formatted surface current instance"
            );
            InstanceData {
                code: SeriesCode::Wcs,
                times,
                stations,
            }
        })
        .into_iter()
        .collect();

    TileData {
        product: Product::SurfaceCurrent,
        dataset_min,
        dataset_max,
        trend_threshold: None,
        instances,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trend::TrendFlag;
    use test_utils::{
        base_time, constant_series, linear_series, point_atkinson, time_axis, vancouver_harbour,
    };

    #[test]
    fn test_water_level_instances_in_code_order() {
        let a = point_atkinson()
            .with_series(SeriesCode::Wlp, constant_series(base_time(), 900, 4, 1.0))
            .with_series(SeriesCode::Wlo, constant_series(base_time(), 900, 4, 1.1));
        let b = vancouver_harbour()
            .with_series(SeriesCode::Spine, constant_series(base_time(), 900, 4, 0.9));

        let tile = Product::WaterLevel.format(&[&a, &b], &TrendConfig::default());
        let codes: Vec<SeriesCode> = tile.instances.iter().map(|i| i.code).collect();
        assert_eq!(codes, vec![SeriesCode::Wlo, SeriesCode::Wlp, SeriesCode::Spine]);
        assert_eq!(tile.dataset_min, 0.9);
        assert_eq!(tile.dataset_max, 1.1);
        assert_eq!(tile.trend_threshold, Some(0.2));
        assert_eq!(tile.station_groups(), 3);
    }

    #[test]
    fn test_extremes_ignore_fill() {
        let a = point_atkinson()
            .with_series(SeriesCode::Wlo, constant_series(base_time(), 900, 4, 2.0));
        let late = time_axis(base_time(), 900, 3)[2];
        let b = vancouver_harbour()
            .with_series(SeriesCode::Wlo, constant_series(late, 900, 4, 3.0));

        let tile = Product::WaterLevel.format(&[&a, &b], &TrendConfig::default());
        assert_eq!(tile.dataset_min, 2.0);
        assert_eq!(tile.dataset_max, 3.0);

        let instance = &tile.instances[0];
        assert_eq!(instance.times.count, 6);
        match &instance.stations[0].values {
            StationValues::WaterLevel(records) => {
                assert_eq!(records[5].height, -9999.0);
                assert_eq!(records[5].trend, TrendFlag::Unknown.code());
            }
            other => panic!("unexpected values {other:?}"),
        }
    }

    #[test]
    fn test_surface_current_pairs_speed_and_direction() {
        let a = point_atkinson()
            .with_series(SeriesCode::Wcs, linear_series(base_time(), 600, 3, 0.5, 0.25))
            .with_series(SeriesCode::Wcd, constant_series(base_time(), 600, 2, 180.0));
        let b = vancouver_harbour()
            .with_series(SeriesCode::Wcd, constant_series(base_time(), 600, 3, 90.0));

        let tile = Product::SurfaceCurrent.format(&[&a, &b], &TrendConfig::default());
        assert_eq!(tile.instances.len(), 1);
        assert_eq!(tile.trend_threshold, None);
        assert_eq!(tile.dataset_min, 0.5);
        assert_eq!(tile.dataset_max, 1.0);

        let instance = &tile.instances[0];
        assert_eq!(instance.stations.len(), 1);
        assert_eq!(instance.times.interval_secs, 600);
        assert_eq!(
            instance.stations[0].values,
            StationValues::SurfaceCurrent(vec![
                SurfaceCurrentRecord { speed: 0.5, direction: 180.0 },
                SurfaceCurrentRecord { speed: 0.75, direction: 180.0 },
                SurfaceCurrentRecord { speed: 1.0, direction: -1.0 },
            ])
        );
    }

    #[test]
    fn test_no_series_yields_empty_tile() {
        let a = point_atkinson();
        assert!(Product::WaterLevel.format(&[&a], &TrendConfig::default()).is_empty());

        let b = vancouver_harbour()
            .with_series(SeriesCode::Wcd, constant_series(base_time(), 600, 3, 90.0));
        assert!(Product::SurfaceCurrent.format(&[&b], &TrendConfig::default()).is_empty());
    }

    #[test]
    fn test_positions_align_with_stations() {
        let a = point_atkinson()
            .with_series(SeriesCode::Wlo, constant_series(base_time(), 900, 2, 1.0));
        let b = vancouver_harbour()
            .with_series(SeriesCode::Wlo, constant_series(base_time(), 900, 2, 1.0));

        let tile = Product::WaterLevel.format(&[&b, &a], &TrendConfig::default());
        let instance = &tile.instances[0];
        let positions = instance.positions();
        assert_eq!(positions.len(), instance.stations.len());
        for (pos, station) in positions.iter().zip(&instance.stations) {
            assert_eq!(pos.latitude, station.header.latitude);
            assert_eq!(pos.longitude, station.header.longitude);
        }
        assert_eq!(instance.stations[0].header.code, "07735");
    }
}
