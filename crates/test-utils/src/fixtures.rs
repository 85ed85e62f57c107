//! Common test fixtures for the tiling tests.
//!
//! This module provides stations, cells and the GeoJSON documents the
//! loaders consume, so integration tests can exercise the full input path.

use std::fs;
use std::path::{Path, PathBuf};

use s100_common::{SeriesCode, StationHeader, StationRecord, TileCell};
use serde_json::{json, Map, Value};

/// Well-known cell identifiers and extents.
pub mod cells {
    /// Cell covering Burrard Inlet and the Strait of Georgia approaches.
    pub const VANCOUVER_ID: &str = "CA2_4900N12400W";
    /// (west, south, east, north)
    pub const VANCOUVER: (f64, f64, f64, f64) = (-124.0, 49.0, -123.0, 50.0);

    /// Neighbouring cell to the west, sharing the -124 meridian.
    pub const NANAIMO_ID: &str = "CA2_4900N12500W";
    pub const NANAIMO: (f64, f64, f64, f64) = (-125.0, 49.0, -124.0, 50.0);
}

/// A rectangular cell from `(west, south, east, north)` extents.
pub fn rect_cell(id: &str, extent: (f64, f64, f64, f64)) -> TileCell {
    let (west, south, east, north) = extent;
    let ring = vec![
        [west, south],
        [east, south],
        [east, north],
        [west, north],
        [west, south],
    ];
    match TileCell::new(id, ring) {
        Ok(cell) => cell,
        Err(e) => panic!("fixture cell '{id}' is invalid: {e}"),
    }
}

/// The default single-cell grid used by most tests.
pub fn vancouver_cell() -> TileCell {
    rect_cell(cells::VANCOUVER_ID, cells::VANCOUVER)
}

/// A station with no series attached.
pub fn station(code: &str, name: &str, latitude: f64, longitude: f64) -> StationRecord {
    StationRecord::new(StationHeader::new(code, name, latitude, longitude))
}

/// Point Atkinson (07795), inside [`vancouver_cell`].
pub fn point_atkinson() -> StationRecord {
    station("07795", "Point Atkinson", 49.337, -123.253)
}

/// Vancouver harbour (07735), inside [`vancouver_cell`].
pub fn vancouver_harbour() -> StationRecord {
    station("07735", "Vancouver", 49.287, -123.110)
}

/// Serialize a station the way the station-data fetcher publishes it.
pub fn station_feature(station: &StationRecord) -> Value {
    let mut properties = Map::new();
    properties.insert(
        "metadata".to_string(),
        json!({
            "code": station.header.code,
            "officialName": station.header.name,
            "latitude": station.header.latitude,
            "longitude": station.header.longitude,
        }),
    );

    for code in SeriesCode::ALL {
        let samples: Map<String, Value> = station
            .series(code)
            .iter()
            .map(|(t, v)| (t.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string(), json!(v)))
            .collect();
        if !samples.is_empty() {
            properties.insert(code.as_str().to_string(), Value::Object(samples));
        }
    }

    json!({
        "type": "Feature",
        "id": station.header.code,
        "geometry": {
            "type": "Point",
            "coordinates": [station.header.longitude, station.header.latitude],
        },
        "properties": properties,
    })
}

/// A station feature collection document.
pub fn station_collection_json(stations: &[StationRecord]) -> String {
    json!({
        "type": "FeatureCollection",
        "features": stations.iter().map(station_feature).collect::<Vec<_>>(),
    })
    .to_string()
}

/// A tile grid document.
pub fn grid_json(cells: &[TileCell]) -> String {
    let features: Vec<Value> = cells
        .iter()
        .map(|cell| {
            json!({
                "type": "Feature",
                "geometry": {"type": "Polygon", "coordinates": [cell.polygon()]},
                "properties": {"cell": cell.id()},
            })
        })
        .collect();

    json!({"type": "FeatureCollection", "features": features}).to_string()
}

/// Write `content` to `dir/name` and return the path.
pub fn write_fixture(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    if let Err(e) = fs::write(&path, content) {
        panic!("failed to write fixture {}: {e}", path.display());
    }
    path
}

/// A fresh scratch directory removed when dropped.
pub fn scratch_dir() -> tempfile::TempDir {
    match tempfile::tempdir() {
        Ok(dir) => dir,
        Err(e) => panic!("failed to create scratch directory: {e}"),
    }
}
