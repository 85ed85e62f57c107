//! Loading of station feature collections and tile grids.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use s100_common::{parse_timestamp, SeriesCode, StationHeader, StationRecord, TileCell, TimeSeries};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{GridError, Result};
use crate::geojson::{Feature, GridCollection, StationCollection, StationProperties};

/// Outcome of loading a station feature collection.
#[derive(Debug, Default)]
pub struct StationLoad {
    /// Stations that passed validation, in input order.
    pub stations: Vec<StationRecord>,
    /// Features excluded because their metadata or series were unusable.
    pub rejected: Vec<RejectedStation>,
}

/// A station feature excluded from processing.
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedStation {
    /// Position of the feature in the collection.
    pub index: usize,
    pub reason: String,
}

/// Read and parse a station feature collection file.
pub fn load_station_collection<P: AsRef<Path>>(path: P) -> Result<StationLoad> {
    let content = fs::read_to_string(path.as_ref())?;
    let load = parse_station_collection(&content)?;

    info!(
        path = %path.as_ref().display(),
        stations = load.stations.len(),
        rejected = load.rejected.len(),
        "Loaded station feature collection"
    );

    Ok(load)
}

/// Parse a station feature collection.
///
/// Invalid JSON fails the whole load. A feature with missing metadata or
/// unreadable series is excluded and reported in [`StationLoad::rejected`].
pub fn parse_station_collection(json: &str) -> Result<StationLoad> {
    let collection: StationCollection = serde_json::from_str(json)?;
    let mut load = StationLoad::default();

    for (index, feature) in collection.features.iter().enumerate() {
        match station_from_feature(index, feature) {
            Ok(station) => load.stations.push(station),
            Err(GridError::MalformedStation { index, reason }) => {
                warn!(index, reason = %reason, "Excluding malformed station feature");
                load.rejected.push(RejectedStation { index, reason });
            }
            Err(e) => return Err(e),
        }
    }

    Ok(load)
}

fn station_from_feature(
    index: usize,
    feature: &Feature<StationProperties>,
) -> Result<StationRecord> {
    let metadata = feature
        .properties
        .metadata
        .as_ref()
        .ok_or_else(|| GridError::malformed_station(index, "missing metadata"))?;

    let code = metadata
        .code
        .clone()
        .ok_or_else(|| GridError::malformed_station(index, "missing metadata.code"))?;
    let name = metadata
        .official_name
        .clone()
        .ok_or_else(|| GridError::malformed_station(index, "missing metadata.officialName"))?;
    let latitude = metadata
        .latitude
        .ok_or_else(|| GridError::malformed_station(index, "missing metadata.latitude"))?;
    let longitude = metadata
        .longitude
        .ok_or_else(|| GridError::malformed_station(index, "missing metadata.longitude"))?;

    let mut station = StationRecord::new(StationHeader::new(code, name, latitude, longitude));

    for (key, value) in &feature.properties.series {
        let Some(series_code) = SeriesCode::from_key(key) else {
            debug!(index, key = %key, "Ignoring unknown station property");
            continue;
        };
        let samples = parse_series(index, series_code, value)?;
        station = station.with_series(series_code, samples);
    }

    Ok(station)
}

/// Parse a `{timestamp: value}` mapping. `null` values are dropped.
fn parse_series(index: usize, code: SeriesCode, value: &Value) -> Result<TimeSeries> {
    let entries = match value {
        Value::Object(entries) => entries,
        Value::Null => return Ok(Vec::new()),
        _ => {
            return Err(GridError::malformed_station(
                index,
                format!("series '{code}' is not a timestamp mapping"),
            ))
        }
    };

    let mut samples = Vec::with_capacity(entries.len());
    for (stamp, sample) in entries {
        let time = parse_timestamp(stamp)
            .map_err(|e| GridError::malformed_station(index, format!("series '{code}': {e}")))?;

        match sample {
            Value::Null => continue,
            Value::Number(n) => match n.as_f64() {
                Some(v) => samples.push((time, v)),
                None => continue,
            },
            other => {
                return Err(GridError::malformed_station(
                    index,
                    format!("series '{code}' has non-numeric value {other} at {stamp}"),
                ))
            }
        }
    }

    Ok(samples)
}

/// Read and parse a tile grid file.
pub fn load_tile_grid<P: AsRef<Path>>(path: P) -> Result<Vec<TileCell>> {
    let content = fs::read_to_string(path.as_ref())?;
    let cells = parse_tile_grid(&content)?;

    info!(path = %path.as_ref().display(), cells = cells.len(), "Loaded tile grid");

    Ok(cells)
}

/// Parse a tile grid. Any invalid cell rejects the whole grid.
///
/// Cell ids must name distinct output files: ids that collapse to the same
/// file stem (including plain duplicates) are rejected.
pub fn parse_tile_grid(json: &str) -> Result<Vec<TileCell>> {
    let collection: GridCollection = serde_json::from_str(json)?;

    let cells = collection
        .features
        .iter()
        .enumerate()
        .map(|(index, feature)| {
            let id = feature
                .properties
                .cell
                .clone()
                .ok_or_else(|| GridError::invalid_cell(index, "missing 'cell' property"))?;
            let ring = feature
                .geometry
                .as_ref()
                .and_then(|g| g.exterior_ring())
                .ok_or_else(|| GridError::invalid_cell(index, "geometry is not a polygon"))?;

            TileCell::new(id, ring).map_err(|e| GridError::invalid_cell(index, e.to_string()))
        })
        .collect::<Result<Vec<_>>>()?;

    check_output_names(&cells)?;
    Ok(cells)
}

fn check_output_names(cells: &[TileCell]) -> Result<()> {
    let mut seen: HashMap<String, &str> = HashMap::with_capacity(cells.len());

    for (index, cell) in cells.iter().enumerate() {
        let stem = cell
            .file_stem("")
            .map_err(|e| GridError::invalid_cell(index, e.to_string()))?;
        if let Some(first) = seen.get(&stem) {
            return Err(GridError::OutputCollision {
                first: first.to_string(),
                second: cell.id().to_string(),
                stem,
            });
        }
        seen.insert(stem, cell.id());
    }

    Ok(())
}
