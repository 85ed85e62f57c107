//! Station-to-cell assignment.
//!
//! A station belongs to a cell when its position lies strictly inside the
//! cell's bounding box. Stations exactly on a grid line belong to no cell.

use s100_common::{StationRecord, TileCell};
use tracing::debug;

/// The stations assigned to one non-empty cell.
#[derive(Debug, Clone)]
pub struct CellAssignment<'a> {
    pub cell: &'a TileCell,
    /// Stations inside the cell, in input order.
    pub stations: Vec<&'a StationRecord>,
}

/// Stations whose position falls strictly inside `cell`.
pub fn stations_in_cell<'a>(
    cell: &TileCell,
    stations: &'a [StationRecord],
) -> Vec<&'a StationRecord> {
    stations
        .iter()
        .filter(|s| cell.contains_strict(s.longitude(), s.latitude()))
        .collect()
}

/// Assign stations to cells, dropping cells with no stations.
///
/// Cell order follows the grid; a station may appear under at most one
/// cell unless cells overlap.
pub fn partition<'a>(
    cells: &'a [TileCell],
    stations: &'a [StationRecord],
) -> Vec<CellAssignment<'a>> {
    let assignments: Vec<CellAssignment<'a>> = cells
        .iter()
        .filter_map(|cell| {
            let members = stations_in_cell(cell, stations);
            if members.is_empty() {
                return None;
            }
            debug!(cell = %cell.id(), stations = members.len(), "Assigned stations to cell");
            Some(CellAssignment {
                cell,
                stations: members,
            })
        })
        .collect();

    for station in unassigned_stations(cells, stations) {
        debug!(
            station = %station.code(),
            lat = station.latitude(),
            lon = station.longitude(),
            "Station is outside every cell or on a grid line"
        );
    }

    assignments
}

/// Stations that fall strictly inside no cell.
pub fn unassigned_stations<'a>(
    cells: &[TileCell],
    stations: &'a [StationRecord],
) -> Vec<&'a StationRecord> {
    stations
        .iter()
        .filter(|s| !cells.iter().any(|c| c.contains_strict(s.longitude(), s.latitude())))
        .collect()
}
