//! Input side of the tiler.
//!
//! Loads the station feature collection produced by the station-data
//! fetcher and the static tile grid, then assigns stations to cells.
//!
//! ```text
//! stations.json ──► load_station_collection ──┐
//!                                              ├─► partition ──► Vec<CellAssignment>
//! grid.json ──────► load_tile_grid ───────────┘
//! ```

pub mod error;
pub mod geojson;
pub mod loader;
pub mod partition;

pub use error::{GridError, Result};
pub use loader::{
    load_station_collection, load_tile_grid, parse_station_collection, parse_tile_grid,
    RejectedStation, StationLoad,
};
pub use partition::{partition, stations_in_cell, unassigned_stations, CellAssignment};
