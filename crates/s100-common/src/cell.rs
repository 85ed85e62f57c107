//! Tile grid cells and output naming.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::BoundingBox;

#[derive(Debug, Error, PartialEq)]
pub enum CellError {
    #[error("cell polygon needs at least 3 vertices, got {0}")]
    TooFewVertices(usize),

    #[error("cell identifier '{0}' is too short to derive a file name")]
    InvalidId(String),
}

/// One cell of the fixed tile grid.
///
/// Loaded once per run and shared read-only by every tile job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileCell {
    id: String,
    polygon: Vec<[f64; 2]>,
    bounds: BoundingBox,
}

impl TileCell {
    /// Build a cell from its identifier and closed `[lon, lat]` ring.
    pub fn new(id: impl Into<String>, polygon: Vec<[f64; 2]>) -> Result<Self, CellError> {
        let bounds = match BoundingBox::from_vertices(&polygon) {
            Some(bounds) if polygon.len() >= 3 => bounds,
            _ => return Err(CellError::TooFewVertices(polygon.len())),
        };

        Ok(Self {
            id: id.into(),
            polygon,
            bounds,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn polygon(&self) -> &[[f64; 2]] {
        &self.polygon
    }

    pub fn bounds(&self) -> &BoundingBox {
        &self.bounds
    }

    /// Whether `(lon, lat)` falls strictly inside the cell bounds.
    pub fn contains_strict(&self, lon: f64, lat: f64) -> bool {
        self.bounds.contains_point_strict(lon, lat)
    }

    /// Output file stem for a product file-type code.
    ///
    /// The grid encodes cells as e.g. `CA2_4900N12400W`; the product name
    /// keeps the two-letter producer prefix, pads the level digit to three
    /// characters and drops the separator: `104CA0024900N12400W`.
    pub fn file_stem(&self, file_type: &str) -> Result<String, CellError> {
        let chars: Vec<char> = self.id.chars().collect();
        if chars.len() < 5 {
            return Err(CellError::InvalidId(self.id.clone()));
        }

        let prefix: String = chars[..2].iter().collect();
        let suffix: String = chars[4..].iter().collect();
        Ok(format!("{file_type}{prefix}00{}{suffix}", chars[2]))
    }

    /// Output file name (`<stem>.h5`).
    pub fn file_name(&self, file_type: &str) -> Result<String, CellError> {
        Ok(format!("{}.h5", self.file_stem(file_type)?))
    }
}
