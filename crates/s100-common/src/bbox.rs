//! Bounding box types and operations.

use serde::{Deserialize, Serialize};

/// A geographic bounding box in WGS84 degrees.
///
/// `x` is longitude and `y` is latitude.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    /// Create a new bounding box from corner coordinates.
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Smallest box enclosing every `[lon, lat]` vertex.
    ///
    /// Returns `None` for an empty vertex list.
    pub fn from_vertices(vertices: &[[f64; 2]]) -> Option<Self> {
        let first = vertices.first()?;
        let init = Self::new(first[0], first[1], first[0], first[1]);

        Some(vertices.iter().skip(1).fold(init, |acc, v| Self {
            min_x: acc.min_x.min(v[0]),
            min_y: acc.min_y.min(v[1]),
            max_x: acc.max_x.max(v[0]),
            max_y: acc.max_y.max(v[1]),
        }))
    }

    /// Check if a point lies strictly inside this bbox.
    ///
    /// Points on any edge are outside, so a point on a line shared by two
    /// adjacent boxes belongs to neither.
    pub fn contains_point_strict(&self, x: f64, y: f64) -> bool {
        x > self.min_x && x < self.max_x && y > self.min_y && y < self.max_y
    }

    pub fn west(&self) -> f64 {
        self.min_x
    }

    pub fn east(&self) -> f64 {
        self.max_x
    }

    pub fn south(&self) -> f64 {
        self.min_y
    }

    pub fn north(&self) -> f64 {
        self.max_y
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_vertices() {
        let ring = [
            [-124.0, 49.0],
            [-123.0, 49.0],
            [-123.0, 50.0],
            [-124.0, 50.0],
            [-124.0, 49.0],
        ];
        let bbox = BoundingBox::from_vertices(&ring).unwrap();
        assert_eq!(bbox.west(), -124.0);
        assert_eq!(bbox.east(), -123.0);
        assert_eq!(bbox.south(), 49.0);
        assert_eq!(bbox.north(), 50.0);
    }

    #[test]
    fn test_from_vertices_empty() {
        assert!(BoundingBox::from_vertices(&[]).is_none());
    }

    #[test]
    fn test_strict_containment_excludes_edges() {
        let bbox = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        assert!(bbox.contains_point_strict(5.0, 5.0));
        assert!(!bbox.contains_point_strict(10.0, 5.0));
        assert!(!bbox.contains_point_strict(5.0, 0.0));
    }
}
