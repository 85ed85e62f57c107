//! GeoJSON models for the two inputs of a tiling run.
//!
//! Only the members the tiler reads are modelled; everything else in the
//! documents is ignored on deserialization.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A GeoJSON FeatureCollection with typed feature properties.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeatureCollection<P> {
    /// Type identifier (always "FeatureCollection").
    #[serde(rename = "type", default = "feature_collection_type")]
    pub type_: String,

    /// Array of features.
    #[serde(default = "Vec::new")]
    pub features: Vec<Feature<P>>,
}

fn feature_collection_type() -> String {
    "FeatureCollection".to_string()
}

/// A GeoJSON Feature.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Feature<P> {
    /// Type identifier (always "Feature").
    #[serde(rename = "type", default)]
    pub type_: String,

    /// Optional feature identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<serde_json::Value>,

    /// Feature geometry; stations carry a point, grid cells a polygon.
    #[serde(default)]
    pub geometry: Option<Geometry>,

    pub properties: P,
}

/// The geometry kinds the tiler understands.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Geometry {
    Point {
        coordinates: Vec<f64>,
    },
    Polygon {
        /// Rings of positions; the first ring is the exterior.
        coordinates: Vec<Vec<Vec<f64>>>,
    },
    #[serde(other)]
    Unsupported,
}

impl Geometry {
    /// Exterior ring of a polygon as `[lon, lat]` pairs.
    ///
    /// Positions with fewer than two ordinates are dropped; extra
    /// ordinates (elevation) are ignored.
    pub fn exterior_ring(&self) -> Option<Vec<[f64; 2]>> {
        match self {
            Geometry::Polygon { coordinates } => coordinates.first().map(|ring| {
                ring.iter()
                    .filter(|pos| pos.len() >= 2)
                    .map(|pos| [pos[0], pos[1]])
                    .collect()
            }),
            _ => None,
        }
    }
}

/// Properties of a station feature.
///
/// `metadata` identifies the station; every other key is a candidate
/// time series (`wlo`, `wlp`, ...) mapping ISO timestamps to values.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StationProperties {
    #[serde(default)]
    pub metadata: Option<StationMetadata>,

    #[serde(flatten)]
    pub series: BTreeMap<String, serde_json::Value>,
}

/// Station metadata as published by the station-data service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StationMetadata {
    #[serde(default)]
    pub code: Option<String>,

    #[serde(rename = "officialName", default)]
    pub official_name: Option<String>,

    #[serde(default)]
    pub latitude: Option<f64>,

    #[serde(default)]
    pub longitude: Option<f64>,
}

/// Properties of a tile grid feature.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CellProperties {
    #[serde(default)]
    pub cell: Option<String>,
}

pub type StationCollection = FeatureCollection<StationProperties>;
pub type GridCollection = FeatureCollection<CellProperties>;
