//! Product store abstraction.
//!
//! The writer talks to the output file only through [`ProductStore`], a
//! thin layer of idempotent attribute writes and create-once groups and
//! datasets. [`Hdf5Store`] is the real file; [`MemoryStore`] mirrors its
//! semantics for tests and dry runs.

mod hdf5_file;
mod memory;

pub use hdf5_file::{silence_hdf5_errors, Hdf5Store};
pub use memory::{MemoryDataset, MemoryGroup, MemoryStore};

use crate::error::Result;
use crate::format::StationValues;
use crate::profile::FeatureField;
use crate::records::{PositionRecord, WaterLevelDataType};

/// Path of the file root group.
pub const ROOT: &str = "/";

/// A scalar attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Float(f64),
    Int(i32),
    /// Counts.
    UInt(u32),
    /// Small S-100 enumerations.
    Byte(u8),
    Text(String),
    WaterLevelType(WaterLevelDataType),
}

impl From<f64> for AttrValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<u32> for AttrValue {
    fn from(v: u32) -> Self {
        Self::UInt(v)
    }
}

impl From<&str> for AttrValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

/// Storage operations needed to build a DCF8 product.
///
/// Group paths are `/`-separated and relative to the file root; [`ROOT`]
/// names the root itself.
pub trait ProductStore {
    /// Whether a group exists at `path`.
    fn group_exists(&self, path: &str) -> Result<bool>;

    /// Create a group. Fails with a schema violation if it already exists.
    fn create_group(&mut self, path: &str) -> Result<()>;

    /// Names of the direct members (groups and datasets) of a group.
    fn member_names(&self, path: &str) -> Result<Vec<String>>;

    /// Create or overwrite a scalar attribute on a group.
    fn set_attr(&mut self, group: &str, name: &str, value: &AttrValue) -> Result<()>;

    /// Write a station group's `values` dataset.
    fn write_values(&mut self, group: &str, values: &StationValues) -> Result<()>;

    /// Write a `geometryValues` dataset into a positioning group.
    fn write_positions(&mut self, group: &str, positions: &[PositionRecord]) -> Result<()>;

    /// Write a feature information table.
    fn write_feature_table(&mut self, group: &str, name: &str, rows: &[FeatureField]) -> Result<()>;

    /// Write a one-dimensional string dataset.
    fn write_strings(&mut self, group: &str, name: &str, values: &[&str]) -> Result<()>;
}

/// Parent path of a group path; `None` for the root.
pub(crate) fn parent_path(path: &str) -> Option<&str> {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.rsplit_once('/').map(|(parent, _)| parent).unwrap_or(ROOT))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parent_path() {
        assert_eq!(parent_path("/"), None);
        assert_eq!(parent_path("WaterLevel"), Some(ROOT));
        assert_eq!(parent_path("/WaterLevel/WaterLevel.01"), Some("WaterLevel"));
        assert_eq!(
            parent_path("WaterLevel/WaterLevel.01/Group_001"),
            Some("WaterLevel/WaterLevel.01")
        );
    }
}
