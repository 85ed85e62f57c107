//! In-memory backend with the same semantics as the HDF5 one.

use std::collections::BTreeMap;

use super::{parent_path, AttrValue, ProductStore};
use crate::error::{ProductError, Result};
use crate::format::StationValues;
use crate::profile::FeatureField;
use crate::records::{PositionRecord, SurfaceCurrentRecord, WaterLevelRecord};

#[derive(Debug, Clone, PartialEq)]
pub enum MemoryDataset {
    WaterLevel(Vec<WaterLevelRecord>),
    SurfaceCurrent(Vec<SurfaceCurrentRecord>),
    Positions(Vec<PositionRecord>),
    FeatureTable(Vec<FeatureField>),
    Strings(Vec<String>),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryGroup {
    pub attrs: BTreeMap<String, AttrValue>,
    pub datasets: BTreeMap<String, MemoryDataset>,
}

/// A product held in memory, keyed by normalized group path.
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryStore {
    groups: BTreeMap<String, MemoryGroup>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn key(path: &str) -> String {
    path.trim_matches('/').to_string()
}

impl MemoryStore {
    /// A store holding only the root group.
    pub fn new() -> Self {
        let mut groups = BTreeMap::new();
        groups.insert(String::new(), MemoryGroup::default());
        Self { groups }
    }

    pub fn group(&self, path: &str) -> Option<&MemoryGroup> {
        self.groups.get(&key(path))
    }

    pub fn attr(&self, group: &str, name: &str) -> Option<&AttrValue> {
        self.group(group)?.attrs.get(name)
    }

    pub fn dataset(&self, group: &str, name: &str) -> Option<&MemoryDataset> {
        self.group(group)?.datasets.get(name)
    }

    fn group_mut(&mut self, path: &str) -> Result<&mut MemoryGroup> {
        self.groups
            .get_mut(&key(path))
            .ok_or_else(|| ProductError::schema_violation(format!("group {path} does not exist")))
    }

    fn insert_dataset(&mut self, group: &str, name: &str, dataset: MemoryDataset) -> Result<()> {
        let target = self.group_mut(group)?;
        if target.datasets.contains_key(name) {
            return Err(ProductError::schema_violation(format!(
                "dataset {group}/{name} exists already"
            )));
        }
        target.datasets.insert(name.to_string(), dataset);
        Ok(())
    }
}

impl ProductStore for MemoryStore {
    fn group_exists(&self, path: &str) -> Result<bool> {
        Ok(self.groups.contains_key(&key(path)))
    }

    fn create_group(&mut self, path: &str) -> Result<()> {
        let k = key(path);
        if self.groups.contains_key(&k) {
            return Err(ProductError::schema_violation(format!(
                "group {path} exists already, cannot recreate it"
            )));
        }
        if let Some(parent) = parent_path(path) {
            if !self.groups.contains_key(&key(parent)) {
                return Err(ProductError::schema_violation(format!(
                    "parent of group {path} does not exist"
                )));
            }
        }
        self.groups.insert(k, MemoryGroup::default());
        Ok(())
    }

    fn member_names(&self, path: &str) -> Result<Vec<String>> {
        let group = self
            .group(path)
            .ok_or_else(|| ProductError::schema_violation(format!("group {path} does not exist")))?;
        let parent = key(path);

        let mut names: Vec<String> = self
            .groups
            .keys()
            .filter(|k| !k.is_empty())
            .filter_map(|k| {
                let (p, name) = k.rsplit_once('/').unwrap_or(("", k.as_str()));
                (p == parent).then(|| name.to_string())
            })
            .collect();
        names.extend(group.datasets.keys().cloned());
        names.sort();
        Ok(names)
    }

    fn set_attr(&mut self, group: &str, name: &str, value: &AttrValue) -> Result<()> {
        self.group_mut(group)?
            .attrs
            .insert(name.to_string(), value.clone());
        Ok(())
    }

    fn write_values(&mut self, group: &str, values: &StationValues) -> Result<()> {
        let dataset = match values {
            StationValues::WaterLevel(v) => MemoryDataset::WaterLevel(v.clone()),
            StationValues::SurfaceCurrent(v) => MemoryDataset::SurfaceCurrent(v.clone()),
        };
        self.insert_dataset(group, "values", dataset)
    }

    fn write_positions(&mut self, group: &str, positions: &[PositionRecord]) -> Result<()> {
        self.insert_dataset(group, "geometryValues", MemoryDataset::Positions(positions.to_vec()))
    }

    fn write_feature_table(
        &mut self,
        group: &str,
        name: &str,
        rows: &[FeatureField],
    ) -> Result<()> {
        self.insert_dataset(group, name, MemoryDataset::FeatureTable(rows.to_vec()))
    }

    fn write_strings(&mut self, group: &str, name: &str, values: &[&str]) -> Result<()> {
        let strings = values.iter().map(|s| s.to_string()).collect();
        self.insert_dataset(group, name, MemoryDataset::Strings(strings))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::ROOT;

    #[test]
    fn test_create_requires_parent_and_rejects_duplicates() {
        let mut store = MemoryStore::new();
        assert!(store.create_group("WaterLevel/WaterLevel.01").is_err());

        store.create_group("WaterLevel").unwrap();
        store.create_group("WaterLevel/WaterLevel.01").unwrap();
        assert!(matches!(
            store.create_group("/WaterLevel/"),
            Err(ProductError::SchemaViolation(_))
        ));
    }

    #[test]
    fn test_set_attr_overwrites() {
        let mut store = MemoryStore::new();
        store.set_attr(ROOT, "issueTime", &AttrValue::from("000000Z")).unwrap();
        store.set_attr(ROOT, "issueTime", &AttrValue::from("120000Z")).unwrap();
        assert_eq!(store.group(ROOT).unwrap().attrs.len(), 1);
        assert_eq!(store.attr(ROOT, "issueTime"), Some(&AttrValue::from("120000Z")));
    }

    #[test]
    fn test_member_names() {
        let mut store = MemoryStore::new();
        store.create_group("WaterLevel").unwrap();
        store.create_group("WaterLevel/WaterLevel.01").unwrap();
        store.create_group("Group_F").unwrap();
        store.write_strings("Group_F", "featureCode", &["WaterLevel"]).unwrap();

        assert_eq!(store.member_names(ROOT).unwrap(), vec!["Group_F", "WaterLevel"]);
        assert_eq!(store.member_names("WaterLevel").unwrap(), vec!["WaterLevel.01"]);
        assert_eq!(store.member_names("Group_F").unwrap(), vec!["featureCode"]);
    }
}
