//! Template schema checks and skeleton template construction.
//!
//! A template carries the per-product static metadata: root attributes
//! that never change per tile, the empty feature group and the `Group_F`
//! feature information table. The writer only ever populates it.

use std::path::Path;

use tracing::info;

use crate::error::{ProductError, Result};
use crate::profile::{Product, ProductProfile};
use crate::store::{AttrValue, Hdf5Store, ProductStore, ROOT};

/// Feature information group name.
pub const GROUP_F: &str = "Group_F";

/// Structural expectations of a product template.
#[derive(Debug, Clone, Copy)]
pub struct TemplateSchema {
    profile: &'static ProductProfile,
}

impl TemplateSchema {
    pub fn new(product: Product) -> Self {
        Self {
            profile: product.profile(),
        }
    }

    pub fn profile(&self) -> &'static ProductProfile {
        self.profile
    }

    /// Check that a store can receive a tile.
    ///
    /// The feature group must exist and must not contain any instance
    /// group yet; instances are always created by the writer.
    pub fn validate<S: ProductStore>(&self, store: &S) -> Result<()> {
        let root_group = self.profile.root_group;
        if !store.group_exists(root_group)? {
            return Err(ProductError::schema_violation(format!(
                "template has no '{root_group}' feature group"
            )));
        }

        if let Some(existing) = store
            .member_names(root_group)?
            .into_iter()
            .find(|name| self.profile.is_instance_name(name))
        {
            return Err(ProductError::schema_violation(format!(
                "template already contains instance group {root_group}/{existing}"
            )));
        }

        Ok(())
    }

    /// Static attributes of the file root.
    pub fn root_defaults(&self) -> Vec<(&'static str, AttrValue)> {
        let mut attrs = vec![
            ("productSpecification", AttrValue::from(self.profile.product_specification)),
            ("epoch", AttrValue::from("G1762")),
            ("horizontalCRS", AttrValue::Int(4326)),
            ("horizontalDatumReference", AttrValue::from("EPSG")),
            ("eastBoundLongitude", AttrValue::Float(0.0)),
            ("westBoundLongitude", AttrValue::Float(0.0)),
            ("northBoundLatitude", AttrValue::Float(0.0)),
            ("southBoundLatitude", AttrValue::Float(0.0)),
            ("geographicIdentifier", AttrValue::from("")),
            ("issueDate", AttrValue::from("")),
            ("issueTime", AttrValue::from("")),
            ("metadata", AttrValue::from("")),
        ];

        match self.profile.product {
            Product::WaterLevel => attrs.extend([
                ("verticalCS", AttrValue::Int(6499)),
                ("verticalCoordinateBase", AttrValue::Byte(2)),
                ("verticalDatum", AttrValue::Int(12)),
                ("verticalDatumReference", AttrValue::Byte(1)),
                ("waterLevelTrendThreshold", AttrValue::Float(0.2)),
            ]),
            Product::SurfaceCurrent => attrs.push(("depthTypeIndex", AttrValue::Byte(2))),
        }

        attrs
    }

    /// Static attributes of the feature group.
    pub fn feature_defaults(&self) -> Vec<(&'static str, AttrValue)> {
        let mut attrs = vec![
            ("dataCodingFormat", AttrValue::Byte(8)),
            ("dimension", AttrValue::Byte(2)),
            ("commonPointRule", AttrValue::Byte(4)),
            ("horizontalPositionUncertainty", AttrValue::Float(-1.0)),
            ("numInstances", AttrValue::UInt(0)),
            (self.profile.min_attr, AttrValue::Float(self.profile.fill_value)),
            (self.profile.max_attr, AttrValue::Float(self.profile.fill_value)),
        ];

        match self.profile.product {
            Product::WaterLevel => attrs.extend([
                ("methodWaterLevelProduct", AttrValue::from("")),
                ("pickPriorityType", AttrValue::from("")),
                ("timeUncertainty", AttrValue::Float(-1.0)),
                ("verticalUncertainty", AttrValue::Float(-1.0)),
            ]),
            Product::SurfaceCurrent => attrs.extend([
                ("typeOfCurrentData", AttrValue::Byte(1)),
                ("verticalPositionUncertainty", AttrValue::Float(-1.0)),
            ]),
        }

        attrs
    }

    /// Write the static skeleton into an empty store.
    pub fn apply_skeleton<S: ProductStore>(&self, store: &mut S) -> Result<()> {
        for (name, value) in self.root_defaults() {
            store.set_attr(ROOT, name, &value)?;
        }

        store.create_group(GROUP_F)?;
        store.write_strings(GROUP_F, "featureCode", &[self.profile.root_group])?;
        store.write_feature_table(GROUP_F, self.profile.root_group, self.profile.feature_fields)?;

        store.create_group(self.profile.root_group)?;
        for (name, value) in self.feature_defaults() {
            store.set_attr(self.profile.root_group, name, &value)?;
        }

        Ok(())
    }
}

/// Write a minimal valid template for `product` to `path`.
pub fn create_skeleton_template(product: Product, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let mut store = Hdf5Store::create(path)?;
    TemplateSchema::new(product).apply_skeleton(&mut store)?;
    store.flush()?;

    info!(product = %product, path = %path.display(), "Created skeleton template");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryDataset, MemoryStore};

    #[test]
    fn test_skeleton_passes_validation() {
        for product in Product::ALL {
            let schema = TemplateSchema::new(product);
            let mut store = MemoryStore::new();
            schema.apply_skeleton(&mut store).unwrap();
            schema.validate(&store).unwrap();

            let profile = product.profile();
            assert_eq!(
                store.attr(ROOT, "productSpecification"),
                Some(&AttrValue::from(profile.product_specification))
            );
            assert_eq!(
                store.attr(profile.root_group, "dataCodingFormat"),
                Some(&AttrValue::Byte(8))
            );
            match store.dataset(GROUP_F, profile.root_group) {
                Some(MemoryDataset::FeatureTable(rows)) => assert_eq!(rows.len(), 3),
                other => panic!("unexpected Group_F table {other:?}"),
            }
        }
    }

    #[test]
    fn test_missing_feature_group() {
        let store = MemoryStore::new();
        let err = TemplateSchema::new(Product::WaterLevel).validate(&store).unwrap_err();
        assert!(matches!(err, ProductError::SchemaViolation(_)));
    }

    #[test]
    fn test_existing_instance_rejected() {
        let schema = TemplateSchema::new(Product::SurfaceCurrent);
        let mut store = MemoryStore::new();
        schema.apply_skeleton(&mut store).unwrap();
        store.create_group("SurfaceCurrent/SurfaceCurrent.01").unwrap();

        let err = schema.validate(&store).unwrap_err();
        assert!(err.to_string().contains("SurfaceCurrent.01"));
    }

    #[test]
    fn test_product_specific_defaults() {
        let wl = TemplateSchema::new(Product::WaterLevel);
        assert!(wl.root_defaults().iter().any(|(n, _)| *n == "waterLevelTrendThreshold"));
        assert!(wl.feature_defaults().iter().any(|(n, _)| *n == "minDatasetHeight"));

        let sc = TemplateSchema::new(Product::SurfaceCurrent);
        assert!(sc.root_defaults().iter().any(|(n, _)| *n == "depthTypeIndex"));
        assert!(!sc.root_defaults().iter().any(|(n, _)| *n == "verticalCS"));
        assert!(sc.feature_defaults().iter().any(|(n, _)| *n == "maxDatasetCurrentSpeed"));
    }
}
