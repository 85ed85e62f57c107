//! Static product descriptors.
//!
//! The two product families share the DCF8 layout and differ only in the
//! data captured here plus the product-specific behaviour dispatched on
//! [`Product`] in `format` and `writer`.

use std::fmt;
use std::str::FromStr;

use s100_common::SeriesCode;
use serde::{Deserialize, Serialize};

/// The product families this crate can generate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Product {
    /// S-104 water level.
    #[serde(rename = "s104", alias = "S104", alias = "water_level")]
    WaterLevel,
    /// S-111 surface current.
    #[serde(rename = "s111", alias = "S111", alias = "surface_current")]
    SurfaceCurrent,
}

impl Product {
    pub const ALL: [Product; 2] = [Product::WaterLevel, Product::SurfaceCurrent];

    /// The static descriptor for this product.
    pub fn profile(&self) -> &'static ProductProfile {
        match self {
            Self::WaterLevel => &WATER_LEVEL,
            Self::SurfaceCurrent => &SURFACE_CURRENT,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WaterLevel => "s104",
            Self::SurfaceCurrent => "s111",
        }
    }
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Product {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "s104" | "s-104" | "104" | "waterlevel" | "water_level" => Ok(Self::WaterLevel),
            "s111" | "s-111" | "111" | "surfacecurrent" | "surface_current" => {
                Ok(Self::SurfaceCurrent)
            }
            other => Err(format!("unknown product '{other}', expected s104 or s111")),
        }
    }
}

/// Storage type of a value field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Float64,
    Int8,
}

/// One member of a station `values` record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueField {
    pub name: &'static str,
    pub field_type: FieldType,
}

/// One row of the `Group_F` feature information table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureField {
    pub code: &'static str,
    pub name: &'static str,
    pub uom: &'static str,
    pub fill_value: &'static str,
    pub datatype: &'static str,
    pub lower: &'static str,
    pub upper: &'static str,
    pub closure: &'static str,
}

/// Everything that distinguishes one DCF8 product family from another.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductProfile {
    pub product: Product,
    /// Feature group under the file root, also the instance name prefix.
    pub root_group: &'static str,
    /// Prefix of output file names.
    pub file_type: &'static str,
    pub product_specification: &'static str,
    /// Fields of the per-station `values` compound, in order.
    pub value_fields: [ValueField; 2],
    /// Series codes that become instances, in instance order.
    pub series_codes: &'static [SeriesCode],
    /// Sentinel written where a station has no sample.
    pub fill_value: f64,
    /// Feature attributes receiving the dataset-wide extremes.
    pub min_attr: &'static str,
    pub max_attr: &'static str,
    pub feature_fields: &'static [FeatureField],
}

impl ProductProfile {
    /// Index-derived instance group path, 1-based: `WaterLevel/WaterLevel.01`.
    pub fn instance_path(&self, index: usize) -> String {
        format!("{root}/{root}.{:02}", index + 1, root = self.root_group)
    }

    /// Station group path inside an instance, 1-based: `.../Group_001`.
    pub fn station_group_path(&self, instance_path: &str, index: usize) -> String {
        format!("{instance_path}/Group_{:03}", index + 1)
    }

    /// Positioning group path of an instance.
    pub fn positioning_path(&self, instance_path: &str) -> String {
        format!("{instance_path}/Positioning")
    }

    /// Whether `name` looks like one of this product's instance groups.
    pub fn is_instance_name(&self, name: &str) -> bool {
        name.strip_prefix(self.root_group)
            .and_then(|rest| rest.strip_prefix('.'))
            .map(|n| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()))
            .unwrap_or(false)
    }
}

pub static WATER_LEVEL: ProductProfile = ProductProfile {
    product: Product::WaterLevel,
    root_group: "WaterLevel",
    file_type: "104",
    product_specification: "INT.IHO.S-104.0.0",
    value_fields: [
        ValueField {
            name: "waterLevelHeight",
            field_type: FieldType::Float64,
        },
        ValueField {
            name: "waterLevelTrend",
            field_type: FieldType::Int8,
        },
    ],
    series_codes: &[SeriesCode::Wlo, SeriesCode::Wlf, SeriesCode::Wlp, SeriesCode::Spine],
    fill_value: -9999.0,
    min_attr: "minDatasetHeight",
    max_attr: "maxDatasetHeight",
    feature_fields: &[
        FeatureField {
            code: "waterLevelHeight",
            name: "Water level height",
            uom: "meters",
            fill_value: "-9999",
            datatype: "H5T_FLOAT",
            lower: "-99.99",
            upper: "99.99",
            closure: "closedInterval",
        },
        FeatureField {
            code: "waterLevelTrend",
            name: "Water level trend",
            uom: "",
            fill_value: "0",
            datatype: "H5T_ENUM",
            lower: "",
            upper: "",
            closure: "",
        },
        FeatureField {
            code: "waterLevelTime",
            name: "Water level time",
            uom: "DateTime",
            fill_value: "",
            datatype: "H5T_STRING",
            lower: "19000101T000000Z",
            upper: "21500101T000000Z",
            closure: "closedInterval",
        },
    ],
};

pub static SURFACE_CURRENT: ProductProfile = ProductProfile {
    product: Product::SurfaceCurrent,
    root_group: "SurfaceCurrent",
    file_type: "111",
    product_specification: "INT.IHO.S-111.1.0",
    value_fields: [
        ValueField {
            name: "surfaceCurrentSpeed",
            field_type: FieldType::Float64,
        },
        ValueField {
            name: "surfaceCurrentDirection",
            field_type: FieldType::Float64,
        },
    ],
    series_codes: &[SeriesCode::Wcs],
    fill_value: -1.0,
    min_attr: "minDatasetCurrentSpeed",
    max_attr: "maxDatasetCurrentSpeed",
    feature_fields: &[
        FeatureField {
            code: "surfaceCurrentSpeed",
            name: "Surface current speed",
            uom: "knots",
            fill_value: "-1.0",
            datatype: "H5T_FLOAT",
            lower: "0.0",
            upper: "[]",
            closure: "geSemiInterval",
        },
        FeatureField {
            code: "surfaceCurrentDirection",
            name: "Surface current direction",
            uom: "arc-degrees",
            fill_value: "-1.0",
            datatype: "H5T_FLOAT",
            lower: "0.0",
            upper: "360",
            closure: "geLtInterval",
        },
        FeatureField {
            code: "surfaceCurrentTime",
            name: "Surface current time",
            uom: "DateTime",
            fill_value: "",
            datatype: "H5T_STRING",
            lower: "19000101T000000Z",
            upper: "21500101T000000Z",
            closure: "closedInterval",
        },
    ],
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_from_str() {
        assert_eq!("s104".parse::<Product>().unwrap(), Product::WaterLevel);
        assert_eq!("S-111".parse::<Product>().unwrap(), Product::SurfaceCurrent);
        assert!("s102".parse::<Product>().is_err());
    }

    #[test]
    fn test_paths_are_index_derived() {
        let profile = Product::WaterLevel.profile();
        let instance = profile.instance_path(0);
        assert_eq!(instance, "WaterLevel/WaterLevel.01");
        assert_eq!(profile.instance_path(9), "WaterLevel/WaterLevel.10");
        assert_eq!(profile.station_group_path(&instance, 0), "WaterLevel/WaterLevel.01/Group_001");
        assert_eq!(profile.positioning_path(&instance), "WaterLevel/WaterLevel.01/Positioning");
    }

    #[test]
    fn test_is_instance_name() {
        let profile = Product::SurfaceCurrent.profile();
        assert!(profile.is_instance_name("SurfaceCurrent.01"));
        assert!(!profile.is_instance_name("SurfaceCurrent"));
        assert!(!profile.is_instance_name("Group_F"));
        assert!(!profile.is_instance_name("SurfaceCurrent.x"));
    }

    #[test]
    fn test_profiles_agree_with_group_f() {
        for product in Product::ALL {
            let profile = product.profile();
            assert_eq!(profile.product, product);
            for (field, row) in profile.value_fields.iter().zip(profile.feature_fields) {
                assert_eq!(field.name, row.code);
            }
        }
    }

    #[test]
    fn test_serde_names() {
        let p: Product = serde_json::from_str("\"s111\"").unwrap();
        assert_eq!(p, Product::SurfaceCurrent);
    }
}
