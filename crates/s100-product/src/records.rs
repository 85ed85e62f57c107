//! Compound record types stored in product datasets.
//!
//! Field names are part of the external schema and are fixed through
//! `#[hdf5(rename)]`; the Rust names are free.

use hdf5::types::VarLenUnicode;
use hdf5::H5Type;

/// One sample of an S-104 station `values` dataset.
#[derive(H5Type, Clone, Copy, Debug, PartialEq)]
#[repr(C)]
pub struct WaterLevelRecord {
    #[hdf5(rename = "waterLevelHeight")]
    pub height: f64,
    #[hdf5(rename = "waterLevelTrend")]
    pub trend: i8,
}

/// One sample of an S-111 station `values` dataset.
#[derive(H5Type, Clone, Copy, Debug, PartialEq)]
#[repr(C)]
pub struct SurfaceCurrentRecord {
    #[hdf5(rename = "surfaceCurrentSpeed")]
    pub speed: f64,
    #[hdf5(rename = "surfaceCurrentDirection")]
    pub direction: f64,
}

/// One entry of an instance `Positioning/geometryValues` dataset.
#[derive(H5Type, Clone, Copy, Debug, PartialEq)]
#[repr(C)]
pub struct PositionRecord {
    pub latitude: f64,
    pub longitude: f64,
}

/// One row of the `Group_F` feature information table.
#[derive(H5Type, Clone, Debug, PartialEq)]
#[repr(C)]
pub struct FeatureInfoRecord {
    pub code: VarLenUnicode,
    pub name: VarLenUnicode,
    #[hdf5(rename = "uom.name")]
    pub uom: VarLenUnicode,
    #[hdf5(rename = "fillValue")]
    pub fill_value: VarLenUnicode,
    pub datatype: VarLenUnicode,
    pub lower: VarLenUnicode,
    pub upper: VarLenUnicode,
    pub closure: VarLenUnicode,
}

/// S-104 `typeOfWaterLevelData` enumeration.
#[derive(H5Type, Clone, Copy, Debug, PartialEq, Eq)]
#[repr(i32)]
pub enum WaterLevelDataType {
    Observation = 1,
    AstronomicalPrediction = 2,
    AnalysisOrHybrid = 3,
    HydrodynamicHindcast = 4,
    HydrodynamicForecast = 5,
    ObservedMinusPredicted = 6,
    ObservedMinusHindcast = 7,
    ObservedMinusForecast = 9,
    ForecastMinusPredicted = 10,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::{FieldType, ProductProfile, SURFACE_CURRENT, WATER_LEVEL};
    use hdf5::types::{FloatSize, IntSize, TypeDescriptor};

    fn field_names<T: H5Type>() -> Vec<String> {
        match T::type_descriptor() {
            TypeDescriptor::Compound(compound) => {
                compound.fields.iter().map(|f| f.name.clone()).collect()
            }
            other => panic!("expected compound type, got {other:?}"),
        }
    }

    #[test]
    fn test_value_record_field_names() {
        assert_eq!(
            field_names::<WaterLevelRecord>(),
            vec!["waterLevelHeight", "waterLevelTrend"]
        );
        assert_eq!(
            field_names::<SurfaceCurrentRecord>(),
            vec!["surfaceCurrentSpeed", "surfaceCurrentDirection"]
        );
        assert_eq!(field_names::<PositionRecord>(), vec!["latitude", "longitude"]);
    }

    #[test]
    fn test_feature_info_field_names() {
        let names = field_names::<FeatureInfoRecord>();
        assert_eq!(names.len(), 8);
        assert_eq!(names[2], "uom.name");
        assert_eq!(names[3], "fillValue");
    }

    fn fields_of<T: H5Type>() -> Vec<(String, TypeDescriptor)> {
        match T::type_descriptor() {
            TypeDescriptor::Compound(compound) => compound
                .fields
                .into_iter()
                .map(|f| (f.name, f.ty))
                .collect(),
            other => panic!("expected compound type, got {other:?}"),
        }
    }

    fn profile_fields(profile: &ProductProfile) -> Vec<(String, TypeDescriptor)> {
        profile
            .value_fields
            .iter()
            .map(|field| {
                let ty = match field.field_type {
                    FieldType::Float64 => TypeDescriptor::Float(FloatSize::U8),
                    FieldType::Int8 => TypeDescriptor::Integer(IntSize::U1),
                };
                (field.name.to_string(), ty)
            })
            .collect()
    }

    #[test]
    fn test_value_records_match_profiles() {
        assert_eq!(fields_of::<WaterLevelRecord>(), profile_fields(&WATER_LEVEL));
        assert_eq!(fields_of::<SurfaceCurrentRecord>(), profile_fields(&SURFACE_CURRENT));
    }
}
