//! Binary Product Writer.
//!
//! Builds one product file in a fixed order: general (root) metadata,
//! feature metadata, then per instance the instance group, its station
//! groups and its positioning group. Attribute writes are create-or-
//! overwrite; groups and datasets are create-once.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use s100_common::{
    format_issue_date, format_issue_time, format_s100_datetime, SeriesCode, TileCell,
};
use tracing::{debug, warn};

use crate::error::{ProductError, Result};
use crate::format::{InstanceData, TileData};
use crate::profile::{Product, ProductProfile};
use crate::records::WaterLevelDataType;
use crate::store::{AttrValue, Hdf5Store, ProductStore, ROOT};
use crate::template::TemplateSchema;

/// Depth of S-111 surface currents below the surface, in metres.
pub const SURFACE_CURRENT_DEPTH: f64 = 1.0;

/// `timeIntervalIndex` value for regularly spaced records.
const REGULAR_INTERVAL: u8 = 1;

/// What a successful write produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteSummary {
    pub instances: usize,
    pub station_groups: usize,
}

/// One attribute write produced by a product-specific hook.
#[derive(Debug, Clone, PartialEq)]
pub struct AttrWrite {
    pub group: String,
    pub name: &'static str,
    pub value: AttrValue,
}

impl AttrWrite {
    fn new(group: impl Into<String>, name: &'static str, value: AttrValue) -> Self {
        Self {
            group: group.into(),
            name,
            value,
        }
    }
}

/// Unsigned 32-bit count or interval attribute, rejected when out of range.
fn count_attr<T>(name: &'static str, value: T) -> Result<AttrValue>
where
    T: Copy + std::fmt::Display,
    u32: TryFrom<T>,
{
    u32::try_from(value)
        .map(AttrValue::UInt)
        .map_err(|_| ProductError::invalid_attribute(name, format!("{value} does not fit in u32")))
}

/// `typeOfWaterLevelData` of a water-level series code.
pub fn water_level_data_type(code: SeriesCode) -> WaterLevelDataType {
    match code {
        SeriesCode::Wlo => WaterLevelDataType::Observation,
        SeriesCode::Wlp => WaterLevelDataType::AstronomicalPrediction,
        _ => WaterLevelDataType::HydrodynamicForecast,
    }
}

impl Product {
    /// Product-specific root attributes written with the general metadata.
    pub fn general_attributes(&self, tile: &TileData) -> Vec<AttrWrite> {
        match (self, tile.trend_threshold) {
            (Self::WaterLevel, Some(threshold)) => vec![AttrWrite::new(
                ROOT,
                "waterLevelTrendThreshold",
                AttrValue::Float(threshold),
            )],
            _ => Vec::new(),
        }
    }

    /// Feature-level attributes: extremes, instance count and extras.
    pub fn feature_attributes(&self, tile: &TileData) -> Result<Vec<AttrWrite>> {
        let profile = self.profile();
        let root = profile.root_group;
        let mut writes = vec![
            AttrWrite::new(root, profile.min_attr, AttrValue::Float(tile.dataset_min)),
            AttrWrite::new(root, profile.max_attr, AttrValue::Float(tile.dataset_max)),
            AttrWrite::new(
                root,
                "numInstances",
                count_attr("numInstances", tile.instances.len())?,
            ),
        ];

        if let Self::SurfaceCurrent = self {
            writes.push(AttrWrite::new(
                ROOT,
                "surfaceCurrentDepth",
                AttrValue::Float(SURFACE_CURRENT_DEPTH),
            ));
        }

        Ok(writes)
    }

    /// Attributes of one instance group.
    pub fn instance_attributes(
        &self,
        instance_path: &str,
        instance: &InstanceData,
    ) -> Result<Vec<AttrWrite>> {
        let stations = count_attr("numberOfStations", instance.stations.len())?;
        let times = &instance.times;

        let mut writes = vec![
            AttrWrite::new(instance_path, "numberOfStations", stations.clone()),
            AttrWrite::new(instance_path, "numGRP", stations),
            AttrWrite::new(
                instance_path,
                "numberOfTimes",
                count_attr("numberOfTimes", times.count)?,
            ),
            AttrWrite::new(
                instance_path,
                "dateTimeOfFirstRecord",
                AttrValue::Text(format_s100_datetime(&times.first)),
            ),
            AttrWrite::new(
                instance_path,
                "dateTimeOfLastRecord",
                AttrValue::Text(format_s100_datetime(&times.last)),
            ),
            AttrWrite::new(
                instance_path,
                "timeRecordInterval",
                count_attr("timeRecordInterval", times.interval_secs)?,
            ),
        ];

        if let Self::WaterLevel = self {
            writes.push(AttrWrite::new(
                instance_path,
                "typeOfWaterLevelData",
                AttrValue::WaterLevelType(water_level_data_type(instance.code)),
            ));
        }

        Ok(writes)
    }
}

fn apply<S: ProductStore>(store: &mut S, writes: &[AttrWrite]) -> Result<()> {
    for write in writes {
        store.set_attr(&write.group, write.name, &write.value)?;
    }
    Ok(())
}

/// Writes formatted tiles into product files.
#[derive(Debug, Clone, Copy)]
pub struct ProductWriter {
    product: Product,
}

impl ProductWriter {
    pub fn new(product: Product) -> Self {
        Self { product }
    }

    pub fn product(&self) -> Product {
        self.product
    }

    pub fn profile(&self) -> &'static ProductProfile {
        self.product.profile()
    }

    /// Copy `template` to `output` and write the tile into the copy.
    ///
    /// On any failure after the copy the partial output is removed, so a
    /// failed tile never leaves a file behind.
    pub fn write_file(
        &self,
        template: &Path,
        output: &Path,
        cell: &TileCell,
        tile: &TileData,
        issued: DateTime<Utc>,
    ) -> Result<WriteSummary> {
        self.check_tile(cell, tile)?;
        if !template.is_file() {
            return Err(ProductError::TemplateNotFound(template.to_path_buf()));
        }

        fs::copy(template, output)?;

        let result = Hdf5Store::open_rw(output).and_then(|mut store| {
            let summary = self.write(&mut store, cell, tile, issued)?;
            store.flush()?;
            Ok(summary)
        });

        if result.is_err() {
            if let Err(e) = fs::remove_file(output) {
                warn!(
                    path = %output.display(),
                    error = %e,
                    "Failed to remove partial product file"
                );
            }
        }

        result
    }

    /// Write the tile into an already prepared store.
    pub fn write<S: ProductStore>(
        &self,
        store: &mut S,
        cell: &TileCell,
        tile: &TileData,
        issued: DateTime<Utc>,
    ) -> Result<WriteSummary> {
        self.check_tile(cell, tile)?;
        TemplateSchema::new(self.product).validate(store)?;

        self.write_general_metadata(store, cell, tile, issued)?;
        self.write_feature_metadata(store, tile)?;
        for (index, instance) in tile.instances.iter().enumerate() {
            self.write_instance(store, index, instance)?;
        }

        Ok(WriteSummary {
            instances: tile.instances.len(),
            station_groups: tile.station_groups(),
        })
    }

    fn check_tile(&self, cell: &TileCell, tile: &TileData) -> Result<()> {
        if tile.product != self.product {
            return Err(ProductError::Config(format!(
                "{} writer given {} data",
                self.product, tile.product
            )));
        }
        if tile.is_empty() {
            return Err(ProductError::EmptyDataset {
                cell: cell.id().to_string(),
            });
        }
        Ok(())
    }

    /// Root attributes: bounds, issue time, identifiers.
    pub fn write_general_metadata<S: ProductStore>(
        &self,
        store: &mut S,
        cell: &TileCell,
        tile: &TileData,
        issued: DateTime<Utc>,
    ) -> Result<()> {
        let profile = self.profile();
        let stem = cell.file_stem(profile.file_type)?;
        let bounds = cell.bounds();

        let writes = [
            AttrWrite::new(ROOT, "eastBoundLongitude", AttrValue::Float(bounds.east())),
            AttrWrite::new(ROOT, "westBoundLongitude", AttrValue::Float(bounds.west())),
            AttrWrite::new(ROOT, "northBoundLatitude", AttrValue::Float(bounds.north())),
            AttrWrite::new(ROOT, "southBoundLatitude", AttrValue::Float(bounds.south())),
            AttrWrite::new(ROOT, "issueDate", AttrValue::Text(format_issue_date(&issued))),
            AttrWrite::new(ROOT, "issueTime", AttrValue::Text(format_issue_time(&issued))),
            AttrWrite::new(
                ROOT,
                "geographicIdentifier",
                AttrValue::Text(format!("CND S{} tile {stem}", profile.file_type)),
            ),
            AttrWrite::new(ROOT, "metadata", AttrValue::Text(format!("MD_{stem}.XML"))),
        ];

        apply(store, &writes)?;
        apply(store, &self.product.general_attributes(tile))
    }

    /// Feature group attributes.
    pub fn write_feature_metadata<S: ProductStore>(
        &self,
        store: &mut S,
        tile: &TileData,
    ) -> Result<()> {
        apply(store, &self.product.feature_attributes(tile)?)
    }

    fn write_instance<S: ProductStore>(
        &self,
        store: &mut S,
        index: usize,
        instance: &InstanceData,
    ) -> Result<()> {
        let profile = self.profile();
        let instance_path = profile.instance_path(index);

        store.create_group(&instance_path)?;
        apply(store, &self.product.instance_attributes(&instance_path, instance)?)?;

        let times = &instance.times;
        let count = count_attr("numberOfTimes", times.count)?;
        let interval = count_attr("timeRecordInterval", times.interval_secs)?;
        let start = AttrValue::Text(format_s100_datetime(&times.first));
        let end = AttrValue::Text(format_s100_datetime(&times.last));

        for (i, station) in instance.stations.iter().enumerate() {
            let group = profile.station_group_path(&instance_path, i);
            store.create_group(&group)?;

            let writes = [
                AttrWrite::new(
                    &group,
                    "stationIdentification",
                    AttrValue::Text(station.header.code.clone()),
                ),
                AttrWrite::new(
                    &group,
                    "stationName",
                    AttrValue::Text(station.header.name.clone()),
                ),
                AttrWrite::new(&group, "startDateTime", start.clone()),
                AttrWrite::new(&group, "endDateTime", end.clone()),
                AttrWrite::new(&group, "numberOfTimes", count.clone()),
                AttrWrite::new(&group, "timeIntervalIndex", AttrValue::Byte(REGULAR_INTERVAL)),
                AttrWrite::new(&group, "timeRecordInterval", interval.clone()),
            ];
            apply(store, &writes)?;
            store.write_values(&group, &station.values)?;
        }

        let positioning = profile.positioning_path(&instance_path);
        store.create_group(&positioning)?;
        store.write_positions(&positioning, &instance.positions())?;

        debug!(
            instance = %instance_path,
            code = %instance.code,
            stations = instance.stations.len(),
            "Wrote instance"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TrendConfig;
    use crate::store::{MemoryDataset, MemoryStore};
    use crate::trend::TrendFlag;
    use chrono::TimeZone;
    use test_utils::{base_time, constant_series, point_atkinson, vancouver_cell, vancouver_harbour};

    fn template(product: Product) -> MemoryStore {
        let mut store = MemoryStore::new();
        TemplateSchema::new(product).apply_skeleton(&mut store).unwrap();
        store
    }

    fn issued() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2021, 12, 6, 14, 30, 5).unwrap()
    }

    fn scenario_tile() -> TileData {
        let a = point_atkinson()
            .with_series(SeriesCode::Wlo, constant_series(base_time(), 900, 10, 1.5));
        let b = vancouver_harbour()
            .with_series(SeriesCode::Wlp, constant_series(base_time(), 900, 10, 2.5));
        Product::WaterLevel.format(&[&a, &b], &TrendConfig::default())
    }

    #[test]
    fn test_two_station_scenario() {
        let mut store = template(Product::WaterLevel);
        let summary = ProductWriter::new(Product::WaterLevel)
            .write(&mut store, &vancouver_cell(), &scenario_tile(), issued())
            .unwrap();
        assert_eq!(summary, WriteSummary { instances: 2, station_groups: 2 });

        assert_eq!(store.attr("WaterLevel", "numInstances"), Some(&AttrValue::UInt(2)));
        assert_eq!(store.attr("WaterLevel", "minDatasetHeight"), Some(&AttrValue::Float(1.5)));
        assert_eq!(store.attr("WaterLevel", "maxDatasetHeight"), Some(&AttrValue::Float(2.5)));

        // Instance 1 is wlo with station A only
        assert_eq!(
            store.attr("WaterLevel/WaterLevel.01", "typeOfWaterLevelData"),
            Some(&AttrValue::WaterLevelType(WaterLevelDataType::Observation))
        );
        assert_eq!(
            store.attr("WaterLevel/WaterLevel.01/Group_001", "stationIdentification"),
            Some(&AttrValue::from("07795"))
        );
        assert!(store.group("WaterLevel/WaterLevel.01/Group_002").is_none());

        match store.dataset("WaterLevel/WaterLevel.01/Group_001", "values") {
            Some(MemoryDataset::WaterLevel(records)) => {
                assert_eq!(records.len(), 10);
                assert!(records.iter().all(|r| r.height == 1.5));
                let moving = [TrendFlag::Increasing.code(), TrendFlag::Decreasing.code()];
                assert!(records.iter().all(|r| !moving.contains(&r.trend)));
                assert!(records[2..9].iter().all(|r| r.trend == TrendFlag::Steady.code()));
            }
            other => panic!("unexpected values {other:?}"),
        }

        // Instance 2 is wlp with station B only
        assert_eq!(
            store.attr("WaterLevel/WaterLevel.02", "typeOfWaterLevelData"),
            Some(&AttrValue::WaterLevelType(WaterLevelDataType::AstronomicalPrediction))
        );
        assert_eq!(
            store.attr("WaterLevel/WaterLevel.02/Group_001", "stationName"),
            Some(&AttrValue::from("Vancouver"))
        );
        assert!(store.group("WaterLevel/WaterLevel.03").is_none());
    }

    #[test]
    fn test_general_metadata() {
        let mut store = template(Product::WaterLevel);
        ProductWriter::new(Product::WaterLevel)
            .write(&mut store, &vancouver_cell(), &scenario_tile(), issued())
            .unwrap();

        assert_eq!(store.attr(ROOT, "westBoundLongitude"), Some(&AttrValue::Float(-124.0)));
        assert_eq!(store.attr(ROOT, "eastBoundLongitude"), Some(&AttrValue::Float(-123.0)));
        assert_eq!(store.attr(ROOT, "southBoundLatitude"), Some(&AttrValue::Float(49.0)));
        assert_eq!(store.attr(ROOT, "northBoundLatitude"), Some(&AttrValue::Float(50.0)));
        assert_eq!(store.attr(ROOT, "issueDate"), Some(&AttrValue::from("20211206")));
        assert_eq!(store.attr(ROOT, "issueTime"), Some(&AttrValue::from("143005Z")));
        assert_eq!(
            store.attr(ROOT, "geographicIdentifier"),
            Some(&AttrValue::from("CND S104 tile 104CA0024900N12400W"))
        );
        assert_eq!(
            store.attr(ROOT, "metadata"),
            Some(&AttrValue::from("MD_104CA0024900N12400W.XML"))
        );
    }

    #[test]
    fn test_instance_time_attributes() {
        let mut store = template(Product::WaterLevel);
        ProductWriter::new(Product::WaterLevel)
            .write(&mut store, &vancouver_cell(), &scenario_tile(), issued())
            .unwrap();

        let instance = "WaterLevel/WaterLevel.01";
        assert_eq!(store.attr(instance, "numberOfTimes"), Some(&AttrValue::UInt(10)));
        assert_eq!(store.attr(instance, "timeRecordInterval"), Some(&AttrValue::UInt(900)));
        assert_eq!(
            store.attr(instance, "dateTimeOfFirstRecord"),
            Some(&AttrValue::from("20211206T000000Z"))
        );
        assert_eq!(
            store.attr(instance, "dateTimeOfLastRecord"),
            Some(&AttrValue::from("20211206T021500Z"))
        );
        assert_eq!(
            store.attr(&format!("{instance}/Group_001"), "endDateTime"),
            Some(&AttrValue::from("20211206T021500Z"))
        );
        assert_eq!(
            store.attr(&format!("{instance}/Group_001"), "timeIntervalIndex"),
            Some(&AttrValue::Byte(1))
        );
    }

    #[test]
    fn test_positioning_matches_station_groups() {
        let a = point_atkinson()
            .with_series(SeriesCode::Wlo, constant_series(base_time(), 900, 4, 1.0));
        let b = vancouver_harbour()
            .with_series(SeriesCode::Wlo, constant_series(base_time(), 900, 4, 1.0));
        let tile = Product::WaterLevel.format(&[&b, &a], &TrendConfig::default());

        let mut store = template(Product::WaterLevel);
        ProductWriter::new(Product::WaterLevel)
            .write(&mut store, &vancouver_cell(), &tile, issued())
            .unwrap();

        let dataset = store.dataset("WaterLevel/WaterLevel.01/Positioning", "geometryValues");
        let positions = match dataset {
            Some(MemoryDataset::Positions(p)) => p.clone(),
            other => panic!("unexpected positioning {other:?}"),
        };
        assert_eq!(positions.len(), 2);
        for (i, pos) in positions.iter().enumerate() {
            let group = format!("WaterLevel/WaterLevel.01/Group_{:03}", i + 1);
            let code = match store.attr(&group, "stationIdentification") {
                Some(AttrValue::Text(code)) => code.clone(),
                other => panic!("unexpected id {other:?}"),
            };
            let station = if code == "07795" { point_atkinson() } else { vancouver_harbour() };
            assert_eq!(pos.latitude, station.latitude());
            assert_eq!(pos.longitude, station.longitude());
        }
    }

    #[test]
    fn test_rewrite_into_same_store_is_schema_violation() {
        let mut store = template(Product::WaterLevel);
        let writer = ProductWriter::new(Product::WaterLevel);
        writer.write(&mut store, &vancouver_cell(), &scenario_tile(), issued()).unwrap();

        let err = writer
            .write(&mut store, &vancouver_cell(), &scenario_tile(), issued())
            .unwrap_err();
        assert!(matches!(err, ProductError::SchemaViolation(_)));
    }

    #[test]
    fn test_regeneration_differs_only_in_issue_time() {
        let writer = ProductWriter::new(Product::WaterLevel);
        let mut first = template(Product::WaterLevel);
        let mut second = template(Product::WaterLevel);
        writer.write(&mut first, &vancouver_cell(), &scenario_tile(), issued()).unwrap();
        writer
            .write(
                &mut second,
                &vancouver_cell(),
                &scenario_tile(),
                issued() + chrono::Duration::days(1),
            )
            .unwrap();
        assert_ne!(first, second);

        for store in [&mut first, &mut second] {
            store.set_attr(ROOT, "issueDate", &AttrValue::from("")).unwrap();
            store.set_attr(ROOT, "issueTime", &AttrValue::from("")).unwrap();
        }
        assert_eq!(first, second);
    }

    #[test]
    fn test_general_metadata_step_is_idempotent() {
        let writer = ProductWriter::new(Product::WaterLevel);
        let tile = scenario_tile();
        let mut store = template(Product::WaterLevel);
        writer.write_general_metadata(&mut store, &vancouver_cell(), &tile, issued()).unwrap();
        let once = store.clone();
        writer.write_general_metadata(&mut store, &vancouver_cell(), &tile, issued()).unwrap();
        assert_eq!(store, once);
    }

    #[test]
    fn test_empty_tile_is_not_written() {
        let tile = Product::WaterLevel.format(&[&point_atkinson()], &TrendConfig::default());
        let mut store = template(Product::WaterLevel);
        let err = ProductWriter::new(Product::WaterLevel)
            .write(&mut store, &vancouver_cell(), &tile, issued())
            .unwrap_err();
        assert!(err.is_empty_dataset());
        assert!(store.group("WaterLevel/WaterLevel.01").is_none());
    }

    #[test]
    fn test_surface_current_writes_depth_and_no_trend() {
        let a = point_atkinson()
            .with_series(SeriesCode::Wcs, constant_series(base_time(), 600, 3, 0.8))
            .with_series(SeriesCode::Wcd, constant_series(base_time(), 600, 3, 45.0));
        let tile = Product::SurfaceCurrent.format(&[&a], &TrendConfig::default());

        let mut store = template(Product::SurfaceCurrent);
        ProductWriter::new(Product::SurfaceCurrent)
            .write(&mut store, &vancouver_cell(), &tile, issued())
            .unwrap();

        assert_eq!(store.attr(ROOT, "surfaceCurrentDepth"), Some(&AttrValue::Float(1.0)));
        assert_eq!(store.attr("SurfaceCurrent", "numInstances"), Some(&AttrValue::UInt(1)));
        assert_eq!(
            store.attr("SurfaceCurrent", "maxDatasetCurrentSpeed"),
            Some(&AttrValue::Float(0.8))
        );
        assert!(store.attr("SurfaceCurrent/SurfaceCurrent.01", "typeOfWaterLevelData").is_none());
        assert!(matches!(
            store.dataset("SurfaceCurrent/SurfaceCurrent.01/Group_001", "values"),
            Some(MemoryDataset::SurfaceCurrent(records)) if records.len() == 3
        ));
        assert_eq!(
            store.attr(ROOT, "geographicIdentifier"),
            Some(&AttrValue::from("CND S111 tile 111CA0024900N12400W"))
        );
    }

    #[test]
    fn test_product_mismatch() {
        let mut store = template(Product::SurfaceCurrent);
        let err = ProductWriter::new(Product::SurfaceCurrent)
            .write(&mut store, &vancouver_cell(), &scenario_tile(), issued())
            .unwrap_err();
        assert!(matches!(err, ProductError::Config(_)));
    }

    #[test]
    fn test_out_of_range_counts_are_rejected() {
        let tile = scenario_tile();
        let path = "WaterLevel/WaterLevel.01";

        let mut instance = tile.instances[0].clone();
        instance.times.interval_secs = i64::from(u32::MAX) + 1;
        match Product::WaterLevel.instance_attributes(path, &instance) {
            Err(ProductError::InvalidAttribute { name, .. }) => {
                assert_eq!(name, "timeRecordInterval")
            }
            other => panic!("expected an invalid attribute, got {other:?}"),
        }

        let mut instance = tile.instances[0].clone();
        instance.times.interval_secs = -900;
        assert!(Product::WaterLevel.instance_attributes(path, &instance).is_err());

        assert!(matches!(count_attr("numberOfTimes", 10usize), Ok(AttrValue::UInt(10))));
        assert!(count_attr("numberOfTimes", u64::from(u32::MAX) + 1).is_err());
    }

    #[test]
    fn test_water_level_data_type_mapping() {
        use WaterLevelDataType::*;
        assert_eq!(water_level_data_type(SeriesCode::Wlo), Observation);
        assert_eq!(water_level_data_type(SeriesCode::Wlp), AstronomicalPrediction);
        assert_eq!(water_level_data_type(SeriesCode::Wlf), HydrodynamicForecast);
        assert_eq!(water_level_data_type(SeriesCode::Spine), HydrodynamicForecast);
    }
}
