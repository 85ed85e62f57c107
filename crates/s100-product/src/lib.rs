//! S-104 / S-111 Data Coding Format 8 product generation.
//!
//! Turns the stations of one grid cell into a stationwise product file:
//!
//! ```text
//! Vec<&StationRecord> (one cell)
//!      │
//!      ▼
//! Product::format ──► AssembledSeries per series code
//!      │                   │
//!      │                   └─► compute_trends (water level)
//!      ▼
//! TileData ──► ProductWriter ──► ProductStore (Hdf5Store / MemoryStore)
//!                   │
//!                   ├─► general metadata (root)
//!                   ├─► feature metadata
//!                   └─► instances, station groups, positioning
//! ```
//!
//! [`TileGenerator`] drives this over a whole grid on a worker pool.
//!
//! # Example
//!
//! ```ignore
//! use s100_product::{create_skeleton_template, GeneratorConfig, Product, TileGenerator};
//!
//! create_skeleton_template(Product::WaterLevel, "s104_template.h5")?;
//! let report = TileGenerator::new(Product::WaterLevel, GeneratorConfig::default())
//!     .generate_all(&cells, &stations, "s104_template.h5".as_ref(), "out".as_ref())?;
//! println!("{} files written", report.written());
//! ```

pub mod config;
pub mod error;
pub mod format;
pub mod generator;
pub mod profile;
pub mod records;
pub mod series;
pub mod store;
pub mod template;
pub mod trend;
pub mod writer;

// Re-export commonly used types at crate root
pub use config::{GeneratorConfig, TrendConfig};
pub use error::{ProductError, Result};
pub use format::{InstanceData, StationGroupData, StationValues, TileData, TimeAxis};
pub use generator::{BatchReport, CellReport, TileGenerator, TileOutcome};
pub use profile::{FeatureField, FieldType, Product, ProductProfile, ValueField};
pub use records::{PositionRecord, SurfaceCurrentRecord, WaterLevelDataType, WaterLevelRecord};
pub use series::{AssembledSeries, StationColumn};
pub use store::{silence_hdf5_errors, AttrValue, Hdf5Store, MemoryStore, ProductStore};
pub use template::{create_skeleton_template, TemplateSchema};
pub use trend::{compute_trends, TrendFlag, TrendTable};
pub use writer::{ProductWriter, WriteSummary};
