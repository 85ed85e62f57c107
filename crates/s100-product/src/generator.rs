//! Batch tile generation over a grid.
//!
//! Tiles are independent: each worker formats and writes one cell end to
//! end, so the batch runs on a bounded rayon pool with no shared mutable
//! state. A failing tile is recorded and never stops the others.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use s100_common::{StationRecord, TileCell};
use serde::Serialize;
use tile_grid::{partition, unassigned_stations};
use tracing::{debug, error, info, warn};

use crate::config::GeneratorConfig;
use crate::error::{ProductError, Result};
use crate::profile::Product;
use crate::writer::{ProductWriter, WriteSummary};

/// What happened to one cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TileOutcome {
    Written {
        path: PathBuf,
        instances: usize,
        stations: usize,
    },
    /// The cell had stations but none carried a series for this product.
    Skipped { reason: String },
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CellReport {
    pub cell: String,
    #[serde(flatten)]
    pub outcome: TileOutcome,
}

/// Per-cell outcomes of a batch, in grid order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchReport {
    pub cells: Vec<CellReport>,
    /// Stations that fell inside no cell.
    pub unassigned_stations: usize,
}

impl BatchReport {
    pub fn written(&self) -> usize {
        self.count(|o| matches!(o, TileOutcome::Written { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, TileOutcome::Skipped { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, TileOutcome::Failed { .. }))
    }

    pub fn has_failures(&self) -> bool {
        self.failed() > 0
    }

    /// Paths of every file written, in grid order.
    pub fn written_paths(&self) -> Vec<&Path> {
        self.cells
            .iter()
            .filter_map(|c| match &c.outcome {
                TileOutcome::Written { path, .. } => Some(path.as_path()),
                _ => None,
            })
            .collect()
    }

    fn count(&self, pred: impl Fn(&TileOutcome) -> bool) -> usize {
        self.cells.iter().filter(|c| pred(&c.outcome)).count()
    }
}

/// Generates one product file per non-empty cell.
#[derive(Debug, Clone)]
pub struct TileGenerator {
    product: Product,
    config: GeneratorConfig,
    issued: Option<DateTime<Utc>>,
}

impl TileGenerator {
    pub fn new(product: Product, config: GeneratorConfig) -> Self {
        Self {
            product,
            config,
            issued: None,
        }
    }

    /// Use a fixed issue time instead of the current time.
    pub fn with_issue_time(mut self, issued: DateTime<Utc>) -> Self {
        self.issued = Some(issued);
        self
    }

    pub fn product(&self) -> Product {
        self.product
    }

    /// Partition `stations` over `cells` and write every non-empty cell.
    ///
    /// Only problems that affect the whole batch (invalid configuration,
    /// missing template, unusable output directory) are returned as errors.
    pub fn generate_all(
        &self,
        cells: &[TileCell],
        stations: &[StationRecord],
        template: &Path,
        output_dir: &Path,
    ) -> Result<BatchReport> {
        self.config.validate().map_err(ProductError::Config)?;
        if !template.is_file() {
            return Err(ProductError::TemplateNotFound(template.to_path_buf()));
        }
        fs::create_dir_all(output_dir)?;

        let start = Instant::now();
        let issued = self.issued.unwrap_or_else(Utc::now);
        let assignments = partition(cells, stations);
        let unassigned = unassigned_stations(cells, stations).len();

        info!(
            product = %self.product,
            cells = cells.len(),
            non_empty = assignments.len(),
            stations = stations.len(),
            unassigned,
            workers = self.config.workers,
            "Starting tile generation"
        );

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.workers)
            .build()
            .map_err(|e| ProductError::Config(format!("failed to build worker pool: {e}")))?;

        let reports: Vec<CellReport> = pool.install(|| {
            assignments
                .par_iter()
                .map(|assignment| {
                    let cell = assignment.cell;
                    let stations = &assignment.stations;
                    let written =
                        self.generate_tile(cell, stations, template, output_dir, issued);
                    let outcome = match written {
                        Ok((path, summary)) => TileOutcome::Written {
                            path,
                            instances: summary.instances,
                            stations: assignment.stations.len(),
                        },
                        Err(e) if e.is_empty_dataset() => {
                            debug!(cell = %cell.id(), "No series for this product, skipping cell");
                            TileOutcome::Skipped {
                                reason: e.to_string(),
                            }
                        }
                        Err(e) => {
                            error!(cell = %cell.id(), error = %e, "Tile generation failed");
                            TileOutcome::Failed {
                                error: e.to_string(),
                            }
                        }
                    };
                    CellReport {
                        cell: cell.id().to_string(),
                        outcome,
                    }
                })
                .collect()
        });

        let report = BatchReport {
            cells: reports,
            unassigned_stations: unassigned,
        };

        if report.has_failures() {
            warn!(failed = report.failed(), "Some tiles failed");
        }
        info!(
            written = report.written(),
            skipped = report.skipped(),
            failed = report.failed(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Tile generation complete"
        );

        Ok(report)
    }

    /// Format and write a single cell.
    pub fn generate_tile(
        &self,
        cell: &TileCell,
        stations: &[&StationRecord],
        template: &Path,
        output_dir: &Path,
        issued: DateTime<Utc>,
    ) -> Result<(PathBuf, WriteSummary)> {
        let writer = ProductWriter::new(self.product);
        let output = output_dir.join(cell.file_name(writer.profile().file_type)?);

        let tile = self.product.format(stations, &self.config.trend);
        let summary = writer.write_file(template, &output, cell, &tile, issued)?;

        info!(
            cell = %cell.id(),
            path = %output.display(),
            instances = summary.instances,
            station_groups = summary.station_groups,
            "Wrote product file"
        );
        Ok((output, summary))
    }
}
