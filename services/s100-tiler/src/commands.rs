//! Subcommand implementations.

use std::fs;

use anyhow::{Context, Result};
use s100_common::parse_timestamp;
use s100_product::{create_skeleton_template, BatchReport, TileGenerator, TileOutcome};
use tile_grid::{load_station_collection, load_tile_grid};
use tracing::{error, info, warn};

use crate::config::TilerConfig;
use crate::{GenerateArgs, TemplateArgs};

/// Apply command-line overrides on top of the loaded configuration.
fn apply_overrides(mut config: TilerConfig, args: &GenerateArgs) -> TilerConfig {
    if let Some(grid) = &args.grid {
        config.grid = Some(grid.clone());
    }
    if let Some(template) = &args.template {
        config.template = Some(template.clone());
    }
    if let Some(product) = args.product {
        config.product = product;
    }
    if let Some(output_dir) = &args.output_dir {
        config.output_dir = output_dir.clone();
    }
    if let Some(workers) = args.workers {
        config.workers = workers;
    }
    config
}

/// Run a batch over the configured grid.
///
/// Per-tile failures are reported, not returned; the caller decides the
/// exit status from [`BatchReport::has_failures`].
pub fn generate(config: TilerConfig, args: &GenerateArgs) -> Result<BatchReport> {
    let config = apply_overrides(config, args);
    config.validate()?;

    let (Some(template), Some(grid)) = (config.template.as_deref(), config.grid.as_deref()) else {
        anyhow::bail!("Template and tile grid must both be configured");
    };

    let load = load_station_collection(&args.input)
        .with_context(|| format!("Failed to load stations from {}", args.input.display()))?;
    if !load.rejected.is_empty() {
        warn!(rejected = load.rejected.len(), "Some station features were excluded");
    }

    let cells = load_tile_grid(grid)
        .with_context(|| format!("Failed to load tile grid from {}", grid.display()))?;

    let mut generator = TileGenerator::new(config.product, config.generator_config());
    if let Some(stamp) = &args.issue_time {
        let issued = parse_timestamp(stamp)
            .with_context(|| format!("Invalid --issue-time '{stamp}'"))?;
        generator = generator.with_issue_time(issued);
    }

    let report = generator.generate_all(&cells, &load.stations, template, &config.output_dir)?;

    for cell in &report.cells {
        if let TileOutcome::Failed { error } = &cell.outcome {
            error!(cell = %cell.cell, error = %error, "Tile failed");
        }
    }

    if let Some(path) = &args.report {
        let json = serde_json::to_string_pretty(&report)?;
        fs::write(path, json)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        info!(path = %path.display(), "Wrote batch report");
    }

    info!(
        product = %config.product,
        written = report.written(),
        skipped = report.skipped(),
        failed = report.failed(),
        unassigned_stations = report.unassigned_stations,
        output_dir = %config.output_dir.display(),
        "Batch finished"
    );

    Ok(report)
}

/// Write a skeleton template for a product.
pub fn template(args: &TemplateArgs) -> Result<()> {
    if let Some(parent) = args.output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    create_skeleton_template(args.product, &args.output)
        .with_context(|| format!("Failed to create template {}", args.output.display()))?;

    info!(product = %args.product, path = %args.output.display(), "Wrote product template");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use s100_common::SeriesCode;
    use s100_product::Product;
    use std::path::PathBuf;
    use test_utils::{
        base_time, constant_series, grid_json, point_atkinson, scratch_dir, station_collection_json,
        vancouver_cell, write_fixture,
    };

    fn generate_args(input: PathBuf) -> GenerateArgs {
        GenerateArgs {
            input,
            grid: None,
            template: None,
            product: None,
            output_dir: None,
            workers: None,
            issue_time: Some("2021-12-06T12:00:00Z".to_string()),
            report: None,
        }
    }

    #[test]
    fn test_overrides_replace_config() {
        let mut args = generate_args(PathBuf::from("stations.json"));
        args.product = Some(Product::SurfaceCurrent);
        args.workers = Some(7);
        args.grid = Some(PathBuf::from("grid.json"));

        let config = apply_overrides(TilerConfig::default(), &args);
        assert_eq!(config.product, Product::SurfaceCurrent);
        assert_eq!(config.workers, 7);
        assert_eq!(config.grid, Some(PathBuf::from("grid.json")));
        assert_eq!(config.output_dir, PathBuf::from("output"));
    }

    #[test]
    fn test_template_then_generate() {
        let dir = scratch_dir();
        let template_path = dir.path().join("templates/s104.h5");
        template(&TemplateArgs {
            product: Product::WaterLevel,
            output: template_path.clone(),
        })
        .unwrap();
        assert!(template_path.is_file());

        let station = point_atkinson()
            .with_series(SeriesCode::Wlo, constant_series(base_time(), 900, 8, 1.0));
        let stations_json = station_collection_json(&[station]);
        let stations = write_fixture(dir.path(), "stations.json", &stations_json);
        let grid = write_fixture(dir.path(), "grid.json", &grid_json(&[vancouver_cell()]));

        let mut args = generate_args(stations);
        args.grid = Some(grid);
        args.template = Some(template_path);
        args.output_dir = Some(dir.path().join("out"));
        args.workers = Some(1);
        args.report = Some(dir.path().join("report.json"));

        let report = generate(TilerConfig::default(), &args).unwrap();
        assert_eq!(report.written(), 1);
        assert!(dir.path().join("out/104CA0024900N12400W.h5").is_file());

        let report_json = fs::read_to_string(dir.path().join("report.json")).unwrap();
        let json: serde_json::Value = serde_json::from_str(&report_json).unwrap();
        assert_eq!(json["cells"][0]["status"], "written");
        assert_eq!(json["cells"][0]["cell"], "CA2_4900N12400W");
    }

    #[test]
    fn test_generate_requires_grid() {
        let dir = scratch_dir();
        let stations = write_fixture(dir.path(), "stations.json", &station_collection_json(&[]));
        let args = generate_args(stations);
        assert!(generate(TilerConfig::default(), &args).is_err());
    }
}
