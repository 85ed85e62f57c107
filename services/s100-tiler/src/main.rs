//! S-100 tile generator.
//!
//! Splits a station feature collection over a tile grid and writes one
//! S-104 (water level) or S-111 (surface current) DCF8 HDF5 file per
//! non-empty cell.

mod commands;
mod config;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use s100_product::Product;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use config::{LogFormat, TilerConfig};

#[derive(Parser, Debug)]
#[command(name = "s100-tiler")]
#[command(about = "Generate S-104/S-111 DCF8 product tiles from station time series")]
struct Cli {
    /// Configuration file path (defaults and S100_* variables when omitted)
    #[arg(short, long, env = "S100_CONFIG")]
    config: Option<PathBuf>,

    /// Log level
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    log_level: String,

    /// Log output format
    #[arg(long, value_enum)]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write one product file per grid cell containing stations
    Generate(GenerateArgs),
    /// Write a minimal product template
    Template(TemplateArgs),
}

#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Station feature collection (GeoJSON)
    #[arg(short, long)]
    pub input: PathBuf,

    /// Tile grid (GeoJSON)
    #[arg(short, long)]
    pub grid: Option<PathBuf>,

    /// Product template (HDF5)
    #[arg(short, long)]
    pub template: Option<PathBuf>,

    /// Product to generate (s104 or s111)
    #[arg(short, long)]
    pub product: Option<Product>,

    /// Output directory
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Number of tiles written concurrently
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Fixed issue time (RFC 3339) instead of the current time
    #[arg(long)]
    pub issue_time: Option<String>,

    /// Also write the per-cell batch report as JSON
    #[arg(long)]
    pub report: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct TemplateArgs {
    /// Product the template is for (s104 or s111)
    #[arg(short, long)]
    pub product: Product,

    /// Template file to create
    #[arg(short, long)]
    pub output: PathBuf,
}

fn main() -> Result<ExitCode> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = TilerConfig::load(cli.config.as_deref())?;

    init_tracing(&cli.log_level, cli.log_format.unwrap_or(config.log_format));
    s100_product::silence_hdf5_errors();

    info!(version = env!("CARGO_PKG_VERSION"), "Starting s100-tiler");

    match cli.command {
        Command::Generate(args) => {
            let report = commands::generate(config, &args)?;
            if report.has_failures() {
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::Template(args) => commands::template(&args)?,
    }

    Ok(ExitCode::SUCCESS)
}

fn init_tracing(level: &str, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = fmt().with_env_filter(filter).with_target(true).with_writer(std::io::stderr);

    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.pretty().init(),
    }
}
