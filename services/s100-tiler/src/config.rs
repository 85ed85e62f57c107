//! Tiler configuration.
//!
//! Values come from, in increasing priority: built-in defaults, a YAML file
//! (with `${VAR}` / `${VAR:-default}` substitution) or `S100_*` environment
//! variables, and finally command-line flags.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use clap::ValueEnum;
use s100_product::{GeneratorConfig, Product, TrendConfig};
use serde::{Deserialize, Serialize};

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" | "text" => Ok(Self::Pretty),
            other => Err(format!("unknown log format '{other}', expected json or pretty")),
        }
    }
}

/// Top-level tiler configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TilerConfig {
    /// Product family to generate.
    pub product: Product,

    /// Template HDF5 file copied for every tile.
    pub template: Option<PathBuf>,

    /// Tile grid GeoJSON.
    pub grid: Option<PathBuf>,

    /// Directory the product files are written to.
    pub output_dir: PathBuf,

    /// Number of tiles written concurrently.
    pub workers: usize,

    pub trend: TrendConfig,

    pub log_format: LogFormat,
}

impl Default for TilerConfig {
    fn default() -> Self {
        let generator = GeneratorConfig::default();
        Self {
            product: Product::WaterLevel,
            template: None,
            grid: None,
            output_dir: PathBuf::from("output"),
            workers: generator.workers,
            trend: generator.trend,
            log_format: LogFormat::default(),
        }
    }
}

impl TilerConfig {
    /// Load from `path` when given, otherwise from the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_yaml(path),
            None => Self::from_env(),
        }
    }

    /// Load a YAML configuration file with environment variable substitution.
    pub fn from_yaml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read tiler config from {:?}", path.as_ref()))?;

        Self::parse_yaml(&content, |name| env::var(name).ok())
            .with_context(|| format!("Failed to parse tiler config from {:?}", path.as_ref()))
    }

    /// Build from defaults overridden by `S100_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn parse_yaml(content: &str, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let expanded = expand_env_vars(content, &lookup)?;
        Ok(serde_yaml::from_str(&expanded)?)
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(v) = lookup("S100_PRODUCT") {
            config.product = v.parse().map_err(anyhow::Error::msg)?;
        }
        if let Some(v) = lookup("S100_TEMPLATE") {
            config.template = Some(PathBuf::from(v));
        }
        if let Some(v) = lookup("S100_GRID") {
            config.grid = Some(PathBuf::from(v));
        }
        if let Some(v) = lookup("S100_OUTPUT_DIR") {
            config.output_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("S100_WORKERS") {
            config.workers = v
                .parse()
                .with_context(|| format!("S100_WORKERS must be an integer, got '{v}'"))?;
        }
        if let Some(v) = lookup("S100_TREND_THRESHOLD") {
            config.trend.threshold = v
                .parse()
                .with_context(|| format!("S100_TREND_THRESHOLD must be a number, got '{v}'"))?;
        }
        if let Some(v) = lookup("S100_TREND_INTERPOLATE") {
            config.trend.interpolate_gaps =
                matches!(v.to_lowercase().as_str(), "1" | "true" | "yes");
        }
        if let Some(v) = lookup("S100_LOG_FORMAT") {
            config.log_format = v.parse().map_err(anyhow::Error::msg)?;
        }

        Ok(config)
    }

    /// Settings handed to the batch generator.
    pub fn generator_config(&self) -> GeneratorConfig {
        GeneratorConfig {
            workers: self.workers,
            trend: self.trend,
        }
    }

    /// Check the configuration is usable for a generation run.
    pub fn validate(&self) -> Result<()> {
        self.generator_config().validate().map_err(anyhow::Error::msg)?;

        match &self.template {
            None => bail!("No template configured (set --template or S100_TEMPLATE)"),
            Some(path) if !path.is_file() => bail!("Template not found: {}", path.display()),
            Some(_) => {}
        }

        match &self.grid {
            None => bail!("No tile grid configured (set --grid or S100_GRID)"),
            Some(path) if !path.is_file() => bail!("Tile grid not found: {}", path.display()),
            Some(_) => {}
        }

        Ok(())
    }
}

/// Expand `${VAR}` and `${VAR:-default}` references.
fn expand_env_vars(content: &str, lookup: &impl Fn(&str) -> Option<String>) -> Result<String> {
    let mut result = String::with_capacity(content.len());
    let mut chars = content.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '$' || chars.peek() != Some(&'{') {
            result.push(ch);
            continue;
        }
        chars.next(); // consume '{'

        let mut expr = String::new();
        loop {
            match chars.next() {
                Some('}') => break,
                Some(c) => expr.push(c),
                None => bail!("Unclosed variable substitution: ${{{expr}"),
            }
        }

        let value = match expr.split_once(":-") {
            Some((name, default)) => lookup(name.trim())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_string()),
            None => lookup(expr.trim())
                .with_context(|| format!("Environment variable {expr} not set"))?,
        };
        result.push_str(&value);
    }

    Ok(result)
}
