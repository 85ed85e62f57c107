//! Configuration for tile generation.

use serde::{Deserialize, Serialize};

/// Water-level trend classification settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendConfig {
    /// Slope (metres per sample) above which a level is rising, and below
    /// the negation of which it is falling.
    pub threshold: f64,

    /// Linearly interpolate interior gaps before fitting the rolling slope.
    pub interpolate_gaps: bool,
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            threshold: 0.2,
            interpolate_gaps: false,
        }
    }
}

impl TrendConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if !(self.threshold.is_finite() && self.threshold > 0.0) {
            return Err("trend threshold must be a positive number".to_string());
        }
        Ok(())
    }
}

/// Configuration for a batch of tiles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Number of tiles written concurrently.
    pub workers: usize,

    pub trend: TrendConfig,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            workers: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
            trend: TrendConfig::default(),
        }
    }
}

impl GeneratorConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.workers == 0 {
            return Err("workers must be > 0".to_string());
        }
        self.trend.validate()
    }
}
