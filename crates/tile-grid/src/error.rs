//! Error types for input loading.

use thiserror::Error;

/// Errors that can occur while loading stations or the tile grid.
#[derive(Error, Debug)]
pub enum GridError {
    #[error("Failed to read file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A station feature is unusable; the station is excluded.
    #[error("Malformed station feature #{index}: {reason}")]
    MalformedStation { index: usize, reason: String },

    /// A grid cell is unusable; the grid as a whole is rejected.
    #[error("Invalid grid cell #{index}: {reason}")]
    InvalidCell { index: usize, reason: String },

    /// Two cells would be written to the same product file.
    #[error("Grid cells '{first}' and '{second}' share the output name {stem}")]
    OutputCollision {
        first: String,
        second: String,
        stem: String,
    },
}

impl GridError {
    pub fn malformed_station(index: usize, reason: impl Into<String>) -> Self {
        Self::MalformedStation {
            index,
            reason: reason.into(),
        }
    }

    pub fn invalid_cell(index: usize, reason: impl Into<String>) -> Self {
        Self::InvalidCell {
            index,
            reason: reason.into(),
        }
    }
}

/// Result type for grid operations.
pub type Result<T> = std::result::Result<T, GridError>;
