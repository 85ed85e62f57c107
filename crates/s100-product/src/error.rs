//! Error types for product generation.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while formatting or writing a product file.
#[derive(Error, Debug)]
pub enum ProductError {
    /// No station contributes any dataset type to the tile. Not fatal:
    /// the tile is skipped and no file is produced.
    #[error("no dataset type has contributing stations in cell {cell}")]
    EmptyDataset { cell: String },

    /// The product file does not have the shape the writer expects, e.g.
    /// a group that is about to be created already exists. Aborts the tile.
    #[error("schema violation: {0}")]
    SchemaViolation(String),

    /// An attribute value could not be represented in the file.
    #[error("invalid attribute '{name}': {reason}")]
    InvalidAttribute { name: String, reason: String },

    /// Template file missing or unreadable.
    #[error("template not found: {}", .0.display())]
    TemplateNotFound(PathBuf),

    #[error("cell error: {0}")]
    Cell(#[from] s100_common::CellError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HDF5 error: {0}")]
    Hdf5(#[from] hdf5::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

impl ProductError {
    /// Create a SchemaViolation error.
    pub fn schema_violation(msg: impl Into<String>) -> Self {
        Self::SchemaViolation(msg.into())
    }

    /// Create an InvalidAttribute error.
    pub fn invalid_attribute(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidAttribute {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error means "nothing to write" rather than a failure.
    pub fn is_empty_dataset(&self) -> bool {
        matches!(self, Self::EmptyDataset { .. })
    }
}

/// Result type for product operations.
pub type Result<T> = std::result::Result<T, ProductError>;
