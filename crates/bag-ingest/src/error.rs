//! Error types for the BAG ingest pipeline

use std::path::PathBuf;
use thiserror::Error;

use crate::xml::MarkupError;

/// Result type alias for ingest operations
pub type Result<T> = std::result::Result<T, IngestError>;

/// Errors raised while turning BAG documents into Parquet
///
/// Record-level problems (bad dates, unusable geometry) never show up here;
/// they null a field or drop the record. Everything below fails a whole
/// document or, from the merge stage on, the whole run.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Document '{path}' is {size} bytes, above the {limit} byte limit")]
    OversizeDocument { path: PathBuf, size: u64, limit: u64 },

    #[error("Malformed XML in '{path}': {source}")]
    Xml {
        path: PathBuf,
        #[source]
        source: MarkupError,
    },

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Shard '{path}' does not match the schema of the first shard")]
    SchemaMismatch { path: PathBuf },

    #[error("Column '{column}' is missing or has an unexpected type in '{path}'")]
    MissingColumn { path: PathBuf, column: String },

    #[error("Worker for '{path}' did not finish: {message}")]
    Worker { path: PathBuf, message: String },

    #[error("No shards to merge")]
    NothingToMerge,

    #[error("No boundary named '{0}' found")]
    BoundaryNotFound(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error(transparent)]
    Common(#[from] bag_common::BagError),
}

impl IngestError {
    /// Wrap an I/O error with the path it happened on
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        IngestError::Io {
            path: path.into(),
            source,
        }
    }

    /// Check if this error represents a missing file
    pub fn is_not_found(&self) -> bool {
        matches!(self, IngestError::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound)
    }
}
