//! Error types shared across the BAG workspace

use thiserror::Error;

/// Result type alias for shared BAG operations
pub type Result<T> = std::result::Result<T, BagError>;

/// Errors raised by the shared utilities
#[derive(Error, Debug)]
pub enum BagError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
