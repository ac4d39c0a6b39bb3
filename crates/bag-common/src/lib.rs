//! BAG Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared types, utilities, and error handling for the BAG Parquet workspace.
//!
//! # Overview
//!
//! - **Error Handling**: [`BagError`] and the [`Result`] alias
//! - **Logging**: structured `tracing` setup shared by every binary
//! - **Checksums**: integrity digests for written artifacts
//!
//! # Example
//!
//! ```no_run
//! use bag_common::checksum::compute_file_checksum;
//! use bag_common::types::ChecksumAlgorithm;
//!
//! fn fingerprint(path: &str) -> bag_common::Result<()> {
//!     let digest = compute_file_checksum(path, ChecksumAlgorithm::Sha256)?;
//!     tracing::info!(%digest, "artifact fingerprint");
//!     Ok(())
//! }
//! ```

pub mod checksum;
pub mod error;
pub mod logging;
pub mod types;

// Re-export commonly used types
pub use error::{BagError, Result};
