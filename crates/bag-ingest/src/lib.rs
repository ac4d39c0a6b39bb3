//! BAG Ingest Library
//!
//! Turns BAG (Basisregistratie Adressen en Gebouwen) XML extracts into
//! spatially ordered GeoParquet artifacts.
//!
//! # Stages
//!
//! - **Extract**: stream entities out of one document, drop superseded ones and
//!   convert their GML geometry to WKB ([`extract`], [`geometry`])
//! - **Shard**: write each document to its own Parquet shard ([`shard`])
//! - **Merge**: concatenate shards and sort rows along a Hilbert curve ([`merge`])
//!
//! [`pipeline::run`] drives all of them for one entity type.
//!
//! # Example
//!
//! ```no_run
//! use bag_ingest::config::PipelineConfig;
//! use bag_ingest::extract::EntityKind;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = PipelineConfig {
//!         entity: EntityKind::Pand,
//!         prefix: Some("9999PND08122025".to_string()),
//!         count: Some(2),
//!         ..Default::default()
//!     };
//!     let report = bag_ingest::pipeline::run(&config).await?;
//!     println!("{} rows", report.rows);
//!     Ok(())
//! }
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod cli;
pub mod config;
pub mod error;
pub mod extract;
pub mod geometry;
pub mod merge;
pub mod pipeline;
pub mod query;
pub mod shard;
pub mod spatial;
pub mod xml;

pub use error::{IngestError, Result};
