//! Shard worker
//!
//! Each input document becomes exactly one Parquet shard, written by a
//! worker that owns all of its state.

pub mod geoparquet;
pub mod schema;
pub mod worker;
pub mod writer;

pub use schema::{entity_schema, records_to_batch, GEOMETRY_COLUMN};
pub use worker::{process, process_blocking, ShardContext, ShardOptions, ShardOutcome};
pub use writer::{read_parquet, GeoParquetWriter, ParquetContents, WriterOptions, WrittenFile};
