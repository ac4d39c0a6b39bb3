//! Shard merge stage
//!
//! Reads shards in path order, sorts row references along a Hilbert curve
//! and writes the final artifact one row group at a time.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow::compute::interleave_record_batch;
use geo::BoundingRect;
use arrow::datatypes::{Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::{ParquetCompression, DEFAULT_ROW_GROUP_SIZE};
use crate::error::{IngestError, Result};
use crate::geometry::wkb_to_geo;
use crate::shard::geoparquet::GeometryStats;
use crate::shard::writer::{geometry_column_index, geometry_values, read_parquet};
use crate::shard::{GeoParquetWriter, WriterOptions};
use crate::spatial::{hilbert_key, BoundingExtent};

/// Settings for the merge stage
#[derive(Debug, Clone)]
pub struct MergeOptions {
    pub compression: ParquetCompression,
    pub row_group_size: usize,
    pub extent: BoundingExtent,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            compression: ParquetCompression::Zstd,
            row_group_size: DEFAULT_ROW_GROUP_SIZE,
            extent: BoundingExtent::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergeSummary {
    pub rows: usize,
    pub shards: usize,
    pub bbox: Option<[f64; 4]>,
}

/// Hilbert key of every row of `batch`; rows without decodable geometry get 0
pub fn row_keys(batch: &RecordBatch, geometry_index: usize, extent: &BoundingExtent) -> Vec<u32> {
    scan_rows(batch, geometry_index, extent, &mut GeometryStats::default())
}

/// [`row_keys`], folding every decoded geometry into `stats` on the way
pub fn scan_rows(
    batch: &RecordBatch,
    geometry_index: usize,
    extent: &BoundingExtent,
    stats: &mut GeometryStats,
) -> Vec<u32> {
    geometry_values(batch, geometry_index)
        .map(|wkb| {
            let Some(geometry) = wkb.and_then(wkb_to_geo) else {
                return 0;
            };
            stats.record(&geometry);
            geometry
                .bounding_rect()
                .map_or(0, |bounds| hilbert_key(extent, &bounds))
        })
        .collect()
}

/// Position of one row: (key, batch, row within batch)
type RowRef = (u32, usize, usize);

/// Merge `shard_paths` into one Hilbert ordered artifact at `output`
pub fn merge(shard_paths: &[PathBuf], output: &Path, options: &MergeOptions) -> Result<MergeSummary> {
    let Some(first) = shard_paths.first() else {
        return Err(IngestError::NothingToMerge);
    };

    let mut schema: Option<SchemaRef> = None;
    let mut batches = Vec::new();

    for path in shard_paths {
        let contents = read_parquet(path)?;
        match &schema {
            None => schema = Some(strip_metadata(&contents.schema)),
            Some(expected) if expected.fields() != contents.schema.fields() => {
                return Err(IngestError::SchemaMismatch { path: path.clone() });
            }
            Some(_) => {}
        }
        debug!(shard = %path.display(), rows = contents.num_rows(), "Read shard");
        batches.extend(contents.batches);
    }

    let schema = schema.ok_or(IngestError::NothingToMerge)?;
    let geometry_index = geometry_column_index(&schema, first)?;

    let mut stats = GeometryStats::default();
    let mut order: Vec<RowRef> = Vec::new();
    for (batch_index, batch) in batches.iter().enumerate() {
        let keys = scan_rows(batch, geometry_index, &options.extent, &mut stats);
        order.extend(
            keys.into_iter()
                .enumerate()
                .map(|(row, key)| (key, batch_index, row)),
        );
    }
    // stable: equal keys keep shard order
    order.sort_by_key(|&(key, _, _)| key);

    let written = write_artifact(&schema, &batches, &order, &stats, output, options)?;

    info!(
        output = %output.display(),
        rows = written.rows,
        shards = shard_paths.len(),
        extent = %options.extent.version,
        "Merged shards"
    );

    Ok(MergeSummary {
        rows: written.rows,
        shards: shard_paths.len(),
        bbox: written.bbox,
    })
}

/// Write through a temporary file so a failed merge leaves no artifact behind
fn write_artifact(
    schema: &SchemaRef,
    batches: &[RecordBatch],
    order: &[RowRef],
    stats: &GeometryStats,
    output: &Path,
    options: &MergeOptions,
) -> Result<crate::shard::WrittenFile> {
    let mut partial = output.as_os_str().to_owned();
    partial.push(".partial");
    let partial = PathBuf::from(partial);

    let write = || -> Result<crate::shard::WrittenFile> {
        let writer_options = WriterOptions {
            compression: options.compression,
            row_group_size: options.row_group_size,
            extent: Some(options.extent.clone()),
        };
        let mut writer = GeoParquetWriter::create(&partial, schema.clone(), &writer_options)?;

        let sources: Vec<&RecordBatch> = batches.iter().collect();
        for group in order.chunks(options.row_group_size.max(1)) {
            let indices: Vec<(usize, usize)> =
                group.iter().map(|&(_, batch, row)| (batch, row)).collect();
            let rows = interleave_record_batch(&sources, &indices)?;
            // shard footers may differ, the artifact carries its own
            let rows = RecordBatch::try_new(schema.clone(), rows.columns().to_vec())?;
            writer.write_summarized(&rows)?;
        }
        writer.absorb_stats(stats);
        writer.finish()
    };

    let written = match write() {
        Ok(written) => written,
        Err(e) => {
            let _ = std::fs::remove_file(&partial);
            return Err(e);
        }
    };

    std::fs::rename(&partial, output).map_err(|e| IngestError::io(output, e))?;

    Ok(crate::shard::WrittenFile {
        path: output.to_path_buf(),
        ..written
    })
}

fn strip_metadata(schema: &SchemaRef) -> SchemaRef {
    Arc::new(Schema::new(schema.fields().clone()))
}
