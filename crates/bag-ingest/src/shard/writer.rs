//! GeoParquet file writer and reader

use std::fs::File;
use std::path::{Path, PathBuf};

use arrow::array::{Array, AsArray};
use arrow::datatypes::{DataType, SchemaRef};
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use parquet::file::metadata::KeyValue;
use parquet::file::properties::WriterProperties;
use tracing::debug;

use super::geoparquet::{footer_metadata, GeometryStats};
use super::schema::GEOMETRY_COLUMN;
use crate::config::ParquetCompression;
use crate::error::{IngestError, Result};
use crate::spatial::BoundingExtent;

/// Configuration for the Parquet writer
#[derive(Debug, Clone)]
pub struct WriterOptions {
    pub compression: ParquetCompression,
    /// Maximum rows per row group
    pub row_group_size: usize,
    /// Extent the rows are ordered against, recorded in the footer
    pub extent: Option<BoundingExtent>,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            compression: ParquetCompression::default(),
            row_group_size: crate::config::DEFAULT_ROW_GROUP_SIZE,
            extent: None,
        }
    }
}

impl WriterOptions {
    fn writer_properties(&self) -> WriterProperties {
        WriterProperties::builder()
            .set_compression(self.compression.codec())
            .set_max_row_group_size(self.row_group_size.max(1))
            .build()
    }
}

/// A finished Parquet file
#[derive(Debug, Clone)]
pub struct WrittenFile {
    pub path: PathBuf,
    pub rows: usize,
    pub bbox: Option<[f64; 4]>,
}

/// Writes record batches with a WKB `geom` column to one Parquet file
///
/// Geometry types and bounds are collected while writing and stored as
/// GeoParquet metadata when the file is finished.
pub struct GeoParquetWriter {
    path: PathBuf,
    writer: ArrowWriter<File>,
    geometry_index: usize,
    stats: GeometryStats,
    rows: usize,
    extent: Option<BoundingExtent>,
}

impl GeoParquetWriter {
    pub fn create(path: impl AsRef<Path>, schema: SchemaRef, options: &WriterOptions) -> Result<Self> {
        let path = path.as_ref();
        let geometry_index = geometry_column_index(&schema, path)?;

        let file = File::create(path).map_err(|e| IngestError::io(path, e))?;
        let writer = ArrowWriter::try_new(file, schema, Some(options.writer_properties()))?;

        Ok(Self {
            path: path.to_path_buf(),
            writer,
            geometry_index,
            stats: GeometryStats::default(),
            rows: 0,
            extent: options.extent.clone(),
        })
    }

    pub fn write(&mut self, batch: &RecordBatch) -> Result<()> {
        if let Some(geometries) = batch.column(self.geometry_index).as_binary_opt::<i32>() {
            for wkb in geometries.iter().flatten() {
                self.stats.update(wkb);
            }
        }

        self.writer.write(batch)?;
        self.rows += batch.num_rows();
        Ok(())
    }

    /// Write rows whose geometries the caller has already folded into
    /// [`GeoParquetWriter::absorb_stats`]
    pub fn write_summarized(&mut self, batch: &RecordBatch) -> Result<()> {
        self.writer.write(batch)?;
        self.rows += batch.num_rows();
        Ok(())
    }

    pub fn absorb_stats(&mut self, stats: &GeometryStats) {
        self.stats.absorb(stats);
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Write the footer and close the file
    pub fn finish(mut self) -> Result<WrittenFile> {
        for entry in footer_metadata(&self.stats, GEOMETRY_COLUMN, self.extent.as_ref())
            .map_err(bag_common::BagError::from)?
        {
            self.writer.append_key_value_metadata(entry);
        }
        self.writer.close()?;

        debug!(path = %self.path.display(), rows = self.rows, "Closed parquet file");

        Ok(WrittenFile {
            path: self.path,
            rows: self.rows,
            bbox: self.stats.bbox(),
        })
    }
}

/// Everything read back from a Parquet file
#[derive(Debug)]
pub struct ParquetContents {
    pub schema: SchemaRef,
    pub batches: Vec<RecordBatch>,
    pub metadata: Vec<KeyValue>,
}

impl ParquetContents {
    pub fn num_rows(&self) -> usize {
        self.batches.iter().map(RecordBatch::num_rows).sum()
    }

    /// Footer value for `key`
    pub fn metadata_value(&self, key: &str) -> Option<&str> {
        self.metadata
            .iter()
            .find(|kv| kv.key == key)
            .and_then(|kv| kv.value.as_deref())
    }
}

/// Read a whole Parquet file into memory
pub fn read_parquet(path: impl AsRef<Path>) -> Result<ParquetContents> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| IngestError::io(path, e))?;

    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
    let schema = builder.schema().clone();
    let metadata = builder
        .metadata()
        .file_metadata()
        .key_value_metadata()
        .cloned()
        .unwrap_or_default();

    let batches = builder
        .build()?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(ParquetContents {
        schema,
        batches,
        metadata,
    })
}

/// Position of the binary `geom` column
pub fn geometry_column_index(schema: &SchemaRef, path: &Path) -> Result<usize> {
    match schema.index_of(GEOMETRY_COLUMN) {
        Ok(index) if schema.field(index).data_type() == &DataType::Binary => Ok(index),
        _ => Err(IngestError::MissingColumn {
            path: path.to_path_buf(),
            column: GEOMETRY_COLUMN.to_string(),
        }),
    }
}

/// Geometry values of a batch, `None` where null
pub fn geometry_values<'b>(batch: &'b RecordBatch, index: usize) -> impl Iterator<Item = Option<&'b [u8]>> + 'b {
    let column = batch.column(index).as_binary::<i32>();
    (0..column.len()).map(move |row| (!column.is_null(row)).then(|| column.value(row)))
}
