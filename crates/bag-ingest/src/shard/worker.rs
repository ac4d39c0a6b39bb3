//! One document in, one shard out

use std::path::{Path, PathBuf};

use arrow::datatypes::SchemaRef;
use serde::Serialize;
use tracing::{debug, warn};

use super::schema::{entity_schema, records_to_batch};
use super::writer::{GeoParquetWriter, WriterOptions};
use crate::config::{ParquetCompression, PipelineConfig, DEFAULT_MAX_DOCUMENT_BYTES};
use crate::error::{IngestError, Result};
use crate::extract::{EntityKind, ExtractStats, Extractor, Record};
use crate::xml::Document;

/// Default number of records per written batch.
pub const DEFAULT_BATCH_SIZE: usize = 8192;

/// Settings for a single shard worker
#[derive(Debug, Clone)]
pub struct ShardOptions {
    pub max_document_bytes: u64,
    pub batch_size: usize,
    /// Shards are intermediate, so a fast codec is enough
    pub compression: ParquetCompression,
}

impl Default for ShardOptions {
    fn default() -> Self {
        Self {
            max_document_bytes: DEFAULT_MAX_DOCUMENT_BYTES,
            batch_size: DEFAULT_BATCH_SIZE,
            compression: ParquetCompression::Snappy,
        }
    }
}

impl ShardOptions {
    /// Options for the configured entity, with its document size cap
    pub fn for_config(config: &PipelineConfig) -> Self {
        Self {
            max_document_bytes: config.max_document_bytes(),
            ..Default::default()
        }
    }
}

/// Result of a successful worker invocation
#[derive(Debug, Clone, Serialize)]
pub struct ShardOutcome {
    pub path: PathBuf,
    pub rows: usize,
    pub stats: ExtractStats,
}

/// Everything one worker needs, built fresh for every document
pub struct ShardContext {
    extractor: Extractor,
    schema: SchemaRef,
    writer_options: WriterOptions,
    options: ShardOptions,
}

impl ShardContext {
    pub fn new(kind: EntityKind, options: &ShardOptions) -> Self {
        let spec = kind.spec();
        let schema = entity_schema(&spec);

        Self {
            extractor: Extractor::new(spec),
            schema,
            writer_options: WriterOptions {
                compression: options.compression,
                row_group_size: options.batch_size.max(1) * 16,
                extent: None,
            },
            options: options.clone(),
        }
    }

    pub fn schema(&self) -> &SchemaRef {
        &self.schema
    }

    /// Extract `document_path` into a shard at `output_path`
    pub fn run(&self, document_path: &Path, output_path: &Path) -> Result<ShardOutcome> {
        let document = Document::open(document_path, self.options.max_document_bytes)?;
        let mut writer =
            GeoParquetWriter::create(output_path, self.schema.clone(), &self.writer_options)?;

        let batch_size = self.options.batch_size.max(1);
        let mut pending: Vec<Record> = Vec::with_capacity(batch_size);
        let mut records = self.extractor.records(&document);

        for record in records.by_ref() {
            pending.push(record?);
            if pending.len() >= batch_size {
                self.flush(&mut writer, &mut pending)?;
            }
        }
        self.flush(&mut writer, &mut pending)?;

        let stats = records.stats();
        let written = writer.finish()?;

        debug!(
            document = %document_path.display(),
            shard = %output_path.display(),
            rows = written.rows,
            seen = stats.seen,
            superseded = stats.superseded,
            missing_geometry = stats.missing_geometry,
            "Shard written"
        );

        Ok(ShardOutcome {
            path: written.path,
            rows: written.rows,
            stats,
        })
    }

    fn flush(&self, writer: &mut GeoParquetWriter, pending: &mut Vec<Record>) -> Result<()> {
        if pending.is_empty() {
            return Ok(());
        }
        let batch = records_to_batch(self.extractor.spec(), &self.schema, pending)?;
        writer.write(&batch)?;
        pending.clear();
        Ok(())
    }
}

/// Turn one document into one shard
///
/// A partially written shard is removed when anything fails.
pub fn process(
    kind: EntityKind,
    document_path: &Path,
    output_path: &Path,
    options: &ShardOptions,
) -> Result<ShardOutcome> {
    let context = ShardContext::new(kind, options);

    context.run(document_path, output_path).inspect_err(|_| {
        remove_partial(output_path);
    })
}

/// [`process`] on a blocking thread; a panic is reported as a failure of this document
pub async fn process_blocking(
    kind: EntityKind,
    document_path: PathBuf,
    output_path: PathBuf,
    options: ShardOptions,
) -> Result<ShardOutcome> {
    let document = document_path.clone();
    let shard = output_path.clone();

    on_blocking_thread(document_path, output_path, move || {
        process(kind, &document, &shard, &options)
    })
    .await
}

async fn on_blocking_thread<F>(document_path: PathBuf, output_path: PathBuf, job: F) -> Result<ShardOutcome>
where
    F: FnOnce() -> Result<ShardOutcome> + Send + 'static,
{
    match tokio::task::spawn_blocking(job).await {
        Ok(result) => result,
        Err(join_error) => {
            remove_partial(&output_path);
            Err(IngestError::Worker {
                path: document_path,
                message: join_error.to_string(),
            })
        }
    }
}

fn remove_partial(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => debug!(shard = %path.display(), "Removed partial shard"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(shard = %path.display(), error = %e, "Failed to remove partial shard"),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_options_follow_entity_size_cap() {
        let mut config = PipelineConfig {
            entity: EntityKind::Woonplaats,
            ..Default::default()
        };
        assert_eq!(
            ShardOptions::for_config(&config).max_document_bytes,
            config.max_document_bytes()
        );
        assert!(ShardOptions::for_config(&config).max_document_bytes > DEFAULT_MAX_DOCUMENT_BYTES);

        config.entity = EntityKind::Pand;
        let options = ShardOptions::for_config(&config);
        assert_eq!(options.max_document_bytes, DEFAULT_MAX_DOCUMENT_BYTES);
        assert_eq!(options.compression, ParquetCompression::Snappy);
    }

    #[tokio::test]
    async fn test_panicking_worker_becomes_worker_error() {
        let dir = TempDir::new().unwrap();
        let document = dir.path().join("9999PND08122025-000001.xml");
        let shard = dir.path().join("shard_000000.parquet");

        let partial = shard.clone();
        let err = on_blocking_thread(document.clone(), shard.clone(), move || {
            std::fs::write(&partial, b"PAR1").unwrap();
            panic!("extractor blew up");
        })
        .await
        .unwrap_err();

        assert!(matches!(err, IngestError::Worker { ref path, .. } if *path == document));
        assert!(!shard.exists());
    }

    #[tokio::test]
    async fn test_blocking_process_passes_errors_through() {
        let dir = TempDir::new().unwrap();
        let shard = dir.path().join("shard_000000.parquet");

        let err = process_blocking(
            EntityKind::Pand,
            dir.path().join("missing.xml"),
            shard.clone(),
            ShardOptions::default(),
        )
        .await
        .unwrap_err();

        assert!(err.is_not_found());
        assert!(!shard.exists());
    }
}
