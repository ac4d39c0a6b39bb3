//! Pipeline driver
//!
//! Fans documents out over a bounded pool of blocking shard workers, waits for
//! all of them, then merges the surviving shards into one artifact.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{bail, Context, Result};
use bag_common::checksum::fingerprint_file;
use bag_common::types::ChecksumAlgorithm;
use futures::stream::{self, StreamExt};
use tracing::{debug, error, info, warn, Instrument};
use uuid::Uuid;

use super::documents::{shard_path, DocumentSet};
use super::progress::{document_progress, format_bytes};
use super::report::{DocumentFailure, RunReport};
use crate::config::{FailurePolicy, PipelineConfig};
use crate::error::IngestError;
use crate::extract::ExtractStats;
use crate::merge::{merge, MergeOptions};
use crate::shard::{process_blocking, ShardOptions, ShardOutcome};

/// Resolve the documents a run will process
pub fn resolve_documents(config: &PipelineConfig) -> crate::Result<DocumentSet> {
    match (&config.prefix, config.count) {
        (Some(prefix), Some(count)) => Ok(DocumentSet::from_pattern(
            &config.input_dir,
            prefix,
            count,
        )),
        (Some(prefix), None) => DocumentSet::from_dir(&config.input_dir, prefix),
        (None, _) => DocumentSet::discover(&config.input_dir, config.entity.document_code()),
    }
}

/// Run the whole pipeline for one entity type
pub async fn run(config: &PipelineConfig) -> Result<RunReport> {
    config.validate()?;

    let run_id = Uuid::new_v4();
    let span = tracing::info_span!("run", entity = %config.entity, run_id = %run_id);

    execute(config, run_id).instrument(span).await
}

async fn execute(config: &PipelineConfig, run_id: Uuid) -> Result<RunReport> {
    let started_at = chrono::Utc::now();
    let start_time = Instant::now();

    let documents = resolve_documents(config).with_context(|| {
        format!(
            "Failed to list {} documents in {}",
            config.entity,
            config.input_dir.display()
        )
    })?;
    if documents.is_empty() {
        bail!(
            "No {} documents found in {}",
            config.entity,
            config.input_dir.display()
        );
    }

    let output = config.output_path();
    let shard_dir = config.shard_dir();
    std::fs::create_dir_all(&shard_dir)
        .with_context(|| format!("Failed to create shard directory {}", shard_dir.display()))?;
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output directory {}", parent.display()))?;
    }

    let workers = config.worker_count();
    info!(
        documents = documents.len(),
        workers,
        output = %output.display(),
        "Starting run"
    );

    let results = shard_all(config, &documents, &shard_dir, workers).await;

    let mut outcomes: Vec<ShardOutcome> = Vec::new();
    let mut failures: Vec<DocumentFailure> = Vec::new();
    for (index, result) in results {
        let path = documents.paths()[index].clone();
        match result {
            Ok(outcome) => outcomes.push(outcome),
            Err(e) => {
                error!(document = %path.display(), error = %e, "Document failed");
                failures.push(DocumentFailure {
                    index,
                    path,
                    error: e.to_string(),
                });
            }
        }
    }

    info!(
        succeeded = outcomes.len(),
        failed = failures.len(),
        "Sharding complete"
    );

    if outcomes.is_empty() {
        remove_shards(&shard_dir, &[]);
        bail!("All {} documents failed", documents.len());
    }

    if config.failure_policy == FailurePolicy::Abort {
        if let Some(first) = failures.first() {
            let shards: Vec<PathBuf> = outcomes.iter().map(|o| o.path.clone()).collect();
            remove_shards(&shard_dir, &shards);
            bail!(
                "Aborting run: document {} failed: {}",
                first.path.display(),
                first.error
            );
        }
    }

    let shard_paths: Vec<PathBuf> = outcomes.iter().map(|o| o.path.clone()).collect();
    let merge_options = MergeOptions {
        compression: config.compression,
        row_group_size: config.row_group_size,
        extent: config.extent.clone(),
    };

    let summary = {
        let shard_paths = shard_paths.clone();
        let merge_output = output.clone();
        tokio::task::spawn_blocking(move || merge(&shard_paths, &merge_output, &merge_options))
            .await
            .context("Merge task failed")?
            .with_context(|| format!("Failed to merge shards into {}", output.display()))?
    };

    if config.keep_shards {
        info!(shard_dir = %shard_dir.display(), "Keeping shards");
    } else {
        remove_shards(&shard_dir, &shard_paths);
    }

    let artifact = fingerprint_file(&output, ChecksumAlgorithm::Sha256)
        .with_context(|| format!("Failed to fingerprint {}", output.display()))?;

    let totals = outcomes.iter().fold(ExtractStats::default(), |mut acc, o| {
        acc.seen += o.stats.seen;
        acc.superseded += o.stats.superseded;
        acc.missing_geometry += o.stats.missing_geometry;
        acc.emitted += o.stats.emitted;
        acc
    });

    let elapsed = start_time.elapsed();
    let report = RunReport {
        run_id,
        entity: config.entity,
        started_at,
        documents: documents.len(),
        shards: outcomes.len(),
        failures,
        entities_seen: totals.seen,
        superseded: totals.superseded,
        missing_geometry: totals.missing_geometry,
        rows: summary.rows,
        bbox: summary.bbox,
        extent_version: config.extent.version.clone(),
        artifact,
        elapsed_seconds: elapsed.as_secs_f64(),
    };

    if config.write_report {
        let report_path = config.report_path();
        report
            .write_json(&report_path)
            .with_context(|| format!("Failed to write report {}", report_path.display()))?;
        debug!(report = %report_path.display(), "Wrote run report");
    }

    info!(
        output = %output.display(),
        rows = report.rows,
        size = %format_bytes(report.artifact.size_bytes),
        failed = report.failures.len(),
        "Run complete in {:.2}s",
        report.elapsed_seconds
    );

    Ok(report)
}

/// Shard every document; results come back ordered by document index
async fn shard_all(
    config: &PipelineConfig,
    documents: &DocumentSet,
    shard_dir: &Path,
    workers: usize,
) -> Vec<(usize, Result<ShardOutcome, IngestError>)> {
    let options = ShardOptions::for_config(config);
    let kind = config.entity;
    let total = documents.len();

    let pb = document_progress(
        total as u64,
        &format!("Sharding {} documents", kind),
        config.progress,
    );

    let mut results: Vec<(usize, Result<ShardOutcome, IngestError>)> =
        stream::iter(documents.iter().cloned().enumerate())
            .map(|(index, document)| {
                let output = shard_path(shard_dir, index);
                let options = options.clone();
                let pb = pb.clone();

                async move {
                    debug!(
                        document = %document.display(),
                        "Starting document {} / {}",
                        index + 1,
                        total
                    );
                    let result = process_blocking(kind, document, output, options).await;
                    pb.inc(1);
                    (index, result)
                }
            })
            .buffer_unordered(workers.max(1))
            .collect()
            .await;

    pb.finish_and_clear();
    results.sort_by_key(|(index, _)| *index);
    results
}

/// Remove `shards`, then the directory itself if nothing else is left in it
fn remove_shards(shard_dir: &Path, shards: &[PathBuf]) {
    for shard in shards {
        if let Err(e) = std::fs::remove_file(shard) {
            warn!(shard = %shard.display(), error = %e, "Failed to remove shard");
        }
    }

    let is_empty = std::fs::read_dir(shard_dir)
        .map(|mut entries| entries.next().is_none())
        .unwrap_or(false);
    if is_empty {
        if let Err(e) = std::fs::remove_dir(shard_dir) {
            warn!(shard_dir = %shard_dir.display(), error = %e, "Failed to remove shard directory");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::extract::EntityKind;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_by_pattern() {
        let config = PipelineConfig {
            prefix: Some("9999VBO08122025".to_string()),
            count: Some(2),
            input_dir: PathBuf::from("in"),
            ..Default::default()
        };
        let set = resolve_documents(&config).unwrap();
        assert_eq!(set.paths()[1], PathBuf::from("in/9999VBO08122025-000002.xml"));
    }

    #[test]
    fn test_resolve_discovers_by_entity_code() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("9999WPL08122025-000001.xml"), "<x/>").unwrap();
        std::fs::write(dir.path().join("9999PND08122025-000001.xml"), "<x/>").unwrap();

        let config = PipelineConfig {
            entity: EntityKind::Woonplaats,
            input_dir: dir.path().to_path_buf(),
            ..Default::default()
        };
        let set = resolve_documents(&config).unwrap();
        assert_eq!(set.len(), 1);
        assert!(set.paths()[0].to_string_lossy().contains("WPL"));
    }

    #[test]
    fn test_remove_shards_keeps_foreign_files() {
        let dir = TempDir::new().unwrap();
        let shard_dir = dir.path().join("tmp_panden_shards");
        std::fs::create_dir(&shard_dir).unwrap();
        let shard = shard_path(&shard_dir, 0);
        std::fs::write(&shard, b"x").unwrap();
        std::fs::write(shard_dir.join("notes.txt"), b"x").unwrap();

        remove_shards(&shard_dir, &[shard.clone()]);
        assert!(!shard.exists());
        assert!(shard_dir.exists());

        std::fs::remove_file(shard_dir.join("notes.txt")).unwrap();
        remove_shards(&shard_dir, &[]);
        assert!(!shard_dir.exists());
    }

    #[tokio::test]
    async fn test_empty_input_dir_fails() {
        let dir = TempDir::new().unwrap();
        let config = PipelineConfig {
            input_dir: dir.path().to_path_buf(),
            output: Some(dir.path().join("panden.parquet")),
            progress: false,
            ..Default::default()
        };
        let err = run(&config).await.unwrap_err();
        assert!(err.to_string().contains("No pand documents"));
    }
}
