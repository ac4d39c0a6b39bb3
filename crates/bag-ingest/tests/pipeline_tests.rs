//! End-to-end pipeline tests
//!
//! These run the driver over the fixture documents:
//! - Document isolation and the failure policy
//! - Deterministic shard assignment and row order
//! - Run reports and shard cleanup

mod common;

use arrow::compute::concat_batches;
use bag_ingest::config::FailurePolicy;
use bag_ingest::extract::EntityKind;
use bag_ingest::pipeline::{run, shard_path, RunReport};
use bag_ingest::query::{count_intersecting, summarize};
use bag_ingest::shard::read_parquet;
use common::{pipeline_config, PND_PREFIX, VBO_PREFIX, WPL_PREFIX};
use tempfile::TempDir;

#[tokio::test]
async fn test_pand_run_end_to_end() {
    let dir = TempDir::new().unwrap();
    let config = pipeline_config(EntityKind::Pand, PND_PREFIX, 2, dir.path());

    let report = run(&config).await.unwrap();

    assert!(report.is_complete());
    assert_eq!(report.documents, 2);
    assert_eq!(report.shards, 2);
    assert_eq!(report.rows, 5);
    assert_eq!(report.entities_seen, 6);
    assert_eq!(report.superseded, 1);
    assert_eq!(report.extent_version, "rd-new-v1");
    assert_eq!(report.artifact.path, dir.path().join("panden.parquet"));
    assert_eq!(report.artifact.checksum.len(), 64);

    let summary = summarize(dir.path().join("panden.parquet")).unwrap();
    assert_eq!(summary.rows, 5);
    assert!(summary.hilbert_ordered);
    assert_eq!(summary.bbox, Some([84000.0, 447000.0, 250030.0, 600010.0]));

    // shards and their directory are cleaned up
    assert!(!config.shard_dir().exists());
}

#[tokio::test]
async fn test_missing_document_is_isolated() {
    let dir = TempDir::new().unwrap();
    let mut config = pipeline_config(EntityKind::Pand, PND_PREFIX, 3, dir.path());
    config.keep_shards = true;

    let report = run(&config).await.unwrap();

    assert!(!report.is_complete());
    assert_eq!(report.shards, 2);
    assert_eq!(report.rows, 5);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].index, 2);
    assert!(report.failures[0]
        .path
        .ends_with("9999PND08122025-000003.xml"));

    let shard_dir = config.shard_dir();
    assert!(shard_path(&shard_dir, 0).exists());
    assert!(shard_path(&shard_dir, 1).exists());
    assert!(!shard_path(&shard_dir, 2).exists());
    assert_eq!(std::fs::read_dir(&shard_dir).unwrap().count(), 2);
}

#[tokio::test]
async fn test_abort_policy_skips_merge() {
    let dir = TempDir::new().unwrap();
    let mut config = pipeline_config(EntityKind::Pand, PND_PREFIX, 3, dir.path());
    config.failure_policy = FailurePolicy::Abort;

    let err = run(&config).await.unwrap_err();

    assert!(err.to_string().contains("9999PND08122025-000003.xml"));
    assert!(!dir.path().join("panden.parquet").exists());
    assert!(!config.shard_dir().exists());
}

#[tokio::test]
async fn test_all_documents_failing_fails_the_run() {
    let dir = TempDir::new().unwrap();
    let config = pipeline_config(EntityKind::Pand, "9999PND01011900", 2, dir.path());

    let err = run(&config).await.unwrap_err();

    assert!(err.to_string().contains("All 2 documents failed"));
    assert!(!dir.path().join("panden.parquet").exists());
}

#[tokio::test]
async fn test_rerun_gives_identical_artifact() {
    let first = TempDir::new().unwrap();
    let second = TempDir::new().unwrap();

    let mut config = pipeline_config(EntityKind::Pand, PND_PREFIX, 2, first.path());
    config.workers = Some(1);
    let a = run(&config).await.unwrap();

    let mut config = pipeline_config(EntityKind::Pand, PND_PREFIX, 2, second.path());
    config.workers = Some(4);
    let b = run(&config).await.unwrap();

    let a_contents = read_parquet(&a.artifact.path).unwrap();
    let b_contents = read_parquet(&b.artifact.path).unwrap();
    let a_rows = concat_batches(&a_contents.schema, a_contents.batches.iter()).unwrap();
    let b_rows = concat_batches(&b_contents.schema, b_contents.batches.iter()).unwrap();

    assert_eq!(a_rows, b_rows);
    assert_eq!(a.artifact.checksum, b.artifact.checksum);
}

#[tokio::test]
async fn test_run_report_is_written() {
    let dir = TempDir::new().unwrap();
    let mut config = pipeline_config(EntityKind::Verblijfsobject, VBO_PREFIX, 1, dir.path());
    config.write_report = true;

    let report = run(&config).await.unwrap();

    let written = RunReport::read_json(config.report_path()).unwrap();
    assert_eq!(written.run_id, report.run_id);
    assert_eq!(written.rows, 2);
    assert_eq!(written.entity, EntityKind::Verblijfsobject);
    assert_eq!(written.artifact, report.artifact);
}

#[tokio::test]
async fn test_discovery_without_prefix() {
    let dir = TempDir::new().unwrap();
    let mut config = pipeline_config(EntityKind::Pand, PND_PREFIX, 0, dir.path());
    config.prefix = None;
    config.count = None;

    let report = run(&config).await.unwrap();

    // truncated.xml does not carry the PND code
    assert_eq!(report.documents, 2);
    assert_eq!(report.rows, 5);
}

#[tokio::test]
async fn test_count_features_in_woonplaats() {
    let dir = TempDir::new().unwrap();

    let woonplaatsen = run(&pipeline_config(
        EntityKind::Woonplaats,
        WPL_PREFIX,
        1,
        dir.path(),
    ))
    .await
    .unwrap();
    let panden = run(&pipeline_config(EntityKind::Pand, PND_PREFIX, 2, dir.path()))
        .await
        .unwrap();
    let vbo = run(&pipeline_config(
        EntityKind::Verblijfsobject,
        VBO_PREFIX,
        1,
        dir.path(),
    ))
    .await
    .unwrap();

    let boundaries = &woonplaatsen.artifact.path;
    assert_eq!(
        count_intersecting(&vbo.artifact.path, boundaries, "Middelstad").unwrap(),
        1
    );
    assert_eq!(
        count_intersecting(&panden.artifact.path, boundaries, "Middelstad").unwrap(),
        1
    );
    assert_eq!(
        count_intersecting(&panden.artifact.path, boundaries, "9002").unwrap(),
        1
    );
}
