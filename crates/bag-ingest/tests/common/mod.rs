//! Shared helpers for integration tests

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use bag_ingest::config::PipelineConfig;
use bag_ingest::extract::EntityKind;
use wkb::reader::Wkb;

pub const PND_PREFIX: &str = "9999PND08122025";
pub const VBO_PREFIX: &str = "9999VBO08122025";
pub const WPL_PREFIX: &str = "9999WPL08122025";

pub fn fixture_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/bag")
}

pub fn fixture(name: &str) -> PathBuf {
    fixture_dir().join(name)
}

/// Config reading numbered fixtures and writing into `out_dir`
pub fn pipeline_config(
    entity: EntityKind,
    prefix: &str,
    count: usize,
    out_dir: &Path,
) -> PipelineConfig {
    PipelineConfig {
        entity,
        input_dir: fixture_dir(),
        prefix: Some(prefix.to_string()),
        count: Some(count),
        output: Some(out_dir.join(entity.artifact_name())),
        workers: Some(2),
        progress: false,
        ..Default::default()
    }
}

pub fn to_wkt(bytes: &[u8]) -> String {
    let geometry = Wkb::try_new(bytes).unwrap();
    let mut out = String::new();
    wkt::to_wkt::write_geometry(&mut out, &geometry).unwrap();
    out
}
