//! Pipeline configuration
//!
//! Settings are layered: built-in defaults, then an optional TOML file, then
//! `BAG_*` environment variables (nested keys use `__`, e.g.
//! `BAG_EXTENT__VERSION`). Command line flags are applied last by the CLI.

use std::path::{Path, PathBuf};

use clap::ValueEnum;
use parquet::basic::{Compression, GzipLevel, ZstdLevel};
use serde::{Deserialize, Serialize};

use crate::error::{IngestError, Result};
use crate::extract::EntityKind;
use crate::spatial::BoundingExtent;

// ============================================================================
// Pipeline Configuration Constants
// ============================================================================

/// Environment variable prefix for configuration overrides.
pub const ENV_PREFIX: &str = "BAG";

/// Environment variable naming the configuration file.
pub const CONFIG_FILE_ENV: &str = "BAG_CONFIG";

/// Default input directory.
pub const DEFAULT_INPUT_DIR: &str = "data";

/// Default maximum size of one input document in bytes.
pub const DEFAULT_MAX_DOCUMENT_BYTES: u64 = 32_000_000;

/// Default maximum document size for place extracts, whose geometries are much larger.
pub const DEFAULT_WOONPLAATS_MAX_DOCUMENT_BYTES: u64 = 100_000_000;

/// Default number of rows per row group in the merged artifact.
pub const DEFAULT_ROW_GROUP_SIZE: usize = 122_880;

/// Parquet compression codec
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ParquetCompression {
    Uncompressed,
    Snappy,
    Gzip,
    #[default]
    Zstd,
    Lz4,
}

impl ParquetCompression {
    pub fn codec(&self) -> Compression {
        match self {
            ParquetCompression::Uncompressed => Compression::UNCOMPRESSED,
            ParquetCompression::Snappy => Compression::SNAPPY,
            ParquetCompression::Gzip => Compression::GZIP(GzipLevel::default()),
            ParquetCompression::Zstd => Compression::ZSTD(ZstdLevel::default()),
            ParquetCompression::Lz4 => Compression::LZ4_RAW,
        }
    }
}

/// What the driver does when a document fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Log the failure, merge the shards that succeeded and list failures in the report
    #[default]
    Continue,
    /// Fail the run without merging
    Abort,
}

/// Everything a pipeline run needs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub entity: EntityKind,

    /// Directory holding the extract documents
    pub input_dir: PathBuf,

    /// File name prefix, e.g. `9999PND08122025`
    pub prefix: Option<String>,

    /// Number of documents `<prefix>-000001.xml ..= <prefix>-<count>.xml`;
    /// when absent the input directory is listed instead
    pub count: Option<usize>,

    /// Final artifact path; defaults to the entity's artifact name in the working directory
    pub output: Option<PathBuf>,

    /// Directory for intermediate shards; defaults to `tmp_<artifact stem>_shards`
    /// next to the output
    pub shard_dir: Option<PathBuf>,

    /// Worker pool size; defaults to the available parallelism
    pub workers: Option<usize>,

    pub max_document_bytes: Option<u64>,
    pub compression: ParquetCompression,
    pub row_group_size: usize,
    pub failure_policy: FailurePolicy,
    pub keep_shards: bool,

    /// Write `<output>.report.json` after the run
    pub write_report: bool,

    /// Show a progress bar on an interactive terminal
    pub progress: bool,

    pub extent: BoundingExtent,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            entity: EntityKind::Pand,
            input_dir: PathBuf::from(DEFAULT_INPUT_DIR),
            prefix: None,
            count: None,
            output: None,
            shard_dir: None,
            workers: None,
            max_document_bytes: None,
            compression: ParquetCompression::default(),
            row_group_size: DEFAULT_ROW_GROUP_SIZE,
            failure_policy: FailurePolicy::default(),
            keep_shards: false,
            write_report: false,
            progress: true,
            extent: BoundingExtent::default(),
        }
    }
}

impl PipelineConfig {
    /// Load configuration from defaults, an optional file and the environment
    ///
    /// The file is taken from `config_file`, falling back to `BAG_CONFIG`.
    pub fn load(config_file: Option<&Path>) -> Result<Self> {
        dotenvy::dotenv().ok();

        let config_file = config_file
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_FILE_ENV).map(PathBuf::from));

        let mut builder =
            config::Config::builder().add_source(config::Config::try_from(&Self::default())?);

        if let Some(path) = &config_file {
            builder = builder.add_source(config::File::from(path.as_path()).required(true));
        }

        let settings = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.workers == Some(0) {
            return Err(IngestError::InvalidConfig(
                "workers must be greater than 0".to_string(),
            ));
        }

        if self.max_document_bytes == Some(0) {
            return Err(IngestError::InvalidConfig(
                "max_document_bytes must be greater than 0".to_string(),
            ));
        }

        if self.row_group_size == 0 {
            return Err(IngestError::InvalidConfig(
                "row_group_size must be greater than 0".to_string(),
            ));
        }

        if matches!(self.prefix.as_deref(), Some(p) if p.trim().is_empty()) {
            return Err(IngestError::InvalidConfig("prefix cannot be empty".to_string()));
        }

        if self.count.is_some() && self.prefix.is_none() {
            return Err(IngestError::InvalidConfig(
                "count requires a document prefix".to_string(),
            ));
        }

        if self.extent.is_degenerate() {
            return Err(IngestError::InvalidConfig(format!(
                "bounding extent '{}' has no area",
                self.extent.version
            )));
        }

        if self.extent.version.trim().is_empty() {
            return Err(IngestError::InvalidConfig(
                "bounding extent needs a version".to_string(),
            ));
        }

        Ok(())
    }

    pub fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| PathBuf::from(self.entity.artifact_name()))
    }

    pub fn shard_dir(&self) -> PathBuf {
        if let Some(dir) = &self.shard_dir {
            return dir.clone();
        }

        let output = self.output_path();
        let stem = output
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.entity.to_string());
        output
            .parent()
            .unwrap_or_else(|| Path::new(""))
            .join(format!("tmp_{}_shards", stem))
    }

    pub fn worker_count(&self) -> usize {
        self.workers.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(usize::from)
                .unwrap_or(1)
        })
    }

    pub fn max_document_bytes(&self) -> u64 {
        self.max_document_bytes.unwrap_or(match self.entity {
            EntityKind::Woonplaats | EntityKind::WoonplaatsRing => {
                DEFAULT_WOONPLAATS_MAX_DOCUMENT_BYTES
            }
            _ => DEFAULT_MAX_DOCUMENT_BYTES,
        })
    }

    /// Path of the JSON run report written next to the artifact
    pub fn report_path(&self) -> PathBuf {
        let mut name = self.output_path().into_os_string();
        name.push(".report.json");
        PathBuf::from(name)
    }
}
