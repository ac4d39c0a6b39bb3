//! Command line interface
//!
//! Flags given on the command line override values loaded by
//! [`PipelineConfig::load`].

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;

use crate::config::{FailurePolicy, ParquetCompression, PipelineConfig, CONFIG_FILE_ENV};
use crate::extract::EntityKind;
use crate::merge::{merge, MergeOptions};
use crate::pipeline;
use crate::query::{count_intersecting, summarize};
use crate::shard::{process, ShardOptions};

/// BAG XML extracts to Hilbert ordered GeoParquet
#[derive(Parser, Debug)]
#[command(name = "bag-ingest")]
#[command(author, version, about, long_about = None)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbose output (debug logging, no progress bar)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// TOML configuration file
    #[arg(short, long, env = CONFIG_FILE_ENV, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Shard every document of one entity type and merge the result
    Run(RunArgs),

    /// Turn a single document into a shard
    Shard {
        /// Entity type to extract
        #[arg(short, long, value_enum)]
        entity: EntityKind,

        /// BAG XML document
        #[arg(short, long)]
        input: PathBuf,

        /// Shard file to write
        #[arg(short, long)]
        output: PathBuf,

        /// Refuse documents larger than this many bytes
        #[arg(long)]
        max_document_bytes: Option<u64>,
    },

    /// Merge shards into one Hilbert ordered artifact
    Merge {
        /// Artifact to write
        #[arg(short, long)]
        output: PathBuf,

        /// Shards, merged in the order given
        #[arg(required = true)]
        shards: Vec<PathBuf>,

        /// Codec for the artifact (default: configured compression, zstd)
        #[arg(long, value_enum)]
        compression: Option<ParquetCompression>,
    },

    /// Print a JSON summary of an artifact
    Inspect {
        artifact: PathBuf,
    },

    /// Count features intersecting a named boundary
    CountIntersecting {
        /// Artifact with the features to count
        #[arg(long)]
        features: PathBuf,

        /// Artifact with boundaries, e.g. woonplaatsen.parquet
        #[arg(long)]
        boundaries: PathBuf,

        /// Boundary `naam` or `identificatie`
        #[arg(long)]
        name: String,
    },
}

#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Entity type to process
    #[arg(short, long, value_enum)]
    pub entity: Option<EntityKind>,

    /// Directory holding the XML documents
    #[arg(short, long)]
    pub input_dir: Option<PathBuf>,

    /// Document name prefix, e.g. 9999PND08122025
    #[arg(short, long)]
    pub prefix: Option<String>,

    /// Number of numbered documents (`<prefix>-000001.xml` onwards)
    #[arg(short = 'n', long)]
    pub count: Option<usize>,

    /// Artifact to write
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    #[arg(long)]
    pub shard_dir: Option<PathBuf>,

    /// Concurrent workers (default: available parallelism)
    #[arg(short, long)]
    pub workers: Option<usize>,

    #[arg(long)]
    pub max_document_bytes: Option<u64>,

    #[arg(long, value_enum)]
    pub compression: Option<ParquetCompression>,

    #[arg(long, value_enum)]
    pub failure_policy: Option<FailurePolicy>,

    /// Leave shards on disk after merging
    #[arg(long)]
    pub keep_shards: bool,

    /// Write `<output>.report.json`
    #[arg(long)]
    pub report: bool,
}

impl RunArgs {
    /// Apply flags that were given on top of `config`
    pub fn apply(self, config: &mut PipelineConfig) {
        if let Some(entity) = self.entity {
            config.entity = entity;
        }
        if let Some(dir) = self.input_dir {
            config.input_dir = dir;
        }
        if self.prefix.is_some() {
            config.prefix = self.prefix;
        }
        if self.count.is_some() {
            config.count = self.count;
        }
        if self.output.is_some() {
            config.output = self.output;
        }
        if self.shard_dir.is_some() {
            config.shard_dir = self.shard_dir;
        }
        if self.workers.is_some() {
            config.workers = self.workers;
        }
        if self.max_document_bytes.is_some() {
            config.max_document_bytes = self.max_document_bytes;
        }
        if let Some(compression) = self.compression {
            config.compression = compression;
        }
        if let Some(policy) = self.failure_policy {
            config.failure_policy = policy;
        }
        config.keep_shards |= self.keep_shards;
        config.write_report |= self.report;
    }
}

/// Execute a parsed command line
pub async fn execute(cli: Cli) -> Result<()> {
    let Cli {
        command,
        verbose,
        config: config_file,
    } = cli;

    match command {
        Commands::Run(args) => {
            let mut config = PipelineConfig::load(config_file.as_deref())
                .context("Failed to load configuration")?;
            args.apply(&mut config);
            if verbose {
                config.progress = false;
            }

            let report = pipeline::run(&config).await?;
            println!(
                "{} rows written to {} ({} of {} documents)",
                report.rows,
                report.artifact.path.display(),
                report.shards,
                report.documents
            );
            if !report.is_complete() {
                for failure in &report.failures {
                    eprintln!("failed: {} ({})", failure.path.display(), failure.error);
                }
            }
        }
        Commands::Shard {
            entity,
            input,
            output,
            max_document_bytes,
        } => {
            let mut config = PipelineConfig::load(config_file.as_deref())
                .context("Failed to load configuration")?;
            config.entity = entity;
            if max_document_bytes.is_some() {
                config.max_document_bytes = max_document_bytes;
            }
            let options = ShardOptions::for_config(&config);
            let outcome = tokio::task::spawn_blocking(move || process(entity, &input, &output, &options))
                .await
                .context("Shard task failed")??;
            info!(shard = %outcome.path.display(), rows = outcome.rows, "Shard complete");
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        Commands::Merge {
            output,
            shards,
            compression,
        } => {
            let config = PipelineConfig::load(config_file.as_deref())
                .context("Failed to load configuration")?;
            let options = MergeOptions {
                compression: compression.unwrap_or(config.compression),
                row_group_size: config.row_group_size,
                extent: config.extent,
            };
            let summary = tokio::task::spawn_blocking(move || merge(&shards, &output, &options))
                .await
                .context("Merge task failed")??;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Commands::Inspect { artifact } => {
            let summary = summarize(&artifact)
                .with_context(|| format!("Failed to inspect {}", artifact.display()))?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Commands::CountIntersecting {
            features,
            boundaries,
            name,
        } => {
            let count = count_intersecting(&features, &boundaries, &name)?;
            println!("{count}");
        }
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_run_flags_override_config() {
        let cli = Cli::try_parse_from([
            "bag-ingest",
            "run",
            "--entity",
            "woonplaats-ring",
            "--prefix",
            "9999WPL08122025",
            "--count",
            "2",
            "--workers",
            "3",
            "--failure-policy",
            "abort",
            "--report",
        ])
        .unwrap();

        let Commands::Run(args) = cli.command else {
            panic!("expected run");
        };
        let mut config = PipelineConfig {
            workers: Some(8),
            ..Default::default()
        };
        args.apply(&mut config);

        assert_eq!(config.entity, EntityKind::WoonplaatsRing);
        assert_eq!(config.prefix.as_deref(), Some("9999WPL08122025"));
        assert_eq!(config.count, Some(2));
        assert_eq!(config.workers, Some(3));
        assert_eq!(config.failure_policy, FailurePolicy::Abort);
        assert!(config.write_report);
        assert!(!config.keep_shards);
        assert_eq!(config.compression, ParquetCompression::Zstd);
    }

    #[test]
    fn test_absent_flags_keep_config() {
        let mut config = PipelineConfig {
            keep_shards: true,
            output: Some(PathBuf::from("out/panden.parquet")),
            ..Default::default()
        };
        RunArgs::default().apply(&mut config);
        assert!(config.keep_shards);
        assert_eq!(config.output, Some(PathBuf::from("out/panden.parquet")));
    }

    #[test]
    fn test_merge_compression_is_optional() {
        let cli = Cli::try_parse_from(["bag-ingest", "merge", "-o", "x.parquet", "a.parquet"]).unwrap();
        let Commands::Merge { compression, .. } = cli.command else {
            panic!("expected merge");
        };
        assert_eq!(compression, None);

        let cli = Cli::try_parse_from([
            "bag-ingest",
            "merge",
            "-o",
            "x.parquet",
            "--compression",
            "snappy",
            "a.parquet",
        ])
        .unwrap();
        let Commands::Merge { compression, .. } = cli.command else {
            panic!("expected merge");
        };
        assert_eq!(compression, Some(ParquetCompression::Snappy));
    }

    #[test]
    fn test_merge_requires_shards() {
        assert!(Cli::try_parse_from(["bag-ingest", "merge", "--output", "x.parquet"]).is_err());
    }
}
