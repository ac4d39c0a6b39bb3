//! Build automation tasks for the BAG pipeline
//!
//! Currently this generates the CLI reference from the clap definitions.

use clap::Parser;
use std::fs;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "Build automation tasks for the BAG pipeline", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Parser)]
enum Command {
    /// Generate the CLI reference in Markdown
    GenerateCliDocs {
        /// Output directory for generated documentation
        #[arg(short, long, default_value = "docs")]
        output_dir: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::GenerateCliDocs { output_dir } => generate_cli_docs(&output_dir)?,
    }

    Ok(())
}

fn generate_cli_docs(output_dir: &str) -> anyhow::Result<()> {
    println!("Generating CLI documentation...");

    let markdown = clap_markdown::help_markdown::<bag_ingest::cli::Cli>();

    let content = format!(
        r#"# bag-ingest CLI Reference

This documentation is auto-generated from the CLI source code. Last updated: {}.

## Overview

`bag-ingest` turns BAG XML extract documents into one GeoParquet file per
entity type. Every document is written to its own shard by a pool of workers;
the shards are then merged and the rows sorted along a Hilbert curve over the
Dutch national grid (EPSG:28992).

## Quick Start

```bash
# Buildings from data/9999PND08122025-000001.xml .. -000040.xml
bag-ingest run --entity pand --prefix 9999PND08122025 --count 40 --output panden.parquet

# Woonplaats boundaries, every matching document in the input directory
bag-ingest run --entity woonplaats --prefix 9999WPL08122025 --output woonplaatsen.parquet

# How many buildings lie in Delft?
bag-ingest count-intersecting --features panden.parquet --boundaries woonplaatsen.parquet --name Delft
```

## Commands

{}

## Configuration

Settings are read in this order, later sources winning:

1. Built-in defaults
2. A TOML file given with `--config` or `BAG_CONFIG`
3. `BAG_*` environment variables (a `.env` file is loaded first); nested keys
   use `__`, e.g. `BAG_EXTENT__VERSION`
4. Command line flags

Example `bag.toml`:

```toml
entity = "pand"
input_dir = "data"
prefix = "9999PND08122025"
count = 40
workers = 8
compression = "zstd"
failure_policy = "continue"
write_report = true

[extent]
version = "rd-new-v1"
min_x = 0.0
min_y = 280000.0
max_x = 310000.0
max_y = 640000.0
```

## Environment Variables

- `BAG_CONFIG` - Configuration file
- `LOG_LEVEL` - Logging level (`trace`, `debug`, `info`, `warn`, `error`)
- `LOG_OUTPUT` - `console`, `file` or `both`
- `LOG_FORMAT` - `text` or `json`
- `LOG_DIR` - Directory for rolling log files

---

*This documentation is automatically generated from the CLI source code. To update, run `cargo xtask generate-cli-docs`.*
"#,
        chrono::Utc::now().format("%Y-%m-%d"),
        markdown
    );

    let output_path = PathBuf::from(output_dir);
    fs::create_dir_all(&output_path)?;

    let file_path = output_path.join("cli.md");
    fs::write(&file_path, content)?;

    println!("Generated CLI documentation at: {}", file_path.display());

    Ok(())
}
