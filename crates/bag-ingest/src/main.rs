//! BAG Ingest - BAG XML to GeoParquet

use bag_common::logging::{init_logging, LogConfig, LogLevel};
use bag_ingest::cli::{execute, Cli};
use clap::Parser;
use std::process;
use tracing::error;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };

    // Environment variables take precedence over the flag
    let log_config = LogConfig::builder()
        .level(log_level)
        .log_file_prefix("bag-ingest")
        .build()
        .merge_env();

    let guard = match log_config.map(|config| init_logging(&config)) {
        Ok(Ok(guard)) => guard,
        Ok(Err(e)) | Err(e) => {
            eprintln!("Error: failed to initialise logging: {e:#}");
            process::exit(1);
        }
    };

    if let Err(e) = execute(cli).await {
        error!(error = %e, "Command failed");
        eprintln!("Error: {e:#}");
        drop(guard);
        process::exit(1);
    }
}
