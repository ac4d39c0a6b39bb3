//! Common types used across the BAG workspace

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Checksum algorithm type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ChecksumAlgorithm {
    #[default]
    Sha256,
}

impl std::fmt::Display for ChecksumAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChecksumAlgorithm::Sha256 => write!(f, "sha256"),
        }
    }
}

/// Fingerprint of a file written by a pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactFile {
    /// Location of the file on disk
    pub path: PathBuf,

    /// Hex-encoded digest of the file contents
    pub checksum: String,

    /// Algorithm used for `checksum`
    pub algorithm: ChecksumAlgorithm,

    /// File size in bytes
    pub size_bytes: u64,

    /// When the fingerprint was taken
    pub recorded_at: DateTime<Utc>,
}
