//! Run reports

use std::path::{Path, PathBuf};

use bag_common::types::ArtifactFile;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{IngestError, Result};
use crate::extract::EntityKind;

/// A document whose worker failed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentFailure {
    pub index: usize,
    pub path: PathBuf,
    pub error: String,
}

/// Outcome of one pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub entity: EntityKind,
    pub started_at: DateTime<Utc>,
    pub documents: usize,
    pub shards: usize,
    pub failures: Vec<DocumentFailure>,
    /// Entities seen across successful documents
    pub entities_seen: usize,
    pub superseded: usize,
    pub missing_geometry: usize,
    pub rows: usize,
    pub bbox: Option<[f64; 4]>,
    pub extent_version: String,
    pub artifact: ArtifactFile,
    pub elapsed_seconds: f64,
}

impl RunReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Write the report as pretty JSON
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self).map_err(bag_common::BagError::from)?;
        std::fs::write(path, json).map_err(|e| IngestError::io(path, e))
    }

    pub fn read_json(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| IngestError::io(path, e))?;
        Ok(serde_json::from_str(&json).map_err(bag_common::BagError::from)?)
    }
}
