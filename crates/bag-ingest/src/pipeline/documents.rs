//! Input document enumeration

use std::path::{Path, PathBuf};

use crate::error::{IngestError, Result};

/// Ordered list of input documents; a document's position is its shard index
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentSet {
    paths: Vec<PathBuf>,
}

impl DocumentSet {
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self { paths }
    }

    /// `<dir>/<prefix>-000001.xml` up to `<dir>/<prefix>-<count>.xml`
    ///
    /// Files are not checked for existence; a missing one fails its own worker.
    pub fn from_pattern(dir: impl AsRef<Path>, prefix: &str, count: usize) -> Self {
        let dir = dir.as_ref();
        let paths = (1..=count)
            .map(|seq| dir.join(format!("{}-{:06}.xml", prefix, seq)))
            .collect();
        Self { paths }
    }

    /// Every `*.xml` file in `dir` whose name starts with `prefix`, sorted by name
    pub fn from_dir(dir: impl AsRef<Path>, prefix: &str) -> Result<Self> {
        Self::list(dir.as_ref(), |name| name.starts_with(prefix))
    }

    /// Every `*.xml` file in `dir` whose name contains `code`, e.g. `PND`
    pub fn discover(dir: impl AsRef<Path>, code: &str) -> Result<Self> {
        Self::list(dir.as_ref(), |name| name.contains(code))
    }

    fn list(dir: &Path, matches: impl Fn(&str) -> bool) -> Result<Self> {
        let entries = std::fs::read_dir(dir).map_err(|e| IngestError::io(dir, e))?;

        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| IngestError::io(dir, e))?;
            let path = entry.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let is_xml = path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("xml"));
            if is_xml && matches(name) && path.is_file() {
                paths.push(path);
            }
        }
        paths.sort();

        Ok(Self { paths })
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PathBuf> {
        self.paths.iter()
    }
}

/// Shard file for the document at `index`
pub fn shard_path(shard_dir: &Path, index: usize) -> PathBuf {
    shard_dir.join(format!("shard_{:06}.parquet", index))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_from_pattern() {
        let set = DocumentSet::from_pattern("data", "9999PND08122025", 3);
        assert_eq!(
            set.paths(),
            &[
                PathBuf::from("data/9999PND08122025-000001.xml"),
                PathBuf::from("data/9999PND08122025-000002.xml"),
                PathBuf::from("data/9999PND08122025-000003.xml"),
            ]
        );
        assert!(DocumentSet::from_pattern("data", "x", 0).is_empty());
    }

    #[test]
    fn test_from_dir_sorts_and_filters() {
        let dir = TempDir::new().unwrap();
        for name in [
            "9999WPL08122025-000002.xml",
            "9999WPL08122025-000001.xml",
            "9999PND08122025-000001.xml",
            "9999WPL08122025-notes.txt",
        ] {
            std::fs::write(dir.path().join(name), "<x/>").unwrap();
        }
        std::fs::create_dir(dir.path().join("9999WPL08122025-dir.xml")).unwrap();

        let set = DocumentSet::from_dir(dir.path(), "9999WPL").unwrap();
        let names: Vec<_> = set
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            vec!["9999WPL08122025-000001.xml", "9999WPL08122025-000002.xml"]
        );

        let set = DocumentSet::discover(dir.path(), "PND").unwrap();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_from_missing_dir() {
        let err = DocumentSet::from_dir("/nonexistent/bag", "x").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_shard_path_is_indexed() {
        assert_eq!(
            shard_path(Path::new("tmp"), 7),
            PathBuf::from("tmp/shard_000007.parquet")
        );
    }
}
