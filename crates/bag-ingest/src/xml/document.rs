//! Whole-file document reader

use std::path::{Path, PathBuf};

use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::debug;

use super::element::{read_subtree, Element};
use crate::error::{IngestError, Result};

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// One BAG input file held in memory
#[derive(Debug)]
pub struct Document {
    path: PathBuf,
    bytes: Vec<u8>,
}

impl Document {
    /// Read a document from disk, refusing files larger than `max_bytes`
    pub fn open(path: impl AsRef<Path>, max_bytes: u64) -> Result<Self> {
        let path = path.as_ref();
        let metadata = std::fs::metadata(path).map_err(|e| IngestError::io(path, e))?;

        if metadata.len() > max_bytes {
            return Err(IngestError::OversizeDocument {
                path: path.to_path_buf(),
                size: metadata.len(),
                limit: max_bytes,
            });
        }

        let bytes = std::fs::read(path).map_err(|e| IngestError::io(path, e))?;
        debug!(document = %path.display(), bytes = bytes.len(), "Loaded document");

        Ok(Self::from_bytes(path, bytes))
    }

    /// Wrap bytes that are already in memory; `path` is only used in errors
    pub fn from_bytes(path: impl Into<PathBuf>, mut bytes: Vec<u8>) -> Self {
        if bytes.starts_with(UTF8_BOM) {
            bytes.drain(..UTF8_BOM.len());
        }

        Self {
            path: path.into(),
            bytes,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Lazily iterate every element whose qualified name equals `name`
    ///
    /// Matching elements nested inside another match are returned as part of
    /// the outer element only. The iterator stops after the first error.
    pub fn entities<'a>(&'a self, name: &'a str) -> Entities<'a> {
        Entities {
            reader: Reader::from_reader(self.bytes.as_slice()),
            name,
            path: &self.path,
            finished: false,
        }
    }
}

/// Iterator returned by [`Document::entities`]
pub struct Entities<'a> {
    reader: Reader<&'a [u8]>,
    name: &'a str,
    path: &'a Path,
    finished: bool,
}

impl Entities<'_> {
    fn next_entity(&mut self) -> std::result::Result<Option<Element>, super::MarkupError> {
        loop {
            match self.reader.read_event()? {
                Event::Start(start) if start.name().as_ref() == self.name.as_bytes() => {
                    return read_subtree(&mut self.reader, &start).map(Some);
                }
                Event::Empty(start) if start.name().as_ref() == self.name.as_bytes() => {
                    return Element::from_start(&start).map(Some);
                }
                Event::Eof => return Ok(None),
                _ => {}
            }
        }
    }
}

impl Iterator for Entities<'_> {
    type Item = Result<Element>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        match self.next_entity() {
            Ok(Some(element)) => Some(Ok(element)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(source) => {
                self.finished = true;
                Some(Err(IngestError::Xml {
                    path: self.path.to_path_buf(),
                    source,
                }))
            }
        }
    }
}
