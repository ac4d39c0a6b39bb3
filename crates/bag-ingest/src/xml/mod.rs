//! Minimal XML object model for BAG extracts
//!
//! BAG documents are read whole (behind a size guard) and walked with
//! quick-xml; each entity becomes a small owned [`Element`] tree that the
//! extractor queries with [`ElementPath`]s.

pub mod document;
pub mod element;
pub mod path;

pub use document::{Document, Entities};
pub use element::{Element, Node};
pub use path::ElementPath;

use thiserror::Error;

/// Markup-level failures
#[derive(Error, Debug)]
pub enum MarkupError {
    #[error(transparent)]
    Xml(#[from] quick_xml::Error),

    #[error(transparent)]
    Attribute(#[from] quick_xml::events::attributes::AttrError),

    #[error("unexpected end of input inside <{0}>")]
    UnexpectedEof(String),

    #[error("no root element found")]
    NoRootElement,
}
