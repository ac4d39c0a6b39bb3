//! Document fan-out, barrier and merge for one entity type

pub mod documents;
pub mod driver;
pub mod progress;
pub mod report;

pub use documents::{shard_path, DocumentSet};
pub use driver::{resolve_documents, run};
pub use report::{DocumentFailure, RunReport};
