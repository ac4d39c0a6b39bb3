//! Spatial ordering support

pub mod extent;
pub mod hilbert;

pub use extent::BoundingExtent;
pub use hilbert::{hilbert_key, HILBERT_ORDER};
