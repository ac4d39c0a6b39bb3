//! WKB encoding

use geo_types::Geometry;
use wkb::writer::{write_geometry, WriteOptions};
use wkb::Endianness;

use super::GeometryError;

/// Encode a geometry as little-endian WKB
pub fn to_wkb(geometry: &Geometry<f64>) -> Result<Vec<u8>, GeometryError> {
    let mut buffer = Vec::new();
    write_geometry(
        &mut buffer,
        geometry,
        &WriteOptions {
            endianness: Endianness::LittleEndian,
        },
    )
    .map_err(|e| GeometryError::Encode(e.to_string()))?;
    Ok(buffer)
}
