//! Geometry adapter
//!
//! Turns GML fragments cut out of BAG entities into flattened 2D
//! well-known binary. Every entry point returns `None` instead of an error:
//! a record with unusable geometry is dropped by the caller, it never fails
//! the document.

pub mod bounds;
pub mod coords;
pub mod encoding;
pub mod gml;

pub use bounds::{geometry_type_name, wkb_bounds, wkb_to_geo};
pub use encoding::to_wkb;
pub use gml::parse_gml;

use geo_types::{Geometry, LineString, Point, Polygon};
use thiserror::Error;
use tracing::trace;

use crate::xml::MarkupError;

/// Reasons a fragment could not be turned into a geometry
#[derive(Error, Debug)]
pub enum GeometryError {
    #[error("malformed markup: {0}")]
    Markup(#[from] MarkupError),

    #[error("unsupported geometry element <{0}>")]
    Unsupported(String),

    #[error("<{parent}> has no <{child}>")]
    MissingElement { parent: String, child: &'static str },

    #[error("{values} values cannot be split into {dimension}D positions")]
    OddCoordinateCount { values: usize, dimension: usize },

    #[error("invalid srsDimension {0}")]
    InvalidDimension(usize),

    #[error("invalid coordinate value '{0}'")]
    InvalidCoordinate(String),

    #[error("ring has {0} positions, at least 4 are required")]
    RingTooShort(usize),

    #[error("geometry is empty")]
    Empty,

    #[error("WKB encoding failed: {0}")]
    Encode(String),
}

/// Convert one GML fragment into 2D little-endian WKB
///
/// Empty input and anything that fails to parse yield `None`.
pub fn convert(fragment: &str) -> Option<Vec<u8>> {
    if fragment.trim().is_empty() {
        return None;
    }

    match parse_gml(fragment).and_then(|geometry| to_wkb(&geometry)) {
        Ok(wkb) => Some(wkb),
        Err(e) => {
            trace!(error = %e, "Discarding unusable GML fragment");
            None
        }
    }
}

/// WKB point from a whitespace separated position, extra dimensions ignored
pub fn point_from_pos(text: &str) -> Option<Vec<u8>> {
    let values = coords::parse_values(text).ok()?;
    let [x, y, ..] = values.as_slice() else {
        return None;
    };

    to_wkb(&Geometry::Point(Point::new(*x, *y))).ok()
}

/// WKB polygon with a single ring built from a flat list of coordinate pairs
///
/// The ring is closed when the last position differs from the first.
pub fn ring_polygon_from_pos_list(text: &str) -> Option<Vec<u8>> {
    let values = coords::parse_values(text).ok()?;
    let mut ring = coords::to_coords(&values, 2).ok()?;
    coords::close_ring(&mut ring);

    if ring.len() < 4 {
        trace!(positions = ring.len(), "Ring too short for a polygon");
        return None;
    }

    let polygon = Polygon::new(LineString::from(ring), Vec::new());
    to_wkb(&Geometry::Polygon(polygon)).ok()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use geo_traits::{Dimensions, GeometryTrait};
    use wkb::reader::Wkb;

    fn as_wkt(bytes: &[u8]) -> String {
        let geometry = Wkb::try_new(bytes).unwrap();
        let mut out = String::new();
        wkt::to_wkt::write_geometry(&mut out, &geometry).unwrap();
        out
    }

    #[test]
    fn test_empty_and_malformed_fragments_are_none() {
        assert!(convert("").is_none());
        assert!(convert("   \n\t").is_none());
        assert!(convert("<gml:Polygon><gml:exterior>").is_none());
        assert!(convert("not markup at all").is_none());
        assert!(convert("<gml:Curve/>").is_none());
        assert!(convert(
            "<gml:Polygon><gml:exterior><gml:LinearRing>\
             <gml:posList>1 2 3</gml:posList>\
             </gml:LinearRing></gml:exterior></gml:Polygon>"
        )
        .is_none());
    }

    #[test]
    fn test_three_dimensional_polygon_is_flattened() {
        let fragment = r#"<gml:Polygon srsName="urn:ogc:def:crs:EPSG::28992" srsDimension="3">
            <gml:exterior><gml:LinearRing>
                <gml:posList>0 0 1.5 10 0 1.5 10 10 1.5 0 10 1.5 0 0 1.5</gml:posList>
            </gml:LinearRing></gml:exterior>
        </gml:Polygon>"#;

        let bytes = convert(fragment).unwrap();
        let geometry = Wkb::try_new(&bytes).unwrap();
        assert_eq!(geometry.dim(), Dimensions::Xy);
        assert_eq!(as_wkt(&bytes), "POLYGON((0 0,10 0,10 10,0 10,0 0))");
    }

    #[test]
    fn test_point_from_pos() {
        let bytes = point_from_pos("120000.5 487000.25").unwrap();
        assert_eq!(as_wkt(&bytes), "POINT(120000.5 487000.25)");

        let bytes = point_from_pos(" 120000.5 487000.25 0.0 ").unwrap();
        assert_eq!(as_wkt(&bytes), "POINT(120000.5 487000.25)");

        assert!(point_from_pos("120000.5").is_none());
        assert!(point_from_pos("x y").is_none());
        assert!(point_from_pos("").is_none());
    }

    #[test]
    fn test_ring_polygon_is_closed() {
        let bytes = ring_polygon_from_pos_list("0 0 4 0 4 4 0 4").unwrap();
        assert_eq!(as_wkt(&bytes), "POLYGON((0 0,4 0,4 4,0 4,0 0))");

        let bytes = ring_polygon_from_pos_list("0 0 4 0 4 4 0 0").unwrap();
        assert_eq!(as_wkt(&bytes), "POLYGON((0 0,4 0,4 4,0 0))");
    }

    #[test]
    fn test_ring_polygon_rejects_bad_lists() {
        assert!(ring_polygon_from_pos_list("0 0 4 0").is_none());
        assert!(ring_polygon_from_pos_list("0 0 4 0 4").is_none());
        assert!(ring_polygon_from_pos_list("").is_none());
    }
}
