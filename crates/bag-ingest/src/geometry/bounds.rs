//! Decoding stored WKB back into `geo` types

use geo::BoundingRect;
use geo_traits::to_geo::ToGeoGeometry;
use geo_types::{Geometry, Rect};
use wkb::reader::Wkb;

/// Decode WKB into a `geo_types` geometry, keeping x and y only
pub fn wkb_to_geo(bytes: &[u8]) -> Option<Geometry<f64>> {
    Wkb::try_new(bytes).ok()?.try_to_geometry()
}

/// Bounding rectangle of a WKB geometry
pub fn wkb_bounds(bytes: &[u8]) -> Option<Rect<f64>> {
    wkb_to_geo(bytes)?.bounding_rect()
}

/// GeoParquet geometry type name
pub fn geometry_type_name(geometry: &Geometry<f64>) -> &'static str {
    match geometry {
        Geometry::Point(_) => "Point",
        Geometry::Line(_) | Geometry::LineString(_) => "LineString",
        Geometry::Polygon(_) | Geometry::Rect(_) | Geometry::Triangle(_) => "Polygon",
        Geometry::MultiPoint(_) => "MultiPoint",
        Geometry::MultiLineString(_) => "MultiLineString",
        Geometry::MultiPolygon(_) => "MultiPolygon",
        Geometry::GeometryCollection(_) => "GeometryCollection",
    }
}
