//! GML geometry parsing
//!
//! Elements are matched on local name, so `gml:Polygon`, `Polygon` and any
//! other prefix are treated alike. Coordinates are flattened to x/y while
//! parsing; `srsDimension` is inherited from the nearest ancestor that sets
//! it.

use geo_types::{Coord, Geometry, LineString, MultiPolygon, Point, Polygon};

use super::coords::{close_ring, parse_tuples, parse_values, to_coords};
use super::GeometryError;
use crate::xml::Element;

const DEFAULT_DIMENSION: usize = 2;

/// Parse a GML fragment into a 2D geometry
pub fn parse_gml(fragment: &str) -> Result<Geometry<f64>, GeometryError> {
    let root = Element::parse_fragment(fragment)?;
    geometry_from_element(&root, None)
}

/// Parse an already loaded GML element
pub fn geometry_from_element(
    element: &Element,
    dimension: Option<usize>,
) -> Result<Geometry<f64>, GeometryError> {
    let dimension = srs_dimension(element, dimension);

    match element.local_name() {
        "Point" => point(element, dimension).map(Geometry::Point),
        "LineString" => line_string(element, dimension).map(Geometry::LineString),
        "Polygon" | "PolygonPatch" => polygon(element, dimension).map(Geometry::Polygon),
        "Surface" => {
            let mut polygons = surface(element, dimension)?;
            if polygons.len() == 1 {
                Ok(Geometry::Polygon(polygons.remove(0)))
            } else {
                Ok(Geometry::MultiPolygon(MultiPolygon::new(polygons)))
            }
        }
        "MultiSurface" | "MultiPolygon" => {
            multi_polygon(element, dimension).map(Geometry::MultiPolygon)
        }
        other => Err(GeometryError::Unsupported(other.to_string())),
    }
}

fn srs_dimension(element: &Element, inherited: Option<usize>) -> Option<usize> {
    element
        .attribute_local("srsDimension")
        .and_then(|value| value.trim().parse().ok())
        .or(inherited)
}

fn point(element: &Element, dimension: Option<usize>) -> Result<Point<f64>, GeometryError> {
    let coords = positions(element, dimension)?;
    match coords.as_slice() {
        [coord] => Ok(Point::from(*coord)),
        [] => Err(GeometryError::Empty),
        _ => Err(GeometryError::OddCoordinateCount {
            values: coords.len() * 2,
            dimension: 2,
        }),
    }
}

fn line_string(
    element: &Element,
    dimension: Option<usize>,
) -> Result<LineString<f64>, GeometryError> {
    let coords = positions(element, dimension)?;
    if coords.len() < 2 {
        return Err(GeometryError::Empty);
    }
    Ok(LineString::from(coords))
}

fn polygon(element: &Element, dimension: Option<usize>) -> Result<Polygon<f64>, GeometryError> {
    let exterior = element
        .child_elements()
        .find(|child| matches!(child.local_name(), "exterior" | "outerBoundaryIs"))
        .ok_or_else(|| GeometryError::MissingElement {
            parent: element.name.clone(),
            child: "exterior",
        })?;

    let exterior = boundary_ring(exterior, dimension)?;
    let interiors = element
        .child_elements()
        .filter(|child| matches!(child.local_name(), "interior" | "innerBoundaryIs"))
        .map(|boundary| boundary_ring(boundary, dimension))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Polygon::new(exterior, interiors))
}

fn boundary_ring(
    boundary: &Element,
    dimension: Option<usize>,
) -> Result<LineString<f64>, GeometryError> {
    let dimension = srs_dimension(boundary, dimension);
    let ring = boundary
        .child_local("LinearRing")
        .ok_or_else(|| GeometryError::MissingElement {
            parent: boundary.name.clone(),
            child: "LinearRing",
        })?;

    let dimension = srs_dimension(ring, dimension);
    let mut coords = positions(ring, dimension)?;
    if coords.len() < 4 {
        return Err(GeometryError::RingTooShort(coords.len()));
    }
    close_ring(&mut coords);

    Ok(LineString::from(coords))
}

/// Polygons of a `Surface`'s `patches`
fn surface(element: &Element, dimension: Option<usize>) -> Result<Vec<Polygon<f64>>, GeometryError> {
    let patches = element
        .child_local("patches")
        .ok_or_else(|| GeometryError::MissingElement {
            parent: element.name.clone(),
            child: "patches",
        })?;

    let dimension = srs_dimension(patches, dimension);
    let polygons = patches
        .child_elements()
        .map(|patch| match geometry_from_element(patch, dimension)? {
            Geometry::Polygon(polygon) => Ok(polygon),
            _ => Err(GeometryError::Unsupported(patch.name.clone())),
        })
        .collect::<Result<Vec<_>, _>>()?;

    if polygons.is_empty() {
        return Err(GeometryError::Empty);
    }
    Ok(polygons)
}

fn multi_polygon(
    element: &Element,
    dimension: Option<usize>,
) -> Result<MultiPolygon<f64>, GeometryError> {
    let mut polygons = Vec::new();

    for member in element.child_elements() {
        let dimension = srs_dimension(member, dimension);
        match member.local_name() {
            "surfaceMember" | "surfaceMembers" | "polygonMember" | "polygonMembers" => {
                for child in member.child_elements() {
                    match geometry_from_element(child, dimension)? {
                        Geometry::Polygon(polygon) => polygons.push(polygon),
                        Geometry::MultiPolygon(multi) => polygons.extend(multi.0),
                        _ => return Err(GeometryError::Unsupported(child.name.clone())),
                    }
                }
            }
            _ => {}
        }
    }

    if polygons.is_empty() {
        return Err(GeometryError::Empty);
    }
    Ok(MultiPolygon::new(polygons))
}

/// Coordinates of a geometry element from `posList`, `pos` children or `coordinates`
fn positions(element: &Element, dimension: Option<usize>) -> Result<Vec<Coord<f64>>, GeometryError> {
    if let Some(pos_list) = element.child_local("posList") {
        let dimension = srs_dimension(pos_list, dimension).unwrap_or(DEFAULT_DIMENSION);
        return to_coords(&parse_values(&pos_list.text())?, dimension);
    }

    let mut coords = Vec::new();
    let mut found_pos = false;
    for pos in element.child_elements().filter(|child| child.local_name() == "pos") {
        found_pos = true;
        let values = parse_values(&pos.text())?;
        // a lone pos without any dimension hint carries exactly one position
        let dimension = srs_dimension(pos, dimension).unwrap_or(values.len().max(DEFAULT_DIMENSION));
        coords.extend(to_coords(&values, dimension)?);
    }
    if found_pos {
        return Ok(coords);
    }

    if let Some(tuples) = element.child_local("coordinates") {
        return parse_tuples(&tuples.text());
    }

    Err(GeometryError::MissingElement {
        parent: element.name.clone(),
        child: "posList",
    })
}
