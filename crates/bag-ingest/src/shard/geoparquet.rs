//! GeoParquet file metadata

use std::collections::{BTreeMap, BTreeSet};

use geo::BoundingRect;
use geo_types::{coord, Geometry, Rect};
use parquet::file::metadata::KeyValue;
use serde::{Deserialize, Serialize};

use crate::geometry::{geometry_type_name, wkb_to_geo};
use crate::spatial::extent::RD_NEW_EPSG;
use crate::spatial::BoundingExtent;

/// GeoParquet metadata key
pub const GEO_METADATA_KEY: &str = "geo";

/// Metadata key naming the extent rows were ordered against
pub const EXTENT_VERSION_KEY: &str = "extent_version";

/// Metadata key holding the full extent as JSON
pub const EXTENT_KEY: &str = "bag:extent";

const GEOPARQUET_VERSION: &str = "1.1.0";

/// The `geo` metadata document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoMetadata {
    pub version: String,
    pub primary_column: String,
    pub columns: BTreeMap<String, GeoColumn>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoColumn {
    pub encoding: String,
    pub geometry_types: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bbox: Option<[f64; 4]>,
    pub crs: serde_json::Value,
}

/// Running geometry types and bounds of a WKB column
#[derive(Debug, Clone, Default)]
pub struct GeometryStats {
    types: BTreeSet<&'static str>,
    bounds: Option<Rect<f64>>,
}

impl GeometryStats {
    /// Fold one WKB value in; undecodable values are ignored
    pub fn update(&mut self, wkb: &[u8]) {
        if let Some(geometry) = wkb_to_geo(wkb) {
            self.record(&geometry);
        }
    }

    /// Fold in a geometry that is already decoded
    pub fn record(&mut self, geometry: &Geometry<f64>) {
        self.types.insert(geometry_type_name(geometry));
        if let Some(rect) = geometry.bounding_rect() {
            self.include(rect);
        }
    }

    /// Fold in everything collected by `other`
    pub fn absorb(&mut self, other: &GeometryStats) {
        self.types.extend(other.types.iter().copied());
        if let Some(rect) = other.bounds {
            self.include(rect);
        }
    }

    fn include(&mut self, rect: Rect<f64>) {
        self.bounds = Some(match self.bounds {
            None => rect,
            Some(current) => Rect::new(
                coord! {
                    x: current.min().x.min(rect.min().x),
                    y: current.min().y.min(rect.min().y),
                },
                coord! {
                    x: current.max().x.max(rect.max().x),
                    y: current.max().y.max(rect.max().y),
                },
            ),
        });
    }

    pub fn bbox(&self) -> Option<[f64; 4]> {
        self.bounds
            .map(|r| [r.min().x, r.min().y, r.max().x, r.max().y])
    }

    pub fn geometry_types(&self) -> Vec<String> {
        self.types.iter().map(|t| t.to_string()).collect()
    }

    pub fn to_metadata(&self, column: &str) -> GeoMetadata {
        let mut columns = BTreeMap::new();
        columns.insert(
            column.to_string(),
            GeoColumn {
                encoding: "WKB".to_string(),
                geometry_types: self.geometry_types(),
                bbox: self.bbox(),
                crs: rd_new_projjson(),
            },
        );

        GeoMetadata {
            version: GEOPARQUET_VERSION.to_string(),
            primary_column: column.to_string(),
            columns,
        }
    }
}

/// Key/value entries written into the Parquet footer
pub fn footer_metadata(
    stats: &GeometryStats,
    column: &str,
    extent: Option<&BoundingExtent>,
) -> serde_json::Result<Vec<KeyValue>> {
    let mut entries = vec![KeyValue::new(
        GEO_METADATA_KEY.to_string(),
        serde_json::to_string(&stats.to_metadata(column))?,
    )];

    if let Some(extent) = extent {
        entries.push(KeyValue::new(
            EXTENT_VERSION_KEY.to_string(),
            extent.version.clone(),
        ));
        entries.push(KeyValue::new(
            EXTENT_KEY.to_string(),
            serde_json::to_string(extent)?,
        ));
    }

    Ok(entries)
}

/// Identifying PROJJSON for Amersfoort / RD New
fn rd_new_projjson() -> serde_json::Value {
    serde_json::json!({
        "$schema": "https://proj.org/schemas/v0.7/projjson.schema.json",
        "type": "ProjectedCRS",
        "name": "Amersfoort / RD New",
        "id": { "authority": "EPSG", "code": RD_NEW_EPSG }
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::geometry::{point_from_pos, ring_polygon_from_pos_list};

    #[test]
    fn test_stats_accumulate() {
        let mut stats = GeometryStats::default();
        assert_eq!(stats.bbox(), None);

        stats.update(&point_from_pos("10 20").unwrap());
        stats.update(&ring_polygon_from_pos_list("0 30 5 30 5 35 0 30").unwrap());
        stats.update(b"garbage");

        assert_eq!(stats.bbox(), Some([0.0, 20.0, 10.0, 35.0]));
        assert_eq!(stats.geometry_types(), vec!["Point", "Polygon"]);
    }

    #[test]
    fn test_absorb_combines_types_and_bounds() {
        let mut left = GeometryStats::default();
        left.update(&point_from_pos("10 20").unwrap());
        let mut right = GeometryStats::default();
        right.update(&ring_polygon_from_pos_list("0 30 5 30 5 35 0 30").unwrap());

        left.absorb(&right);
        left.absorb(&GeometryStats::default());
        assert_eq!(left.bbox(), Some([0.0, 20.0, 10.0, 35.0]));
        assert_eq!(left.geometry_types(), vec!["Point", "Polygon"]);
    }

    #[test]
    fn test_footer_metadata() {
        let mut stats = GeometryStats::default();
        stats.update(&point_from_pos("1 2").unwrap());

        let entries = footer_metadata(&stats, "geom", Some(&BoundingExtent::default())).unwrap();
        let keys: Vec<&str> = entries.iter().map(|kv| kv.key.as_str()).collect();
        assert_eq!(keys, vec!["geo", "extent_version", "bag:extent"]);
        assert_eq!(entries[1].value.as_deref(), Some("rd-new-v1"));

        let geo: GeoMetadata = serde_json::from_str(entries[0].value.as_deref().unwrap()).unwrap();
        assert_eq!(geo.primary_column, "geom");
        let column = &geo.columns["geom"];
        assert_eq!(column.encoding, "WKB");
        assert_eq!(column.bbox, Some([1.0, 2.0, 1.0, 2.0]));
        assert_eq!(column.crs["id"]["code"], 28992);
    }

    #[test]
    fn test_shard_footer_has_no_extent() {
        let entries = footer_metadata(&GeometryStats::default(), "geom", None).unwrap();
        assert_eq!(entries.len(), 1);
    }
}
