//! Reading finished artifacts back

use std::path::Path;

use arrow::array::{Array, AsArray};
use arrow::record_batch::RecordBatch;
use geo::{BoundingRect, Intersects};
use geo_types::{Geometry, Rect};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{IngestError, Result};
use crate::geometry::wkb_to_geo;
use crate::merge::scan_rows;
use crate::shard::geoparquet::{GeometryStats, EXTENT_KEY, EXTENT_VERSION_KEY};
use crate::shard::writer::{geometry_column_index, geometry_values, read_parquet};
use crate::spatial::BoundingExtent;

/// Columns a boundary row can be looked up by
const BOUNDARY_NAME_COLUMNS: [&str; 2] = ["naam", "identificatie"];

/// Shape and ordering of an artifact
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArtifactSummary {
    pub rows: usize,
    pub columns: Vec<String>,
    pub bbox: Option<[f64; 4]>,
    pub extent_version: Option<String>,
    /// Hilbert keys are non-decreasing in storage order
    pub hilbert_ordered: bool,
}

/// Summarize the artifact at `path`
///
/// Ordering is checked against the extent recorded in the file, or the
/// default extent when the file carries none.
pub fn summarize(path: impl AsRef<Path>) -> Result<ArtifactSummary> {
    let path = path.as_ref();
    let contents = read_parquet(path)?;
    let geometry_index = geometry_column_index(&contents.schema, path)?;

    let extent = contents
        .metadata_value(EXTENT_KEY)
        .and_then(|json| serde_json::from_str::<BoundingExtent>(json).ok())
        .unwrap_or_default();

    let mut stats = GeometryStats::default();
    let mut previous = 0u32;
    let mut hilbert_ordered = true;

    for batch in &contents.batches {
        for key in scan_rows(batch, geometry_index, &extent, &mut stats) {
            if key < previous {
                hilbert_ordered = false;
            }
            previous = key;
        }
    }

    let columns = contents
        .schema
        .fields()
        .iter()
        .map(|field| field.name().clone())
        .collect();

    Ok(ArtifactSummary {
        rows: contents.num_rows(),
        columns,
        bbox: stats.bbox(),
        extent_version: contents.metadata_value(EXTENT_VERSION_KEY).map(str::to_string),
        hilbert_ordered,
    })
}

/// Count rows of `features` whose geometry intersects the boundary called `name`
///
/// A boundary matches on `naam` or `identificatie`; several matching rows
/// (e.g. a split municipality) are all used.
pub fn count_intersecting(
    features: impl AsRef<Path>,
    boundaries: impl AsRef<Path>,
    name: &str,
) -> Result<usize> {
    let boundaries = load_boundaries(boundaries.as_ref(), name)?;
    if boundaries.is_empty() {
        return Err(IngestError::BoundaryNotFound(name.to_string()));
    }
    debug!(name, parts = boundaries.len(), "Loaded boundary");

    let features = features.as_ref();
    let contents = read_parquet(features)?;
    let geometry_index = geometry_column_index(&contents.schema, features)?;

    let mut count = 0;
    for batch in &contents.batches {
        for wkb in geometry_values(batch, geometry_index).flatten() {
            let Some(geometry) = wkb_to_geo(wkb) else {
                continue;
            };
            let Some(bounds) = geometry.bounding_rect() else {
                continue;
            };
            let hit = boundaries
                .iter()
                .any(|(rect, boundary)| rect.intersects(&bounds) && boundary.intersects(&geometry));
            if hit {
                count += 1;
            }
        }
    }

    info!(
        features = %features.display(),
        boundary = name,
        count,
        "Counted intersecting features"
    );
    Ok(count)
}

fn load_boundaries(path: &Path, name: &str) -> Result<Vec<(Rect<f64>, Geometry<f64>)>> {
    let contents = read_parquet(path)?;
    let geometry_index = geometry_column_index(&contents.schema, path)?;

    let name_columns: Vec<usize> = BOUNDARY_NAME_COLUMNS
        .iter()
        .filter_map(|column| contents.schema.index_of(column).ok())
        .collect();
    if name_columns.is_empty() {
        return Err(IngestError::MissingColumn {
            path: path.to_path_buf(),
            column: BOUNDARY_NAME_COLUMNS.join(" or "),
        });
    }

    let mut found = Vec::new();
    for batch in &contents.batches {
        for (row, wkb) in geometry_values(batch, geometry_index).enumerate() {
            if !row_matches(batch, &name_columns, row, name) {
                continue;
            }
            let geometry = wkb.and_then(wkb_to_geo);
            if let Some((rect, geometry)) =
                geometry.and_then(|g| g.bounding_rect().map(|rect| (rect, g)))
            {
                found.push((rect, geometry));
            }
        }
    }
    Ok(found)
}

fn row_matches(batch: &RecordBatch, columns: &[usize], row: usize, name: &str) -> bool {
    columns.iter().any(|&index| {
        batch
            .column(index)
            .as_string_opt::<i32>()
            .is_some_and(|values| !values.is_null(row) && values.value(row) == name)
    })
}
