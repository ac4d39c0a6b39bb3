//! Record extraction
//!
//! An [`EntitySpec`] describes one BAG entity type as data: which element
//! marks an entity, which paths feed which typed columns, how superseded
//! versions are recognised and where the geometry comes from. The
//! [`Extractor`] applies an [`EntitySpec`] to a [`Document`] lazily, one entity at a
//! time.

pub mod entities;

pub use entities::EntityKind;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::trace;

use crate::error::Result;
use crate::geometry;
use crate::xml::{Document, Element, ElementPath, Entities};

/// Target type of an extracted column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Integer,
    Date,
}

/// One column: its name, where its text comes from and how it is typed
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub column: String,
    pub path: ElementPath,
    pub kind: FieldKind,
}

impl FieldSpec {
    pub fn new(column: impl Into<String>, path: &str, kind: FieldKind) -> Self {
        Self {
            column: column.into(),
            path: ElementPath::new(path),
            kind,
        }
    }
}

/// Where an entity's geometry can be found
#[derive(Debug, Clone)]
pub enum GeometrySource {
    /// A GML geometry sub-tree
    Gml(ElementPath),
    /// A `pos` element holding a single position
    Point(ElementPath),
    /// A `posList` holding the exterior ring of a polygon
    RingPosList(ElementPath),
}

impl GeometrySource {
    fn path(&self) -> &ElementPath {
        match self {
            GeometrySource::Gml(path)
            | GeometrySource::Point(path)
            | GeometrySource::RingPosList(path) => path,
        }
    }

    fn build(&self, located: &Element) -> Option<Vec<u8>> {
        match self {
            GeometrySource::Gml(_) => geometry::convert(&located.to_markup()),
            GeometrySource::Point(_) => geometry::point_from_pos(&located.text()),
            GeometrySource::RingPosList(_) => {
                geometry::ring_polygon_from_pos_list(&located.text())
            }
        }
    }
}

/// Declarative extraction rules for one entity type
#[derive(Debug, Clone)]
pub struct EntitySpec {
    /// Qualified element name of one entity, e.g. `Objecten:Pand`
    pub element: String,
    pub fields: Vec<FieldSpec>,
    /// Entities containing this element are superseded and skipped
    pub validity: ElementPath,
    /// Alternatives in priority order
    pub geometry: Vec<GeometrySource>,
}

/// A typed column value
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Integer(i32),
    Date(NaiveDate),
    Null,
}

impl FieldValue {
    /// Coerce raw text, falling back to `Null` when it does not fit the kind
    pub fn coerce(text: &str, kind: FieldKind) -> Self {
        match kind {
            FieldKind::Text => FieldValue::Text(text.to_string()),
            FieldKind::Integer => text
                .trim()
                .parse()
                .map(FieldValue::Integer)
                .unwrap_or(FieldValue::Null),
            FieldKind::Date => NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
                .map(FieldValue::Date)
                .unwrap_or(FieldValue::Null),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }
}

/// One extracted entity: values in column order plus WKB geometry
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub values: Vec<FieldValue>,
    pub geometry: Vec<u8>,
}

/// Per-document extraction counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ExtractStats {
    pub seen: usize,
    pub superseded: usize,
    pub missing_geometry: usize,
    pub emitted: usize,
}

/// Applies an [`EntitySpec`] to documents
#[derive(Debug, Clone)]
pub struct Extractor {
    spec: EntitySpec,
}

impl Extractor {
    pub fn new(spec: EntitySpec) -> Self {
        Self { spec }
    }

    pub fn spec(&self) -> &EntitySpec {
        &self.spec
    }

    /// Lazily extract every current entity with usable geometry
    pub fn records<'d>(&'d self, document: &'d Document) -> Records<'d> {
        Records {
            extractor: self,
            entities: document.entities(&self.spec.element),
            stats: ExtractStats::default(),
        }
    }

    /// Extract a single entity, updating `stats`
    pub fn extract(&self, entity: &Element, stats: &mut ExtractStats) -> Option<Record> {
        stats.seen += 1;

        if self.spec.validity.exists(entity) {
            stats.superseded += 1;
            return None;
        }

        let Some(geometry) = self.geometry(entity) else {
            stats.missing_geometry += 1;
            trace!(entity = %self.spec.element, "Skipping entity without usable geometry");
            return None;
        };

        let values = self
            .spec
            .fields
            .iter()
            .map(|field| match field.path.find(entity) {
                Some(found) => FieldValue::coerce(&found.text(), field.kind),
                None => FieldValue::Null,
            })
            .collect();

        stats.emitted += 1;
        Some(Record { values, geometry })
    }

    /// The first alternative that locates an element decides the geometry
    fn geometry(&self, entity: &Element) -> Option<Vec<u8>> {
        self.spec.geometry.iter().find_map(|source| {
            source
                .path()
                .find(entity)
                .map(|located| source.build(located))
        })?
    }
}

/// Iterator returned by [`Extractor::records`]
pub struct Records<'d> {
    extractor: &'d Extractor,
    entities: Entities<'d>,
    stats: ExtractStats,
}

impl Records<'_> {
    pub fn stats(&self) -> ExtractStats {
        self.stats
    }
}

impl Iterator for Records<'_> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entity = match self.entities.next()? {
                Ok(entity) => entity,
                Err(e) => return Some(Err(e)),
            };
            if let Some(record) = self.extractor.extract(&entity, &mut self.stats) {
                return Some(Ok(record));
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_coerce_integer() {
        assert_eq!(FieldValue::coerce(" 1923 ", FieldKind::Integer), FieldValue::Integer(1923));
        assert!(FieldValue::coerce("19x3", FieldKind::Integer).is_null());
        assert!(FieldValue::coerce("", FieldKind::Integer).is_null());
    }

    #[test]
    fn test_coerce_date() {
        assert_eq!(
            FieldValue::coerce("2018-03-26", FieldKind::Date),
            FieldValue::Date(NaiveDate::from_ymd_opt(2018, 3, 26).unwrap())
        );
        assert!(FieldValue::coerce("2018-02-30", FieldKind::Date).is_null());
        assert!(FieldValue::coerce("26-03-2018", FieldKind::Date).is_null());
    }

    #[test]
    fn test_coerce_text_keeps_value() {
        assert_eq!(
            FieldValue::coerce("Pand in gebruik", FieldKind::Text),
            FieldValue::Text("Pand in gebruik".to_string())
        );
    }

    fn point_spec() -> EntitySpec {
        EntitySpec {
            element: "Objecten:Thing".to_string(),
            fields: vec![FieldSpec::new("id", "//Objecten:id", FieldKind::Integer)],
            validity: ElementPath::new("//Historie:eindGeldigheid"),
            geometry: vec![
                GeometrySource::Point(ElementPath::new("//Objecten:punt/gml:pos")),
                GeometrySource::Point(ElementPath::new("//gml:pos")),
            ],
        }
    }

    #[test]
    fn test_first_located_alternative_decides() {
        let extractor = Extractor::new(point_spec());
        let mut stats = ExtractStats::default();

        let entity = Element::parse_fragment(
            "<Objecten:Thing><Objecten:id>7</Objecten:id>\
             <Objecten:punt><gml:pos>1 2</gml:pos></Objecten:punt>\
             <gml:pos>3 4</gml:pos></Objecten:Thing>",
        )
        .unwrap();
        let record = extractor.extract(&entity, &mut stats).unwrap();
        assert_eq!(record.values, vec![FieldValue::Integer(7)]);
        assert_eq!(record.geometry, geometry::point_from_pos("1 2").unwrap());

        // a located but unusable first alternative drops the record
        let entity = Element::parse_fragment(
            "<Objecten:Thing><Objecten:punt><gml:pos>oops</gml:pos></Objecten:punt>\
             <gml:pos>3 4</gml:pos></Objecten:Thing>",
        )
        .unwrap();
        assert!(extractor.extract(&entity, &mut stats).is_none());

        assert_eq!(
            stats,
            ExtractStats {
                seen: 2,
                superseded: 0,
                missing_geometry: 1,
                emitted: 1
            }
        );
    }

    #[test]
    fn test_missing_field_is_null() {
        let extractor = Extractor::new(point_spec());
        let entity =
            Element::parse_fragment("<Objecten:Thing><gml:pos>3 4</gml:pos></Objecten:Thing>")
                .unwrap();
        let record = extractor
            .extract(&entity, &mut ExtractStats::default())
            .unwrap();
        assert_eq!(record.values, vec![FieldValue::Null]);
    }
}
