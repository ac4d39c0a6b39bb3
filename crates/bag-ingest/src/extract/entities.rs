//! Built-in BAG entity specs

use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use super::{EntitySpec, FieldKind, FieldSpec, GeometrySource};
use crate::xml::ElementPath;

const VALIDITY_MARKER: &str = "//Historie:eindGeldigheid";

/// The entity types this pipeline knows how to extract
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum EntityKind {
    /// Buildings (`Objecten:Pand`)
    Pand,
    /// Addressable units (`Objecten:Verblijfsobject`)
    Verblijfsobject,
    /// Places (`Objecten:Woonplaats`) from their GML geometry
    Woonplaats,
    /// Places with the polygon rebuilt from the first exterior `posList`
    WoonplaatsRing,
}

impl EntityKind {
    pub const ALL: [EntityKind; 4] = [
        EntityKind::Pand,
        EntityKind::Verblijfsobject,
        EntityKind::Woonplaats,
        EntityKind::WoonplaatsRing,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Pand => "pand",
            EntityKind::Verblijfsobject => "verblijfsobject",
            EntityKind::Woonplaats => "woonplaats",
            EntityKind::WoonplaatsRing => "woonplaats-ring",
        }
    }

    /// Object type code used in extract file names, e.g. `9999PND08122025-000001.xml`
    pub fn document_code(&self) -> &'static str {
        match self {
            EntityKind::Pand => "PND",
            EntityKind::Verblijfsobject => "VBO",
            EntityKind::Woonplaats | EntityKind::WoonplaatsRing => "WPL",
        }
    }

    /// File name of the merged artifact
    pub fn artifact_name(&self) -> &'static str {
        match self {
            EntityKind::Pand => "panden.parquet",
            EntityKind::Verblijfsobject => "verblijfsobjecten.parquet",
            EntityKind::Woonplaats | EntityKind::WoonplaatsRing => "woonplaatsen.parquet",
        }
    }

    pub fn element(&self) -> &'static str {
        match self {
            EntityKind::Pand => "Objecten:Pand",
            EntityKind::Verblijfsobject => "Objecten:Verblijfsobject",
            EntityKind::Woonplaats | EntityKind::WoonplaatsRing => "Objecten:Woonplaats",
        }
    }

    pub fn spec(&self) -> EntitySpec {
        use FieldKind::{Date, Integer, Text};

        let fields = match self {
            EntityKind::Pand => vec![
                FieldSpec::new("identificatie", "//Objecten:identificatie", Text),
                FieldSpec::new("status", "//Objecten:status", Text),
                FieldSpec::new(
                    "oorspronkelijkBouwjaar",
                    "//Objecten:oorspronkelijkBouwjaar",
                    Integer,
                ),
                FieldSpec::new("geconstateerd", "//Objecten:geconstateerd", Text),
                FieldSpec::new("documentnummer", "//Objecten:documentnummer", Text),
                FieldSpec::new("documentdatum", "//Objecten:documentdatum", Date),
            ],
            EntityKind::Verblijfsobject => vec![
                FieldSpec::new("identificatie", "//Objecten:identificatie", Text),
                FieldSpec::new("status", "//Objecten:status", Text),
                FieldSpec::new("gebruiksdoel", "//Objecten:gebruiksdoel", Text),
                FieldSpec::new("oppervlakte", "//Objecten:oppervlakte", Integer),
                FieldSpec::new("documentdatum", "//Objecten:documentdatum", Date),
                FieldSpec::new("pand", "//Objecten-ref:PandRef", Text),
                FieldSpec::new(
                    "hoofdadres",
                    "//Objecten:heeftAlsHoofdadres/Objecten-ref:NummeraanduidingRef",
                    Text,
                ),
            ],
            EntityKind::Woonplaats | EntityKind::WoonplaatsRing => vec![
                FieldSpec::new("identificatie", "//Objecten:identificatie", Text),
                FieldSpec::new("naam", "//Objecten:naam", Text),
                FieldSpec::new("status", "//Objecten:status", Text),
                FieldSpec::new("documentdatum", "//Objecten:documentdatum", Date),
            ],
        };

        let geometry = match self {
            EntityKind::Pand => vec![
                gml("//Objecten:geometrie/gml:Polygon"),
                gml("//Objecten:geometrie/Objecten:multivlak/gml:MultiSurface"),
            ],
            EntityKind::Verblijfsobject => {
                vec![GeometrySource::Point(ElementPath::new("//gml:pos"))]
            }
            EntityKind::Woonplaats => vec![
                gml("//Objecten:geometrie/Objecten:vlak/gml:Polygon"),
                gml("//Objecten:geometrie/Objecten:multivlak/gml:MultiSurface"),
                gml("//Objecten:geometrie/gml:Polygon"),
            ],
            EntityKind::WoonplaatsRing => vec![GeometrySource::RingPosList(ElementPath::new(
                "//gml:Polygon/gml:exterior/gml:LinearRing/gml:posList",
            ))],
        };

        EntitySpec {
            element: self.element().to_string(),
            fields,
            validity: ElementPath::new(VALIDITY_MARKER),
            geometry,
        }
    }
}

fn gml(path: &str) -> GeometrySource {
    GeometrySource::Gml(ElementPath::new(path))
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pand" | "pnd" => Ok(EntityKind::Pand),
            "verblijfsobject" | "vbo" => Ok(EntityKind::Verblijfsobject),
            "woonplaats" | "wpl" => Ok(EntityKind::Woonplaats),
            "woonplaats-ring" => Ok(EntityKind::WoonplaatsRing),
            _ => Err(format!("Unknown entity type: {}", s)),
        }
    }
}
