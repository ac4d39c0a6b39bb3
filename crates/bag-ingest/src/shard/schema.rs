//! Arrow schemas and record batches for extracted entities

use std::sync::Arc;

use arrow::array::{ArrayRef, BinaryBuilder, Date32Builder, Int32Builder, StringBuilder};
use arrow::datatypes::{DataType, Date32Type, Field, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use chrono::NaiveDate;

use crate::error::Result;
use crate::extract::{EntitySpec, FieldKind, FieldValue, Record};

/// Name of the WKB geometry column
pub const GEOMETRY_COLUMN: &str = "geom";

/// Arrow schema for an entity: one nullable column per field, then `geom`
pub fn entity_schema(spec: &EntitySpec) -> SchemaRef {
    let mut fields: Vec<Field> = spec
        .fields
        .iter()
        .map(|field| Field::new(&field.column, data_type(field.kind), true))
        .collect();
    fields.push(Field::new(GEOMETRY_COLUMN, DataType::Binary, false));

    Arc::new(Schema::new(fields))
}

fn data_type(kind: FieldKind) -> DataType {
    match kind {
        FieldKind::Text => DataType::Utf8,
        FieldKind::Integer => DataType::Int32,
        FieldKind::Date => DataType::Date32,
    }
}

/// Days since the Unix epoch, as stored in `Date32`
pub fn date32(date: NaiveDate) -> i32 {
    Date32Type::from_naive_date(date)
}

/// Column builder matching one field kind
enum ColumnBuilder {
    Text(StringBuilder),
    Integer(Int32Builder),
    Date(Date32Builder),
}

impl ColumnBuilder {
    fn new(kind: FieldKind, capacity: usize) -> Self {
        match kind {
            FieldKind::Text => ColumnBuilder::Text(StringBuilder::with_capacity(capacity, capacity * 16)),
            FieldKind::Integer => ColumnBuilder::Integer(Int32Builder::with_capacity(capacity)),
            FieldKind::Date => ColumnBuilder::Date(Date32Builder::with_capacity(capacity)),
        }
    }

    fn append(&mut self, value: &FieldValue) {
        match (self, value) {
            (ColumnBuilder::Text(b), FieldValue::Text(text)) => b.append_value(text),
            (ColumnBuilder::Integer(b), FieldValue::Integer(v)) => b.append_value(*v),
            (ColumnBuilder::Date(b), FieldValue::Date(d)) => b.append_value(date32(*d)),
            (ColumnBuilder::Text(b), _) => b.append_null(),
            (ColumnBuilder::Integer(b), _) => b.append_null(),
            (ColumnBuilder::Date(b), _) => b.append_null(),
        }
    }

    fn finish(self) -> ArrayRef {
        match self {
            ColumnBuilder::Text(mut b) => Arc::new(b.finish()),
            ColumnBuilder::Integer(mut b) => Arc::new(b.finish()),
            ColumnBuilder::Date(mut b) => Arc::new(b.finish()),
        }
    }
}

/// Build a record batch for `records` using the schema from [`entity_schema`]
pub fn records_to_batch(
    spec: &EntitySpec,
    schema: &SchemaRef,
    records: &[Record],
) -> Result<RecordBatch> {
    let mut builders: Vec<ColumnBuilder> = spec
        .fields
        .iter()
        .map(|field| ColumnBuilder::new(field.kind, records.len()))
        .collect();
    let mut geometry = BinaryBuilder::with_capacity(records.len(), records.len() * 64);

    for record in records {
        for (index, builder) in builders.iter_mut().enumerate() {
            builder.append(record.values.get(index).unwrap_or(&FieldValue::Null));
        }
        geometry.append_value(&record.geometry);
    }

    let mut columns: Vec<ArrayRef> = builders.into_iter().map(ColumnBuilder::finish).collect();
    columns.push(Arc::new(geometry.finish()));

    Ok(RecordBatch::try_new(schema.clone(), columns)?)
}
