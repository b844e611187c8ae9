// src/schema/arrow.rs

use arrow::datatypes::{DataType, Field as ArrowField, Schema as ArrowSchema, TimeUnit};
use std::sync::Arc;

use crate::dataset::{Column, INCIDENT_NAME};
use crate::process::record::ValueKind;

pub const TIMESTAMP_TZ: &str = "UTC";

/// Map a value kind onto its Arrow DataType.
///
/// - Timestamp → Timestamp(µs, UTC)
/// - Date      → Date32
/// - Float     → Float64
/// - Boolean   → Boolean
/// - Text      → Utf8
pub fn map_to_arrow_type(kind: ValueKind) -> DataType {
    match kind {
        ValueKind::Timestamp => DataType::Timestamp(TimeUnit::Microsecond, Some(Arc::from(TIMESTAMP_TZ))),
        ValueKind::Date => DataType::Date32,
        ValueKind::Float => DataType::Float64,
        ValueKind::Boolean => DataType::Boolean,
        ValueKind::Text => DataType::Utf8,
    }
}

/// Inverse of `map_to_arrow_type`; `None` for types the dataset never writes.
pub fn map_from_arrow_type(dt: &DataType) -> Option<ValueKind> {
    match dt {
        DataType::Timestamp(TimeUnit::Microsecond, _) => Some(ValueKind::Timestamp),
        DataType::Date32 => Some(ValueKind::Date),
        DataType::Float64 => Some(ValueKind::Float),
        DataType::Boolean => Some(ValueKind::Boolean),
        DataType::Utf8 => Some(ValueKind::Text),
        _ => None,
    }
}

/// Build the dataset schema: non-null `incident_name`, then one nullable field per column.
pub fn build_arrow_schema(cols: &[Column]) -> Arc<ArrowSchema> {
    let fields: Vec<ArrowField> = std::iter::once(ArrowField::new(INCIDENT_NAME, DataType::Utf8, false))
        .chain(
            cols.iter()
                .map(|col| ArrowField::new(&col.name, map_to_arrow_type(col.kind), true)),
        )
        .collect();

    Arc::new(ArrowSchema::new(fields))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_round_trip_through_arrow_types() {
        for kind in [
            ValueKind::Timestamp,
            ValueKind::Date,
            ValueKind::Float,
            ValueKind::Boolean,
            ValueKind::Text,
        ] {
            assert_eq!(map_from_arrow_type(&map_to_arrow_type(kind)), Some(kind));
        }
        assert_eq!(map_from_arrow_type(&DataType::Int32), None);
    }

    #[test]
    fn incident_name_leads_and_is_required() {
        let schema = build_arrow_schema(&[Column {
            name: "lat".into(),
            kind: ValueKind::Float,
        }]);
        assert_eq!(schema.field(0).name(), INCIDENT_NAME);
        assert!(!schema.field(0).is_nullable());
        assert_eq!(schema.field(1).data_type(), &DataType::Float64);
        assert!(schema.field(1).is_nullable());
    }
}
