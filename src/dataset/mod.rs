// src/dataset/mod.rs
pub mod read;
pub mod write;

use std::collections::HashSet;
use tracing::{debug, warn};

use crate::process::record::{FieldValue, IncidentRecord, ValueKey, ValueKind};

pub use read::read_dataset;
pub use write::write_dataset;

pub const INCIDENT_NAME: &str = "incident_name";

/// Columns every dataset carries, even when empty.
pub const CORE_COLUMNS: &[(&str, ValueKind)] = &[
    ("current_as_of", ValueKind::Timestamp),
    ("lat", ValueKind::Float),
    ("lon", ValueKind::Float),
];

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub kind: ValueKind,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DatasetRow {
    pub incident_name: String,
    /// One cell per entry of `Dataset::columns`.
    pub cells: Vec<Option<FieldValue>>,
}

/// The assembled, deduplicated table. `incident_name` is implicit as the first column.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    columns: Vec<Column>,
    rows: Vec<DatasetRow>,
}

impl Dataset {
    /// Build from records in discovery order, collapsing rows equal in every column.
    pub fn assemble(records: Vec<IncidentRecord>) -> Self {
        // 1) column order: core columns, then first-seen order
        let mut names: Vec<String> = CORE_COLUMNS.iter().map(|(n, _)| n.to_string()).collect();
        for record in &records {
            for (name, _) in record.fields() {
                if !names.iter().any(|n| n == name) {
                    names.push(name.to_string());
                }
            }
        }

        // 2) one cell per column for every record
        let mut table: Vec<(String, Vec<Option<FieldValue>>)> = records
            .into_iter()
            .map(|record| {
                let cells = names.iter().map(|n| record.get(n).cloned()).collect();
                (record.incident_name, cells)
            })
            .collect();

        // 3) unify kinds per column, before comparing rows
        let mut columns = Vec::with_capacity(names.len());
        for (idx, name) in names.into_iter().enumerate() {
            let core = CORE_COLUMNS.iter().find(|(n, _)| *n == name).map(|(_, k)| *k);
            let kinds: HashSet<ValueKind> = table
                .iter()
                .filter_map(|(_, cells)| cells[idx].as_ref().map(FieldValue::kind))
                .collect();
            let kind = match (kinds.len(), core) {
                (0, Some(k)) => k,
                (0, None) => ValueKind::Text,
                (1, _) => *kinds.iter().next().unwrap_or(&ValueKind::Text),
                _ => {
                    warn!(column = %name, kinds = ?kinds, "mixed value kinds, storing as text");
                    for (_, cells) in table.iter_mut() {
                        if let Some(v) = cells[idx].take() {
                            cells[idx] = Some(match v {
                                FieldValue::Text(s) => FieldValue::Text(s),
                                other => FieldValue::Text(other.to_string()),
                            });
                        }
                    }
                    ValueKind::Text
                }
            };
            columns.push(Column { name, kind });
        }

        // 4) rows, first occurrence wins
        let mut seen: HashSet<(String, Vec<Option<ValueKey>>)> = HashSet::new();
        let mut rows = Vec::with_capacity(table.len());
        for (incident_name, cells) in table {
            let key = (
                incident_name.clone(),
                cells.iter().map(|c| c.as_ref().map(FieldValue::key)).collect(),
            );
            if seen.insert(key) {
                rows.push(DatasetRow {
                    incident_name,
                    cells,
                });
            } else {
                debug!(incident = %incident_name, "duplicate row");
            }
        }

        Self { columns, rows }
    }

    /// Assemble directly from parts; cells must line up with `columns`.
    pub(crate) fn from_parts(columns: Vec<Column>, rows: Vec<DatasetRow>) -> Self {
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// All column names, `incident_name` first.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(INCIDENT_NAME).chain(self.columns.iter().map(|c| c.name.as_str()))
    }

    pub fn rows(&self) -> &[DatasetRow] {
        &self.rows
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cell of `row` in the named column.
    pub fn value(&self, row: usize, column: &str) -> Option<&FieldValue> {
        let idx = self.columns.iter().position(|c| c.name == column)?;
        self.rows.get(row)?.cells[idx].as_ref()
    }
}

impl std::ops::Index<usize> for DatasetRow {
    type Output = Option<FieldValue>;

    fn index(&self, idx: usize) -> &Self::Output {
        &self.cells[idx]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn record(name: &str, hour: u32, extra: &[(&str, FieldValue)]) -> IncidentRecord {
        let mut r = IncidentRecord::new(name);
        r.insert(
            "current_as_of",
            FieldValue::Timestamp(Utc.with_ymd_and_hms(2020, 8, 20, hour, 0, 0).unwrap()),
        );
        r.insert("lat", FieldValue::Float(38.5));
        r.insert("lon", FieldValue::Float(-120.1));
        for (k, v) in extra {
            r.insert(*k, v.clone());
        }
        r
    }

    #[test]
    fn identical_records_collapse_first_wins() {
        let ds = Dataset::assemble(vec![
            record("Oak Fire", 8, &[]),
            record("Oak Fire", 9, &[]),
            record("Oak Fire", 8, &[]),
        ]);
        assert_eq!(ds.num_rows(), 2);
        assert_eq!(
            ds.value(1, "current_as_of"),
            Some(&FieldValue::Timestamp(Utc.with_ymd_and_hms(2020, 8, 20, 9, 0, 0).unwrap()))
        );
    }

    #[test]
    fn different_names_are_not_duplicates() {
        let ds = Dataset::assemble(vec![record("Oak Fire", 8, &[]), record("Elm Fire", 8, &[])]);
        assert_eq!(ds.num_rows(), 2);
    }

    #[test]
    fn absent_fields_become_nulls_in_first_seen_order() {
        let ds = Dataset::assemble(vec![
            record("A", 8, &[("cause", FieldValue::Text("Lightning".into()))]),
            record("B", 8, &[("size_acres", FieldValue::Float(10.0))]),
        ]);
        let names: Vec<_> = ds.column_names().collect();
        assert_eq!(
            names,
            vec!["incident_name", "current_as_of", "lat", "lon", "cause", "size_acres"]
        );
        assert_eq!(ds.value(0, "size_acres"), None);
        assert_eq!(ds.value(1, "cause"), None);
        assert_eq!(ds.columns()[4].kind, ValueKind::Float);
    }

    #[test]
    fn mixed_kinds_fall_back_to_text() {
        let ds = Dataset::assemble(vec![
            record("A", 8, &[("acres_note", FieldValue::Float(1.5))]),
            record("B", 8, &[("acres_note", FieldValue::Text("n/a".into()))]),
        ]);
        let col = ds.columns().iter().find(|c| c.name == "acres_note").unwrap();
        assert_eq!(col.kind, ValueKind::Text);
        assert_eq!(ds.value(0, "acres_note"), Some(&FieldValue::Text("1.5".into())));
    }

    #[test]
    fn rows_equal_after_text_fallback_collapse() {
        let ds = Dataset::assemble(vec![
            record("A", 8, &[("acres_note", FieldValue::Float(1.5))]),
            record("A", 8, &[("acres_note", FieldValue::Text("1.5".into()))]),
            record("B", 8, &[("acres_note", FieldValue::Text("n/a".into()))]),
        ]);
        assert_eq!(ds.num_rows(), 2);
        assert_eq!(ds.rows()[0].incident_name, "A");
        assert_eq!(ds.value(0, "acres_note"), Some(&FieldValue::Text("1.5".into())));
        assert_eq!(ds.rows()[1].incident_name, "B");
    }

    #[test]
    fn empty_input_keeps_core_columns() {
        let ds = Dataset::assemble(Vec::new());
        assert!(ds.is_empty());
        let names: Vec<_> = ds.column_names().collect();
        assert_eq!(names, vec!["incident_name", "current_as_of", "lat", "lon"]);
        assert_eq!(ds.columns()[0].kind, ValueKind::Timestamp);
    }
}
