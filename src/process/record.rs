// src/process/record.rs

use chrono::{DateTime, Datelike, NaiveDate, SecondsFormat, Utc};
use serde::Serialize;
use std::fmt;

/// Type of a normalized value, and of a dataset column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Timestamp,
    Date,
    Float,
    Boolean,
    Text,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Timestamp(DateTime<Utc>),
    Date(NaiveDate),
    Float(f64),
    Boolean(bool),
    Text(String),
}

/// Hashable image of a value; floats compare bitwise.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValueKey {
    Timestamp(i64),
    Date(i32),
    Float(u64),
    Boolean(bool),
    Text(String),
}

impl FieldValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            FieldValue::Timestamp(_) => ValueKind::Timestamp,
            FieldValue::Date(_) => ValueKind::Date,
            FieldValue::Float(_) => ValueKind::Float,
            FieldValue::Boolean(_) => ValueKind::Boolean,
            FieldValue::Text(_) => ValueKind::Text,
        }
    }

    pub fn key(&self) -> ValueKey {
        match self {
            FieldValue::Timestamp(ts) => ValueKey::Timestamp(ts.timestamp_micros()),
            FieldValue::Date(d) => ValueKey::Date(d.num_days_from_ce()),
            FieldValue::Float(f) => ValueKey::Float(f.to_bits()),
            FieldValue::Boolean(b) => ValueKey::Boolean(*b),
            FieldValue::Text(s) => ValueKey::Text(s.clone()),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Timestamp(ts) => f.write_str(&ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            FieldValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            FieldValue::Float(v) => write!(f, "{v}"),
            FieldValue::Boolean(b) => write!(f, "{b}"),
            FieldValue::Text(s) => f.write_str(s),
        }
    }
}

/// One normalized snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct IncidentRecord {
    pub incident_name: String,
    /// Canonical field name → value, in insertion order; names are unique.
    fields: Vec<(String, FieldValue)>,
}

impl IncidentRecord {
    pub fn new(incident_name: impl Into<String>) -> Self {
        Self {
            incident_name: incident_name.into(),
            fields: Vec::new(),
        }
    }

    /// Set a field, replacing an existing value in place.
    pub fn insert(&mut self, name: impl Into<String>, value: FieldValue) {
        let name = name.into();
        match self.fields.iter_mut().find(|(k, _)| *k == name) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_replaces_in_place() {
        let mut r = IncidentRecord::new("Oak Fire");
        r.insert("lat", FieldValue::Float(1.0));
        r.insert("lon", FieldValue::Float(2.0));
        r.insert("lat", FieldValue::Float(3.0));
        let names: Vec<_> = r.fields().map(|(k, _)| k).collect();
        assert_eq!(names, vec!["lat", "lon"]);
        assert_eq!(r.get("lat"), Some(&FieldValue::Float(3.0)));
    }

    #[test]
    fn float_keys_are_bitwise() {
        assert_ne!(FieldValue::Float(0.0).key(), FieldValue::Float(-0.0).key());
        assert_eq!(FieldValue::Float(f64::NAN).key(), FieldValue::Float(f64::NAN).key());
    }

    #[test]
    fn display_renders_iso_forms() {
        let d = NaiveDate::from_ymd_opt(2020, 8, 1).unwrap();
        assert_eq!(FieldValue::Date(d).to_string(), "2020-08-01");
        let ts = d.and_hms_opt(9, 30, 0).unwrap().and_utc();
        assert_eq!(FieldValue::Timestamp(ts).to_string(), "2020-08-01T09:30:00Z");
    }
}
