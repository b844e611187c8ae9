// src/process/fields.rs

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

use crate::dataset::INCIDENT_NAME;
use crate::error::{PipelineError, Result};
use crate::process::date_parser::{parse_date, parse_timestamp};
use crate::process::raw_table::RawPropertyTable;
use crate::process::record::{FieldValue, IncidentRecord};
use crate::process::utils::{strip_prefix_ci, strip_suffix_ci};

static QUOTED: Lazy<Regex> = Lazy::new(|| Regex::new(r#""([^"]*)""#).expect("quoted span regex"));

type Transform = fn(&str) -> Result<Vec<(&'static str, FieldValue)>>;

/// How one raw property becomes zero or more canonical fields.
pub struct FieldRule {
    pub key: &'static str,
    /// Names the transform may emit.
    pub outputs: &'static [&'static str],
    pub required: bool,
    pub transform: Transform,
}

/// Rules applied to every snapshot; the source key is replaced by the transform's output.
pub static FIELD_RULES: &[FieldRule] = &[
    FieldRule {
        key: "current_as_of",
        outputs: &["current_as_of"],
        required: true,
        transform: current_as_of,
    },
    FieldRule {
        key: "date_of_origin",
        outputs: &["date_of_origin"],
        required: false,
        transform: date_of_origin,
    },
    FieldRule {
        key: "estimated_containment_date",
        outputs: &["estimated_containment_date"],
        required: false,
        transform: estimated_containment_date,
    },
    FieldRule {
        key: "size",
        outputs: &["size_acres"],
        required: false,
        transform: size_acres,
    },
    FieldRule {
        key: "percent_of_perimeter_contained",
        outputs: &["percent_of_perimeter_contained"],
        required: false,
        transform: percent_contained,
    },
    FieldRule {
        key: "coordinates",
        outputs: &["lat", "lon"],
        required: true,
        transform: coordinates,
    },
];

/// True for names only a rule (or the record label) may produce.
fn is_reserved(key: &str) -> bool {
    key == INCIDENT_NAME
        || FIELD_RULES
            .iter()
            .any(|r| r.outputs.iter().any(|o| *o == key))
}

fn current_as_of(raw: &str) -> Result<Vec<(&'static str, FieldValue)>> {
    let span = QUOTED
        .captures(raw)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .ok_or_else(|| PipelineError::field("current_as_of", raw, "no quoted date-time"))?;
    let ts = parse_timestamp(span)
        .ok_or_else(|| PipelineError::field("current_as_of", raw, "quoted span is not a date-time"))?;
    Ok(vec![("current_as_of", FieldValue::Timestamp(ts))])
}

fn approx_date(field: &'static str, raw: &str) -> Result<Vec<(&'static str, FieldValue)>> {
    let trimmed = raw.trim();
    let text = strip_prefix_ci(trimmed, "approx. ").unwrap_or(trimmed);
    let date = parse_date(text).ok_or_else(|| PipelineError::field(field, raw, "not a date"))?;
    Ok(vec![(field, FieldValue::Date(date))])
}

fn date_of_origin(raw: &str) -> Result<Vec<(&'static str, FieldValue)>> {
    approx_date("date_of_origin", raw)
}

fn estimated_containment_date(raw: &str) -> Result<Vec<(&'static str, FieldValue)>> {
    approx_date("estimated_containment_date", raw)
}

fn size_acres(raw: &str) -> Result<Vec<(&'static str, FieldValue)>> {
    let trimmed = raw.trim();
    let number = strip_suffix_ci(trimmed, " Acres").unwrap_or(trimmed).replace(',', "");
    let acres: f64 = number
        .trim()
        .parse()
        .map_err(|_| PipelineError::field("size", raw, "not an acreage"))?;
    Ok(vec![("size_acres", FieldValue::Float(acres))])
}

fn percent_contained(raw: &str) -> Result<Vec<(&'static str, FieldValue)>> {
    let pct: f64 = raw
        .trim()
        .trim_matches('%')
        .trim()
        .parse()
        .map_err(|_| PipelineError::field("percent_of_perimeter_contained", raw, "not a percentage"))?;
    Ok(vec![("percent_of_perimeter_contained", FieldValue::Float(pct / 100.0))])
}

fn coordinates(raw: &str) -> Result<Vec<(&'static str, FieldValue)>> {
    let tokens: Vec<&str> = raw.split_whitespace().collect();
    if tokens.len() < 3 {
        return Err(PipelineError::field(
            "coordinates",
            raw,
            format!("expected at least 3 tokens, got {}", tokens.len()),
        ));
    }
    let parse = |t: &str| {
        t.parse::<f64>()
            .map_err(|_| PipelineError::field("coordinates", raw, format!("`{t}` is not a number")))
    };
    let lat = parse(tokens[0])?;
    let lon = parse(tokens[2])?;
    Ok(vec![("lat", FieldValue::Float(lat)), ("lon", FieldValue::Float(lon))])
}

/// Turn a raw property table into a typed record.
///
/// Properties without a rule pass through as text, except ones named like a rule
/// output or `incident_name`, which are dropped. A failing required rule fails
/// the record; a failing optional rule drops that field unless `strict_optional`.
pub fn normalize(raw: &RawPropertyTable, strict_optional: bool) -> Result<IncidentRecord> {
    let mut record = IncidentRecord::new(raw.label.clone());

    // 1) required fields first, so a broken page fails before any warnings
    for rule in FIELD_RULES.iter().filter(|r| r.required) {
        if raw.get(rule.key).is_none() {
            return Err(PipelineError::field(rule.key, "", "required field is missing"));
        }
    }

    // 2) walk properties in page order, replacing ruled keys with their outputs
    for (key, value) in &raw.properties {
        let Some(rule) = FIELD_RULES.iter().find(|r| r.key == key.as_str()) else {
            if is_reserved(key) {
                warn!(label = %raw.label, property = %key, "dropping property that shadows a derived field");
            } else {
                record.insert(key.clone(), FieldValue::Text(value.clone()));
            }
            continue;
        };
        match (rule.transform)(value) {
            Ok(outputs) => {
                for (name, v) in outputs {
                    record.insert(name, v);
                }
            }
            Err(e) if rule.required || strict_optional => return Err(e),
            Err(e) => {
                warn!(label = %raw.label, field = rule.key, error = %e, "dropping malformed field");
            }
        }
    }

    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn table(rows: &[(&str, &str)]) -> RawPropertyTable {
        let mut t = RawPropertyTable::new("Oak Fire");
        for (k, v) in rows {
            t.insert(k.to_string(), v.to_string());
        }
        t
    }

    fn base() -> Vec<(&'static str, &'static str)> {
        vec![
            ("current_as_of", r#"Updated "2020-08-20T08:00:00Z" by CAL FIRE"#),
            ("coordinates", "38.5 N -120.1 W"),
        ]
    }

    #[test]
    fn normalizes_every_ruled_field() {
        let mut rows = base();
        rows.extend([
            ("date_of_origin", "approx. 2020-08-01"),
            ("size", "1,234 Acres"),
            ("percent_of_perimeter_contained", "42%"),
            ("cause", "Lightning"),
        ]);
        let r = normalize(&table(&rows), false).unwrap();

        assert_eq!(
            r.get("current_as_of"),
            Some(&FieldValue::Timestamp(Utc.with_ymd_and_hms(2020, 8, 20, 8, 0, 0).unwrap()))
        );
        assert_eq!(
            r.get("date_of_origin"),
            Some(&FieldValue::Date(NaiveDate::from_ymd_opt(2020, 8, 1).unwrap()))
        );
        assert_eq!(r.get("size_acres"), Some(&FieldValue::Float(1234.0)));
        assert!(!r.contains("size"));
        assert_eq!(r.get("percent_of_perimeter_contained"), Some(&FieldValue::Float(0.42)));
        assert_eq!(r.get("lat"), Some(&FieldValue::Float(38.5)));
        assert_eq!(r.get("lon"), Some(&FieldValue::Float(-120.1)));
        assert!(!r.contains("coordinates"));
        assert_eq!(r.get("cause"), Some(&FieldValue::Text("Lightning".into())));
        assert!(!r.contains("estimated_containment_date"));
    }

    #[test]
    fn absent_optional_field_leaves_others_intact() {
        let mut rows = base();
        rows.push(("date_of_origin", "08/01/2020"));
        let r = normalize(&table(&rows), true).unwrap();
        assert!(!r.contains("estimated_containment_date"));
        assert!(r.contains("date_of_origin"));
        assert_eq!(r.len(), 4);
    }

    #[test]
    fn two_token_coordinates_fail() {
        let rows = vec![
            ("current_as_of", r#""2020-08-20T08:00:00Z""#),
            ("coordinates", "38.5 N"),
        ];
        let err = normalize(&table(&rows), false).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FieldFormat);
    }

    #[test]
    fn three_tokens_are_enough() {
        let out = coordinates("38.5 N -120.1").unwrap();
        assert_eq!(out[1], ("lon", FieldValue::Float(-120.1)));
    }

    #[test]
    fn current_as_of_without_quotes_fails() {
        let err = current_as_of("2020-08-20T08:00:00Z").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FieldFormat);
        let err = current_as_of(r#"at "noon""#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FieldFormat);
    }

    #[test]
    fn first_quoted_span_is_used() {
        let out = current_as_of(r#""2020-08-20 08:00" then "2021-01-01 00:00""#).unwrap();
        assert_eq!(
            out[0].1,
            FieldValue::Timestamp(Utc.with_ymd_and_hms(2020, 8, 20, 8, 0, 0).unwrap())
        );
    }

    #[test]
    fn missing_required_field_fails() {
        let rows = vec![("coordinates", "38.5 N -120.1 W")];
        let err = normalize(&table(&rows), false).unwrap_err();
        assert!(err.to_string().contains("current_as_of"));
    }

    #[test]
    fn malformed_optional_field_is_dropped_unless_strict() {
        let mut rows = base();
        rows.push(("size", "about a hundred"));
        let lenient = normalize(&table(&rows), false).unwrap();
        assert!(!lenient.contains("size") && !lenient.contains("size_acres"));
        assert!(lenient.contains("lat"));

        let err = normalize(&table(&rows), true).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FieldFormat);
    }

    #[test]
    fn raw_properties_never_shadow_derived_fields() {
        let mut rows = base();
        rows.extend([
            ("lat", "38°30'"),
            ("lon", "somewhere west"),
            ("incident_name", "Oak"),
            ("size", "n/a"),
            ("size_acres", "lots"),
        ]);
        let r = normalize(&table(&rows), false).unwrap();
        assert_eq!(r.get("lat"), Some(&FieldValue::Float(38.5)));
        assert_eq!(r.get("lon"), Some(&FieldValue::Float(-120.1)));
        assert!(!r.contains("incident_name"));
        assert!(!r.contains("size_acres"));
        assert_eq!(r.incident_name, "Oak Fire");
    }

    #[test]
    fn shadowing_property_before_coordinates_is_also_dropped() {
        let rows = vec![
            ("current_as_of", r#""2020-08-20T08:00:00Z""#),
            ("lat", "north-ish"),
            ("coordinates", "38.5 N -120.1 W"),
        ];
        let r = normalize(&table(&rows), false).unwrap();
        assert_eq!(r.get("lat"), Some(&FieldValue::Float(38.5)));
        assert_eq!(r.len(), 3);
    }
}
