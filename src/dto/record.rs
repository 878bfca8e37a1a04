//! Normalization of a single record object coming from any endpoint.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDateTime};
use serde_json::{Map, Value};

use crate::domain::record::{Record, RecordStatus};
use crate::domain::types::RecordId;
use crate::endpoints::errors::{EndpointError, EndpointResult};

const RESERVED_KEYS: [&str; 5] = ["id", "status", "admin_notes", "notes", "created_at"];

/// Reads an unsigned integer that may be encoded as a number or a string.
pub(crate) fn as_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    if let Ok(at) = DateTime::parse_from_rfc3339(value) {
        return Some(at.naive_utc());
    }
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
}

fn record_from_map(map: &Map<String, Value>) -> EndpointResult<Record> {
    let id = map
        .get("id")
        .and_then(as_u64)
        .and_then(|id| i64::try_from(id).ok())
        .ok_or_else(|| EndpointError::Decode("record without a numeric id".to_string()))?;
    let id = RecordId::new(id)?;

    let status = map
        .get("status")
        .and_then(Value::as_str)
        .map(RecordStatus::parse)
        .unwrap_or_default();

    let notes = map
        .get("admin_notes")
        .or_else(|| map.get("notes"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .filter(|notes| !notes.is_empty());

    let created_at = map
        .get("created_at")
        .and_then(Value::as_str)
        .and_then(parse_timestamp);

    let fields: BTreeMap<String, Value> = map
        .iter()
        .filter(|(key, _)| !RESERVED_KEYS.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    Ok(Record {
        id,
        status,
        notes,
        created_at,
        fields,
    })
}

/// Converts one JSON object into a [`Record`].
pub fn normalize_record(value: &Value) -> EndpointResult<Record> {
    match value {
        Value::Object(map) => record_from_map(map),
        other => Err(EndpointError::Decode(format!(
            "expected a record object, got {other}"
        ))),
    }
}

/// Converts a JSON array into records, skipping entries that cannot be
/// identified.
pub fn normalize_records(items: &[Value]) -> Vec<Record> {
    items
        .iter()
        .filter_map(|item| match normalize_record(item) {
            Ok(record) => Some(record),
            Err(err) => {
                log::warn!("Skipping record: {err}");
                None
            }
        })
        .collect()
}
