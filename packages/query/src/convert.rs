//! Conversion between model-produced JSON and store documents.
//!
//! The model is told to write dates as ISO 8601 strings, since it cannot
//! emit native date values in JSON. [`json_to_bson`] walks the value tree and
//! turns every string leaf that looks like such a timestamp into a real
//! date, so range comparisons against `timestamp` behave. [`bson_to_json`]
//! goes the other way for results, rendering dates back as ISO strings.

use std::sync::LazyLock;

use bson::{Bson, Document};
use chrono::{DateTime, Utc};
use feed_log_feed_run_models::timestamp;
use regex::Regex;
use serde_json::{Map, Number, Value};

static ISO_TIMESTAMP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}T[0-9]{2}:[0-9]{2}:[0-9]{2}(\.[0-9]{3})?Z$")
        .expect("valid regex")
});

/// Parses `s` as a store date if it is a UTC ISO 8601 timestamp of the form
/// `YYYY-MM-DDTHH:MM:SS[.mmm]Z`.
///
/// Strings with the right shape but an impossible date (month 13, etc.)
/// are not dates.
#[must_use]
pub fn parse_iso_timestamp(s: &str) -> Option<bson::DateTime> {
    if !ISO_TIMESTAMP_RE.is_match(s) {
        return None;
    }
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| bson::DateTime::from_millis(dt.timestamp_millis()))
}

/// Converts a JSON value to BSON, rewriting ISO timestamp strings to dates
/// at any depth.
#[must_use]
pub fn json_to_bson(value: &Value) -> Bson {
    match value {
        Value::Null => Bson::Null,
        Value::Bool(b) => Bson::Boolean(*b),
        Value::Number(n) => number_to_bson(n),
        Value::String(s) => {
            parse_iso_timestamp(s).map_or_else(|| Bson::String(s.clone()), Bson::DateTime)
        }
        Value::Array(items) => Bson::Array(items.iter().map(json_to_bson).collect()),
        Value::Object(map) => Bson::Document(object_to_document(map)),
    }
}

/// Converts a JSON object to a document, rewriting timestamps.
#[must_use]
pub fn object_to_document(map: &Map<String, Value>) -> Document {
    map.iter()
        .map(|(key, value)| (key.clone(), json_to_bson(value)))
        .collect()
}

fn number_to_bson(n: &Number) -> Bson {
    if let Some(i) = n.as_i64() {
        i32::try_from(i).map_or(Bson::Int64(i), Bson::Int32)
    } else {
        n.as_f64().map_or(Bson::Null, Bson::Double)
    }
}

fn format_date(value: bson::DateTime) -> String {
    DateTime::<Utc>::from_timestamp_millis(value.timestamp_millis()).map_or_else(
        || value.to_string(),
        |dt| timestamp::format(&dt),
    )
}

/// Converts a result value to plain JSON.
///
/// Dates become ISO strings with millisecond precision and object ids
/// become hex strings. Types with no natural JSON form fall back to relaxed
/// extended JSON.
#[must_use]
pub fn bson_to_json(value: &Bson) -> Value {
    match value {
        Bson::Null | Bson::Undefined => Value::Null,
        Bson::Boolean(b) => Value::Bool(*b),
        Bson::Int32(i) => Value::from(*i),
        Bson::Int64(i) => Value::from(*i),
        Bson::Double(f) => Number::from_f64(*f).map_or(Value::Null, Value::Number),
        Bson::String(s) => Value::String(s.clone()),
        Bson::Array(items) => Value::Array(items.iter().map(bson_to_json).collect()),
        Bson::Document(doc) => Value::Object(document_to_json(doc)),
        Bson::DateTime(dt) => Value::String(format_date(*dt)),
        Bson::ObjectId(oid) => Value::String(oid.to_hex()),
        other => other.clone().into_relaxed_extjson(),
    }
}

/// Converts a result document to a JSON object.
#[must_use]
pub fn document_to_json(doc: &Document) -> Map<String, Value> {
    doc.iter()
        .map(|(key, value)| (key.clone(), bson_to_json(value)))
        .collect()
}
