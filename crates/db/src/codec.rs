//! Rendering of stored documents as API JSON.

use chrono::{DateTime, SecondsFormat, Utc};
use mongodb::bson::{self, Bson, Document};
use serde_json::{Map, Number, Value};

/// Render a stored document the way clients see it: identifiers as hex
/// strings and dates as RFC 3339 timestamps with millisecond precision.
pub fn document_to_json(document: &Document) -> Value {
    Value::Object(
        document
            .iter()
            .map(|(key, value)| (key.clone(), bson_to_json(value)))
            .collect::<Map<String, Value>>(),
    )
}

/// Render a single BSON value.
pub fn bson_to_json(value: &Bson) -> Value {
    match value {
        Bson::ObjectId(id) => Value::String(id.to_hex()),
        Bson::DateTime(at) => Value::String(format_datetime(at)),
        Bson::String(text) => Value::String(text.clone()),
        Bson::Boolean(flag) => Value::Bool(*flag),
        Bson::Int32(n) => Value::from(*n),
        Bson::Int64(n) => Value::from(*n),
        Bson::Double(n) => Number::from_f64(*n).map(Value::Number).unwrap_or(Value::Null),
        Bson::Null | Bson::Undefined => Value::Null,
        Bson::Array(items) => Value::Array(items.iter().map(bson_to_json).collect()),
        Bson::Document(inner) => document_to_json(inner),
        other => other.clone().into_relaxed_extjson(),
    }
}

fn format_datetime(at: &bson::DateTime) -> String {
    match DateTime::<Utc>::from_timestamp_millis(at.timestamp_millis()) {
        Some(at) => at.to_rfc3339_opts(SecondsFormat::Millis, true),
        None => at.to_string(),
    }
}
