//! Field rule tables for stored record types.
//!
//! A [`Schema`] turns an untrusted JSON payload into a store document:
//! unknown keys are dropped, values are cast to the field's kind, defaults
//! are filled in on create, and required fields are checked. All problems in
//! a payload are reported together in one [`ValidationError`].

use std::fmt;

use bookshelf_db::{bson, Bson, Document, ObjectId};
use chrono::{DateTime, NaiveDate};
use serde_json::{json, Map, Number, Value};
use thiserror::Error;

/// Storage kind of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    /// Whole numbers are stored as 64-bit integers, anything else as a double.
    Number,
    Date,
    ObjectId,
}

impl FieldKind {
    fn label(self) -> &'static str {
        match self {
            FieldKind::Text => "string",
            FieldKind::Number => "Number",
            FieldKind::Date => "date",
            FieldKind::ObjectId => "ObjectId",
        }
    }

    fn openapi(self) -> Value {
        match self {
            FieldKind::Text => json!({ "type": "string" }),
            FieldKind::Number => json!({ "type": "number" }),
            FieldKind::Date => json!({ "type": "string", "format": "date-time" }),
            FieldKind::ObjectId => json!({ "type": "string", "pattern": "^[0-9a-fA-F]{24}$" }),
        }
    }
}

/// Value filled in on create when the payload omits the field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldDefault {
    /// Creation time.
    Now,
    Text(&'static str),
}

impl FieldDefault {
    fn produce(self) -> Bson {
        match self {
            FieldDefault::Now => Bson::DateTime(bson::DateTime::now()),
            FieldDefault::Text(text) => Bson::String(text.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub path: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub default: Option<FieldDefault>,
    /// Alternative input key; output always uses `path`.
    pub alias: Option<&'static str>,
}

impl FieldRule {
    pub const fn optional(path: &'static str, kind: FieldKind) -> Self {
        Self {
            path,
            kind,
            required: false,
            default: None,
            alias: None,
        }
    }

    pub const fn required(path: &'static str, kind: FieldKind) -> Self {
        Self {
            required: true,
            ..Self::optional(path, kind)
        }
    }

    pub const fn with_default(self, default: FieldDefault) -> Self {
        Self {
            default: Some(default),
            ..self
        }
    }

    pub const fn with_alias(self, alias: &'static str) -> Self {
        Self {
            alias: Some(alias),
            ..self
        }
    }

    fn lookup<'a>(&self, body: &'a Map<String, Value>) -> Option<&'a Value> {
        body.get(self.path)
            .or_else(|| self.alias.and_then(|alias| body.get(alias)))
    }

    fn cast(&self, value: &Value) -> Result<Bson, FieldError> {
        if value.is_null() {
            return Ok(Bson::Null);
        }

        let cast = match self.kind {
            FieldKind::Text => cast_text(value),
            FieldKind::Number => cast_number(value),
            FieldKind::Date => cast_date(value),
            FieldKind::ObjectId => cast_object_id(value),
        };

        cast.ok_or_else(|| FieldError::Cast {
            path: self.path,
            kind: self.kind.label(),
            value: match value {
                Value::String(text) => text.clone(),
                other => other.to_string(),
            },
            value_type: json_type(value),
        })
    }
}

/// A single field that failed validation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FieldError {
    #[error("Path `{path}` is required.")]
    Required { path: &'static str },

    #[error("Cast to {kind} failed for value \"{value}\" (type {value_type}) at path \"{path}\"")]
    Cast {
        path: &'static str,
        kind: &'static str,
        value: String,
        value_type: &'static str,
    },
}

impl FieldError {
    pub fn path(&self) -> &'static str {
        match self {
            FieldError::Required { path } | FieldError::Cast { path, .. } => *path,
        }
    }
}

/// Every field error found in one payload.
#[derive(Error, Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Set for create payloads; update errors carry no model name.
    pub model: Option<&'static str>,
    pub errors: Vec<FieldError>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.model {
            Some(model) => write!(f, "{} validation failed", model)?,
            None => write!(f, "Validation failed")?,
        }

        for (index, error) in self.errors.iter().enumerate() {
            let separator = if index == 0 { ": " } else { ", " };
            write!(f, "{}{}: {}", separator, error.path(), error)?;
        }
        Ok(())
    }
}

/// Field rule table of one record type.
#[derive(Debug)]
pub struct Schema {
    /// Singular, capitalised name used in messages (e.g. `Book`).
    pub model: &'static str,
    pub fields: &'static [FieldRule],
}

impl Schema {
    pub fn field(&self, path: &str) -> Option<&FieldRule> {
        self.fields.iter().find(|rule| rule.path == path)
    }

    /// Build the document for a new record.
    pub fn cast_create(&self, body: &Map<String, Value>) -> Result<Document, ValidationError> {
        let mut document = Document::new();
        let mut errors = Vec::new();

        for rule in self.fields {
            let value = match rule.lookup(body) {
                Some(raw) => match rule.cast(raw) {
                    Ok(value) => Some(value),
                    Err(err) => {
                        errors.push(err);
                        continue;
                    }
                },
                None => rule.default.map(FieldDefault::produce),
            };

            if rule.required && value.as_ref().map_or(true, is_blank) {
                errors.push(FieldError::Required { path: rule.path });
                continue;
            }

            if let Some(value) = value {
                document.insert(rule.path, value);
            }
        }

        if errors.is_empty() {
            Ok(document)
        } else {
            Err(ValidationError {
                model: Some(self.model),
                errors,
            })
        }
    }

    /// Build the `$set` document for a partial update. Only keys present in
    /// the payload are validated and returned.
    pub fn cast_update(&self, body: &Map<String, Value>) -> Result<Document, ValidationError> {
        let mut changes = Document::new();
        let mut errors = Vec::new();

        for rule in self.fields {
            let Some(raw) = rule.lookup(body) else {
                continue;
            };

            match rule.cast(raw) {
                Ok(value) if rule.required && is_blank(&value) => {
                    errors.push(FieldError::Required { path: rule.path });
                }
                Ok(value) => {
                    changes.insert(rule.path, value);
                }
                Err(err) => errors.push(err),
            }
        }

        if errors.is_empty() {
            Ok(changes)
        } else {
            Err(ValidationError {
                model: None,
                errors,
            })
        }
    }

    /// OpenAPI object schema of a stored record.
    pub fn openapi_record(&self) -> Value {
        let mut properties = Map::new();
        properties.insert("_id".to_string(), FieldKind::ObjectId.openapi());
        for rule in self.fields {
            properties.insert(rule.path.to_string(), rule.kind.openapi());
        }

        let mut required = vec![Value::from("_id")];
        required.extend(
            self.fields
                .iter()
                .filter(|rule| rule.required || rule.default.is_some())
                .map(|rule| Value::from(rule.path)),
        );

        json!({ "type": "object", "properties": properties, "required": required })
    }

    /// OpenAPI object schema of a create payload.
    pub fn openapi_input(&self) -> Value {
        let mut properties = Map::new();
        for rule in self.fields {
            properties.insert(rule.path.to_string(), rule.kind.openapi());
        }

        let required: Vec<Value> = self
            .fields
            .iter()
            .filter(|rule| rule.required && rule.default.is_none())
            .map(|rule| Value::from(rule.path))
            .collect();

        json!({ "type": "object", "properties": properties, "required": required })
    }
}

fn is_blank(value: &Bson) -> bool {
    match value {
        Bson::Null => true,
        Bson::String(text) => text.is_empty(),
        _ => false,
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "Array",
        Value::Object(_) => "Object",
    }
}

fn cast_text(value: &Value) -> Option<Bson> {
    match value {
        Value::String(text) => Some(Bson::String(text.clone())),
        Value::Number(number) => Some(Bson::String(number_text(number))),
        Value::Bool(flag) => Some(Bson::String(flag.to_string())),
        _ => None,
    }
}

/// Whole-valued floats lose their fraction (`1.0` becomes `"1"`).
fn number_text(number: &Number) -> String {
    match number.as_f64() {
        Some(float) if number.is_f64() => float.to_string(),
        _ => number.to_string(),
    }
}

fn number_to_bson(number: &Number) -> Option<Bson> {
    number
        .as_i64()
        .map(Bson::Int64)
        .or_else(|| number.as_f64().map(Bson::Double))
}

fn cast_number(value: &Value) -> Option<Bson> {
    match value {
        Value::Number(number) => number_to_bson(number),
        Value::String(text) => {
            let text = text.trim();
            if text.is_empty() {
                return Some(Bson::Null);
            }
            match text.parse::<i64>() {
                Ok(whole) => Some(Bson::Int64(whole)),
                Err(_) => text
                    .parse::<f64>()
                    .ok()
                    .filter(|n| n.is_finite())
                    .map(Bson::Double),
            }
        }
        Value::Bool(flag) => Some(Bson::Int64(i64::from(*flag))),
        _ => None,
    }
}

fn cast_date(value: &Value) -> Option<Bson> {
    let millis = match value {
        Value::Number(number) => number.as_i64()?,
        Value::String(text) => match DateTime::parse_from_rfc3339(text) {
            Ok(at) => at.timestamp_millis(),
            Err(_) => NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()?
                .and_hms_opt(0, 0, 0)?
                .and_utc()
                .timestamp_millis(),
        },
        _ => return None,
    };
    Some(Bson::DateTime(bson::DateTime::from_millis(millis)))
}

fn cast_object_id(value: &Value) -> Option<Bson> {
    match value {
        Value::String(text) => ObjectId::parse_str(text).ok().map(Bson::ObjectId),
        _ => None,
    }
}
