//! Field values and the per-entity field resolver capability.
//!
//! # Responsibility
//! - Give filters and sorters one comparable value shape.
//! - Let each entity decide how a named field resolves.
//!
//! # Invariants
//! - An unresolvable field is `None`, never an error.
//! - `List` members are flattened one level for set operations.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::rc::Rc;

/// One resolved field value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    List(Vec<FieldValue>),
    /// Item count of a nested registry or map.
    Count(usize),
    Timestamp(DateTime<Utc>),
}

impl FieldValue {
    /// Set members used by filter intersections.
    pub fn members(&self) -> Vec<&FieldValue> {
        match self {
            Self::List(values) => values.iter().collect(),
            other => vec![other],
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Null => false,
            Self::Bool(value) => *value,
            Self::Int(value) => *value != 0,
            Self::Float(value) => *value != 0.0,
            Self::Text(value) => !value.is_empty() && value != "0",
            Self::List(values) => !values.is_empty(),
            Self::Count(count) => *count > 0,
            Self::Timestamp(_) => true,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(value) => Some(*value as f64),
            Self::Float(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value.as_str()),
            _ => None,
        }
    }

    /// String form used by the comparator fallback.
    ///
    /// Lists and counts have no string form.
    pub fn coerce_string(&self) -> Option<String> {
        match self {
            Self::Null => Some(String::new()),
            Self::Bool(true) => Some("1".to_string()),
            Self::Bool(false) => Some(String::new()),
            Self::Int(value) => Some(value.to_string()),
            Self::Float(value) => Some(value.to_string()),
            Self::Text(value) => Some(value.clone()),
            Self::Timestamp(value) => Some(value.to_rfc3339()),
            Self::List(_) | Self::Count(_) => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Text(_) => "text",
            Self::List(_) => "list",
            Self::Count(_) => "count",
            Self::Timestamp(_) => "timestamp",
        }
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<u8> for FieldValue {
    fn from(value: u8) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Timestamp(value)
    }
}

impl<T: Into<FieldValue>> From<Vec<T>> for FieldValue {
    fn from(values: Vec<T>) -> Self {
        Self::List(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl From<&serde_json::Value> for FieldValue {
    fn from(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(flag) => Self::Bool(*flag),
            serde_json::Value::Number(number) => match number.as_i64() {
                Some(int) => Self::Int(int),
                None => Self::Float(number.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(text) => Self::Text(text.clone()),
            serde_json::Value::Array(values) => {
                Self::List(values.iter().map(FieldValue::from).collect())
            }
            serde_json::Value::Object(map) => Self::Count(map.len()),
        }
    }
}

impl From<serde_json::Value> for FieldValue {
    fn from(value: serde_json::Value) -> Self {
        Self::from(&value)
    }
}

/// Explicit field lookup capability for queryable entities.
pub trait FieldResolver {
    /// Resolves `field`, or `None` when the entity has no such field.
    fn resolve_field(&self, field: &str) -> Option<FieldValue>;

    /// Type names this entity is an instance of, for `instanceof` clauses.
    fn type_tags(&self) -> Vec<&str> {
        Vec::new()
    }
}

impl FieldResolver for serde_json::Value {
    fn resolve_field(&self, field: &str) -> Option<FieldValue> {
        self.as_object()?.get(field).map(FieldValue::from)
    }
}

impl FieldResolver for BTreeMap<String, FieldValue> {
    fn resolve_field(&self, field: &str) -> Option<FieldValue> {
        self.get(field).cloned()
    }
}

impl<T: FieldResolver + ?Sized> FieldResolver for Rc<T> {
    fn resolve_field(&self, field: &str) -> Option<FieldValue> {
        (**self).resolve_field(field)
    }

    fn type_tags(&self) -> Vec<&str> {
        (**self).type_tags()
    }
}

impl<T: FieldResolver + ?Sized> FieldResolver for Box<T> {
    fn resolve_field(&self, field: &str) -> Option<FieldValue> {
        (**self).resolve_field(field)
    }

    fn type_tags(&self) -> Vec<&str> {
        (**self).type_tags()
    }
}
