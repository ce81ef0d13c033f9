//! Purpose: Model the in-memory records a frame is packed from and unpacked into.
//! Exports: `Value`, `ValueKind`, `Record`.
//! Role: Closed value enum standing in for host-language dynamic typing.
//! Invariants: Field names within a record are unique; insert replaces.
//! Invariants: Record equality ignores field order (mapping semantics).

use std::fmt;

use serde::ser::{Error as _, SerializeMap};
use serde::{Serialize, Serializer};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Timestamp(OffsetDateTime),
}

/// Runtime type of a [`Value`], used as the key of the inference type tables.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ValueKind {
    Null,
    Bool,
    Int,
    Float,
    Text,
    Timestamp,
}

impl ValueKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ValueKind::Null => "null",
            ValueKind::Bool => "bool",
            ValueKind::Int => "int",
            ValueKind::Float => "float",
            ValueKind::Text => "text",
            ValueKind::Timestamp => "timestamp",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Bool,
            Value::Int(_) => ValueKind::Int,
            Value::Float(_) => ValueKind::Float,
            Value::Text(_) => ValueKind::Text,
            Value::Timestamp(_) => ValueKind::Timestamp,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(value) => Some(*value as f64),
            Value::Float(value) => Some(*value),
            _ => None,
        }
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::Float(value as f64)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(value as i64)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<OffsetDateTime> for Value {
    fn from(value: OffsetDateTime) -> Self {
        Value::Timestamp(value)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(value) => serializer.serialize_bool(*value),
            Value::Int(value) => serializer.serialize_i64(*value),
            // serde_json writes non-finite floats as null.
            Value::Float(value) => serializer.serialize_f64(*value),
            Value::Text(value) => serializer.serialize_str(value),
            Value::Timestamp(value) => {
                let text = value.format(&Rfc3339).map_err(S::Error::custom)?;
                serializer.serialize_str(&text)
            }
        }
    }
}

/// One row: named field values in insertion order.
#[derive(Clone, Debug, Default)]
pub struct Record {
    fields: Vec<(String, Value)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            fields: Vec::with_capacity(capacity),
        }
    }

    /// Sets `name`, returning the previous value if the field existed.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.fields.push((name, value));
                None
            }
        }
    }

    /// Appends without checking for an existing field; `name` must be new.
    pub(crate) fn push_field(&mut self, name: String, value: Value) {
        debug_assert!(self.get(&name).is_none(), "duplicate field {name}");
        self.fields.push((name, value));
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields
            .iter()
            .map(|(name, value)| (name.as_str(), value))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(name, value)| other.get(name) == Some(value))
    }
}

impl<K, V> FromIterator<(K, V)> for Record
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (name, value) in iter {
            record.insert(name, value);
        }
        record
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (name, value) in self.iter() {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::{Record, Value, ValueKind};
    use serde_json::json;
    use time::macros::datetime;

    #[test]
    fn insert_replaces_existing_field() {
        let mut record = Record::new().with("a", 1.0).with("b", 2);
        let previous = record.insert("a", 5.5);
        assert_eq!(previous, Some(Value::Float(1.0)));
        assert_eq!(record.len(), 2);
        assert_eq!(record.get("a"), Some(&Value::Float(5.5)));
    }

    #[test]
    fn equality_ignores_field_order() {
        let left = Record::new().with("a", 1.5).with("b", 2.0);
        let right = Record::new().with("b", 2.0).with("a", 1.5);
        assert_eq!(left, right);
        assert_ne!(left, Record::new().with("a", 1.5));
    }

    #[test]
    fn kinds_cover_every_variant() {
        let cases = [
            (Value::Null, ValueKind::Null),
            (Value::from(true), ValueKind::Bool),
            (Value::from(3), ValueKind::Int),
            (Value::from(0.25), ValueKind::Float),
            (Value::from("x"), ValueKind::Text),
            (Value::from(datetime!(2020-01-01 0:00 UTC)), ValueKind::Timestamp),
        ];
        for (value, kind) in cases {
            assert_eq!(value.kind(), kind);
        }
    }

    #[test]
    fn records_serialize_as_json_objects() {
        let record = Record::new()
            .with("t", datetime!(1970-01-01 0:16:40 UTC))
            .with("x", 1.5)
            .with("n", Value::Null);
        let value = serde_json::to_value(&record).expect("serialize");
        assert_eq!(
            value,
            json!({"t": "1970-01-01T00:16:40Z", "x": 1.5, "n": null})
        );
    }
}
