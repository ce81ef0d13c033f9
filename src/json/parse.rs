// JSON document decoding into records.
use std::collections::HashSet;

use serde_json::Value as JsonValue;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::core::error::{Error, ErrorKind};
use crate::core::value::{Record, Value};

/// Field names whose string values are RFC 3339 timestamps.
#[derive(Clone, Debug, Default)]
pub struct TimeFields {
    names: HashSet<String>,
}

impl TimeFields {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }
}

/// Parses a JSON object or array of objects.
pub fn parse_records(input: &[u8], time_fields: &TimeFields) -> Result<Vec<Record>, Error> {
    let document: JsonValue = serde_json::from_slice(input).map_err(|err| {
        Error::new(ErrorKind::Usage)
            .with_message("input is not valid JSON")
            .with_hint("Provide a JSON object or an array of objects.")
            .with_source(err)
    })?;
    records_from_json(&document, time_fields)
}

pub fn records_from_json(document: &JsonValue, time_fields: &TimeFields) -> Result<Vec<Record>, Error> {
    match document {
        JsonValue::Array(items) => items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                record_from_json(item, time_fields).map_err(|err| {
                    let message = format!("record {index}: {}", err.message().unwrap_or("invalid"));
                    err.with_message(message)
                })
            })
            .collect(),
        JsonValue::Object(_) => Ok(vec![record_from_json(document, time_fields)?]),
        _ => Err(Error::new(ErrorKind::Usage)
            .with_message("expected a JSON object or array of objects")),
    }
}

pub fn record_from_json(document: &JsonValue, time_fields: &TimeFields) -> Result<Record, Error> {
    let JsonValue::Object(map) = document else {
        return Err(Error::new(ErrorKind::Usage).with_message("record is not a JSON object"));
    };
    let mut record = Record::with_capacity(map.len());
    for (name, value) in map {
        record.insert(name.clone(), field_value(name, value, time_fields)?);
    }
    Ok(record)
}

fn field_value(name: &str, value: &JsonValue, time_fields: &TimeFields) -> Result<Value, Error> {
    match value {
        JsonValue::Null => Ok(Value::Null),
        JsonValue::Bool(flag) => Ok(Value::Bool(*flag)),
        JsonValue::Number(number) => Ok(match number.as_i64() {
            Some(int) => Value::Int(int),
            None => Value::Float(number.as_f64().unwrap_or(f64::NAN)),
        }),
        JsonValue::String(text) if time_fields.contains(name) => {
            OffsetDateTime::parse(text, &Rfc3339)
                .map(Value::Timestamp)
                .map_err(|err| {
                    Error::new(ErrorKind::Usage)
                        .with_message(format!("invalid RFC 3339 timestamp {text:?}"))
                        .with_field(name)
                        .with_source(err)
                })
        }
        JsonValue::String(text) => Ok(Value::Text(text.clone())),
        JsonValue::Array(_) | JsonValue::Object(_) => Err(Error::new(ErrorKind::Usage)
            .with_message("nested JSON values are not supported")
            .with_field(name)),
    }
}
