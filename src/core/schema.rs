//! Purpose: Column definitions and schema inference from sample records.
//! Exports: `ColumnType`, `Column`, `infer_columns`, `ensure_unique_names`.
//! Role: Derives the ordered column list a frame header carries.
//! Invariants: Inferred columns are sorted by name; no two columns share a name.
//! Invariants: A column's type is fixed by the first record that carries it.

use std::collections::BTreeMap;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::error::{Error, ErrorKind};
use crate::core::format::FrameFormat;
use crate::core::value::{Record, ValueKind};

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub enum ColumnType {
    Float32,
    Int32,
}

impl ColumnType {
    pub fn as_str(self) -> &'static str {
        match self {
            ColumnType::Float32 => "Float32",
            ColumnType::Int32 => "Int32",
        }
    }

    /// Encoded size of one value in bytes.
    pub fn width(self) -> usize {
        match self {
            ColumnType::Float32 => 4,
            ColumnType::Int32 => 4,
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ColumnType {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "Float32" => Ok(ColumnType::Float32),
            "Int32" => Ok(ColumnType::Int32),
            other => Err(Error::new(ErrorKind::UnsupportedType)
                .with_message(format!("unknown column type {other:?}"))
                .with_hint("Supported column types: Float32, Int32.")),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ColumnType,
}

impl Column {
    pub fn new(name: impl Into<String>, kind: ColumnType) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    /// Parses a `name:Type` pair, e.g. `depth:Float32`.
    pub fn parse_spec(spec: &str) -> Result<Self, Error> {
        let (name, kind) = spec.rsplit_once(':').ok_or_else(|| {
            Error::new(ErrorKind::Usage)
                .with_message(format!("column spec {spec:?} is not NAME:TYPE"))
        })?;
        if name.is_empty() {
            return Err(Error::new(ErrorKind::Usage).with_message("column name is empty"));
        }
        let kind = kind.parse::<ColumnType>().map_err(|err| err.with_field(name))?;
        Ok(Self::new(name, kind))
    }
}

const TAGGED_TYPE_TABLE: &[(ValueKind, ColumnType)] = &[
    (ValueKind::Int, ColumnType::Float32),
    (ValueKind::Float, ColumnType::Float32),
    (ValueKind::Timestamp, ColumnType::Float32),
];

const LEGACY_TYPE_TABLE: &[(ValueKind, ColumnType)] = &[
    (ValueKind::Int, ColumnType::Int32),
    (ValueKind::Float, ColumnType::Float32),
    (ValueKind::Timestamp, ColumnType::Float32),
];

fn type_table(format: FrameFormat) -> &'static [(ValueKind, ColumnType)] {
    match format {
        FrameFormat::Tagged => TAGGED_TYPE_TABLE,
        FrameFormat::Legacy => LEGACY_TYPE_TABLE,
    }
}

pub fn column_type_for(kind: ValueKind, format: FrameFormat) -> Option<ColumnType> {
    type_table(format)
        .iter()
        .find(|(candidate, _)| *candidate == kind)
        .map(|(_, column_type)| *column_type)
}

/// Derives the columns implied by the union of fields across `records`.
///
/// Every value must have an entry in the format's type table, but only the
/// first occurrence of a name decides its column type.
pub fn infer_columns(records: &[Record], format: FrameFormat) -> Result<Vec<Column>, Error> {
    let mut columns: BTreeMap<&str, ColumnType> = BTreeMap::new();
    for record in records {
        for (name, value) in record.iter() {
            let kind = value.kind();
            let Some(column_type) = column_type_for(kind, format) else {
                return Err(Error::new(ErrorKind::UnsupportedType)
                    .with_message(format!("{kind} is not a supported type"))
                    .with_field(name));
            };
            columns.entry(name).or_insert(column_type);
        }
    }
    Ok(columns
        .into_iter()
        .map(|(name, kind)| Column::new(name, kind))
        .collect())
}

pub fn ensure_unique_names(columns: &[Column], kind: ErrorKind) -> Result<(), Error> {
    let mut seen = HashSet::with_capacity(columns.len());
    for column in columns {
        if !seen.insert(column.name.as_str()) {
            return Err(Error::new(kind)
                .with_message("duplicate column name")
                .with_field(column.name.clone()));
        }
    }
    Ok(())
}
