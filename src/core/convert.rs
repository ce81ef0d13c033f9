// Per-value coercion into fixed-width column scalars, with default substitution.
use std::fmt;

use time::OffsetDateTime;

use crate::core::error::{Error, ErrorKind};
use crate::core::schema::{Column, ColumnType};
use crate::core::value::{Value, ValueKind};

/// A value in its column's fixed-width representation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Scalar {
    Float32(f32),
    Int32(i32),
}

impl Scalar {
    pub fn default_for(kind: ColumnType) -> Self {
        match kind {
            ColumnType::Float32 => Scalar::Float32(0.0),
            ColumnType::Int32 => Scalar::Int32(0),
        }
    }

    pub fn write_le(self, out: &mut Vec<u8>) {
        match self {
            Scalar::Float32(value) => out.extend_from_slice(&value.to_le_bytes()),
            Scalar::Int32(value) => out.extend_from_slice(&value.to_le_bytes()),
        }
    }

    /// Reads one value of `kind` at `offset`; the caller guarantees the bytes exist.
    pub fn read_le(kind: ColumnType, buf: &[u8], offset: usize) -> Self {
        match kind {
            ColumnType::Float32 => Scalar::Float32(f32::from_le_bytes(read_4(buf, offset))),
            ColumnType::Int32 => Scalar::Int32(i32::from_le_bytes(read_4(buf, offset))),
        }
    }

    pub fn into_value(self) -> Value {
        match self {
            Scalar::Float32(value) => Value::Float(value as f64),
            Scalar::Int32(value) => Value::Int(value as i64),
        }
    }
}

/// A value that has no representation in the target column type.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ConversionFailure {
    pub from: ValueKind,
    pub to: ColumnType,
}

impl fmt::Display for ConversionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cannot convert {} to {}", self.from, self.to)
    }
}

impl std::error::Error for ConversionFailure {}

pub fn try_convert(value: &Value, kind: ColumnType) -> Result<Scalar, ConversionFailure> {
    let failure = ConversionFailure {
        from: value.kind(),
        to: kind,
    };
    let scalar = match kind {
        ColumnType::Float32 => to_f64(value).map(|v| Scalar::Float32(v as f32)),
        ColumnType::Int32 => to_i32(value).map(Scalar::Int32),
    };
    scalar.ok_or(failure)
}

/// Converts one field for `column`, substituting the column default when
/// the value is missing or unconvertible.
///
/// Storing a timestamp in an `Int32` column is the one fatal case.
pub fn convert(value: Option<&Value>, column: &Column) -> Result<Scalar, Error> {
    let Some(value) = value else {
        tracing::trace!(column = %column.name, "missing field; using default");
        return Ok(Scalar::default_for(column.kind));
    };
    if column.kind == ColumnType::Int32 && matches!(value, Value::Timestamp(_)) {
        return Err(Error::new(ErrorKind::TimestampToInteger)
            .with_message("timestamps cannot be stored in Int32 columns")
            .with_field(column.name.clone())
            .with_hint("Declare the column as Float32 to store milliseconds since epoch."));
    }
    match try_convert(value, column.kind) {
        Ok(scalar) => Ok(scalar),
        Err(failure) => {
            tracing::trace!(column = %column.name, %failure, "using default");
            Ok(Scalar::default_for(column.kind))
        }
    }
}

/// Whole UTC seconds since the epoch, in milliseconds.
pub fn timestamp_millis(instant: OffsetDateTime) -> f64 {
    instant.unix_timestamp() as f64 * 1000.0
}

fn to_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Int(v) => Some(*v as f64),
        Value::Float(v) => Some(*v),
        Value::Bool(v) => Some(if *v { 1.0 } else { 0.0 }),
        Value::Text(text) => text.trim().parse::<f64>().ok(),
        Value::Timestamp(instant) => Some(timestamp_millis(*instant)),
        Value::Null => None,
    }
}

fn to_i32(value: &Value) -> Option<i32> {
    match value {
        Value::Int(v) => i32::try_from(*v).ok(),
        Value::Float(v) => {
            let truncated = v.trunc();
            if truncated.is_finite()
                && truncated >= i32::MIN as f64
                && truncated <= i32::MAX as f64
            {
                Some(truncated as i32)
            } else {
                None
            }
        }
        Value::Bool(v) => Some(i32::from(*v)),
        Value::Text(text) => text.trim().parse::<i32>().ok(),
        Value::Timestamp(_) | Value::Null => None,
    }
}

fn read_4(buf: &[u8], offset: usize) -> [u8; 4] {
    let mut out = [0u8; 4];
    out.copy_from_slice(&buf[offset..offset + 4]);
    out
}

#[cfg(test)]
mod tests {
    use super::{ConversionFailure, Scalar, convert, try_convert};
    use crate::core::error::ErrorKind;
    use crate::core::schema::{Column, ColumnType};
    use crate::core::value::{Value, ValueKind};
    use time::macros::datetime;

    fn float_col() -> Column {
        Column::new("x", ColumnType::Float32)
    }

    fn int_col() -> Column {
        Column::new("n", ColumnType::Int32)
    }

    #[test]
    fn float_column_coerces_numbers_and_numeric_text() {
        let cases = [
            (Value::from(2), 2.0f32),
            (Value::from(1.5), 1.5),
            (Value::from(true), 1.0),
            (Value::from(" 3.25 "), 3.25),
        ];
        for (value, expected) in cases {
            assert_eq!(
                convert(Some(&value), &float_col()).expect("convert"),
                Scalar::Float32(expected)
            );
        }
    }

    #[test]
    fn float_column_substitutes_default_on_failure() {
        for value in [Value::from("n/a"), Value::Null] {
            assert_eq!(
                convert(Some(&value), &float_col()).expect("convert"),
                Scalar::Float32(0.0)
            );
        }
        assert_eq!(
            convert(None, &float_col()).expect("convert"),
            Scalar::Float32(0.0)
        );
    }

    #[test]
    fn timestamps_become_whole_second_millis() {
        let value = Value::from(datetime!(1970-01-01 0:16:40.750 UTC));
        assert_eq!(
            convert(Some(&value), &float_col()).expect("convert"),
            Scalar::Float32(1_000_000.0)
        );
    }

    #[test]
    fn int_column_truncates_and_range_checks() {
        let cases = [
            (Value::from(7), 7),
            (Value::from(-2.9), -2),
            (Value::from("42"), 42),
            (Value::from("4.5"), 0),
            (Value::from(i64::MAX), 0),
            (Value::from(f64::NAN), 0),
        ];
        for (value, expected) in cases {
            assert_eq!(
                convert(Some(&value), &int_col()).expect("convert"),
                Scalar::Int32(expected)
            );
        }
    }

    #[test]
    fn timestamp_into_int_column_is_fatal() {
        let value = Value::from(datetime!(2020-01-01 0:00 UTC));
        let err = convert(Some(&value), &int_col()).expect_err("should fail");
        assert_eq!(err.kind(), ErrorKind::TimestampToInteger);
        assert_eq!(err.field(), Some("n"));
    }

    #[test]
    fn try_convert_reports_the_failed_pair() {
        let failure = try_convert(&Value::Null, ColumnType::Float32).expect_err("should fail");
        assert_eq!(
            failure,
            ConversionFailure {
                from: ValueKind::Null,
                to: ColumnType::Float32
            }
        );
        assert_eq!(failure.to_string(), "cannot convert null to Float32");
    }

    #[test]
    fn scalars_are_little_endian() {
        let mut buf = Vec::new();
        Scalar::Int32(1).write_le(&mut buf);
        Scalar::Float32(1.0).write_le(&mut buf);
        assert_eq!(buf, [1, 0, 0, 0, 0x00, 0x00, 0x80, 0x3f]);
        assert_eq!(Scalar::read_le(ColumnType::Int32, &buf, 0), Scalar::Int32(1));
        assert_eq!(
            Scalar::read_le(ColumnType::Float32, &buf, 4),
            Scalar::Float32(1.0)
        );
    }
}
