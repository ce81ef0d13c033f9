// Fixed-width payload layouts: row-major and column-major.
use crate::core::convert::{Scalar, convert};
use crate::core::error::{Error, ErrorKind};
use crate::core::format::Orientation;
use crate::core::schema::Column;
use crate::core::value::Record;

/// Bytes taken by one record across all `columns`.
pub fn row_width(columns: &[Column]) -> usize {
    columns.iter().map(|column| column.kind.width()).sum()
}

/// Payload size for `length` records, or `None` on overflow.
pub fn payload_len(columns: &[Column], length: usize) -> Option<usize> {
    row_width(columns).checked_mul(length)
}

pub fn encode(
    records: &[Record],
    columns: &[Column],
    orientation: Orientation,
    out: &mut Vec<u8>,
) -> Result<(), Error> {
    let size = payload_len(columns, records.len()).ok_or_else(|| {
        Error::new(ErrorKind::Usage).with_message("payload size overflows usize")
    })?;
    out.reserve(size);
    match orientation {
        Orientation::RowWise => {
            for record in records {
                for column in columns {
                    convert(record.get(&column.name), column)?.write_le(out);
                }
            }
        }
        Orientation::ColumnWise => {
            for column in columns {
                for record in records {
                    convert(record.get(&column.name), column)?.write_le(out);
                }
            }
        }
    }
    Ok(())
}

/// Rebuilds `length` records from `payload`, which must be exactly the
/// size the columns imply. Column names must already be unique.
pub fn decode(
    payload: &[u8],
    columns: &[Column],
    length: usize,
    orientation: Orientation,
) -> Result<Vec<Record>, Error> {
    let expected = payload_len(columns, length).ok_or_else(|| {
        Error::new(ErrorKind::Corrupt).with_message("payload size overflows usize")
    })?;
    if columns.is_empty() && length > 0 {
        return Err(Error::new(ErrorKind::Corrupt)
            .with_message(format!("{length} records declared with no columns")));
    }
    if payload.len() != expected {
        let kind = if payload.len() < expected {
            ErrorKind::Truncated
        } else {
            ErrorKind::Corrupt
        };
        return Err(Error::new(kind).with_message(format!(
            "payload is {} bytes, expected {expected}",
            payload.len()
        )));
    }

    let mut records: Vec<Record> = (0..length)
        .map(|_| Record::with_capacity(columns.len()))
        .collect();
    match orientation {
        Orientation::RowWise => {
            let width = row_width(columns);
            for (index, record) in records.iter_mut().enumerate() {
                let mut offset = index * width;
                for column in columns {
                    let scalar = Scalar::read_le(column.kind, payload, offset);
                    record.push_field(column.name.clone(), scalar.into_value());
                    offset += column.kind.width();
                }
            }
        }
        Orientation::ColumnWise => {
            let mut offset = 0;
            for column in columns {
                for record in records.iter_mut() {
                    let scalar = Scalar::read_le(column.kind, payload, offset);
                    record.push_field(column.name.clone(), scalar.into_value());
                    offset += column.kind.width();
                }
            }
        }
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::{decode, encode, payload_len};
    use crate::core::error::ErrorKind;
    use crate::core::format::Orientation;
    use crate::core::schema::{Column, ColumnType};
    use crate::core::value::{Record, Value};

    fn columns() -> Vec<Column> {
        vec![
            Column::new("a", ColumnType::Float32),
            Column::new("b", ColumnType::Int32),
        ]
    }

    fn records() -> Vec<Record> {
        vec![
            Record::new().with("a", 1.5).with("b", 10),
            Record::new().with("a", -2.0).with("b", 20),
            Record::new().with("a", 0.25).with("b", 30),
        ]
    }

    fn le_f32(value: f32) -> [u8; 4] {
        value.to_le_bytes()
    }

    fn le_i32(value: i32) -> [u8; 4] {
        value.to_le_bytes()
    }

    #[test]
    fn row_major_interleaves_columns() {
        let mut out = Vec::new();
        encode(&records()[..2], &columns(), Orientation::RowWise, &mut out).expect("encode");
        let expected = [le_f32(1.5), le_i32(10), le_f32(-2.0), le_i32(20)].concat();
        assert_eq!(out, expected);
    }

    #[test]
    fn column_major_groups_by_column() {
        let mut out = Vec::new();
        encode(&records()[..2], &columns(), Orientation::ColumnWise, &mut out).expect("encode");
        let expected = [le_f32(1.5), le_f32(-2.0), le_i32(10), le_i32(20)].concat();
        assert_eq!(out, expected);
    }

    #[test]
    fn both_orientations_decode_to_the_same_records() {
        for orientation in [Orientation::RowWise, Orientation::ColumnWise] {
            let mut out = Vec::new();
            encode(&records(), &columns(), orientation, &mut out).expect("encode");
            assert_eq!(out.len(), payload_len(&columns(), 3).expect("len"));
            let decoded = decode(&out, &columns(), 3, orientation).expect("decode");
            assert_eq!(decoded, records());
        }
    }

    #[test]
    fn single_record_column_major_decodes() {
        let one = vec![Record::new().with("a", 4.0).with("b", 5)];
        let mut out = Vec::new();
        encode(&one, &columns(), Orientation::ColumnWise, &mut out).expect("encode");
        let decoded = decode(&out, &columns(), 1, Orientation::ColumnWise).expect("decode");
        assert_eq!(decoded, one);
    }

    #[test]
    fn empty_collection_has_empty_payload() {
        let mut out = Vec::new();
        encode(&[], &columns(), Orientation::ColumnWise, &mut out).expect("encode");
        assert!(out.is_empty());
        let decoded = decode(&out, &columns(), 0, Orientation::ColumnWise).expect("decode");
        assert!(decoded.is_empty());
    }

    #[test]
    fn decoded_fields_follow_column_order() {
        let wide: Vec<Column> = (0..64)
            .map(|index| Column::new(format!("c{index:02}"), ColumnType::Int32))
            .collect();
        let record: Record = wide
            .iter()
            .enumerate()
            .map(|(index, column)| (column.name.clone(), index as i32))
            .collect();
        for orientation in [Orientation::RowWise, Orientation::ColumnWise] {
            let mut out = Vec::new();
            encode(&[record.clone(), record.clone()], &wide, orientation, &mut out)
                .expect("encode");
            let decoded = decode(&out, &wide, 2, orientation).expect("decode");
            for row in &decoded {
                assert_eq!(row.len(), wide.len());
                let names: Vec<&str> = row.names().collect();
                let expected: Vec<&str> = wide.iter().map(|col| col.name.as_str()).collect();
                assert_eq!(names, expected);
                assert_eq!(row.get("c63"), Some(&Value::Int(63)));
            }
        }
    }

    #[test]
    fn columnless_records_are_corrupt() {
        let err = decode(&[], &[], 5, Orientation::RowWise).expect_err("should fail");
        assert_eq!(err.kind(), ErrorKind::Corrupt);
        assert!(decode(&[], &[], 0, Orientation::RowWise).expect("decode").is_empty());
    }

    #[test]
    fn short_payload_is_truncated_and_long_payload_corrupt() {
        let mut out = Vec::new();
        encode(&records(), &columns(), Orientation::RowWise, &mut out).expect("encode");
        let err = decode(&out[..out.len() - 1], &columns(), 3, Orientation::RowWise)
            .expect_err("should fail");
        assert_eq!(err.kind(), ErrorKind::Truncated);
        out.push(0);
        let err = decode(&out, &columns(), 3, Orientation::RowWise).expect_err("should fail");
        assert_eq!(err.kind(), ErrorKind::Corrupt);
    }
}
