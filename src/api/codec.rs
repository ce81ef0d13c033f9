//! Purpose: Pack record collections into frames and unpack frames back into records.
//! Exports: `PackOptions`, `pack`, `pack_one`, `unpack`, `unpack_with`, `read_frame`, `columns_for`.
//! Role: Orchestrates inference, conversion, layout, and framing for callers.
//! Invariants: A frame is produced whole or the call fails; nothing partial escapes.
//! Invariants: Envelope validation finishes before any payload value is decoded.

use serde_json::{Map, Value as JsonValue};

use crate::core::error::{Error, ErrorKind};
use crate::core::format::{FrameFormat, Orientation};
use crate::core::frame::{Frame, FrameReader, FrameWriter, Header};
use crate::core::layout;
use crate::core::schema::{Column, ensure_unique_names, infer_columns};
use crate::core::value::Record;

#[derive(Clone, Debug, Default)]
pub struct PackOptions {
    pub orientation: Orientation,
    pub columns: Option<Vec<Column>>,
    pub extra: Map<String, JsonValue>,
    pub format: FrameFormat,
}

impl PackOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = orientation;
        self
    }

    pub fn columns(mut self, columns: Vec<Column>) -> Self {
        self.columns = Some(columns);
        self
    }

    pub fn extra_field(mut self, name: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.extra.insert(name.into(), value.into());
        self
    }

    pub fn extra(mut self, extra: Map<String, JsonValue>) -> Self {
        self.extra = extra;
        self
    }

    pub fn format(mut self, format: FrameFormat) -> Self {
        self.format = format;
        self
    }
}

/// Columns implied by `records`, sorted by name.
pub fn columns_for(records: &[Record]) -> Result<Vec<Column>, Error> {
    infer_columns(records, FrameFormat::Tagged)
}

pub fn pack(records: &[Record], options: &PackOptions) -> Result<Vec<u8>, Error> {
    let mut writer = FrameWriter::new(options.format, options.orientation)?;
    let columns = match options.columns.as_deref() {
        Some(columns) if !columns.is_empty() => {
            ensure_unique_names(columns, ErrorKind::Usage)?;
            columns.to_vec()
        }
        _ => infer_columns(records, options.format)?,
    };
    if columns.is_empty() && !records.is_empty() {
        return Err(Error::new(ErrorKind::Usage)
            .with_message("records carry no fields to pack")
            .with_hint("Supply columns or records with at least one field."));
    }
    let header = Header::new(records.len(), columns, options.extra.clone());
    writer.write_header(&header)?;
    layout::encode(
        records,
        &header.cols,
        options.orientation,
        writer.payload_mut(),
    )?;
    let buf = writer.finish();
    tracing::debug!(
        records = records.len(),
        columns = header.cols.len(),
        orientation = %options.orientation,
        format = options.format.as_str(),
        bytes = buf.len(),
        "packed frame"
    );
    Ok(buf)
}

pub fn pack_one(record: &Record, options: &PackOptions) -> Result<Vec<u8>, Error> {
    pack(std::slice::from_ref(record), options)
}

pub fn read_frame(buf: &[u8], format: FrameFormat) -> Result<Frame<'_>, Error> {
    FrameReader::new(buf).read_frame(format)
}

pub fn unpack(buf: &[u8]) -> Result<(Header, Vec<Record>), Error> {
    unpack_with(buf, FrameFormat::Tagged)
}

pub fn unpack_with(buf: &[u8], format: FrameFormat) -> Result<(Header, Vec<Record>), Error> {
    let frame = read_frame(buf, format)?;
    let records = frame.decode_records()?;
    tracing::debug!(
        records = records.len(),
        columns = frame.header.cols.len(),
        orientation = %frame.orientation,
        format = format.as_str(),
        "unpacked frame"
    );
    Ok((frame.header, records))
}

#[cfg(test)]
mod tests {
    use super::{PackOptions, columns_for, pack, pack_one, unpack, unpack_with};
    use crate::core::error::ErrorKind;
    use crate::core::format::{FrameFormat, Orientation};
    use crate::core::schema::{Column, ColumnType};
    use crate::core::value::{Record, Value};
    use serde_json::json;

    #[test]
    fn single_record_packs_like_a_one_element_collection() {
        let record = Record::new().with("x", 3.0);
        let options = PackOptions::new();
        assert_eq!(
            pack_one(&record, &options).expect("one"),
            pack(&[record.clone()], &options).expect("many")
        );
    }

    #[test]
    fn supplied_columns_skip_inference() {
        let records = [Record::new().with("n", 12.9).with("label", "ignored")];
        let options = PackOptions::new().columns(vec![Column::new("n", ColumnType::Int32)]);
        let buf = pack(&records, &options).expect("pack");
        let (header, decoded) = unpack(&buf).expect("unpack");
        assert_eq!(header.cols, vec![Column::new("n", ColumnType::Int32)]);
        assert_eq!(decoded, vec![Record::new().with("n", 12)]);
    }

    #[test]
    fn empty_column_list_falls_back_to_inference() {
        let records = [Record::new().with("a", 1.0)];
        let buf = pack(&records, &PackOptions::new().columns(Vec::new())).expect("pack");
        let (header, _) = unpack(&buf).expect("unpack");
        assert_eq!(header.cols, columns_for(&records).expect("columns"));
    }

    #[test]
    fn duplicate_supplied_columns_are_rejected() {
        let columns = vec![
            Column::new("a", ColumnType::Float32),
            Column::new("a", ColumnType::Float32),
        ];
        let err = pack(&[], &PackOptions::new().columns(columns)).expect_err("should fail");
        assert_eq!(err.kind(), ErrorKind::Usage);
    }

    #[test]
    fn extra_fields_round_trip_verbatim() {
        let options = PackOptions::new()
            .extra_field("source", "station-4")
            .extra_field("meta", json!({"units": ["m", "s"]}));
        let buf = pack(&[Record::new().with("a", 1.0)], &options).expect("pack");
        let (header, _) = unpack(&buf).expect("unpack");
        assert_eq!(header.extra.get("source"), Some(&json!("station-4")));
        assert_eq!(header.extra.get("meta"), Some(&json!({"units": ["m", "s"]})));
    }

    #[test]
    fn legacy_frames_round_trip_with_int_columns() {
        let records = [
            Record::new().with("count", 3).with("level", 0.5),
            Record::new().with("count", 4.75).with("level", 1.5),
        ];
        let options = PackOptions::new().format(FrameFormat::Legacy);
        let buf = pack(&records, &options).expect("pack");
        let (header, decoded) = unpack_with(&buf, FrameFormat::Legacy).expect("unpack");
        assert_eq!(header.cols[0], Column::new("count", ColumnType::Int32));
        assert_eq!(decoded[1].get("count"), Some(&Value::Int(4)));
        assert_eq!(decoded[1].get("level"), Some(&Value::Float(1.5)));
    }

    #[test]
    fn legacy_frame_is_not_a_tagged_frame() {
        let buf = pack(
            &[Record::new().with("a", 1.0)],
            &PackOptions::new().format(FrameFormat::Legacy),
        )
        .expect("pack");
        let err = unpack(&buf).expect_err("should fail");
        assert_eq!(err.kind(), ErrorKind::BadMagic);
    }

    #[test]
    fn fieldless_records_are_rejected() {
        let err = pack(&[Record::new()], &PackOptions::new()).expect_err("should fail");
        assert_eq!(err.kind(), ErrorKind::Usage);
        let buf = pack(&[], &PackOptions::new()).expect("empty collection");
        let (header, records) = unpack(&buf).expect("unpack");
        assert!(header.cols.is_empty());
        assert!(records.is_empty());
    }

    #[test]
    fn columnwise_legacy_pack_is_rejected() {
        let options = PackOptions::new()
            .format(FrameFormat::Legacy)
            .orientation(Orientation::ColumnWise);
        let err = pack(&[], &options).expect_err("should fail");
        assert_eq!(err.kind(), ErrorKind::InvalidOrientation);
    }
}
