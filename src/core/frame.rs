// Frame envelope layout: magic, version, orientation, JSON header, payload.
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::core::error::{Error, ErrorKind};
use crate::core::format::{FORMAT_VERSION, FrameFormat, Orientation, version_error};
use crate::core::layout;
use crate::core::schema::{Column, ensure_unique_names};
use crate::core::value::Record;

pub const FRAME_MAGIC: [u8; 4] = *b"tmtx";
/// Bytes ahead of the header JSON in a tagged frame.
pub const TAGGED_PREFIX_LEN: usize = 13;
/// Bytes ahead of the header JSON in a legacy frame.
pub const LEGACY_PREFIX_LEN: usize = 4;

/// The JSON header: record count, columns, and caller pass-through fields.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Header {
    pub length: usize,
    pub cols: Vec<Column>,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

impl Header {
    pub fn new(length: usize, cols: Vec<Column>, mut extra: Map<String, JsonValue>) -> Self {
        for reserved in ["length", "cols"] {
            if extra.remove(reserved).is_some() {
                tracing::debug!(field = reserved, "extra header field overridden");
            }
        }
        Self {
            length,
            cols,
            extra,
        }
    }

    pub fn payload_len(&self) -> Option<usize> {
        layout::payload_len(&self.cols, self.length)
    }
}

pub struct FrameWriter {
    format: FrameFormat,
    orientation: Orientation,
    buf: Vec<u8>,
}

impl FrameWriter {
    pub fn new(format: FrameFormat, orientation: Orientation) -> Result<Self, Error> {
        if format == FrameFormat::Legacy && orientation != Orientation::RowWise {
            return Err(Error::new(ErrorKind::InvalidOrientation)
                .with_message("legacy frames are always rowwise")
                .with_hint("Use the tagged format for columnwise frames."));
        }
        Ok(Self {
            format,
            orientation,
            buf: Vec::new(),
        })
    }

    /// Writes the envelope prefix and header; the payload follows.
    pub fn write_header(&mut self, header: &Header) -> Result<(), Error> {
        let json = serde_json::to_vec(header).map_err(|err| {
            Error::new(ErrorKind::Internal)
                .with_message("header encode failed")
                .with_source(err)
        })?;
        let header_len = i32::try_from(json.len()).map_err(|_| {
            Error::new(ErrorKind::Usage).with_message("header JSON exceeds i32::MAX bytes")
        })?;
        let payload = header.payload_len().unwrap_or(0);
        let prefix = match self.format {
            FrameFormat::Tagged => TAGGED_PREFIX_LEN,
            FrameFormat::Legacy => LEGACY_PREFIX_LEN,
        };
        self.buf.reserve(prefix + json.len() + payload);
        if self.format == FrameFormat::Tagged {
            self.buf.extend_from_slice(&FRAME_MAGIC);
            self.buf.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
            self.buf.push(self.orientation.tag());
        }
        self.buf.extend_from_slice(&header_len.to_le_bytes());
        self.buf.extend_from_slice(&json);
        Ok(())
    }

    pub fn payload_mut(&mut self) -> &mut Vec<u8> {
        &mut self.buf
    }

    pub fn finish(self) -> Vec<u8> {
        self.buf
    }
}

/// A validated frame whose payload has not been decoded yet.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame<'a> {
    pub format: FrameFormat,
    pub version: Option<i32>,
    pub orientation: Orientation,
    pub header_len: usize,
    pub header: Header,
    pub payload: &'a [u8],
}

impl Frame<'_> {
    pub fn decode_records(&self) -> Result<Vec<Record>, Error> {
        layout::decode(
            self.payload,
            &self.header.cols,
            self.header.length,
            self.orientation,
        )
    }
}

pub struct FrameReader<'a> {
    buf: &'a [u8],
    offset: usize,
}

impl<'a> FrameReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, offset: 0 }
    }

    /// Validates the envelope and parses the header, in frame order.
    pub fn read_frame(mut self, format: FrameFormat) -> Result<Frame<'a>, Error> {
        let (version, orientation) = match format {
            FrameFormat::Tagged => {
                let magic = self.take(FRAME_MAGIC.len(), "magic")?;
                if magic != FRAME_MAGIC {
                    return Err(Error::new(ErrorKind::BadMagic)
                        .with_message(format!("expected {:?}, found {magic:?}", FRAME_MAGIC))
                        .with_offset(0));
                }
                let version = self.read_i32("version")?;
                if version != FORMAT_VERSION {
                    return Err(version_error(version).with_offset(4));
                }
                let tag = self.take(1, "orientation")?[0];
                let orientation = Orientation::from_tag(tag).map_err(|err| err.with_offset(8))?;
                (Some(version), orientation)
            }
            FrameFormat::Legacy => (None, Orientation::RowWise),
        };

        let header_offset = self.offset as u64;
        let header_len = self.read_i32("header_length")?;
        let header_len = usize::try_from(header_len).map_err(|_| {
            Error::new(ErrorKind::Corrupt)
                .with_message(format!("negative header length {header_len}"))
                .with_offset(header_offset)
        })?;
        let json_offset = self.offset as u64;
        let json = self.take(header_len, "header")?;
        let header: Header = serde_json::from_slice(json).map_err(|err| {
            Error::new(ErrorKind::Corrupt)
                .with_message("invalid header JSON")
                .with_offset(json_offset)
                .with_source(err)
        })?;
        ensure_unique_names(&header.cols, ErrorKind::Corrupt)?;
        if header.cols.is_empty() && header.length > 0 {
            return Err(Error::new(ErrorKind::Corrupt)
                .with_message(format!("header declares {} records but no columns", header.length))
                .with_offset(json_offset));
        }

        let payload = &self.buf[self.offset..];
        let expected = header.payload_len().ok_or_else(|| {
            Error::new(ErrorKind::Corrupt).with_message("header length overflows payload size")
        })?;
        if payload.len() < expected {
            return Err(Error::new(ErrorKind::Truncated)
                .with_message(format!(
                    "payload is {} bytes, header implies {expected}",
                    payload.len()
                ))
                .with_offset(self.buf.len() as u64));
        }
        if payload.len() > expected {
            return Err(Error::new(ErrorKind::Corrupt)
                .with_message(format!(
                    "{} trailing bytes after payload",
                    payload.len() - expected
                ))
                .with_offset((self.offset + expected) as u64));
        }

        Ok(Frame {
            format,
            version,
            orientation,
            header_len,
            header,
            payload,
        })
    }

    fn take(&mut self, len: usize, what: &str) -> Result<&'a [u8], Error> {
        let end = self
            .offset
            .checked_add(len)
            .filter(|end| *end <= self.buf.len())
            .ok_or_else(|| {
                Error::new(ErrorKind::Truncated)
                    .with_message(format!("frame ends inside {what}"))
                    .with_offset(self.buf.len() as u64)
            })?;
        let slice = &self.buf[self.offset..end];
        self.offset = end;
        Ok(slice)
    }

    fn read_i32(&mut self, what: &str) -> Result<i32, Error> {
        let bytes = self.take(4, what)?;
        let mut out = [0u8; 4];
        out.copy_from_slice(bytes);
        Ok(i32::from_le_bytes(out))
    }
}
