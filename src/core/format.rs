//! Purpose: Centralize frame format versioning and the supported frame variants.
//! Exports: `FORMAT_VERSION`, `SUPPORTED_FORMAT_VERSIONS`, `FrameFormat`, `Orientation`, `version_error`.
//! Role: Shared policy for gating frame compatibility across pack/unpack paths.
//! Invariants: Version list is additive; bump only for incompatible layout changes.
//! Invariants: Orientation tags and names are part of the wire contract.

use std::fmt;
use std::str::FromStr;

use crate::core::error::{Error, ErrorKind};

pub const FORMAT_VERSION: i32 = 1;
pub const SUPPORTED_FORMAT_VERSIONS: &[i32] = &[FORMAT_VERSION];

pub fn version_error(detected: i32) -> Error {
    let supported = SUPPORTED_FORMAT_VERSIONS
        .iter()
        .map(|version| version.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    Error::new(ErrorKind::UnsupportedVersion)
        .with_message(format!(
            "unsupported frame format version {detected} (supported: {supported})"
        ))
        .with_hint("Upgrade typedmatrix or re-pack the data with a supported writer.")
}

/// Which envelope a frame carries.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum FrameFormat {
    /// `tmtx` magic, version, and orientation byte ahead of the header.
    #[default]
    Tagged,
    /// Header length first; no magic, no version, always row-major.
    Legacy,
}

impl FrameFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            FrameFormat::Tagged => "tagged",
            FrameFormat::Legacy => "legacy",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Orientation {
    #[default]
    RowWise,
    ColumnWise,
}

impl Orientation {
    pub fn as_str(self) -> &'static str {
        match self {
            Orientation::RowWise => "rowwise",
            Orientation::ColumnWise => "columnwise",
        }
    }

    pub fn tag(self) -> u8 {
        match self {
            Orientation::RowWise => b'r',
            Orientation::ColumnWise => b'c',
        }
    }

    pub fn from_tag(tag: u8) -> Result<Self, Error> {
        match tag {
            b'r' => Ok(Orientation::RowWise),
            b'c' => Ok(Orientation::ColumnWise),
            other => Err(Error::new(ErrorKind::InvalidOrientation)
                .with_message(format!("unknown orientation tag 0x{other:02x}"))),
        }
    }
}

impl FromStr for Orientation {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "rowwise" => Ok(Orientation::RowWise),
            "columnwise" => Ok(Orientation::ColumnWise),
            other => Err(Error::new(ErrorKind::InvalidOrientation)
                .with_message(format!("unknown orientation {other:?}"))
                .with_hint("Use rowwise or columnwise.")),
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
