//! Purpose: Define the stable public Rust API boundary for TypedMatrix.
//! Exports: Pack/unpack operations, schema inference, precision helpers, and their types.
//! Role: Public, additive-only surface; hides the layout and framing internals.
//! Invariants: Operations are pure functions of their inputs; no shared mutable state.
//! Invariants: Errors carry an `ErrorKind` that maps to a stable exit code.

mod codec;
mod precision;

pub use crate::core::convert::{ConversionFailure, Scalar, try_convert};
#[doc(hidden)]
pub use crate::core::error::to_exit_code;
pub use crate::core::error::{Error, ErrorKind};
pub use crate::core::format::{FORMAT_VERSION, FrameFormat, Orientation};
pub use crate::core::frame::{FRAME_MAGIC, Frame, Header};
pub use crate::core::schema::{Column, ColumnType};
pub use crate::core::value::{Record, Value, ValueKind};
pub use codec::{PackOptions, columns_for, pack, pack_one, read_frame, unpack, unpack_with};
pub use precision::{round_trip_float32, utc_timestamp_float32, utc_timestamp_float32_now};
