//! Purpose: Helpers for observing Float32 precision before values are stored.
//! Exports: `round_trip_float32`, `utc_timestamp_float32`, `utc_timestamp_float32_now`.
//! Role: Lets callers holding f64 data see exactly what a Float32 column keeps.
//! Invariants: Results match what pack followed by unpack would return.

use time::OffsetDateTime;

use crate::core::convert::timestamp_millis;

/// Passes `value` through the little-endian Float32 encoding and back.
///
/// Returns `f64` so the loss shows up in the caller's own float type.
pub fn round_trip_float32(value: f64) -> f64 {
    let bytes = (value as f32).to_le_bytes();
    f32::from_le_bytes(bytes) as f64
}

/// Milliseconds since the epoch for `instant` (whole UTC seconds), as stored
/// in a Float32 column.
///
/// Returns `f32` because the result is meant to be stored, not compared
/// against the f64 input.
pub fn utc_timestamp_float32(instant: OffsetDateTime) -> f32 {
    round_trip_float32(timestamp_millis(instant)) as f32
}

pub fn utc_timestamp_float32_now() -> f32 {
    utc_timestamp_float32(OffsetDateTime::now_utc())
}
