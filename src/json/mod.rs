//! Purpose: Boundary between JSON documents and TypedMatrix records.
//! Exports: `parse_records`, `records_from_json`, `record_from_json`, `TimeFields`.
//! Role: Single seam the CLI uses to turn JSON input into records.
//! Invariants: Only flat objects of scalars are accepted; nesting is a usage error.
//! Invariants: Strings become timestamps only for fields the caller names.

mod parse;

pub use parse::{TimeFields, parse_records, record_from_json, records_from_json};
