//! Purpose: TypedMatrix library crate: binary frames for uniform typed records.
//! Exports: `api` (public pack/unpack surface), `core` (framing internals), `json` (document bridge).
//! Role: Backs the `typedmatrix` CLI and embedding callers.
//! Invariants: Frames are little-endian and self-describing through their JSON header.
//! Invariants: Core modules prefer explicit inputs/outputs over hidden state.
pub mod api;
pub mod core;
pub mod json;
