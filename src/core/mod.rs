// Core modules implementing values, schema, conversion, layout, and framing.
pub mod convert;
pub mod error;
pub mod format;
pub mod frame;
pub mod layout;
pub mod schema;
pub mod value;
