//! Document mapping subsystem
//!
//! Converts catalog records to the index's native documents and back,
//! using the schema resolver for every field name.

mod document;
mod errors;
mod mapper;

pub use document::{FieldValue, IndexDocument};
pub use errors::{MapperError, MapperResult};
pub use mapper::DocumentMapper;
