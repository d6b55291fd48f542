//! Schema resolution subsystem
//!
//! Bridges the open-ended attribute schema of catalog records and the
//! fixed, suffix-typed field namespace of the search index.
//!
//! # Invariants
//!
//! - The format/suffix table is a static bijection
//! - Registration is append-only and idempotent
//! - Private fields never resolve to record attributes

pub mod fields;
mod resolver;

pub use fields::{ID_FIELD, TYPE_NAME_FIELD, TYPE_OBJECT_FIELD};
pub use resolver::SchemaResolver;
