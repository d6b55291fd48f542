//! metacat - schema-resolving storage and query layer for a metadata catalog
//!
//! Records ("metacards") with loosely typed, dynamically declared
//! attributes are stored in a schemaless search index whose field names
//! carry the attribute's format as a suffix.
//!
//! - [`schema`]: attribute name and format to physical field name
//! - [`mapper`]: records to index documents and back
//! - [`query`]: filter trees to the index's native query
//! - [`catalog`]: create, update, delete and query orchestration
//! - [`index`]: the index client seam and an in-memory implementation

pub mod catalog;
pub mod cli;
pub mod config;
pub mod geo;
pub mod index;
pub mod mapper;
pub mod query;
pub mod record;
pub mod schema;
