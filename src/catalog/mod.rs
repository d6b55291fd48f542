//! Catalog provider subsystem
//!
//! Create, update, delete and query over any [`IndexClient`], with
//! identity resolution and source attribution.
//!
//! [`IndexClient`]: crate::index::IndexClient

mod errors;
mod provider;
mod request;
mod response;

pub use errors::{CatalogError, CatalogResult};
pub use provider::CatalogProvider;
pub use request::{DeleteRequest, UpdateRequest};
pub use response::{CreateResponse, DeleteResponse, SearchResult, SourceResponse, Update, UpdateResponse};
