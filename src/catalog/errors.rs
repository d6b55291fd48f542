//! Catalog operation errors
//!
//! Request errors are detected before the index is contacted and are
//! never retried. Everything else wraps a mapping or backend failure.

use thiserror::Error;

use crate::index::IndexError;
use crate::mapper::MapperError;
use crate::query::QueryError;

pub type CatalogResult<T> = Result<T, CatalogError>;

#[derive(Debug, Error)]
pub enum CatalogError {
    /// Backend failed during a create, update or delete.
    #[error("ingest failed: {0}")]
    Ingest(#[source] IndexError),

    /// Update or delete without a match attribute.
    #[error("{operation} requires a match attribute name")]
    MissingAttribute { operation: &'static str },

    /// Create received a record identified by another provider.
    #[error("record '{id}' already belongs to source '{source_id}'; use update instead")]
    ForeignIdentity { id: String, source_id: String },

    /// More stored records matched than updates were requested.
    #[error("'{attribute}' matched {found} records for {requested} updates")]
    AmbiguousMatch {
        attribute: String,
        requested: usize,
        found: usize,
    },

    /// Two stored records share one match value.
    #[error("'{attribute}' value '{value}' matches more than one record")]
    DuplicateMatch { attribute: String, value: String },

    /// Record could not be written as, or read back from, a document.
    #[error("record serialization failed: {0}")]
    Serialization(#[from] MapperError),

    #[error("{0}")]
    UnsupportedQuery(String),

    #[error("invalid start index {start_index}: must be 1 or greater")]
    InvalidPagination { start_index: i64 },

    /// Backend failed while answering a search.
    #[error("query failed: {0}")]
    Query(#[source] IndexError),
}

impl CatalogError {
    pub fn code(&self) -> &'static str {
        match self {
            CatalogError::Ingest(_) => "CATALOG_INGEST_FAILED",
            CatalogError::MissingAttribute { .. } => "CATALOG_MISSING_ATTRIBUTE",
            CatalogError::ForeignIdentity { .. } => "CATALOG_FOREIGN_IDENTITY",
            CatalogError::AmbiguousMatch { .. } => "CATALOG_AMBIGUOUS_MATCH",
            CatalogError::DuplicateMatch { .. } => "CATALOG_DUPLICATE_MATCH",
            CatalogError::Serialization(_) => "CATALOG_SERIALIZATION_FAILED",
            CatalogError::UnsupportedQuery(_) => "CATALOG_UNSUPPORTED_QUERY",
            CatalogError::InvalidPagination { .. } => "CATALOG_INVALID_PAGINATION",
            CatalogError::Query(_) => "CATALOG_QUERY_FAILED",
        }
    }

    /// True for caller mistakes that never reach the backend.
    pub fn is_request_error(&self) -> bool {
        matches!(
            self,
            CatalogError::MissingAttribute { .. }
                | CatalogError::ForeignIdentity { .. }
                | CatalogError::AmbiguousMatch { .. }
                | CatalogError::DuplicateMatch { .. }
                | CatalogError::UnsupportedQuery(_)
                | CatalogError::InvalidPagination { .. }
        )
    }
}

impl From<QueryError> for CatalogError {
    fn from(err: QueryError) -> Self {
        match err {
            QueryError::Unsupported(_) => CatalogError::UnsupportedQuery(err.to_string()),
            QueryError::InvalidPagination { start_index } => CatalogError::InvalidPagination { start_index },
        }
    }
}
