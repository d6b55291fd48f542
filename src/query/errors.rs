//! Query translation errors
//!
//! Both kinds are request errors: they are raised before the index is
//! contacted and are never retried.

use thiserror::Error;

pub type QueryResult<T> = Result<T, QueryError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// Filter construct the translator cannot express.
    #[error("unsupported query: {0}")]
    Unsupported(String),

    /// Start index below 1.
    #[error("invalid start index {start_index}: must be 1 or greater")]
    InvalidPagination { start_index: i64 },
}

impl QueryError {
    pub fn unsupported(construct: impl Into<String>) -> Self {
        QueryError::Unsupported(construct.into())
    }

    pub fn code(&self) -> &'static str {
        match self {
            QueryError::Unsupported(_) => "QUERY_UNSUPPORTED",
            QueryError::InvalidPagination { .. } => "QUERY_INVALID_PAGINATION",
        }
    }
}
