//! Search index client contract
//!
//! Everything the catalog needs from a backend: batch add, query,
//! delete-by-query, liveness and the list of fields in use.

use std::sync::Arc;

use super::errors::IndexResult;
use crate::mapper::IndexDocument;
use crate::query::{Clause, NativeQuery};

/// A matched document and its native score, when one was requested.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredDocument {
    pub document: IndexDocument,
    pub score: Option<f64>,
}

/// One page of matches plus the total number of matches.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResponse {
    pub documents: Vec<ScoredDocument>,
    pub num_found: usize,
}

/// Blocking client for a search index keyed by the `id_txt` field.
pub trait IndexClient: Send + Sync {
    /// Adds or replaces documents as one batch.
    ///
    /// With `force_commit` the batch is visible to queries on return.
    fn add(&self, documents: Vec<IndexDocument>, force_commit: bool) -> IndexResult<()>;

    fn query(&self, query: &NativeQuery) -> IndexResult<QueryResponse>;

    /// Deletes every document matching `clause`. Returns the number removed.
    fn delete_by_query(&self, clause: &Clause) -> IndexResult<usize>;

    fn ping(&self) -> IndexResult<()>;

    /// Every field name currently present in the index.
    fn field_names(&self) -> IndexResult<Vec<String>>;
}

impl<T: IndexClient + ?Sized> IndexClient for Arc<T> {
    fn add(&self, documents: Vec<IndexDocument>, force_commit: bool) -> IndexResult<()> {
        (**self).add(documents, force_commit)
    }

    fn query(&self, query: &NativeQuery) -> IndexResult<QueryResponse> {
        (**self).query(query)
    }

    fn delete_by_query(&self, clause: &Clause) -> IndexResult<usize> {
        (**self).delete_by_query(clause)
    }

    fn ping(&self) -> IndexResult<()> {
        (**self).ping()
    }

    fn field_names(&self) -> IndexResult<Vec<String>> {
        (**self).field_names()
    }
}
