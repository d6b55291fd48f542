//! Catalog operation results

use crate::record::Metacard;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CreateResponse {
    /// Accepted records with generated IDs filled in.
    pub created: Vec<Metacard>,
}

/// One applied replacement.
#[derive(Debug, Clone, PartialEq)]
pub struct Update {
    pub old: Metacard,
    pub new: Metacard,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateResponse {
    pub updates: Vec<Update>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeleteResponse {
    /// Records as they were before deletion.
    pub deleted: Vec<Metacard>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub metacard: Metacard,
    /// Native score for relevance and attribute sorts.
    pub relevance_score: Option<f64>,
    /// Geodesic distance from the query's reference point for distance sorts.
    pub distance_in_meters: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceResponse {
    pub results: Vec<SearchResult>,
    /// Total matches, independent of paging.
    pub hits: usize,
    /// Non-fatal translation warnings.
    pub processing_details: Vec<String>,
}
