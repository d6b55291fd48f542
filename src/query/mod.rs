//! Query translation subsystem
//!
//! Compiles abstract filter trees, sorts and pagination into native
//! index queries over physical fields.
//!
//! # Invariants
//!
//! - Translation never registers fields
//! - The same request and registry state always yield the same query text
//! - Start indexes are 1-based; a page size of zero or less means "all"

mod ast;
mod errors;
mod native;
mod translator;

pub use ast::{
    CompareOp, Filter, QueryRequest, SortBy, SortOrder, SpatialOp, TemporalOp, DEFAULT_PAGE_SIZE,
};
pub use errors::{QueryError, QueryResult};
pub use native::{
    strip_outer_parens, Clause, DistanceAnchor, NativeQuery, RangeBound, ScoreMode, SortClause,
    SpatialRelation,
};
pub use translator::{match_keys, QueryTranslator};
