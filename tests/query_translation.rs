//! Query Translation Tests
//!
//! Filter trees compile to native query text:
//! - Properties resolve through the registry without extending it
//! - LIKE patterns keep wildcards and escape grammar characters
//! - Paging and sorting follow the request
//! - Unsupported predicates fail instead of matching nothing

use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use metacat::query::{
    CompareOp, Filter, QueryRequest, QueryTranslator, ScoreMode, SortBy, SpatialOp, TemporalOp,
};
use metacat::record::AttributeFormat;
use metacat::schema::SchemaResolver;

// =============================================================================
// Helper Functions
// =============================================================================

fn translator() -> QueryTranslator {
    let resolver = Arc::new(SchemaResolver::new());
    resolver.register("rating", AttributeFormat::Double);
    QueryTranslator::new(resolver, 1000)
}

fn text_of(filter: Filter) -> String {
    translator()
        .translate(&QueryRequest::new(filter))
        .unwrap()
        .text()
}

// =============================================================================
// Predicate Tests
// =============================================================================

/// Case-sensitive LIKE targets the raw field.
#[test]
fn test_like_renders_wildcard() {
    assert_eq!(text_of(Filter::like("title", "Flag*")), "title_txt:Flag*");
}

/// Case-insensitive LIKE lowercases the pattern and the field.
#[test]
fn test_ilike_renders_lowered_field() {
    assert_eq!(text_of(Filter::ilike("title", "FLAG*")), "lower(title_txt):flag*");
}

/// Grammar characters in LIKE patterns are escaped; escaped wildcards are literal.
#[test]
fn test_like_escapes_grammar_characters() {
    assert_eq!(text_of(Filter::like("title", "a:b c\\*")), "title_txt:a\\:b\\ c\\*");
}

/// Equality uses a quoted term; inequality negates it.
#[test]
fn test_equality_and_inequality() {
    assert_eq!(text_of(Filter::eq("title", "Flagstaff")), "title_txt:\"Flagstaff\"");
    assert_eq!(
        text_of(Filter::compare("title", CompareOp::Ne, "Flagstaff")),
        "NOT title_txt:\"Flagstaff\""
    );
}

/// Numeric literals find the field the attribute is registered under.
#[test]
fn test_numeric_range_uses_registered_field() {
    assert_eq!(text_of(Filter::between("rating", 1i64, 5i64)), "rating_dbl:[1.0 TO 5.0]");
    assert_eq!(
        text_of(Filter::compare("rating", CompareOp::Gt, 3.5)),
        "rating_dbl:{3.5 TO *]"
    );
}

/// Boolean structure is kept and flattened.
#[test]
fn test_logical_structure() {
    let filter = Filter::and([
        Filter::like("title", "Flag*"),
        Filter::and([Filter::compare("rating", CompareOp::Ge, 4.0), Filter::Include]),
    ]);
    assert_eq!(text_of(filter), "title_txt:Flag* AND rating_dbl:[4.0 TO *]");
}

/// Include and exclude are the match-all and match-none constants.
#[test]
fn test_constant_filters() {
    assert_eq!(text_of(Filter::Include), "*:*");
    assert_eq!(text_of(Filter::Exclude), "-*:*");
    assert_eq!(text_of(Filter::not(Filter::Include)), "-*:*");
}

/// ID lookups hit the unique-key field.
#[test]
fn test_ids_filter() {
    assert_eq!(text_of(Filter::ids(["a", "b"])), "id_txt:(\"a\" OR \"b\")");
}

/// A relative window is inclusive on both ends.
#[test]
fn test_relative_temporal_window() {
    let now = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
    let request = QueryRequest::new(Filter::temporal("modified", TemporalOp::Relative(Duration::hours(24))));
    let query = translator().translate_at(&request, now).unwrap();
    assert_eq!(
        query.text(),
        "modified_tdt:[\"2024-01-01T00:00:00.000Z\" TO \"2024-01-02T00:00:00.000Z\"]"
    );
}

/// Spatial predicates embed the parsed geometry.
#[test]
fn test_spatial_intersects() {
    assert_eq!(
        text_of(Filter::spatial("location", SpatialOp::Intersects, "POINT(1 2)")),
        "location_geo:\"Intersects(POINT (1 2))\""
    );
}

// =============================================================================
// Unsupported Predicate Tests
// =============================================================================

/// LIKE against a numeric property is refused.
#[test]
fn test_like_on_numeric_property_is_unsupported() {
    let request = QueryRequest::new(Filter::like("rating", "4*")).with_type_hint("rating", AttributeFormat::Double);
    let err = translator().translate(&request).unwrap_err();
    assert_eq!(err.code(), "QUERY_UNSUPPORTED");
}

/// Distance predicates need a point.
#[test]
fn test_distance_from_polygon_is_unsupported() {
    let filter = Filter::spatial(
        "location",
        SpatialOp::DWithin { meters: 100.0 },
        "POLYGON((0 0, 1 0, 1 1, 0 1, 0 0))",
    );
    let err = translator().translate(&QueryRequest::new(filter)).unwrap_err();
    assert_eq!(err.code(), "QUERY_UNSUPPORTED");
}

// =============================================================================
// Paging and Sorting Tests
// =============================================================================

/// Start index is 1-based and must be positive.
#[test]
fn test_paging() {
    let query = translator()
        .translate(&QueryRequest::new(Filter::Include).with_start_index(11).with_page_size(5))
        .unwrap();
    assert_eq!((query.start, query.rows), (10, 5));

    let everything = translator()
        .translate(&QueryRequest::new(Filter::Include).with_page_size(0))
        .unwrap();
    assert_eq!(everything.rows, 1000);

    let err = translator()
        .translate(&QueryRequest::new(Filter::Include).with_start_index(0))
        .unwrap_err();
    assert_eq!(err.code(), "QUERY_INVALID_PAGINATION");
}

/// Without a sort, newest effective date comes first.
#[test]
fn test_default_sort_is_temporal() {
    let query = translator().translate(&QueryRequest::new(Filter::Include)).unwrap();
    assert_eq!(query.sort_text(), "effective_tdt desc");
    assert!(!query.include_score);
}

/// Distance sorting reads the score as a distance from the filter's point.
#[test]
fn test_distance_sort_uses_filter_point() {
    let filter = Filter::spatial("location", SpatialOp::DWithin { meters: 5000.0 }, "POINT(-111.65 35.19)");
    let request = QueryRequest::new(filter).with_sort(SortBy::asc("DISTANCE"));
    let query = translator().translate(&request).unwrap();

    assert_eq!(query.score_mode, ScoreMode::Distance);
    assert!(query.include_score);
    assert_eq!(query.sort_text(), "score asc");
    let anchor = query.distance_anchor.unwrap();
    assert_eq!(anchor.field, "location_geo");
    assert!(query.warnings.is_empty());
}

/// Sorting on an unknown property is dropped with a warning.
#[test]
fn test_unknown_sort_property_warns() {
    let request = QueryRequest::new(Filter::Include).with_sort(SortBy::asc("nonexistent"));
    let query = translator().translate(&request).unwrap();
    assert!(query.sort.is_empty());
    assert_eq!(query.warnings.len(), 1);
}
