//! Catalog CRUD Tests
//!
//! End-to-end behavior of the provider over the in-memory index:
//! - Create assigns identity and attribution
//! - Update preserves identity and creation time
//! - Update pairs values the way the lookup query matched them
//! - Ambiguous and duplicate matches fail the whole request
//! - Delete returns what it removed
//! - Search results carry relevance or distance
//! - A reopened index re-seeds the schema registry

use metacat::catalog::{CatalogProvider, DeleteRequest, UpdateRequest};
use metacat::config::CatalogConfig;
use chrono::{TimeZone, Utc};
use metacat::index::{IndexClient, MemoryIndex};
use metacat::mapper::FieldValue;
use metacat::query::{Filter, QueryRequest, SortBy, SpatialOp};
use metacat::record::{AttributeValue, Metacard};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn provider() -> CatalogProvider<MemoryIndex> {
    CatalogProvider::new(MemoryIndex::new(), CatalogConfig::default().with_source_id("local"))
}

fn titled(title: &str) -> Metacard {
    Metacard::basic().with("title", title)
}

fn create_titles(provider: &CatalogProvider<MemoryIndex>, titles: &[&str]) {
    let cards = titles.iter().map(|t| titled(t)).collect();
    provider.create(cards).unwrap();
}

fn all(provider: &CatalogProvider<MemoryIndex>) -> usize {
    provider
        .query(&QueryRequest::new(Filter::Include).with_page_size(0))
        .unwrap()
        .hits
}

// =============================================================================
// Lifecycle Tests
// =============================================================================

/// Create, find, update by title, then delete by the new title.
#[test]
fn test_flagstaff_lifecycle() {
    let provider = provider();

    let created = provider.create(vec![titled("Flagstaff")]).unwrap().created;
    let original = &created[0];
    let id = original.id().unwrap().to_string();
    assert_eq!(original.source_id(), Some("local"));
    assert_eq!(
        provider.client().get(&id).unwrap().first("title_txt"),
        Some(&FieldValue::Text("Flagstaff".into()))
    );

    let found = provider
        .query(&QueryRequest::new(Filter::like("title", "Flag*")))
        .unwrap();
    assert_eq!(found.hits, 1);
    assert_eq!(found.results[0].metacard.id(), Some(id.as_str()));

    let updated = provider
        .update(UpdateRequest::new("title").with_update("Flagstaff", titled("Flagstaff Chamber")))
        .unwrap()
        .updates;
    assert_eq!(updated.len(), 1);
    assert_eq!(updated[0].new.id(), Some(id.as_str()));
    assert_eq!(updated[0].new.created(), original.created());
    assert_eq!(updated[0].old.title(), Some("Flagstaff"));
    assert_eq!(all(&provider), 1);
    assert_eq!(
        provider.client().get(&id).unwrap().first("title_txt"),
        Some(&FieldValue::Text("Flagstaff Chamber".into()))
    );

    let deleted = provider
        .delete(DeleteRequest::new("title", ["Flagstaff Chamber"]))
        .unwrap()
        .deleted;
    assert_eq!(deleted.len(), 1);
    assert_eq!(deleted[0].id(), Some(id.as_str()));
    assert_eq!(all(&provider), 0);
}

/// Update by ID replaces the stored record in place.
#[test]
fn test_update_by_id() {
    let provider = provider();
    let id = provider.create(vec![titled("Draft")]).unwrap().created[0]
        .id()
        .unwrap()
        .to_string();

    let response = provider
        .update(UpdateRequest::by_id([(id.clone(), titled("Final"))]))
        .unwrap();
    assert_eq!(response.updates.len(), 1);

    let found = provider.query(&QueryRequest::new(Filter::ids([id]))).unwrap();
    assert_eq!(found.results[0].metacard.title(), Some("Final"));
}

// =============================================================================
// Update Pairing Tests
// =============================================================================

/// Only the values that found a record are applied and written.
#[test]
fn test_update_skips_unmatched_values() {
    let provider = provider();
    create_titles(&provider, &["kept", "changed"]);

    let response = provider
        .update(
            UpdateRequest::new("title")
                .with_update("changed", titled("renamed"))
                .with_update("absent", titled("never")),
        )
        .unwrap();
    assert_eq!(response.updates.len(), 1);
    assert_eq!(response.updates[0].new.title(), Some("renamed"));

    let never = provider.query(&QueryRequest::new(Filter::eq("title", "never"))).unwrap();
    assert_eq!(never.hits, 0);
    assert_eq!(all(&provider), 2);
}

/// No stored match means an empty response and an untouched index.
#[test]
fn test_update_without_matches_is_empty() {
    let provider = provider();
    create_titles(&provider, &["kept"]);

    let response = provider
        .update(UpdateRequest::new("title").with_update("absent", titled("never")))
        .unwrap();
    assert!(response.updates.is_empty());
    let kept = provider.query(&QueryRequest::new(Filter::eq("title", "kept"))).unwrap();
    assert_eq!(kept.hits, 1);
}

/// A date given as text pairs with the stored date it matched.
#[test]
fn test_update_by_date_value() {
    let provider = provider();
    let at = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
    provider.create(vec![titled("A").with("created", at)]).unwrap();

    let response = provider
        .update(UpdateRequest::new("created").with_update("2020-01-01T00:00:00Z", titled("B")))
        .unwrap();
    assert_eq!(response.updates.len(), 1);
    assert_eq!(response.updates[0].new.created(), Some(at));

    let b = provider.query(&QueryRequest::new(Filter::eq("title", "B"))).unwrap();
    assert_eq!(b.hits, 1);
}

/// A numeric value written as padded text pairs with the stored number.
#[test]
fn test_update_by_padded_number() {
    let provider = provider();
    provider
        .create(vec![titled("A").with("resource-size", 42i64)])
        .unwrap();

    let response = provider
        .update(UpdateRequest::new("resource-size").with_update("042", titled("B")))
        .unwrap();
    assert_eq!(response.updates.len(), 1);
    assert_eq!(response.updates[0].old.title(), Some("A"));
}

// =============================================================================
// Request Error Tests
// =============================================================================

/// More stored matches than requested updates is ambiguous.
#[test]
fn test_update_with_more_matches_than_requests_fails() {
    let provider = provider();
    create_titles(&provider, &["Same", "Same", "Same", "Same"]);

    let request = UpdateRequest::new("title")
        .with_update("Same", titled("A"))
        .with_update("Other", titled("B"))
        .with_update("Third", titled("C"));
    let err = provider.update(request).unwrap_err();
    assert_eq!(err.code(), "CATALOG_AMBIGUOUS_MATCH");
    assert!(err.is_request_error());
}

/// Two stored records answering one match value is a duplicate.
#[test]
fn test_update_with_duplicate_match_fails() {
    let provider = provider();
    create_titles(&provider, &["Twin", "Twin"]);

    let request = UpdateRequest::new("title")
        .with_update("Twin", titled("A"))
        .with_update("Other", titled("B"));
    let err = provider.update(request).unwrap_err();
    assert_eq!(err.code(), "CATALOG_DUPLICATE_MATCH");
}

/// One multi-valued record answering two values is a duplicate.
#[test]
fn test_update_with_one_record_for_two_values_fails() {
    let provider = provider();
    let mut tagged = titled("tagged");
    tagged.set_values(
        "tags",
        vec![AttributeValue::String("x".into()), AttributeValue::String("y".into())],
    );
    provider.create(vec![tagged]).unwrap();

    let request = UpdateRequest::new("tags")
        .with_update("x", titled("FromX"))
        .with_update("y", titled("FromY"));
    let err = provider.update(request).unwrap_err();
    assert_eq!(err.code(), "CATALOG_DUPLICATE_MATCH");
    let stored = provider.query(&QueryRequest::new(Filter::eq("title", "tagged"))).unwrap();
    assert_eq!(stored.hits, 1);
}

/// The same match value given twice is a duplicate.
#[test]
fn test_update_with_repeated_value_fails() {
    let provider = provider();
    create_titles(&provider, &["once"]);

    let request = UpdateRequest::new("title")
        .with_update("once", titled("first"))
        .with_update("once", titled("second"));
    let err = provider.update(request).unwrap_err();
    assert_eq!(err.code(), "CATALOG_DUPLICATE_MATCH");
    assert!(err.is_request_error());
}

/// A record carrying another provider's identity is refused.
#[test]
fn test_create_rejects_foreign_identity() {
    let provider = provider();
    let mut foreign = titled("Elsewhere").with_source_id("remote");
    foreign.set_id("abc123");

    let err = provider.create(vec![foreign]).unwrap_err();
    assert_eq!(err.code(), "CATALOG_FOREIGN_IDENTITY");
    assert_eq!(all(&provider), 0);
}

/// Update and delete need a match attribute.
#[test]
fn test_missing_match_attribute() {
    let provider = provider();
    let err = provider.delete(DeleteRequest::default()).unwrap_err();
    assert_eq!(err.code(), "CATALOG_MISSING_ATTRIBUTE");
}

// =============================================================================
// Delete Tests
// =============================================================================

/// Delete returns every removed record and leaves the rest.
#[test]
fn test_delete_returns_removed_records() {
    let provider = provider();
    create_titles(&provider, &["a", "b", "c"]);

    let deleted = provider
        .delete(DeleteRequest::new("title", ["a", "b", "missing"]))
        .unwrap()
        .deleted;
    let mut titles: Vec<_> = deleted.iter().filter_map(|c| c.title()).collect();
    titles.sort_unstable();
    assert_eq!(titles, vec!["a", "b"]);
    assert!(deleted.iter().all(|c| c.source_id() == Some("local")));
    assert_eq!(all(&provider), 1);
}

// =============================================================================
// Search Tests
// =============================================================================

/// Distance sorting reports meters from the filter's point, nearest first.
#[test]
fn test_distance_sort_reports_meters() {
    let provider = provider();
    provider
        .create(vec![
            titled("far").with("location", "POINT(0 1)"),
            titled("near").with("location", "POINT(0 0.5)"),
        ])
        .unwrap();

    let filter = Filter::spatial("location", SpatialOp::DWithin { meters: 500_000.0 }, "POINT(0 0)");
    let response = provider
        .query(&QueryRequest::new(filter).with_sort(SortBy::asc("DISTANCE")))
        .unwrap();

    assert_eq!(response.hits, 2);
    assert_eq!(response.results[0].metacard.title(), Some("near"));
    let near = response.results[0].distance_in_meters.unwrap();
    let far = response.results[1].distance_in_meters.unwrap();
    assert!((near - 55_597.5).abs() < 1.0, "near was {}", near);
    assert!((far - 111_195.1).abs() < 1.0, "far was {}", far);
    assert!(response.results[0].relevance_score.is_none());
}

/// Distance to a line is measured to its nearest point, not its vertices.
#[test]
fn test_distance_to_line_between_vertices() {
    let provider = provider();
    provider
        .create(vec![titled("road").with("location", "LINESTRING (-10 0, 10 0)")])
        .unwrap();

    let near = Filter::spatial("location", SpatialOp::DWithin { meters: 10_000.0 }, "POINT (0 0)");
    assert_eq!(provider.query(&QueryRequest::new(near)).unwrap().hits, 1);

    let beside = Filter::spatial("location", SpatialOp::DWithin { meters: 10_000.0 }, "POINT (0 0.05)");
    assert_eq!(provider.query(&QueryRequest::new(beside)).unwrap().hits, 1);

    let off = Filter::spatial("location", SpatialOp::DWithin { meters: 10_000.0 }, "POINT (0 1)");
    assert_eq!(provider.query(&QueryRequest::new(off)).unwrap().hits, 0);
}

/// Relevance sorting exposes the native score.
#[test]
fn test_relevance_sort_reports_score() {
    let provider = provider();
    create_titles(&provider, &["Flagstaff"]);

    let response = provider
        .query(&QueryRequest::new(Filter::like("title", "Flag*")).with_sort(SortBy::desc("RELEVANCE")))
        .unwrap();
    assert!(response.results[0].relevance_score.is_some());
    assert!(response.results[0].distance_in_meters.is_none());
}

/// Paging slices the sorted result set but hits counts everything.
#[test]
fn test_paging_keeps_total_hits() {
    let provider = provider();
    create_titles(&provider, &["a", "b", "c", "d", "e"]);

    let response = provider
        .query(
            &QueryRequest::new(Filter::Include)
                .with_sort(SortBy::asc("title"))
                .with_start_index(2)
                .with_page_size(2),
        )
        .unwrap();
    assert_eq!(response.hits, 5);
    let titles: Vec<_> = response.results.iter().filter_map(|r| r.metacard.title()).collect();
    assert_eq!(titles, vec!["b", "c"]);
}

// =============================================================================
// Persistence Tests
// =============================================================================

/// A provider over a reopened snapshot knows attributes written earlier.
#[test]
fn test_reopened_index_bootstraps_schema() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("index.json");

    let first = provider();
    first
        .create(vec![titled("Tagged").with("code", 7i64)])
        .unwrap();
    first.client().save_snapshot(&path).unwrap();

    let reopened = CatalogProvider::new(MemoryIndex::open(&path).unwrap(), CatalogConfig::default());
    assert_eq!(reopened.resolver().anonymous_fields_for("code"), vec!["code_lng"]);

    let deleted = reopened
        .delete(DeleteRequest::new("code", [AttributeValue::String("7".to_string())]))
        .unwrap()
        .deleted;
    assert_eq!(deleted.len(), 1);
    assert_eq!(deleted[0].value("code"), Some(&AttributeValue::Long(7)));
    assert!(reopened.client().field_names().unwrap().is_empty());
}

/// An unavailable backend fails writes and reports itself down.
#[test]
fn test_unavailable_backend() {
    let provider = provider();
    provider.client().set_available(false);

    assert!(!provider.is_available());
    let err = provider.create(vec![titled("x")]).unwrap_err();
    assert_eq!(err.code(), "CATALOG_INGEST_FAILED");
}
