//! Filter tree -> native query translation
//!
//! Leaf predicates resolve their property to physical fields in query
//! context, so translation never extends the registry. The format used
//! for a property comes from the request's type hints, then from a cached
//! metacard type declaring it, then from the literal itself.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use super::ast::{CompareOp, Filter, QueryRequest, SortBy, SpatialOp, TemporalOp};
use super::errors::{QueryError, QueryResult};
use super::native::{
    Clause, DistanceAnchor, NativeQuery, RangeBound, ScoreMode, SortClause, SpatialRelation,
};
use crate::geo::{self, Coord};
use crate::mapper::FieldValue;
use crate::record::{names, AttributeFormat, AttributeValue};
use crate::schema::fields::{self, ID_FIELD, SCORE_FIELD};
use crate::schema::SchemaResolver;

/// Characters with meaning in the native query grammar.
const SPECIAL_CHARS: &str = "+-&|!(){}[]^\"~*?:\\/";

/// Per-request translation state.
struct Scope<'a> {
    hints: &'a BTreeMap<String, AttributeFormat>,
    now: DateTime<Utc>,
    anchor: Option<DistanceAnchor>,
    /// Whether `anchor` came from a distance predicate.
    anchor_from_distance: bool,
}

impl Scope<'_> {
    fn offer_anchor(&mut self, field: &str, point: Coord, from_distance: bool) {
        let replace = match self.anchor {
            None => true,
            Some(_) => from_distance && !self.anchor_from_distance,
        };
        if replace {
            self.anchor = Some(DistanceAnchor {
                field: field.to_string(),
                point,
            });
            self.anchor_from_distance = from_distance;
        }
    }
}

/// Compiles filter trees into native queries.
#[derive(Debug, Clone)]
pub struct QueryTranslator {
    resolver: Arc<SchemaResolver>,
    max_rows: usize,
}

impl QueryTranslator {
    /// `max_rows` is the backend maximum used for "return everything".
    pub fn new(resolver: Arc<SchemaResolver>, max_rows: usize) -> Self {
        Self { resolver, max_rows }
    }

    pub fn max_rows(&self) -> usize {
        self.max_rows
    }

    pub fn translate(&self, request: &QueryRequest) -> QueryResult<NativeQuery> {
        self.translate_at(request, Utc::now())
    }

    /// Translates with an explicit "now" for relative temporal predicates.
    pub fn translate_at(&self, request: &QueryRequest, now: DateTime<Utc>) -> QueryResult<NativeQuery> {
        let (start, rows) = self.page(request)?;

        let mut scope = Scope {
            hints: &request.type_hints,
            now,
            anchor: None,
            anchor_from_distance: false,
        };
        let clause = self.filter(&request.filter, &mut scope)?;

        let mut query = NativeQuery::new(clause, rows);
        query.start = start;
        query.distance_anchor = scope.anchor;
        self.apply_sort(request.sort_by.as_ref(), &mut query);

        debug!(query = %query, warnings = query.warnings.len(), "translated query");
        Ok(query)
    }

    /// Fields and formats a match on `attribute` looks at.
    pub fn match_fields(&self, attribute: &str) -> Vec<(String, AttributeFormat)> {
        if attribute == names::ID {
            vec![(ID_FIELD.to_string(), AttributeFormat::String)]
        } else {
            with_formats(self.resolver.anonymous_fields_for(attribute))
        }
    }

    /// Clause matching documents whose `attribute` equals any of `values`.
    ///
    /// Covers every field the attribute is known under. Values that do not
    /// fit a field's format are left out for that field. `None` when no
    /// field could match.
    pub fn match_clause(&self, attribute: &str, values: &[AttributeValue]) -> Option<Clause> {
        let clauses: Vec<Clause> = self
            .match_fields(attribute)
            .into_iter()
            .filter_map(|(field, format)| {
                let coerced: Vec<FieldValue> = values
                    .iter()
                    .filter_map(|value| match_term(value, format))
                    .collect();
                (!coerced.is_empty()).then_some(Clause::Terms { field, values: coerced })
            })
            .collect();

        if clauses.is_empty() {
            None
        } else {
            Some(Clause::Or(clauses).normalize())
        }
    }

    fn page(&self, request: &QueryRequest) -> QueryResult<(usize, usize)> {
        let invalid = || QueryError::InvalidPagination {
            start_index: request.start_index,
        };
        if request.start_index < 1 {
            return Err(invalid());
        }
        let start = usize::try_from(request.start_index - 1).map_err(|_| invalid())?;

        let rows = if request.page_size <= 0 {
            self.max_rows
        } else {
            usize::try_from(request.page_size).map_or(self.max_rows, |size| size.min(self.max_rows))
        };
        Ok((start, rows))
    }

    // ========================================================================
    // Sorting
    // ========================================================================

    fn apply_sort(&self, sort_by: Option<&SortBy>, query: &mut NativeQuery) {
        let sort_by = sort_by.cloned().unwrap_or_else(|| SortBy::desc(names::TEMPORAL));
        let property = sort_by.property.as_str();
        let order = sort_by.order;

        if property.eq_ignore_ascii_case(names::RELEVANCE) {
            query.sort.push(SortClause::new(SCORE_FIELD, order));
            query.include_score = true;
            query.score_mode = ScoreMode::Relevance;
        } else if property.eq_ignore_ascii_case(names::DISTANCE) {
            query.sort.push(SortClause::new(SCORE_FIELD, order));
            query.include_score = true;
            query.score_mode = ScoreMode::Distance;
            if query.distance_anchor.is_none() {
                warn!("distance sort without a spatial reference point");
                query
                    .warnings
                    .push("distance sort requested but the filter has no reference point".to_string());
            }
        } else if property.eq_ignore_ascii_case(names::TEMPORAL) {
            let field = self.resolver.field_for(names::EFFECTIVE, AttributeFormat::Date, true);
            query.sort.push(SortClause::new(field, order));
        } else {
            let fields = self.resolver.anonymous_fields_for(property);
            if fields.is_empty() {
                warn!(property, "sort property has no indexed fields, dropping it");
                query
                    .warnings
                    .push(format!("sort property '{}' is not indexed and was ignored", property));
                return;
            }
            query
                .sort
                .extend(fields.into_iter().map(|field| SortClause::new(field, order)));
            query.include_score = true;
        }
    }

    // ========================================================================
    // Filters
    // ========================================================================

    fn filter(&self, filter: &Filter, scope: &mut Scope<'_>) -> QueryResult<Clause> {
        match filter {
            Filter::Include => Ok(Clause::MatchAll),
            Filter::Exclude => Ok(Clause::MatchNone),
            Filter::And(children) => Ok(Clause::And(self.filters(children, scope)?)),
            Filter::Or(children) => Ok(Clause::Or(self.filters(children, scope)?)),
            Filter::Not(inner) => Ok(Clause::negate(self.filter(inner, scope)?)),
            Filter::Compare { property, op, value } => self.compare(property, *op, value, scope),
            Filter::Between { property, lower, upper } => self.between(property, lower, upper, scope),
            Filter::Like {
                property,
                pattern,
                case_sensitive,
            } => self.like(property, pattern, *case_sensitive, scope),
            Filter::IsNull { property } => self.is_null(property, scope),
            Filter::Temporal { property, op } => self.temporal(property, op, scope),
            Filter::Spatial { property, op, wkt } => self.spatial(property, *op, wkt, scope),
            Filter::Ids(ids) => Ok(Clause::Terms {
                field: ID_FIELD.to_string(),
                values: ids.iter().map(|id| FieldValue::Text(id.clone())).collect(),
            }),
        }
    }

    fn filters(&self, children: &[Filter], scope: &mut Scope<'_>) -> QueryResult<Vec<Clause>> {
        children.iter().map(|child| self.filter(child, scope)).collect()
    }

    /// Physical fields (with their stored formats) a property denotes.
    fn targets(
        &self,
        property: &str,
        natural: AttributeFormat,
        scope: &Scope<'_>,
    ) -> QueryResult<Vec<(String, AttributeFormat)>> {
        if property.trim().is_empty() {
            return Err(QueryError::unsupported("predicate with a blank property name"));
        }

        if property == names::ID {
            return Ok(vec![(ID_FIELD.to_string(), AttributeFormat::String)]);
        }
        if property == names::ANY_TEXT {
            return Ok(with_formats(self.resolver.fields_matching(|f| f.is_text())));
        }
        if property == names::ANY_GEO {
            return Ok(with_formats(
                self.resolver.fields_matching(|f| f == AttributeFormat::Geometry),
            ));
        }

        let format = scope
            .hints
            .get(property)
            .copied()
            .or_else(|| self.resolver.declared_format(property))
            .unwrap_or(natural);
        let field = self.resolver.field_for(property, format, true);
        let stored = fields::split_physical(&field).map_or(format, |(_, f)| f);
        Ok(vec![(field, stored)])
    }

    fn compare(
        &self,
        property: &str,
        op: CompareOp,
        value: &AttributeValue,
        scope: &mut Scope<'_>,
    ) -> QueryResult<Clause> {
        if op == CompareOp::Ne {
            return Ok(Clause::negate(self.compare(property, CompareOp::Eq, value, scope)?));
        }

        let mut clauses = Vec::new();
        for (field, format) in self.targets(property, value.natural_format(), scope)? {
            if matches!(format, AttributeFormat::Binary | AttributeFormat::Geometry)
                || (op != CompareOp::Eq && !format.is_sortable())
            {
                return Err(QueryError::unsupported(format!(
                    "'{}' comparison on {} property '{}'",
                    op.symbol(),
                    format,
                    property
                )));
            }
            let literal = literal(property, value, format)?;
            clauses.push(match op {
                CompareOp::Eq | CompareOp::Ne => Clause::term(field, literal),
                CompareOp::Lt => range(field, None, Some(RangeBound::exclusive(literal))),
                CompareOp::Le => range(field, None, Some(RangeBound::inclusive(literal))),
                CompareOp::Gt => range(field, Some(RangeBound::exclusive(literal)), None),
                CompareOp::Ge => range(field, Some(RangeBound::inclusive(literal)), None),
            });
        }
        Ok(Clause::Or(clauses))
    }

    fn between(
        &self,
        property: &str,
        lower: &AttributeValue,
        upper: &AttributeValue,
        scope: &mut Scope<'_>,
    ) -> QueryResult<Clause> {
        let mut clauses = Vec::new();
        for (field, format) in self.targets(property, lower.natural_format(), scope)? {
            if !format.is_sortable() {
                return Err(QueryError::unsupported(format!(
                    "BETWEEN on {} property '{}'",
                    format, property
                )));
            }
            clauses.push(range(
                field,
                Some(RangeBound::inclusive(literal(property, lower, format)?)),
                Some(RangeBound::inclusive(literal(property, upper, format)?)),
            ));
        }
        Ok(Clause::Or(clauses))
    }

    fn like(
        &self,
        property: &str,
        pattern: &str,
        case_sensitive: bool,
        scope: &mut Scope<'_>,
    ) -> QueryResult<Clause> {
        let native = native_pattern(pattern, case_sensitive);
        let mut clauses = Vec::new();
        for (field, format) in self.targets(property, AttributeFormat::String, scope)? {
            if !format.is_text() {
                return Err(QueryError::unsupported(format!(
                    "LIKE on {} property '{}'",
                    format, property
                )));
            }
            clauses.push(Clause::Wildcard {
                field,
                pattern: native.clone(),
                case_sensitive,
            });
        }
        Ok(Clause::Or(clauses))
    }

    fn is_null(&self, property: &str, scope: &mut Scope<'_>) -> QueryResult<Clause> {
        let fields = match scope.hints.get(property) {
            Some(_) => self
                .targets(property, AttributeFormat::String, scope)?
                .into_iter()
                .map(|(field, _)| field)
                .collect(),
            None if property == names::ID => vec![ID_FIELD.to_string()],
            None => {
                if property.trim().is_empty() {
                    return Err(QueryError::unsupported("predicate with a blank property name"));
                }
                self.resolver.anonymous_fields_for(property)
            }
        };
        let present = fields.into_iter().map(|field| Clause::Exists { field }).collect();
        Ok(Clause::negate(Clause::Or(present)))
    }

    fn temporal(&self, property: &str, op: &TemporalOp, scope: &mut Scope<'_>) -> QueryResult<Clause> {
        let date = |d: DateTime<Utc>| FieldValue::Date(d);
        let (lower, upper) = match op {
            TemporalOp::During { start, end } => (
                Some(RangeBound::exclusive(date(*start))),
                Some(RangeBound::exclusive(date(*end))),
            ),
            TemporalOp::Before(at) => (None, Some(RangeBound::exclusive(date(*at)))),
            TemporalOp::After(at) => (Some(RangeBound::exclusive(date(*at))), None),
            TemporalOp::Relative(window) => {
                if *window < chrono::Duration::zero() {
                    return Err(QueryError::unsupported("relative temporal window is negative"));
                }
                let from = scope
                    .now
                    .checked_sub_signed(*window)
                    .ok_or_else(|| QueryError::unsupported("relative temporal window out of range"))?;
                (
                    Some(RangeBound::inclusive(date(from))),
                    Some(RangeBound::inclusive(date(scope.now))),
                )
            }
        };

        let mut clauses = Vec::new();
        for (field, format) in self.targets(property, AttributeFormat::Date, scope)? {
            if format != AttributeFormat::Date {
                return Err(QueryError::unsupported(format!(
                    "temporal predicate on {} property '{}'",
                    format, property
                )));
            }
            clauses.push(range(field, lower.clone(), upper.clone()));
        }
        Ok(Clause::Or(clauses))
    }

    fn spatial(&self, property: &str, op: SpatialOp, wkt: &str, scope: &mut Scope<'_>) -> QueryResult<Clause> {
        let geometry = geo::parse_wkt(wkt)
            .map_err(|e| QueryError::unsupported(format!("{} reference geometry: {}", op.name(), e)))?;

        let mut clauses = Vec::new();
        for (field, format) in self.targets(property, AttributeFormat::Geometry, scope)? {
            if format != AttributeFormat::Geometry {
                return Err(QueryError::unsupported(format!(
                    "{} on {} property '{}'",
                    op.name(),
                    format,
                    property
                )));
            }

            let clause = match op {
                SpatialOp::DWithin { meters } | SpatialOp::Beyond { meters } => {
                    let center = geometry.as_point().ok_or_else(|| {
                        QueryError::unsupported(format!("{} requires a POINT reference", op.name()))
                    })?;
                    if !meters.is_finite() || meters < 0.0 {
                        return Err(QueryError::unsupported(format!(
                            "{} distance must be a non-negative number of meters",
                            op.name()
                        )));
                    }
                    scope.offer_anchor(&field, center, true);
                    let within = Clause::Distance { field, center, meters };
                    if matches!(op, SpatialOp::Beyond { .. }) {
                        Clause::negate(within)
                    } else {
                        within
                    }
                }
                relation => {
                    if let Some(point) = geometry.as_point() {
                        scope.offer_anchor(&field, point, false);
                    }
                    Clause::Spatial {
                        field,
                        relation: match relation {
                            SpatialOp::Within => SpatialRelation::IsWithin,
                            SpatialOp::Contains => SpatialRelation::Contains,
                            SpatialOp::Disjoint => SpatialRelation::IsDisjointTo,
                            _ => SpatialRelation::Intersects,
                        },
                        geometry: geometry.clone(),
                    }
                }
            };
            clauses.push(clause);
        }
        Ok(Clause::Or(clauses))
    }
}

fn with_formats(fields: Vec<String>) -> Vec<(String, AttributeFormat)> {
    fields
        .into_iter()
        .filter_map(|field| {
            let format = fields::split_physical(&field)?.1;
            Some((field, format))
        })
        .collect()
}

fn range(field: String, lower: Option<RangeBound>, upper: Option<RangeBound>) -> Clause {
    Clause::Range { field, lower, upper }
}

fn literal(property: &str, value: &AttributeValue, format: AttributeFormat) -> QueryResult<FieldValue> {
    value
        .coerce(format)
        .map(FieldValue::from)
        .map_err(|e| QueryError::unsupported(format!("literal for '{}': {}", property, e)))
}

/// Rewrites a LIKE pattern in native wildcard syntax.
///
/// `*` and `?` stay wildcards, a backslash makes the next character
/// literal, and every other grammar character is escaped.
pub(crate) fn native_pattern(pattern: &str, case_sensitive: bool) -> String {
    let source = if case_sensitive {
        pattern.to_string()
    } else {
        pattern.to_lowercase()
    };

    let mut out = String::with_capacity(source.len());
    let mut chars = source.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some(next) => push_literal(&mut out, next),
                None => push_literal(&mut out, '\\'),
            },
            '*' | '?' => out.push(c),
            other => push_literal(&mut out, other),
        }
    }
    out
}

fn push_literal(out: &mut String, c: char) {
    if SPECIAL_CHARS.contains(c) || c.is_whitespace() {
        out.push('\\');
    }
    out.push(c);
}

/// Term a match value becomes on a field of `format`.
fn match_term(value: &AttributeValue, format: AttributeFormat) -> Option<FieldValue> {
    value.coerce(format).ok().map(FieldValue::from)
}

/// Keys a value can be found under on `fields`, one per field it fits.
///
/// Two values share a key exactly when a match clause for one finds a
/// record holding the other.
pub fn match_keys(fields: &[(String, AttributeFormat)], value: &AttributeValue) -> BTreeSet<String> {
    fields
        .iter()
        .filter_map(|(field, format)| {
            match_term(value, *format).map(|term| format!("{}:{}", field, term.render()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::ast::SortOrder;
    use chrono::{Duration, TimeZone};

    fn translator() -> QueryTranslator {
        let resolver = Arc::new(SchemaResolver::new());
        resolver.register("rating", AttributeFormat::Double);
        resolver.register("rating", AttributeFormat::String);
        QueryTranslator::new(resolver, 1000)
    }

    fn text(filter: Filter) -> String {
        translator().translate(&QueryRequest::new(filter)).unwrap().text()
    }

    #[test]
    fn test_like_uses_declared_text_field() {
        assert_eq!(text(Filter::like("title", "Flag*")), "title_txt:Flag*");
    }

    #[test]
    fn test_like_escapes_grammar_characters() {
        assert_eq!(native_pattern("a b:c\\*d?", true), "a\\ b\\:c\\*d?");
        assert_eq!(native_pattern("FLAG*", false), "flag*");
        assert_eq!(text(Filter::ilike("title", "Flag*")), "lower(title_txt):flag*");
    }

    #[test]
    fn test_compare_ops_produce_ranges() {
        assert_eq!(text(Filter::compare("resource-size", CompareOp::Ge, 10i64)), "resource-size_lng:[10 TO *]");
        assert_eq!(text(Filter::compare("resource-size", CompareOp::Lt, 10i64)), "resource-size_lng:[* TO 10}");
        assert_eq!(text(Filter::compare("title", CompareOp::Ne, "x")), "NOT title_txt:\"x\"");
    }

    #[test]
    fn test_literal_coerced_to_declared_format() {
        assert_eq!(text(Filter::eq("resource-size", "42")), "resource-size_lng:42");
        let err = translator()
            .translate(&QueryRequest::new(Filter::eq("resource-size", "lots")))
            .unwrap_err();
        assert!(matches!(err, QueryError::Unsupported(_)));
    }

    #[test]
    fn test_match_keys_agree_with_match_clause() {
        let translator = translator();
        let fields = translator.match_fields("resource-size");
        assert_eq!(fields, vec![("resource-size_lng".to_string(), AttributeFormat::Long)]);
        assert_eq!(
            translator
                .match_clause("resource-size", &[AttributeValue::from("042")])
                .unwrap()
                .render(),
            "resource-size_lng:42"
        );
        assert_eq!(
            match_keys(&fields, &AttributeValue::from("042")),
            match_keys(&fields, &AttributeValue::Long(42))
        );
        assert!(match_keys(&fields, &AttributeValue::from("lots")).is_empty());

        let both = translator.match_fields("rating");
        assert_eq!(match_keys(&both, &AttributeValue::from("4")).len(), 2);
        assert_eq!(match_keys(&both, &AttributeValue::from("four")).len(), 1);
    }

    #[test]
    fn test_type_hint_overrides_literal_format() {
        let request = QueryRequest::new(Filter::eq("rating", "4.5")).with_type_hint("rating", AttributeFormat::Double);
        let query = translator().translate(&request).unwrap();
        assert_eq!(query.text(), "rating_dbl:4.5");
    }

    #[test]
    fn test_any_text_expands_over_text_fields() {
        let query = text(Filter::like("anyText", "flag*"));
        assert!(query.contains("title_txt:flag*"));
        assert!(query.contains("metadata_xml:flag*"));
        assert!(query.contains("rating_txt:flag*"));
        assert!(!query.contains("rating_dbl"));
    }

    #[test]
    fn test_ids_and_null_checks() {
        assert_eq!(text(Filter::ids(["a", "b"])), "id_txt:(\"a\" OR \"b\")");
        assert_eq!(text(Filter::ids(Vec::<String>::new())), "-*:*");
        assert_eq!(text(Filter::is_null("rating")), "NOT (rating_txt:* OR rating_dbl:*)");
        assert_eq!(text(Filter::is_null("never-seen")), "*:*");
    }

    #[test]
    fn test_relative_temporal_uses_translation_time() {
        let now = Utc.with_ymd_and_hms(2020, 1, 2, 0, 0, 0).unwrap();
        let request = QueryRequest::new(Filter::temporal("modified", TemporalOp::Relative(Duration::days(1))));
        let query = translator().translate_at(&request, now).unwrap();
        assert_eq!(
            query.text(),
            "modified_tdt:[\"2020-01-01T00:00:00.000Z\" TO \"2020-01-02T00:00:00.000Z\"]"
        );
    }

    #[test]
    fn test_temporal_on_non_date_property_is_unsupported() {
        let request = QueryRequest::new(Filter::temporal(
            "title",
            TemporalOp::Before(Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap()),
        ));
        assert!(matches!(translator().translate(&request), Err(QueryError::Unsupported(_))));
    }

    #[test]
    fn test_dwithin_requires_point_and_sets_anchor() {
        let translator = translator();
        let request = QueryRequest::new(Filter::spatial(
            "location",
            SpatialOp::DWithin { meters: 5000.0 },
            "POINT (10 20)",
        ))
        .with_sort(SortBy::asc("DISTANCE"));
        let query = translator.translate(&request).unwrap();
        assert_eq!(query.text(), "{!geofilt sfield=location_geo pt=20,10 d=5}");
        assert_eq!(query.score_mode, ScoreMode::Distance);
        assert_eq!(query.distance_anchor.as_ref().map(|a| a.point), Some(Coord::new(10.0, 20.0)));
        assert!(query.warnings.is_empty());

        let polygon = QueryRequest::new(Filter::spatial(
            "location",
            SpatialOp::Beyond { meters: 10.0 },
            "POLYGON ((0 0, 1 0, 1 1, 0 0))",
        ));
        assert!(matches!(translator.translate(&polygon), Err(QueryError::Unsupported(_))));
    }

    #[test]
    fn test_malformed_geometry_is_unsupported() {
        let request = QueryRequest::new(Filter::spatial("location", SpatialOp::Intersects, "POINT (1)"));
        let err = translator().translate(&request).unwrap_err();
        assert_eq!(err.code(), "QUERY_UNSUPPORTED");
    }

    #[test]
    fn test_pagination_bounds() {
        let translator = translator();
        for start in [0, -3] {
            let request = QueryRequest::new(Filter::Include).with_start_index(start);
            assert_eq!(
                translator.translate(&request),
                Err(QueryError::InvalidPagination { start_index: start })
            );
        }
        for size in [0, -1] {
            let query = translator
                .translate(&QueryRequest::new(Filter::Include).with_page_size(size))
                .unwrap();
            assert_eq!(query.rows, 1000);
        }
        let query = translator
            .translate(&QueryRequest::new(Filter::Include).with_start_index(21).with_page_size(5000))
            .unwrap();
        assert_eq!((query.start, query.rows), (20, 1000));
    }

    #[test]
    fn test_default_sort_is_effective_descending() {
        let query = translator().translate(&QueryRequest::new(Filter::Include)).unwrap();
        assert_eq!(query.sort, vec![SortClause::new("effective_tdt", SortOrder::Descending)]);
        assert!(!query.include_score);
    }

    #[test]
    fn test_relevance_sort_requests_score() {
        let request = QueryRequest::new(Filter::Include).with_sort(SortBy::desc("RELEVANCE"));
        let query = translator().translate(&request).unwrap();
        assert_eq!(query.sort_text(), "score desc");
        assert!(query.include_score);
        assert_eq!(query.score_mode, ScoreMode::Relevance);
    }

    #[test]
    fn test_ordinary_sort_uses_every_known_field() {
        let request = QueryRequest::new(Filter::Include).with_sort(SortBy::asc("rating"));
        let query = translator().translate(&request).unwrap();
        assert_eq!(query.sort_text(), "rating_txt asc, rating_dbl asc");
        assert!(query.include_score);
    }

    #[test]
    fn test_unknown_sort_property_is_dropped_with_warning() {
        let request = QueryRequest::new(Filter::Include).with_sort(SortBy::asc("unheard-of"));
        let query = translator().translate(&request).unwrap();
        assert!(query.sort.is_empty());
        assert_eq!(query.warnings.len(), 1);
    }

    #[test]
    fn test_distance_sort_without_anchor_warns() {
        let request = QueryRequest::new(Filter::Include).with_sort(SortBy::asc("DISTANCE"));
        let query = translator().translate(&request).unwrap();
        assert_eq!(query.sort_text(), "score asc");
        assert!(query.distance_anchor.is_none());
        assert_eq!(query.warnings.len(), 1);
    }

    #[test]
    fn test_translation_is_deterministic() {
        let translator = translator();
        let request = QueryRequest::new(Filter::and([
            Filter::like("anyText", "a*"),
            Filter::or([Filter::eq("title", "x"), Filter::not(Filter::ids(["1"]))]),
        ]))
        .with_sort(SortBy::asc("title"));
        let first = translator.translate(&request).unwrap();
        let second = translator.translate(&request).unwrap();
        assert_eq!(first.to_string(), second.to_string());
    }

    #[test]
    fn test_translation_does_not_register_fields() {
        let translator = translator();
        translator
            .translate(&QueryRequest::new(Filter::eq("brand-new", "x")))
            .unwrap();
        assert!(translator.resolver.anonymous_fields_for("brand-new").is_empty());
    }

    #[test]
    fn test_match_clause_covers_every_format() {
        let translator = translator();
        let clause = translator
            .match_clause("rating", &[AttributeValue::from("4.5"), AttributeValue::from("good")])
            .unwrap();
        assert_eq!(
            clause.render(),
            "(rating_txt:(\"4.5\" OR \"good\") OR rating_dbl:4.5)"
        );
        assert_eq!(translator.match_clause("unknown", &[AttributeValue::from("x")]), None);
    }
}
