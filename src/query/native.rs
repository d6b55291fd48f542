//! Native query representation
//!
//! A clause tree over physical fields, plus sort, paging and scoring
//! options. `text()` renders the canonical Lucene-like query string used
//! for logging, diagnostics and determinism checks.

use std::fmt;

use crate::geo::{Coord, Geometry};
use crate::mapper::FieldValue;
use crate::schema::fields::SCORE_FIELD;

use super::ast::SortOrder;

#[derive(Debug, Clone, PartialEq)]
pub struct RangeBound {
    pub value: FieldValue,
    pub inclusive: bool,
}

impl RangeBound {
    pub fn inclusive(value: FieldValue) -> Self {
        Self { value, inclusive: true }
    }

    pub fn exclusive(value: FieldValue) -> Self {
        Self { value, inclusive: false }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpatialRelation {
    Intersects,
    IsWithin,
    Contains,
    IsDisjointTo,
}

impl SpatialRelation {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpatialRelation::Intersects => "Intersects",
            SpatialRelation::IsWithin => "IsWithin",
            SpatialRelation::Contains => "Contains",
            SpatialRelation::IsDisjointTo => "IsDisjointTo",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    MatchAll,
    MatchNone,
    Term {
        field: String,
        value: FieldValue,
    },
    /// Any of the values.
    Terms {
        field: String,
        values: Vec<FieldValue>,
    },
    Range {
        field: String,
        lower: Option<RangeBound>,
        upper: Option<RangeBound>,
    },
    /// `pattern` uses `*`, `?` and backslash escapes. Case-insensitive
    /// patterns are already lower-cased.
    Wildcard {
        field: String,
        pattern: String,
        case_sensitive: bool,
    },
    Exists {
        field: String,
    },
    Spatial {
        field: String,
        relation: SpatialRelation,
        geometry: Geometry,
    },
    /// Within `meters` of `center`.
    Distance {
        field: String,
        center: Coord,
        meters: f64,
    },
    And(Vec<Clause>),
    Or(Vec<Clause>),
    Not(Box<Clause>),
}

impl Clause {
    pub fn term(field: impl Into<String>, value: FieldValue) -> Self {
        Clause::Term {
            field: field.into(),
            value,
        }
    }

    pub fn negate(clause: Clause) -> Self {
        Clause::Not(Box::new(clause))
    }

    /// Flattens nested groups of the same kind, folds constant children
    /// and collapses single-child groups. Idempotent.
    pub fn normalize(self) -> Clause {
        match self {
            Clause::And(children) => {
                let mut out = Vec::with_capacity(children.len());
                for child in children.into_iter().map(Clause::normalize) {
                    match child {
                        Clause::MatchAll => {}
                        Clause::MatchNone => return Clause::MatchNone,
                        Clause::And(inner) => out.extend(inner),
                        other => out.push(other),
                    }
                }
                collapse(out, Clause::MatchAll, Clause::And)
            }
            Clause::Or(children) => {
                let mut out = Vec::with_capacity(children.len());
                for child in children.into_iter().map(Clause::normalize) {
                    match child {
                        Clause::MatchNone => {}
                        Clause::MatchAll => return Clause::MatchAll,
                        Clause::Or(inner) => out.extend(inner),
                        other => out.push(other),
                    }
                }
                collapse(out, Clause::MatchNone, Clause::Or)
            }
            Clause::Not(inner) => match inner.normalize() {
                Clause::MatchAll => Clause::MatchNone,
                Clause::MatchNone => Clause::MatchAll,
                Clause::Not(double) => *double,
                other => Clause::negate(other),
            },
            Clause::Terms { field, mut values } => match values.len() {
                0 => Clause::MatchNone,
                1 => Clause::Term {
                    field,
                    value: values.swap_remove(0),
                },
                _ => Clause::Terms { field, values },
            },
            other => other,
        }
    }

    /// Query-syntax rendering, groups parenthesized.
    pub fn render(&self) -> String {
        match self {
            Clause::MatchAll => "*:*".to_string(),
            Clause::MatchNone => "-*:*".to_string(),
            Clause::Term { field, value } => format!("{}:{}", field, value.render()),
            Clause::Terms { values, .. } if values.is_empty() => Clause::MatchNone.render(),
            Clause::Terms { field, values } => {
                let rendered: Vec<String> = values.iter().map(FieldValue::render).collect();
                format!("{}:({})", field, rendered.join(" OR "))
            }
            Clause::Range { field, lower, upper } => {
                let (open, low) = match lower {
                    Some(b) => (if b.inclusive { '[' } else { '{' }, b.value.render()),
                    None => ('[', "*".to_string()),
                };
                let (close, high) = match upper {
                    Some(b) => (if b.inclusive { ']' } else { '}' }, b.value.render()),
                    None => (']', "*".to_string()),
                };
                format!("{}:{}{} TO {}{}", field, open, low, high, close)
            }
            Clause::Wildcard {
                field,
                pattern,
                case_sensitive: true,
            } => format!("{}:{}", field, pattern),
            Clause::Wildcard { field, pattern, .. } => format!("lower({}):{}", field, pattern),
            Clause::Exists { field } => format!("{}:*", field),
            Clause::Spatial {
                field,
                relation,
                geometry,
            } => format!("{}:\"{}({})\"", field, relation.as_str(), geometry),
            Clause::Distance { field, center, meters } => format!(
                "{{!geofilt sfield={} pt={},{} d={}}}",
                field,
                center.lat,
                center.lon,
                meters / 1000.0
            ),
            Clause::And(children) => group(children, " AND "),
            Clause::Or(children) => group(children, " OR "),
            Clause::Not(inner) => format!("NOT {}", inner.render()),
        }
    }

    /// Every leaf clause that does not sit under a `Not`.
    pub fn positive_leaves(&self) -> Vec<&Clause> {
        let mut out = Vec::new();
        collect_positive(self, &mut out);
        out
    }
}

fn collect_positive<'a>(clause: &'a Clause, out: &mut Vec<&'a Clause>) {
    match clause {
        Clause::And(children) | Clause::Or(children) => {
            for child in children {
                collect_positive(child, out);
            }
        }
        Clause::Not(_) | Clause::MatchAll | Clause::MatchNone => {}
        leaf => out.push(leaf),
    }
}

fn collapse(mut children: Vec<Clause>, empty: Clause, wrap: fn(Vec<Clause>) -> Clause) -> Clause {
    match children.len() {
        0 => empty,
        1 => children.swap_remove(0),
        _ => wrap(children),
    }
}

fn group(children: &[Clause], separator: &str) -> String {
    let parts: Vec<String> = children.iter().map(Clause::render).collect();
    format!("({})", parts.join(separator))
}

/// Removes grouping parentheses that wrap the whole query.
pub fn strip_outer_parens(text: &str) -> &str {
    let mut text = text.trim();
    while text.starts_with('(') && closing_paren(text) == Some(text.len() - 1) {
        text = text[1..text.len() - 1].trim();
    }
    text
}

/// Byte offset of the parenthesis closing the one at offset 0.
fn closing_paren(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut quoted = false;
    let mut escaped = false;
    for (i, c) in text.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '"' => quoted = !quoted,
            '(' if !quoted => depth += 1,
            ')' if !quoted => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortClause {
    pub field: String,
    pub order: SortOrder,
}

impl SortClause {
    pub fn new(field: impl Into<String>, order: SortOrder) -> Self {
        Self {
            field: field.into(),
            order,
        }
    }
}

/// How the backend score is to be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScoreMode {
    /// Text relevance, higher is better.
    #[default]
    Relevance,
    /// Angular distance in degrees from the distance anchor.
    Distance,
}

/// Reference point for distance scoring.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceAnchor {
    pub field: String,
    pub point: Coord,
}

/// A compiled query ready for an index client.
#[derive(Debug, Clone, PartialEq)]
pub struct NativeQuery {
    pub clause: Clause,
    pub sort: Vec<SortClause>,
    /// 0-based offset of the first row.
    pub start: usize,
    pub rows: usize,
    pub include_score: bool,
    pub score_mode: ScoreMode,
    pub distance_anchor: Option<DistanceAnchor>,
    /// Non-fatal problems found during translation.
    pub warnings: Vec<String>,
}

impl NativeQuery {
    /// Unsorted, unscored query for the first `rows` matches.
    pub fn new(clause: Clause, rows: usize) -> Self {
        Self {
            clause: clause.normalize(),
            sort: Vec::new(),
            start: 0,
            rows,
            include_score: false,
            score_mode: ScoreMode::Relevance,
            distance_anchor: None,
            warnings: Vec::new(),
        }
    }

    /// Canonical query text.
    pub fn text(&self) -> String {
        strip_outer_parens(&self.clause.render()).to_string()
    }

    pub fn sort_text(&self) -> String {
        self.sort
            .iter()
            .map(|s| format!("{} {}", s.field, s.order))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for NativeQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "q={}", self.text())?;
        if !self.sort.is_empty() {
            write!(f, " sort={}", self.sort_text())?;
        }
        write!(f, " start={} rows={}", self.start, self.rows)?;
        if self.include_score {
            write!(f, " fl=*,{}", SCORE_FIELD)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn term(field: &str, value: &str) -> Clause {
        Clause::term(field, FieldValue::Text(value.into()))
    }

    #[test]
    fn test_normalize_flattens_and_collapses() {
        let clause = Clause::And(vec![
            Clause::And(vec![term("a_txt", "1"), Clause::MatchAll]),
            Clause::Or(vec![term("b_txt", "2")]),
        ]);
        assert_eq!(
            clause.normalize(),
            Clause::And(vec![term("a_txt", "1"), term("b_txt", "2")])
        );
    }

    #[test]
    fn test_normalize_folds_constants() {
        assert_eq!(
            Clause::And(vec![term("a_txt", "1"), Clause::MatchNone]).normalize(),
            Clause::MatchNone
        );
        assert_eq!(
            Clause::Or(vec![term("a_txt", "1"), Clause::MatchAll]).normalize(),
            Clause::MatchAll
        );
        assert_eq!(Clause::Or(vec![]).normalize(), Clause::MatchNone);
        assert_eq!(
            Clause::negate(Clause::negate(term("a_txt", "1"))).normalize(),
            term("a_txt", "1")
        );
    }

    #[test]
    fn test_single_value_terms_becomes_term() {
        let clause = Clause::Terms {
            field: "a_txt".into(),
            values: vec![FieldValue::Text("x".into())],
        };
        assert_eq!(clause.normalize(), term("a_txt", "x"));
    }

    #[test]
    fn test_render_groups_and_ranges() {
        let clause = Clause::Or(vec![
            term("title_txt", "Flagstaff"),
            Clause::Range {
                field: "size_lng".into(),
                lower: Some(RangeBound::inclusive(FieldValue::Long(1))),
                upper: Some(RangeBound::exclusive(FieldValue::Long(9))),
            },
            Clause::Range {
                field: "size_lng".into(),
                lower: None,
                upper: Some(RangeBound::inclusive(FieldValue::Long(0))),
            },
        ]);
        assert_eq!(
            clause.render(),
            "(title_txt:\"Flagstaff\" OR size_lng:[1 TO 9} OR size_lng:[* TO 0])"
        );
    }

    #[test]
    fn test_strip_outer_parens() {
        assert_eq!(strip_outer_parens("((a:1 AND b:2))"), "a:1 AND b:2");
        assert_eq!(strip_outer_parens("(a:1) OR (b:2)"), "(a:1) OR (b:2)");
        assert_eq!(strip_outer_parens("(a:\")\" OR b:2)"), "a:\")\" OR b:2");
        assert_eq!(strip_outer_parens("a:\\(x\\)"), "a:\\(x\\)");
    }

    #[test]
    fn test_text_strips_outer_group() {
        let query = NativeQuery::new(Clause::And(vec![term("a_txt", "1"), term("b_txt", "2")]), 5);
        assert_eq!(query.text(), "a_txt:\"1\" AND b_txt:\"2\"");
        assert_eq!(query.to_string(), "q=a_txt:\"1\" AND b_txt:\"2\" start=0 rows=5");
    }

    #[test]
    fn test_positive_leaves_skip_negations() {
        let clause = Clause::And(vec![
            term("a_txt", "1"),
            Clause::negate(term("b_txt", "2")),
            Clause::Or(vec![term("c_txt", "3"), Clause::MatchAll]),
        ]);
        assert_eq!(clause.positive_leaves().len(), 2);
    }
}
