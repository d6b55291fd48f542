//! Clause evaluation against in-memory documents

use std::cmp::Ordering;

use regex::Regex;

use crate::geo::{self, meters_to_degrees, Coord, Geometry};
use crate::mapper::{FieldValue, IndexDocument};
use crate::query::{Clause, RangeBound, SpatialRelation};

/// Whether `doc` satisfies `clause`.
pub(crate) fn matches(clause: &Clause, doc: &IndexDocument) -> bool {
    match clause {
        Clause::MatchAll => true,
        Clause::MatchNone => false,
        Clause::Term { field, value } => doc.values(field).iter().any(|v| equal(v, value)),
        Clause::Terms { field, values } => doc
            .values(field)
            .iter()
            .any(|v| values.iter().any(|wanted| equal(v, wanted))),
        Clause::Range { field, lower, upper } => doc
            .values(field)
            .iter()
            .any(|v| above(v, lower.as_ref()) && below(v, upper.as_ref())),
        Clause::Wildcard {
            field,
            pattern,
            case_sensitive,
        } => match wildcard_regex(pattern, *case_sensitive) {
            Some(regex) => doc
                .values(field)
                .iter()
                .filter_map(FieldValue::as_text)
                .any(|text| regex.is_match(text) || text.split_whitespace().any(|token| regex.is_match(token))),
            None => false,
        },
        Clause::Exists { field } => doc.contains_field(field),
        Clause::Spatial {
            field,
            relation,
            geometry,
        } => geometries(doc, field).any(|stored| match relation {
            SpatialRelation::Intersects => stored.intersects(geometry),
            SpatialRelation::IsWithin => stored.is_within(geometry),
            SpatialRelation::Contains => stored.contains(geometry),
            SpatialRelation::IsDisjointTo => !stored.intersects(geometry),
        }),
        Clause::Distance { field, center, meters } => {
            let limit = meters_to_degrees(*meters);
            geometries(doc, field).any(|stored| stored.distance_degrees(*center) <= limit)
        }
        Clause::And(children) => children.iter().all(|c| matches(c, doc)),
        Clause::Or(children) => children.iter().any(|c| matches(c, doc)),
        Clause::Not(inner) => !matches(inner, doc),
    }
}

/// Text relevance: one plus the number of satisfied positive leaves.
pub(crate) fn relevance(clause: &Clause, doc: &IndexDocument) -> f64 {
    let hits = clause
        .positive_leaves()
        .into_iter()
        .filter(|leaf| matches(leaf, doc))
        .count();
    1.0 + hits as f64
}

/// Smallest angular distance in degrees from `point` to any geometry in `field`.
pub(crate) fn distance(doc: &IndexDocument, field: &str, point: Coord) -> Option<f64> {
    geometries(doc, field)
        .map(|g| g.distance_degrees(point))
        .fold(None, |best, d| Some(best.map_or(d, |b: f64| b.min(d))))
}

fn geometries<'a>(doc: &'a IndexDocument, field: &str) -> impl Iterator<Item = Geometry> + 'a {
    doc.values(field)
        .iter()
        .filter_map(FieldValue::as_text)
        .filter_map(|wkt| geo::parse_wkt(wkt).ok())
}

fn equal(stored: &FieldValue, wanted: &FieldValue) -> bool {
    stored.compare(wanted) == Some(Ordering::Equal) || stored == wanted
}

fn above(value: &FieldValue, bound: Option<&RangeBound>) -> bool {
    match bound {
        None => true,
        Some(b) => match value.compare(&b.value) {
            Some(Ordering::Greater) => true,
            Some(Ordering::Equal) => b.inclusive,
            _ => false,
        },
    }
}

fn below(value: &FieldValue, bound: Option<&RangeBound>) -> bool {
    match bound {
        None => true,
        Some(b) => match value.compare(&b.value) {
            Some(Ordering::Less) => true,
            Some(Ordering::Equal) => b.inclusive,
            _ => false,
        },
    }
}

/// Anchored regex for a native wildcard pattern.
fn wildcard_regex(pattern: &str, case_sensitive: bool) -> Option<Regex> {
    let mut body = String::from(if case_sensitive { "(?s)^" } else { "(?si)^" });
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if let Some(next) = chars.next() {
                    body.push_str(&regex::escape(&next.to_string()));
                }
            }
            '*' => body.push_str(".*"),
            '?' => body.push('.'),
            other => body.push_str(&regex::escape(&other.to_string())),
        }
    }
    body.push('$');
    Regex::new(&body).ok()
}
