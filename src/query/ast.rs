//! Abstract filter, sort and pagination model
//!
//! Properties are attribute names, never physical fields. The translator
//! decides which fields a property means.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Duration, Utc};

use crate::record::{AttributeFormat, AttributeValue};

/// Page size used when a request does not specify one.
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Comparison operators for single-valued predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompareOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "<>",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
        }
    }
}

/// Temporal relations against a DATE property.
#[derive(Debug, Clone, PartialEq)]
pub enum TemporalOp {
    /// Strictly inside the period.
    During {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
    Before(DateTime<Utc>),
    After(DateTime<Utc>),
    /// Within the given duration before the time of translation.
    Relative(Duration),
}

/// Spatial relations against a GEOMETRY property.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpatialOp {
    Intersects,
    Within,
    Contains,
    Disjoint,
    /// Within `meters` of a point.
    DWithin { meters: f64 },
    /// Farther than `meters` from a point.
    Beyond { meters: f64 },
}

impl SpatialOp {
    pub fn name(&self) -> &'static str {
        match self {
            SpatialOp::Intersects => "INTERSECTS",
            SpatialOp::Within => "WITHIN",
            SpatialOp::Contains => "CONTAINS",
            SpatialOp::Disjoint => "DISJOINT",
            SpatialOp::DWithin { .. } => "DWITHIN",
            SpatialOp::Beyond { .. } => "BEYOND",
        }
    }
}

/// Filter expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Matches everything.
    Include,
    /// Matches nothing.
    Exclude,
    And(Vec<Filter>),
    Or(Vec<Filter>),
    Not(Box<Filter>),
    Compare {
        property: String,
        op: CompareOp,
        value: AttributeValue,
    },
    /// Inclusive range.
    Between {
        property: String,
        lower: AttributeValue,
        upper: AttributeValue,
    },
    /// Wildcard text match: `*` any run, `?` one character, `\` escapes.
    Like {
        property: String,
        pattern: String,
        case_sensitive: bool,
    },
    IsNull {
        property: String,
    },
    Temporal {
        property: String,
        op: TemporalOp,
    },
    Spatial {
        property: String,
        op: SpatialOp,
        /// Well-known text of the reference geometry.
        wkt: String,
    },
    /// Record identifier membership.
    Ids(Vec<String>),
}

impl Filter {
    pub fn and(filters: impl IntoIterator<Item = Filter>) -> Self {
        Filter::And(filters.into_iter().collect())
    }

    pub fn or(filters: impl IntoIterator<Item = Filter>) -> Self {
        Filter::Or(filters.into_iter().collect())
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(filter: Filter) -> Self {
        Filter::Not(Box::new(filter))
    }

    pub fn compare(property: impl Into<String>, op: CompareOp, value: impl Into<AttributeValue>) -> Self {
        Filter::Compare {
            property: property.into(),
            op,
            value: value.into(),
        }
    }

    pub fn eq(property: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        Self::compare(property, CompareOp::Eq, value)
    }

    pub fn between(
        property: impl Into<String>,
        lower: impl Into<AttributeValue>,
        upper: impl Into<AttributeValue>,
    ) -> Self {
        Filter::Between {
            property: property.into(),
            lower: lower.into(),
            upper: upper.into(),
        }
    }

    pub fn like(property: impl Into<String>, pattern: impl Into<String>) -> Self {
        Filter::Like {
            property: property.into(),
            pattern: pattern.into(),
            case_sensitive: true,
        }
    }

    pub fn ilike(property: impl Into<String>, pattern: impl Into<String>) -> Self {
        Filter::Like {
            property: property.into(),
            pattern: pattern.into(),
            case_sensitive: false,
        }
    }

    pub fn is_null(property: impl Into<String>) -> Self {
        Filter::IsNull {
            property: property.into(),
        }
    }

    pub fn temporal(property: impl Into<String>, op: TemporalOp) -> Self {
        Filter::Temporal {
            property: property.into(),
            op,
        }
    }

    pub fn spatial(property: impl Into<String>, op: SpatialOp, wkt: impl Into<String>) -> Self {
        Filter::Spatial {
            property: property.into(),
            op,
            wkt: wkt.into(),
        }
    }

    pub fn ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Filter::Ids(ids.into_iter().map(Into::into).collect())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Ascending,
    #[default]
    Descending,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Ascending => "asc",
            SortOrder::Descending => "desc",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Sort on one property. `RELEVANCE`, `DISTANCE` and `TEMPORAL` are
/// pseudo-properties handled by the translator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortBy {
    pub property: String,
    pub order: SortOrder,
}

impl SortBy {
    pub fn new(property: impl Into<String>, order: SortOrder) -> Self {
        Self {
            property: property.into(),
            order,
        }
    }

    pub fn asc(property: impl Into<String>) -> Self {
        Self::new(property, SortOrder::Ascending)
    }

    pub fn desc(property: impl Into<String>) -> Self {
        Self::new(property, SortOrder::Descending)
    }
}

/// A complete search request.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRequest {
    pub filter: Filter,
    /// `None` sorts by effective date, newest first.
    pub sort_by: Option<SortBy>,
    /// 1-based index of the first result.
    pub start_index: i64,
    /// Zero or negative returns every match.
    pub page_size: i64,
    /// Format to assume per property, overriding cached types.
    pub type_hints: BTreeMap<String, AttributeFormat>,
}

impl QueryRequest {
    pub fn new(filter: Filter) -> Self {
        Self {
            filter,
            sort_by: None,
            start_index: 1,
            page_size: DEFAULT_PAGE_SIZE,
            type_hints: BTreeMap::new(),
        }
    }

    pub fn with_sort(mut self, sort_by: SortBy) -> Self {
        self.sort_by = Some(sort_by);
        self
    }

    pub fn with_start_index(mut self, start_index: i64) -> Self {
        self.start_index = start_index;
        self
    }

    pub fn with_page_size(mut self, page_size: i64) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_type_hint(mut self, property: impl Into<String>, format: AttributeFormat) -> Self {
        self.type_hints.insert(property.into(), format);
        self
    }
}
