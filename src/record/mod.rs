//! Catalog record model
//!
//! Records ("metacards") carry a type reference and a map of named,
//! typed, possibly multi-valued attributes. The type is advisory.

mod descriptor;
mod format;
mod metacard;
mod value;

pub use descriptor::{AttributeDescriptor, MetacardType};
pub use format::{AttributeFormat, FormatFamily};
pub use metacard::{Attribute, Metacard};
pub use value::{AttributeValue, CoercionError};

/// Core attribute names and query pseudo-properties.
pub mod names {
    pub const ID: &str = "id";
    pub const TITLE: &str = "title";
    pub const CREATED: &str = "created";
    pub const MODIFIED: &str = "modified";
    pub const EFFECTIVE: &str = "effective";
    pub const EXPIRATION: &str = "expiration";
    pub const METADATA: &str = "metadata";
    pub const CONTENT_TYPE: &str = "metadata-content-type";
    pub const GEOGRAPHY: &str = "location";
    pub const RESOURCE_URI: &str = "resource-uri";
    pub const RESOURCE_SIZE: &str = "resource-size";
    pub const THUMBNAIL: &str = "thumbnail";
    pub const KEYWORDS: &str = "keywords";

    /// Filter property matching every text attribute.
    pub const ANY_TEXT: &str = "anyText";
    /// Filter property matching every geometry attribute.
    pub const ANY_GEO: &str = "anyGeo";

    /// Sort by the index's native relevance score.
    pub const RELEVANCE: &str = "RELEVANCE";
    /// Sort by distance from the query's spatial reference point.
    pub const DISTANCE: &str = "DISTANCE";
    /// Sort by the effective date.
    pub const TEMPORAL: &str = "TEMPORAL";
}
