//! Geometry error types

use thiserror::Error;

pub type GeoResult<T> = Result<T, GeoError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeoError {
    /// Text is not well-formed WKT.
    #[error("malformed WKT '{wkt}': {reason}")]
    Malformed { wkt: String, reason: String },

    /// Well-formed geometry kind this layer does not evaluate.
    #[error("unsupported geometry type {0}")]
    Unsupported(String),
}

impl GeoError {
    pub fn malformed(wkt: &str, reason: impl Into<String>) -> Self {
        GeoError::Malformed {
            wkt: wkt.chars().take(80).collect(),
            reason: reason.into(),
        }
    }

    pub fn unsupported(kind: impl Into<String>) -> Self {
        GeoError::Unsupported(kind.into())
    }
}
