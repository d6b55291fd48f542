//! Record serialization errors

use thiserror::Error;

use crate::record::{AttributeFormat, CoercionError};

pub type MapperResult<T> = Result<T, MapperError>;

/// A record could not be written as a document, or a document could not
/// be read back as a record. Always aborts the whole document.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MapperError {
    /// Attribute value does not fit its declared format.
    #[error("attribute '{attribute}': {source}")]
    Coercion {
        attribute: String,
        #[source]
        source: CoercionError,
    },

    /// More than one value for a single-valued attribute.
    #[error("attribute '{attribute}' is single-valued but has {count} values")]
    Cardinality { attribute: String, count: usize },

    /// Attribute would be stored in a field the catalog reserves.
    #[error("attribute '{attribute}' maps to a reserved field")]
    ReservedAttribute { attribute: String },

    /// Stored field value does not match the format its name declares.
    #[error("field '{field}' holds {found}, expected {format}")]
    FieldMismatch {
        field: String,
        format: AttributeFormat,
        found: String,
    },

    /// Reserved type-definition field could not be decoded.
    #[error("invalid metacard type definition: {0}")]
    InvalidType(String),
}

impl MapperError {
    pub fn code(&self) -> &'static str {
        match self {
            MapperError::Coercion { .. } => "MAPPER_COERCION_FAILED",
            MapperError::Cardinality { .. } => "MAPPER_CARDINALITY",
            MapperError::ReservedAttribute { .. } => "MAPPER_RESERVED_ATTRIBUTE",
            MapperError::FieldMismatch { .. } => "MAPPER_FIELD_MISMATCH",
            MapperError::InvalidType(_) => "MAPPER_INVALID_TYPE",
        }
    }
}
