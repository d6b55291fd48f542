//! Attribute formats
//!
//! The closed set of primitive types an attribute value may have.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Primitive type of an attribute value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttributeFormat {
    String,
    Xml,
    Date,
    Boolean,
    Binary,
    Geometry,
    Object,
    Integer,
    Long,
    Short,
    Float,
    Double,
}

/// Formats that compare against each other during query resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatFamily {
    Text,
    Numeric,
    Date,
    Boolean,
    Binary,
    Geometry,
    Object,
}

impl AttributeFormat {
    /// Every format, in declaration order.
    pub const ALL: [AttributeFormat; 12] = [
        AttributeFormat::String,
        AttributeFormat::Xml,
        AttributeFormat::Date,
        AttributeFormat::Boolean,
        AttributeFormat::Binary,
        AttributeFormat::Geometry,
        AttributeFormat::Object,
        AttributeFormat::Integer,
        AttributeFormat::Long,
        AttributeFormat::Short,
        AttributeFormat::Float,
        AttributeFormat::Double,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AttributeFormat::String => "STRING",
            AttributeFormat::Xml => "XML",
            AttributeFormat::Date => "DATE",
            AttributeFormat::Boolean => "BOOLEAN",
            AttributeFormat::Binary => "BINARY",
            AttributeFormat::Geometry => "GEOMETRY",
            AttributeFormat::Object => "OBJECT",
            AttributeFormat::Integer => "INTEGER",
            AttributeFormat::Long => "LONG",
            AttributeFormat::Short => "SHORT",
            AttributeFormat::Float => "FLOAT",
            AttributeFormat::Double => "DOUBLE",
        }
    }

    pub fn family(&self) -> FormatFamily {
        match self {
            AttributeFormat::String | AttributeFormat::Xml => FormatFamily::Text,
            AttributeFormat::Integer
            | AttributeFormat::Long
            | AttributeFormat::Short
            | AttributeFormat::Float
            | AttributeFormat::Double => FormatFamily::Numeric,
            AttributeFormat::Date => FormatFamily::Date,
            AttributeFormat::Boolean => FormatFamily::Boolean,
            AttributeFormat::Binary => FormatFamily::Binary,
            AttributeFormat::Geometry => FormatFamily::Geometry,
            AttributeFormat::Object => FormatFamily::Object,
        }
    }

    /// Returns true for STRING and XML.
    pub fn is_text(&self) -> bool {
        self.family() == FormatFamily::Text
    }

    pub fn is_numeric(&self) -> bool {
        self.family() == FormatFamily::Numeric
    }

    /// Whether values of this format can be ordered by the index.
    pub fn is_sortable(&self) -> bool {
        !matches!(
            self,
            AttributeFormat::Binary | AttributeFormat::Geometry | AttributeFormat::Object
        )
    }
}

impl fmt::Display for AttributeFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AttributeFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AttributeFormat::ALL
            .iter()
            .find(|format| format.as_str().eq_ignore_ascii_case(s))
            .copied()
            .ok_or_else(|| format!("unknown attribute format '{}'", s))
    }
}
