//! Attribute descriptors and metacard types
//!
//! A metacard type is advisory: records may carry attributes it does not
//! declare, and the index never enforces it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::format::AttributeFormat;
use super::names;

/// Describes how one named slot of a record is stored and searched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeDescriptor {
    pub name: String,
    pub format: AttributeFormat,
    #[serde(default = "default_true")]
    pub indexed: bool,
    #[serde(default = "default_true")]
    pub stored: bool,
    #[serde(default)]
    pub tokenized: bool,
    #[serde(default)]
    pub multivalued: bool,
}

fn default_true() -> bool {
    true
}

impl AttributeDescriptor {
    /// Indexed, stored, single-valued descriptor.
    pub fn new(name: impl Into<String>, format: AttributeFormat) -> Self {
        Self {
            name: name.into(),
            format,
            indexed: true,
            stored: true,
            tokenized: format.is_text(),
            multivalued: false,
        }
    }

    pub fn multivalued(mut self) -> Self {
        self.multivalued = true;
        self
    }

    pub fn not_indexed(mut self) -> Self {
        self.indexed = false;
        self
    }
}

/// A named set of attribute descriptors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetacardType {
    pub name: String,
    pub descriptors: BTreeMap<String, AttributeDescriptor>,
}

impl MetacardType {
    /// Name of the generic type used when a document carries no type.
    pub const BASIC: &'static str = "metacard";

    pub fn new(name: impl Into<String>, descriptors: impl IntoIterator<Item = AttributeDescriptor>) -> Self {
        Self {
            name: name.into(),
            descriptors: descriptors
                .into_iter()
                .map(|d| (d.name.clone(), d))
                .collect(),
        }
    }

    /// The generic type carrying the core catalog attributes.
    pub fn basic() -> Self {
        Self::new(
            Self::BASIC,
            [
                AttributeDescriptor::new(names::ID, AttributeFormat::String),
                AttributeDescriptor::new(names::TITLE, AttributeFormat::String),
                AttributeDescriptor::new(names::CREATED, AttributeFormat::Date),
                AttributeDescriptor::new(names::MODIFIED, AttributeFormat::Date),
                AttributeDescriptor::new(names::EFFECTIVE, AttributeFormat::Date),
                AttributeDescriptor::new(names::EXPIRATION, AttributeFormat::Date),
                AttributeDescriptor::new(names::METADATA, AttributeFormat::Xml),
                AttributeDescriptor::new(names::CONTENT_TYPE, AttributeFormat::String),
                AttributeDescriptor::new(names::GEOGRAPHY, AttributeFormat::Geometry),
                AttributeDescriptor::new(names::RESOURCE_URI, AttributeFormat::String),
                AttributeDescriptor::new(names::RESOURCE_SIZE, AttributeFormat::Long),
                AttributeDescriptor::new(names::THUMBNAIL, AttributeFormat::Binary).not_indexed(),
                AttributeDescriptor::new(names::KEYWORDS, AttributeFormat::String).multivalued(),
            ],
        )
    }

    /// Returns this type with an additional descriptor.
    pub fn with_descriptor(mut self, descriptor: AttributeDescriptor) -> Self {
        self.descriptors.insert(descriptor.name.clone(), descriptor);
        self
    }

    pub fn descriptor(&self, name: &str) -> Option<&AttributeDescriptor> {
        self.descriptors.get(name)
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &AttributeDescriptor> {
        self.descriptors.values()
    }
}

impl Default for MetacardType {
    fn default() -> Self {
        Self::basic()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_type_declares_core_attributes() {
        let basic = MetacardType::basic();
        assert_eq!(basic.descriptor("created").unwrap().format, AttributeFormat::Date);
        assert_eq!(basic.descriptor("location").unwrap().format, AttributeFormat::Geometry);
        assert!(basic.descriptor("keywords").unwrap().multivalued);
        assert!(!basic.descriptor("thumbnail").unwrap().indexed);
    }

    #[test]
    fn test_type_json_defaults_flags() {
        let json = r#"{"name":"nitf","descriptors":{"isr":{"name":"isr","format":"STRING"}}}"#;
        let parsed: MetacardType = serde_json::from_str(json).unwrap();
        let isr = parsed.descriptor("isr").unwrap();
        assert!(isr.indexed);
        assert!(isr.stored);
        assert!(!isr.multivalued);
    }
}
