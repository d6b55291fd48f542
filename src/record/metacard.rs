//! Catalog records

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::descriptor::MetacardType;
use super::names;
use super::value::AttributeValue;

/// A named attribute holding one or more values, in order.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: String,
    pub values: Vec<AttributeValue>,
}

impl Attribute {
    pub fn new(name: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        Self {
            name: name.into(),
            values: vec![value.into()],
        }
    }

    pub fn multi(name: impl Into<String>, values: Vec<AttributeValue>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// First value, for single-valued use.
    pub fn value(&self) -> Option<&AttributeValue> {
        self.values.first()
    }
}

/// A catalog entry.
///
/// Identity and timestamps live in the attribute map under the core
/// attribute names so they are indexed like any other attribute. The
/// source ID is attribution only and is never written to the index.
#[derive(Debug, Clone, PartialEq)]
pub struct Metacard {
    metacard_type: Arc<MetacardType>,
    attributes: BTreeMap<String, Attribute>,
    source_id: Option<String>,
}

impl Metacard {
    pub fn new(metacard_type: Arc<MetacardType>) -> Self {
        Self {
            metacard_type,
            attributes: BTreeMap::new(),
            source_id: None,
        }
    }

    /// Empty record of the generic type.
    pub fn basic() -> Self {
        Self::new(Arc::new(MetacardType::basic()))
    }

    pub fn metacard_type(&self) -> &Arc<MetacardType> {
        &self.metacard_type
    }

    pub fn set_metacard_type(&mut self, metacard_type: Arc<MetacardType>) {
        self.metacard_type = metacard_type;
    }

    /// Builder form of [`Metacard::set_attribute`].
    pub fn with(mut self, name: &str, value: impl Into<AttributeValue>) -> Self {
        self.set_attribute(name, value);
        self
    }

    pub fn set_attribute(&mut self, name: &str, value: impl Into<AttributeValue>) {
        self.attributes
            .insert(name.to_string(), Attribute::new(name, value));
    }

    pub fn set_values(&mut self, name: &str, values: Vec<AttributeValue>) {
        if values.is_empty() {
            self.attributes.remove(name);
        } else {
            self.attributes
                .insert(name.to_string(), Attribute::multi(name, values));
        }
    }

    pub fn remove_attribute(&mut self, name: &str) -> Option<Attribute> {
        self.attributes.remove(name)
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }

    pub fn value(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes.get(name).and_then(Attribute::value)
    }

    /// Attributes in name order.
    pub fn attributes(&self) -> impl Iterator<Item = &Attribute> {
        self.attributes.values()
    }

    /// Non-empty ID, if any.
    pub fn id(&self) -> Option<&str> {
        self.value(names::ID)
            .and_then(AttributeValue::as_str)
            .filter(|id| !id.is_empty())
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.set_attribute(names::ID, AttributeValue::String(id.into()));
    }

    pub fn title(&self) -> Option<&str> {
        self.value(names::TITLE).and_then(AttributeValue::as_str)
    }

    pub fn created(&self) -> Option<DateTime<Utc>> {
        self.value(names::CREATED).and_then(AttributeValue::as_date)
    }

    pub fn modified(&self) -> Option<DateTime<Utc>> {
        self.value(names::MODIFIED).and_then(AttributeValue::as_date)
    }

    pub fn effective(&self) -> Option<DateTime<Utc>> {
        self.value(names::EFFECTIVE).and_then(AttributeValue::as_date)
    }

    pub fn set_created(&mut self, at: DateTime<Utc>) {
        self.set_attribute(names::CREATED, at);
    }

    pub fn set_modified(&mut self, at: DateTime<Utc>) {
        self.set_attribute(names::MODIFIED, at);
    }

    pub fn set_effective(&mut self, at: DateTime<Utc>) {
        self.set_attribute(names::EFFECTIVE, at);
    }

    pub fn source_id(&self) -> Option<&str> {
        self.source_id.as_deref().filter(|s| !s.is_empty())
    }

    pub fn set_source_id(&mut self, source_id: impl Into<String>) {
        self.source_id = Some(source_id.into());
    }

    pub fn with_source_id(mut self, source_id: impl Into<String>) -> Self {
        self.set_source_id(source_id);
        self
    }
}

impl Default for Metacard {
    fn default() -> Self {
        Self::basic()
    }
}
