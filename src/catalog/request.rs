//! Update and delete requests
//!
//! Both locate stored records by the value of a caller-chosen attribute.
//! A missing attribute name is a request error raised by the provider.

use crate::record::{names, AttributeValue, Metacard};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateRequest {
    pub attribute: Option<String>,
    /// (match value, replacement record)
    pub updates: Vec<(AttributeValue, Metacard)>,
}

impl UpdateRequest {
    pub fn new(attribute: impl Into<String>) -> Self {
        Self {
            attribute: Some(attribute.into()),
            updates: Vec::new(),
        }
    }

    /// Replaces each record whose ID is the given key.
    pub fn by_id<I, S>(updates: I) -> Self
    where
        I: IntoIterator<Item = (S, Metacard)>,
        S: Into<String>,
    {
        Self {
            attribute: Some(names::ID.to_string()),
            updates: updates
                .into_iter()
                .map(|(id, card)| (AttributeValue::String(id.into()), card))
                .collect(),
        }
    }

    pub fn with_update(mut self, value: impl Into<AttributeValue>, metacard: Metacard) -> Self {
        self.updates.push((value.into(), metacard));
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeleteRequest {
    pub attribute: Option<String>,
    pub values: Vec<AttributeValue>,
}

impl DeleteRequest {
    pub fn new<I, V>(attribute: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<AttributeValue>,
    {
        Self {
            attribute: Some(attribute.into()),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn by_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(names::ID, ids.into_iter().map(|id| AttributeValue::String(id.into())))
    }
}
