//! Dynamic schema resolver
//!
//! Maps (attribute name, format) to physical index fields and back, and
//! remembers every pair seen so far so that name-only lookups can find
//! all fields an attribute has been written under.
//!
//! The registry is append-only. Concurrent registration of the same pair
//! always computes the same field, so a read-check followed by a
//! write-insert is sufficient.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, trace};

use super::fields;
use crate::record::{AttributeFormat, MetacardType};

/// Resolves attribute names to physical fields.
#[derive(Debug, Default)]
pub struct SchemaResolver {
    /// attribute name -> formats it has been seen under
    formats: RwLock<BTreeMap<String, BTreeSet<AttributeFormat>>>,
    /// metacard type name -> definition
    types: RwLock<HashMap<String, Arc<MetacardType>>>,
}

impl SchemaResolver {
    /// Creates a resolver that knows the generic metacard type.
    pub fn new() -> Self {
        let resolver = Self::default();
        resolver.add_metacard_type(MetacardType::basic());
        resolver
    }

    /// Physical field for an attribute.
    ///
    /// Write context registers the pair and returns its field. Query
    /// context never registers: it returns the exact field if known,
    /// otherwise a known field of the same format family, otherwise the
    /// field the pair would be written under.
    pub fn field_for(&self, name: &str, format: AttributeFormat, query_context: bool) -> String {
        if !query_context {
            return self.register(name, format);
        }

        let formats = self.formats.read().unwrap_or_else(PoisonError::into_inner);
        let chosen = match formats.get(name) {
            Some(known) if known.contains(&format) => format,
            Some(known) => known
                .iter()
                .copied()
                .find(|f| f.family() == format.family())
                .unwrap_or(format),
            None => format,
        };
        fields::physical_name(name, chosen)
    }

    /// Registers (name, format) and returns its physical field.
    ///
    /// A pair whose field is private is never recorded, so it cannot
    /// resolve back to an attribute.
    pub fn register(&self, name: &str, format: AttributeFormat) -> String {
        let field = fields::physical_name(name, format);
        if self.is_private_field(&field) {
            trace!(attribute = name, %format, "not registering reserved field");
            return field;
        }

        let known = self
            .formats
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .is_some_and(|formats| formats.contains(&format));

        if !known {
            let inserted = self
                .formats
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .entry(name.to_string())
                .or_default()
                .insert(format);
            if inserted {
                debug!(attribute = name, %format, "registered attribute field");
            }
        }

        field
    }

    /// Registers a physical field name reported by the index.
    ///
    /// Returns false for private or unrecognized fields.
    pub fn register_field(&self, field: &str) -> bool {
        match self.type_for(field) {
            Some((name, format)) => {
                self.register(&name, format);
                true
            }
            None => {
                trace!(field, "ignoring unrecognized index field");
                false
            }
        }
    }

    /// Every physical field currently known for `name`, in format order.
    pub fn anonymous_fields_for(&self, name: &str) -> Vec<String> {
        self.formats
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .map(|formats| {
                formats
                    .iter()
                    .map(|format| fields::physical_name(name, *format))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Every known field whose format satisfies `predicate`, in name order.
    pub fn fields_matching(&self, predicate: impl Fn(AttributeFormat) -> bool) -> Vec<String> {
        let predicate = &predicate;
        let formats = self.formats.read().unwrap_or_else(PoisonError::into_inner);
        formats
            .iter()
            .flat_map(move |(name, formats)| {
                formats
                    .iter()
                    .filter(move |f| predicate(**f))
                    .map(move |f| fields::physical_name(name, *f))
            })
            .collect()
    }

    /// Inverse mapping; `None` for private or unrecognized fields.
    pub fn type_for(&self, field: &str) -> Option<(String, AttributeFormat)> {
        if self.is_private_field(field) {
            return None;
        }
        fields::split_physical(field).map(|(name, format)| (name.to_string(), format))
    }

    pub fn is_private_field(&self, field: &str) -> bool {
        fields::is_private_field(field)
    }

    /// Snapshot of the registry: attribute name -> formats.
    pub fn known_attributes(&self) -> BTreeMap<String, BTreeSet<AttributeFormat>> {
        self.formats
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Caches a metacard type and registers every descriptor's field.
    ///
    /// The first definition cached under a name wins.
    pub fn add_metacard_type(&self, metacard_type: MetacardType) -> Arc<MetacardType> {
        if let Some(existing) = self.metacard_type(&metacard_type.name) {
            return existing;
        }

        for descriptor in metacard_type.descriptors() {
            self.register(&descriptor.name, descriptor.format);
        }

        let mut types = self.types.write().unwrap_or_else(PoisonError::into_inner);
        types
            .entry(metacard_type.name.clone())
            .or_insert_with(|| Arc::new(metacard_type))
            .clone()
    }

    pub fn metacard_type(&self, name: &str) -> Option<Arc<MetacardType>> {
        self.types
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// Format declared for `name` by a cached type, if any.
    ///
    /// When several types declare the name, the type with the smallest
    /// name wins so the answer does not depend on cache order.
    pub fn declared_format(&self, name: &str) -> Option<AttributeFormat> {
        let types = self.types.read().unwrap_or_else(PoisonError::into_inner);
        let mut declaring: Vec<&Arc<MetacardType>> = types
            .values()
            .filter(|t| t.descriptor(name).is_some())
            .collect();
        declaring.sort_by(|a, b| a.name.cmp(&b.name));
        declaring
            .first()
            .and_then(|t| t.descriptor(name))
            .map(|d| d.format)
    }
}
