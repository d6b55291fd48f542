//! Record <-> document mapping
//!
//! Writing resolves every attribute to its physical field in write
//! context (which registers it) and coerces each value to the declared
//! format. Reading recovers the type from the reserved fields and turns
//! every resolvable, non-private field back into an attribute.

use std::sync::Arc;

use tracing::trace;

use super::document::{FieldValue, IndexDocument};
use super::errors::{MapperError, MapperResult};
use crate::record::{AttributeFormat, AttributeValue, Metacard, MetacardType};
use crate::schema::{fields, SchemaResolver, TYPE_NAME_FIELD, TYPE_OBJECT_FIELD};

/// Converts metacards to index documents and back.
#[derive(Debug, Clone)]
pub struct DocumentMapper {
    resolver: Arc<SchemaResolver>,
}

impl DocumentMapper {
    pub fn new(resolver: Arc<SchemaResolver>) -> Self {
        Self { resolver }
    }

    pub fn resolver(&self) -> &Arc<SchemaResolver> {
        &self.resolver
    }

    /// Builds the index document for a record.
    ///
    /// Any value that cannot be coerced aborts the whole document.
    pub fn to_document(&self, metacard: &Metacard) -> MapperResult<IndexDocument> {
        let metacard_type = metacard.metacard_type();

        let mut doc = IndexDocument::new();
        doc.set_value(TYPE_NAME_FIELD, FieldValue::Text(metacard_type.name.clone()));
        let definition = serde_json::to_string(metacard_type.as_ref())
            .map_err(|e| MapperError::InvalidType(e.to_string()))?;
        doc.set_value(TYPE_OBJECT_FIELD, FieldValue::Text(definition));

        // Resolve and coerce everything before registering any field so a
        // rejected record leaves no trace in the registry.
        let mut pending = Vec::new();
        for attribute in metacard.attributes() {
            let Some(first) = attribute.values.first() else {
                continue;
            };
            let descriptor = metacard_type.descriptor(&attribute.name);
            let format = descriptor.map_or_else(|| first.natural_format(), |d| d.format);
            if fields::is_private_field(&fields::physical_name(&attribute.name, format)) {
                return Err(MapperError::ReservedAttribute {
                    attribute: attribute.name.clone(),
                });
            }

            if let Some(d) = descriptor {
                if !d.multivalued && attribute.values.len() > 1 {
                    return Err(MapperError::Cardinality {
                        attribute: attribute.name.clone(),
                        count: attribute.values.len(),
                    });
                }
            }

            let values = attribute
                .values
                .iter()
                .map(|value| {
                    value
                        .coerce(format)
                        .map(FieldValue::from)
                        .map_err(|source| MapperError::Coercion {
                            attribute: attribute.name.clone(),
                            source,
                        })
                })
                .collect::<MapperResult<Vec<_>>>()?;

            pending.push((attribute.name.as_str(), format, values));
        }

        self.resolver.add_metacard_type(metacard_type.as_ref().clone());
        for (name, format, values) in pending {
            let field = self.resolver.field_for(name, format, false);
            for value in values {
                doc.add_value(field.clone(), value);
            }
        }

        Ok(doc)
    }

    /// Rebuilds a record from an index document.
    ///
    /// Unresolvable fields are skipped. Source attribution is left unset.
    pub fn from_document(&self, doc: &IndexDocument) -> MapperResult<Metacard> {
        let metacard_type = self.resolve_type(doc)?;
        let mut metacard = Metacard::new(metacard_type);

        for (field, values) in doc.fields() {
            let Some((name, format)) = self.resolver.type_for(field) else {
                trace!(field = field.as_str(), "skipping field without attribute mapping");
                continue;
            };
            let values = values
                .iter()
                .map(|value| from_field_value(field, value, format))
                .collect::<MapperResult<Vec<_>>>()?;
            metacard.set_values(&name, values);
        }

        Ok(metacard)
    }

    fn resolve_type(&self, doc: &IndexDocument) -> MapperResult<Arc<MetacardType>> {
        let name = doc.first(TYPE_NAME_FIELD).and_then(FieldValue::as_text);

        if let Some(cached) = name.and_then(|n| self.resolver.metacard_type(n)) {
            return Ok(cached);
        }

        match doc.first(TYPE_OBJECT_FIELD) {
            Some(FieldValue::Text(definition)) => {
                let parsed: MetacardType = serde_json::from_str(definition)
                    .map_err(|e| MapperError::InvalidType(e.to_string()))?;
                Ok(self.resolver.add_metacard_type(parsed))
            }
            Some(other) => Err(MapperError::InvalidType(format!(
                "type definition stored as {}",
                kind_of(other)
            ))),
            None => Ok(self.resolver.add_metacard_type(MetacardType::basic())),
        }
    }
}

/// Canonical attribute value (already coerced) to its stored form.
impl From<AttributeValue> for FieldValue {
    fn from(value: AttributeValue) -> Self {
        match value {
            AttributeValue::String(s) | AttributeValue::Xml(s) | AttributeValue::Geometry(s) => FieldValue::Text(s),
            AttributeValue::Object(v) => FieldValue::Text(v.to_string()),
            AttributeValue::Date(d) => FieldValue::Date(d),
            AttributeValue::Boolean(b) => FieldValue::Bool(b),
            AttributeValue::Binary(bytes) => FieldValue::Binary(bytes),
            AttributeValue::Integer(v) => FieldValue::Long(i64::from(v)),
            AttributeValue::Long(v) => FieldValue::Long(v),
            AttributeValue::Short(v) => FieldValue::Long(i64::from(v)),
            AttributeValue::Float(v) => FieldValue::Double(f64::from(v)),
            AttributeValue::Double(v) => FieldValue::Double(v),
        }
    }
}

fn from_field_value(field: &str, value: &FieldValue, format: AttributeFormat) -> MapperResult<AttributeValue> {
    let mismatch = || MapperError::FieldMismatch {
        field: field.to_string(),
        format,
        found: kind_of(value).to_string(),
    };

    match (format, value) {
        (AttributeFormat::String, FieldValue::Text(s)) => Ok(AttributeValue::String(s.clone())),
        (AttributeFormat::Xml, FieldValue::Text(s)) => Ok(AttributeValue::Xml(s.clone())),
        (AttributeFormat::Geometry, FieldValue::Text(s)) => Ok(AttributeValue::Geometry(s.clone())),
        (AttributeFormat::Object, FieldValue::Text(s)) => serde_json::from_str(s)
            .map(AttributeValue::Object)
            .map_err(|_| mismatch()),
        (AttributeFormat::Date, FieldValue::Date(d)) => Ok(AttributeValue::Date(*d)),
        (AttributeFormat::Boolean, FieldValue::Bool(b)) => Ok(AttributeValue::Boolean(*b)),
        (AttributeFormat::Binary, FieldValue::Binary(bytes)) => Ok(AttributeValue::Binary(bytes.clone())),
        (AttributeFormat::Integer, FieldValue::Long(v)) => i32::try_from(*v)
            .map(AttributeValue::Integer)
            .map_err(|_| mismatch()),
        (AttributeFormat::Short, FieldValue::Long(v)) => i16::try_from(*v)
            .map(AttributeValue::Short)
            .map_err(|_| mismatch()),
        (AttributeFormat::Long, FieldValue::Long(v)) => Ok(AttributeValue::Long(*v)),
        (AttributeFormat::Float, FieldValue::Double(v)) => Ok(AttributeValue::Float(*v as f32)),
        (AttributeFormat::Double, FieldValue::Double(v)) => Ok(AttributeValue::Double(*v)),
        _ => Err(mismatch()),
    }
}

fn kind_of(value: &FieldValue) -> &'static str {
    match value {
        FieldValue::Text(_) => "text",
        FieldValue::Bool(_) => "boolean",
        FieldValue::Long(_) => "integer",
        FieldValue::Double(_) => "floating point",
        FieldValue::Date(_) => "date",
        FieldValue::Binary(_) => "binary",
    }
}
