//! CRUD orchestration over an index client
//!
//! Flow per operation:
//! 1. Validate the request (request errors never touch the backend)
//! 2. Resolve identities and timestamps
//! 3. Map records to documents, or documents back to records
//! 4. One batch call to the index
//!
//! The provider holds no state of its own beyond the schema resolver.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::errors::{CatalogError, CatalogResult};
use super::request::{DeleteRequest, UpdateRequest};
use super::response::{CreateResponse, DeleteResponse, SearchResult, SourceResponse, Update, UpdateResponse};
use crate::config::CatalogConfig;
use crate::geo::degrees_to_meters;
use crate::index::{IndexClient, ScoredDocument};
use crate::mapper::{DocumentMapper, IndexDocument, MapperResult};
use crate::query::{match_keys, NativeQuery, QueryRequest, QueryTranslator, ScoreMode};
use crate::record::Metacard;
use crate::schema::SchemaResolver;

/// Catalog provider backed by a search index.
pub struct CatalogProvider<C: IndexClient> {
    client: C,
    config: CatalogConfig,
    resolver: Arc<SchemaResolver>,
    mapper: DocumentMapper,
    translator: QueryTranslator,
}

impl<C: IndexClient> CatalogProvider<C> {
    /// Creates a provider and seeds its registry with the index's fields.
    pub fn new(client: C, config: CatalogConfig) -> Self {
        let resolver = Arc::new(SchemaResolver::new());

        match client.field_names() {
            Ok(fields) => {
                let registered = fields.iter().filter(|f| resolver.register_field(f)).count();
                debug!(fields = fields.len(), registered, "bootstrapped schema from index");
            }
            Err(e) => warn!(error = %e, "could not list index fields, starting with the basic schema"),
        }

        let translator = QueryTranslator::new(Arc::clone(&resolver), config.max_rows());
        Self {
            client,
            mapper: DocumentMapper::new(Arc::clone(&resolver)),
            translator,
            resolver,
            config,
        }
    }

    pub fn source_id(&self) -> &str {
        &self.config.source_id
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn resolver(&self) -> &Arc<SchemaResolver> {
        &self.resolver
    }

    /// Backend liveness. Never fails.
    pub fn is_available(&self) -> bool {
        match self.client.ping() {
            Ok(()) => true,
            Err(e) => {
                debug!(error = %e, "index ping failed");
                false
            }
        }
    }

    /// Stores new records as one batch.
    ///
    /// Records without an ID get a generated one. A record that carries an
    /// ID and another provider's source ID rejects the whole batch.
    pub fn create(&self, metacards: Vec<Metacard>) -> CatalogResult<CreateResponse> {
        let now = Utc::now();
        let local = self.source_id();

        let mut created = Vec::with_capacity(metacards.len());
        for mut card in metacards {
            if let (Some(id), Some(source)) = (card.id(), card.source_id()) {
                if source != local {
                    return Err(CatalogError::ForeignIdentity {
                        id: id.to_string(),
                        source_id: source.to_string(),
                    });
                }
            }

            if card.id().is_none() {
                card.set_id(Uuid::new_v4().simple().to_string());
            }
            if card.source_id().is_none() {
                card.set_source_id(local);
            }
            if card.created().is_none() {
                card.set_created(now);
            }
            if card.effective().is_none() {
                card.set_effective(now);
            }
            card.set_modified(now);
            created.push(card);
        }

        if created.is_empty() {
            return Ok(CreateResponse::default());
        }

        let documents = self.to_documents(&created)?;
        self.client
            .add(documents, self.config.force_auto_commit)
            .map_err(CatalogError::Ingest)?;

        info!(op = "create", result_count = created.len(), "created records");
        Ok(CreateResponse { created })
    }

    /// Replaces stored records located by a match attribute.
    ///
    /// Match values with no stored record are skipped. A value answered by
    /// two stored records, a stored record answering two values, or a value
    /// given twice fails the whole batch.
    pub fn update(&self, request: UpdateRequest) -> CatalogResult<UpdateResponse> {
        let attribute = required_attribute(request.attribute, "update")?;
        if request.updates.is_empty() {
            return Ok(UpdateResponse::default());
        }

        let keys: Vec<_> = request.updates.iter().map(|(key, _)| key.clone()).collect();
        let Some(clause) = self.translator.match_clause(&attribute, &keys) else {
            debug!(op = "update", attribute = attribute.as_str(), "match attribute has no indexed fields");
            return Ok(UpdateResponse::default());
        };

        // Pair through the same coerced terms the lookup query uses.
        let fields = self.translator.match_fields(&attribute);
        let wanted: Vec<BTreeSet<String>> = keys.iter().map(|key| match_keys(&fields, key)).collect();
        let mut seen = BTreeSet::new();
        for (key, terms) in keys.iter().zip(&wanted) {
            if terms.iter().any(|term| !seen.insert(term.as_str())) {
                return Err(CatalogError::DuplicateMatch {
                    attribute,
                    value: key.to_string(),
                });
            }
        }

        let requested = request.updates.len();
        let response = self
            .client
            .query(&NativeQuery::new(clause, requested))
            .map_err(CatalogError::Ingest)?;

        if response.num_found == 0 {
            return Ok(UpdateResponse::default());
        }
        if response.num_found > requested {
            return Err(CatalogError::AmbiguousMatch {
                attribute,
                requested,
                found: response.num_found,
            });
        }

        let olds = self.to_metacards(&response.documents)?;
        let stored: Vec<BTreeSet<String>> = olds
            .iter()
            .map(|old| {
                old.attribute(&attribute)
                    .map(|a| a.values.iter().flat_map(|v| match_keys(&fields, v)).collect())
                    .unwrap_or_default()
            })
            .collect();

        let mut claimed: Vec<bool> = vec![false; olds.len()];
        let mut pairing: Vec<Option<usize>> = Vec::with_capacity(requested);
        for (key, terms) in keys.iter().zip(&wanted) {
            let mut hits = stored
                .iter()
                .enumerate()
                .filter(|(_, old_terms)| !old_terms.is_disjoint(terms))
                .map(|(index, _)| index);
            let found = hits.next();
            let duplicate = match found {
                Some(index) => hits.next().is_some() || std::mem::replace(&mut claimed[index], true),
                None => false,
            };
            if duplicate {
                return Err(CatalogError::DuplicateMatch {
                    attribute,
                    value: key.to_string(),
                });
            }
            pairing.push(found);
        }

        let now = Utc::now();
        let mut applied = Vec::with_capacity(olds.len());
        for ((key, mut new), paired) in request.updates.into_iter().zip(pairing) {
            let Some(old) = paired.map(|index| &olds[index]) else {
                debug!(op = "update", value = %key, "no stored record for match value");
                continue;
            };

            if let Some(id) = old.id() {
                new.set_id(id);
            }
            match old.created() {
                Some(created) => new.set_created(created),
                None => new.set_created(now),
            }
            new.set_modified(now);
            if new.effective().is_none() {
                new.set_effective(now);
            }
            new.set_source_id(self.source_id());

            applied.push(Update { old: old.clone(), new });
        }

        if applied.is_empty() {
            return Ok(UpdateResponse::default());
        }

        let replacements: Vec<Metacard> = applied.iter().map(|u| u.new.clone()).collect();
        let documents = self.to_documents(&replacements)?;
        self.client
            .add(documents, self.config.force_auto_commit)
            .map_err(CatalogError::Ingest)?;

        info!(op = "update", attribute = attribute.as_str(), result_count = applied.len(), "updated records");
        Ok(UpdateResponse { updates: applied })
    }

    /// Removes stored records located by a match attribute and returns them.
    pub fn delete(&self, request: DeleteRequest) -> CatalogResult<DeleteResponse> {
        let attribute = required_attribute(request.attribute, "delete")?;
        if request.values.is_empty() {
            return Ok(DeleteResponse::default());
        }

        let Some(clause) = self.translator.match_clause(&attribute, &request.values) else {
            debug!(op = "delete", attribute = attribute.as_str(), "match attribute has no indexed fields");
            return Ok(DeleteResponse::default());
        };

        let query = NativeQuery::new(clause, request.values.len());
        let response = self.client.query(&query).map_err(CatalogError::Ingest)?;
        let deleted = self.to_metacards(&response.documents)?;
        if deleted.is_empty() {
            return Ok(DeleteResponse::default());
        }

        self.client
            .delete_by_query(&query.clause)
            .map_err(CatalogError::Ingest)?;

        info!(op = "delete", attribute = attribute.as_str(), result_count = deleted.len(), "deleted records");
        Ok(DeleteResponse { deleted })
    }

    /// Runs a search.
    pub fn query(&self, request: &QueryRequest) -> CatalogResult<SourceResponse> {
        let native = self.translator.translate(request)?;
        let response = self.client.query(&native).map_err(CatalogError::Query)?;

        let mut results = Vec::with_capacity(response.documents.len());
        for hit in &response.documents {
            let mut metacard = self.mapper.from_document(&hit.document)?;
            metacard.set_source_id(self.source_id());

            let (relevance_score, distance_in_meters) = match (native.score_mode, hit.score) {
                (ScoreMode::Distance, Some(degrees)) => (None, Some(degrees_to_meters(degrees))),
                (ScoreMode::Relevance, score) => (score, None),
                (ScoreMode::Distance, None) => (None, None),
            };
            results.push(SearchResult {
                metacard,
                relevance_score,
                distance_in_meters,
            });
        }

        info!(op = "query", result_count = results.len(), hits = response.num_found, "query complete");
        Ok(SourceResponse {
            results,
            hits: response.num_found,
            processing_details: native.warnings,
        })
    }

    fn to_documents(&self, metacards: &[Metacard]) -> MapperResult<Vec<IndexDocument>> {
        metacards.iter().map(|card| self.mapper.to_document(card)).collect()
    }

    /// Maps fetched documents back to records attributed to this source.
    fn to_metacards(&self, hits: &[ScoredDocument]) -> MapperResult<Vec<Metacard>> {
        hits.iter()
            .map(|hit| {
                let mut card = self.mapper.from_document(&hit.document)?;
                card.set_source_id(self.source_id());
                Ok(card)
            })
            .collect()
    }
}

fn required_attribute(attribute: Option<String>, operation: &'static str) -> CatalogResult<String> {
    attribute
        .filter(|name| !name.trim().is_empty())
        .ok_or(CatalogError::MissingAttribute { operation })
}
