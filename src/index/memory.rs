//! In-process reference index
//!
//! Documents are keyed by `id_txt`. Added documents stay pending until a
//! commit, so readers only ever see whole batches. The document set can
//! be saved to and loaded from a JSON snapshot file.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::client::{IndexClient, QueryResponse, ScoredDocument};
use super::errors::{IndexError, IndexResult};
use super::eval;
use crate::mapper::IndexDocument;
use crate::query::{Clause, NativeQuery, ScoreMode, SortOrder};
use crate::schema::fields::{ID_FIELD, SCORE_FIELD};

#[derive(Debug, Default)]
struct IndexState {
    visible: BTreeMap<String, IndexDocument>,
    pending: BTreeMap<String, IndexDocument>,
}

#[derive(Serialize, Deserialize)]
struct Snapshot {
    documents: Vec<IndexDocument>,
}

/// Thread-safe in-memory index.
#[derive(Debug)]
pub struct MemoryIndex {
    state: RwLock<IndexState>,
    available: AtomicBool,
}

impl Default for MemoryIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryIndex {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(IndexState::default()),
            available: AtomicBool::new(true),
        }
    }

    /// Opens the snapshot at `path`, or an empty index if it does not exist.
    pub fn open(path: &Path) -> IndexResult<Self> {
        let index = Self::new();
        if path.exists() {
            index.load_snapshot(path)?;
        }
        Ok(index)
    }

    /// Replaces the visible documents with the snapshot's contents.
    pub fn load_snapshot(&self, path: &Path) -> IndexResult<usize> {
        let content = fs::read_to_string(path)
            .map_err(|e| IndexError::io("failed to read index snapshot", path, e))?;
        let snapshot: Snapshot = serde_json::from_str(&content).map_err(|e| IndexError::Snapshot {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let mut visible = BTreeMap::new();
        for document in snapshot.documents {
            let id = document.id().map(str::to_string).ok_or_else(|| IndexError::Snapshot {
                path: path.to_path_buf(),
                reason: format!("document without {}", ID_FIELD),
            })?;
            visible.insert(id, document);
        }

        let count = visible.len();
        let mut state = self.write_state();
        state.visible = visible;
        state.pending.clear();
        info!(path = %path.display(), documents = count, "loaded index snapshot");
        Ok(count)
    }

    /// Writes the visible documents to `path`, replacing it atomically.
    pub fn save_snapshot(&self, path: &Path) -> IndexResult<usize> {
        let snapshot = Snapshot {
            documents: self.read_state().visible.values().cloned().collect(),
        };
        let json = serde_json::to_string_pretty(&snapshot).map_err(|e| IndexError::Snapshot {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let temp = path.with_extension("tmp");
        let mut file =
            File::create(&temp).map_err(|e| IndexError::io("failed to create index snapshot", &temp, e))?;
        file.write_all(json.as_bytes())
            .map_err(|e| IndexError::io("failed to write index snapshot", &temp, e))?;
        file.sync_all()
            .map_err(|e| IndexError::io("failed to sync index snapshot", &temp, e))?;
        fs::rename(&temp, path).map_err(|e| IndexError::io("failed to replace index snapshot", path, e))?;

        info!(path = %path.display(), documents = snapshot.documents.len(), "saved index snapshot");
        Ok(snapshot.documents.len())
    }

    /// Makes every pending document visible.
    pub fn commit(&self) {
        let mut state = self.write_state();
        let pending = std::mem::take(&mut state.pending);
        let count = pending.len();
        state.visible.extend(pending);
        debug!(documents = count, "committed pending documents");
    }

    /// Simulates the backend going away or coming back.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, AtomicOrdering::SeqCst);
    }

    /// Number of visible documents.
    pub fn len(&self) -> usize {
        self.read_state().visible.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn pending_len(&self) -> usize {
        self.read_state().pending.len()
    }

    /// Visible document by unique key.
    pub fn get(&self, id: &str) -> Option<IndexDocument> {
        self.read_state().visible.get(id).cloned()
    }

    fn ensure_available(&self) -> IndexResult<()> {
        if self.available.load(AtomicOrdering::SeqCst) {
            Ok(())
        } else {
            Err(IndexError::Unavailable("in-memory index is offline".to_string()))
        }
    }

    fn read_state(&self) -> RwLockReadGuard<'_, IndexState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, IndexState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl IndexClient for MemoryIndex {
    fn add(&self, documents: Vec<IndexDocument>, force_commit: bool) -> IndexResult<()> {
        self.ensure_available()?;

        let mut keyed = Vec::with_capacity(documents.len());
        for document in documents {
            let id = document
                .id()
                .map(str::to_string)
                .ok_or_else(|| IndexError::Rejected(format!("document without {}", ID_FIELD)))?;
            keyed.push((id, document));
        }

        let count = keyed.len();
        self.write_state().pending.extend(keyed);
        debug!(documents = count, force_commit, "added documents");

        if force_commit {
            self.commit();
        }
        Ok(())
    }

    fn query(&self, query: &NativeQuery) -> IndexResult<QueryResponse> {
        self.ensure_available()?;

        let uses_score = query.include_score || query.sort.iter().any(|s| s.field == SCORE_FIELD);
        let state = self.read_state();
        let mut hits: Vec<(&IndexDocument, Option<f64>)> = state
            .visible
            .values()
            .filter(|doc| eval::matches(&query.clause, doc))
            .map(|doc| {
                let score = uses_score.then(|| score_of(query, doc)).flatten();
                (doc, score)
            })
            .collect();

        hits.sort_by(|a, b| compare_hits(query, a, b));

        let num_found = hits.len();
        let documents = hits
            .into_iter()
            .skip(query.start)
            .take(query.rows)
            .map(|(doc, score)| ScoredDocument {
                document: doc.clone(),
                score: score.filter(|_| query.include_score),
            })
            .collect();

        debug!(query = %query, num_found, "executed query");
        Ok(QueryResponse { documents, num_found })
    }

    fn delete_by_query(&self, clause: &Clause) -> IndexResult<usize> {
        self.ensure_available()?;

        let mut state = self.write_state();
        let before = state.visible.len() + state.pending.len();
        state.visible.retain(|_, doc| !eval::matches(clause, doc));
        state.pending.retain(|_, doc| !eval::matches(clause, doc));
        let removed = before - state.visible.len() - state.pending.len();

        debug!(removed, "deleted documents by query");
        Ok(removed)
    }

    fn ping(&self) -> IndexResult<()> {
        self.ensure_available()
    }

    fn field_names(&self) -> IndexResult<Vec<String>> {
        self.ensure_available()?;

        let state = self.read_state();
        let names: BTreeSet<String> = state
            .visible
            .values()
            .chain(state.pending.values())
            .flat_map(|doc| doc.field_names().cloned())
            .collect();
        Ok(names.into_iter().collect())
    }
}

fn score_of(query: &NativeQuery, doc: &IndexDocument) -> Option<f64> {
    match query.score_mode {
        ScoreMode::Relevance => Some(eval::relevance(&query.clause, doc)),
        ScoreMode::Distance => query
            .distance_anchor
            .as_ref()
            .and_then(|anchor| eval::distance(doc, &anchor.field, anchor.point)),
    }
}

/// Sort clauses in order, missing values last, then ascending unique key.
fn compare_hits(
    query: &NativeQuery,
    a: &(&IndexDocument, Option<f64>),
    b: &(&IndexDocument, Option<f64>),
) -> Ordering {
    for sort in &query.sort {
        let ordering = if sort.field == SCORE_FIELD {
            directed(a.1.as_ref(), b.1.as_ref(), sort.order, |x, y| x.partial_cmp(y))
        } else {
            directed(a.0.first(&sort.field), b.0.first(&sort.field), sort.order, |x, y| x.compare(y))
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    a.0.id().cmp(&b.0.id())
}

fn directed<T>(
    a: Option<&T>,
    b: Option<&T>,
    order: SortOrder,
    compare: impl Fn(&T, &T) -> Option<Ordering>,
) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(x), Some(y)) => {
            let natural = compare(x, y).unwrap_or(Ordering::Equal);
            match order {
                SortOrder::Ascending => natural,
                SortOrder::Descending => natural.reverse(),
            }
        }
    }
}
