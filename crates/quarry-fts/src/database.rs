//! Embedded database backend.
//!
//! `DatabaseSearch` keeps an inverted index in memory as a sequence of
//! immutable generations. Writes are staged; `refresh_index` folds them
//! into a new generation and swaps it in. A search captures the generation
//! current when it starts and keeps reading it, so a rebuild in progress
//! never disturbs queries already running against the previous one.
//!
//! # Ranking
//!
//! Each query term contributes `idf × saturated(tf)`, where the term
//! frequency is summed across searchable fields weighted by field boost:
//!
//! ```text
//! idf   = ln(1 + (N - df + 0.5) / (df + 0.5))
//! score = Σ idf × tf × (K1 + 1) / (tf + K1)
//! ```
//!
//! Equal scores order by ascending `(primary key, record type)`.
//!
//! With an `index_path`, every committed generation is also written as a
//! [`Snapshot`] and reloaded on the next start.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, RwLock};

use async_trait::async_trait;
use quarry_core::store::RecordStore;
use quarry_core::{Error, Result};

use crate::analysis;
use crate::document::{Document, DocumentKey};
use crate::engine::SearchEngine;
use crate::filter;
use crate::loader::BackendKind;
use crate::manager::IndexManager;
use crate::query::QueryPlan;
use crate::registry::ResolvedType;
use crate::results::{Hit, HitSource};
use crate::snapshot::{IndexMetadata, Snapshot};
use crate::types::BackendOptions;

/// Term frequency saturation.
const K1: f32 = 1.2;

/// Database-backed search backend.
pub type DatabaseSearch = IndexManager<DatabaseEngine>;

impl IndexManager<DatabaseEngine> {
    /// Create a database backend, reloading any snapshot at `options.index_path`.
    pub fn new(options: BackendOptions, store: Arc<dyn RecordStore>) -> Result<Self> {
        let engine = DatabaseEngine::open(&options)?;
        Ok(Self::with_engine(engine, store, options))
    }
}

// ============================================================================
// Generations
// ============================================================================

/// One committed, immutable state of the index.
#[derive(Debug, Default)]
struct Generation {
    number: u64,
    docs: BTreeMap<DocumentKey, Document>,
    /// term → document → boost-weighted term frequency
    postings: HashMap<String, BTreeMap<DocumentKey, f32>>,
}

impl Generation {
    fn build(number: u64, docs: BTreeMap<DocumentKey, Document>) -> Self {
        let mut postings: HashMap<String, BTreeMap<DocumentKey, f32>> = HashMap::new();
        for (key, doc) in &docs {
            for (field, text) in doc.searchable_text() {
                for (term, tf) in analysis::term_frequencies(&text) {
                    *postings
                        .entry(term)
                        .or_default()
                        .entry(key.clone())
                        .or_insert(0.0) += tf as f32 * field.boost;
                }
            }
        }
        Self {
            number,
            docs,
            postings,
        }
    }

    fn idf(&self, df: usize) -> f32 {
        let n = self.docs.len() as f32;
        let df = df as f32;
        (1.0 + (n - df + 0.5) / (df + 0.5)).ln()
    }

    fn matches(&self, plan: &QueryPlan) -> Vec<Hit> {
        let mut scores: HashMap<&DocumentKey, (f32, usize)> = HashMap::new();
        for term in &plan.terms {
            let Some(posting) = self.postings.get(term) else {
                if plan.require_all {
                    return Vec::new();
                }
                continue;
            };
            let idf = self.idf(posting.len());
            for (key, &tf) in posting {
                if !plan.accepts_type(&key.record_type) {
                    continue;
                }
                let entry = scores.entry(key).or_insert((0.0, 0));
                entry.0 += idf * tf * (K1 + 1.0) / (tf + K1);
                entry.1 += 1;
            }
        }

        let needed = if plan.require_all { plan.terms.len() } else { 1 };
        scores
            .into_iter()
            .filter(|(_, (_, matched))| *matched >= needed)
            .filter(|(key, _)| {
                self.docs
                    .get(*key)
                    .is_some_and(|doc| filter::matches_all(&plan.filters, doc))
            })
            .map(|(key, (score, _))| Hit {
                key: key.clone(),
                score,
            })
            .collect()
    }
}

#[derive(Debug)]
enum PendingOp {
    Upsert(Document),
    Delete(DocumentKey),
}

#[derive(Debug, Default)]
struct Pending {
    cleared: bool,
    ops: Vec<PendingOp>,
}

impl Pending {
    fn is_empty(&self) -> bool {
        !self.cleared && self.ops.is_empty()
    }
}

// ============================================================================
// Engine
// ============================================================================

/// Generational in-memory inverted index.
#[derive(Debug)]
pub struct DatabaseEngine {
    current: RwLock<Arc<Generation>>,
    pending: tokio::sync::Mutex<Pending>,
    index_path: Option<PathBuf>,
}

impl DatabaseEngine {
    /// In-memory engine with nothing indexed.
    pub fn in_memory() -> Self {
        Self {
            current: RwLock::new(Arc::new(Generation::default())),
            pending: tokio::sync::Mutex::new(Pending::default()),
            index_path: None,
        }
    }

    /// Open an engine for `options`, restoring the last snapshot if any.
    pub fn open(options: &BackendOptions) -> Result<Self> {
        let Some(index_path) = options.index_path.as_ref().map(PathBuf::from) else {
            return Ok(Self::in_memory());
        };

        std::fs::create_dir_all(&index_path).map_err(|e| Error::io_with_path(e, &index_path))?;

        let generation = match Snapshot::load(&index_path) {
            Ok(Some(snapshot)) => {
                let docs = snapshot
                    .documents
                    .into_iter()
                    .map(|doc| (doc.key.clone(), doc))
                    .collect();
                log::info!(
                    "Restored index generation {} from {}",
                    snapshot.metadata.generation,
                    index_path.display()
                );
                Generation::build(snapshot.metadata.generation, docs)
            }
            Ok(None) => Generation::default(),
            Err(e) => {
                log::warn!("Starting with an empty index: {e}");
                Generation::default()
            }
        };

        Ok(Self {
            current: RwLock::new(Arc::new(generation)),
            pending: tokio::sync::Mutex::new(Pending::default()),
            index_path: Some(index_path),
        })
    }

    /// Number of the committed generation.
    pub fn generation(&self) -> u64 {
        self.current().map(|g| g.number).unwrap_or(0)
    }

    fn current(&self) -> Result<Arc<Generation>> {
        self.current
            .read()
            .map(|g| Arc::clone(&g))
            .map_err(|e| Error::engine(format!("generation lock poisoned: {e}")))
    }
}

#[async_trait]
impl SearchEngine for DatabaseEngine {
    fn kind(&self) -> BackendKind {
        BackendKind::Database
    }

    async fn prepare_type(&self, resolved: &ResolvedType) -> Result<()> {
        log::debug!(
            "Database index ready for '{}' ({} fields)",
            resolved.name(),
            resolved.fields().len()
        );
        Ok(())
    }

    async fn stage_upsert(&self, docs: Vec<Document>) -> Result<()> {
        let mut pending = self.pending.lock().await;
        pending.ops.extend(docs.into_iter().map(PendingOp::Upsert));
        Ok(())
    }

    async fn stage_delete(&self, key: &DocumentKey) -> Result<()> {
        let mut pending = self.pending.lock().await;
        pending.ops.push(PendingOp::Delete(key.clone()));
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        let mut pending = self.pending.lock().await;
        pending.cleared = true;
        pending.ops.clear();
        Ok(())
    }

    async fn commit(&self) -> Result<()> {
        let mut pending = self.pending.lock().await;
        if pending.is_empty() {
            return Ok(());
        }

        let current = self.current()?;
        let mut docs = if pending.cleared {
            BTreeMap::new()
        } else {
            current.docs.clone()
        };
        for op in &pending.ops {
            match op {
                PendingOp::Upsert(doc) => {
                    docs.insert(doc.key.clone(), doc.clone());
                }
                PendingOp::Delete(key) => {
                    docs.remove(key);
                }
            }
        }
        let next = Generation::build(current.number + 1, docs);

        if let Some(index_path) = &self.index_path {
            let snapshot = Snapshot {
                metadata: IndexMetadata::new(next.number, next.docs.len()),
                documents: next.docs.values().cloned().collect(),
            };
            let index_path = index_path.clone();
            tokio::task::spawn_blocking(move || snapshot.save(&index_path))
                .await
                .map_err(|e| Error::engine(format!("spawn_blocking failed: {e}")))??;
        }

        let (number, count) = (next.number, next.docs.len());
        *self
            .current
            .write()
            .map_err(|e| Error::engine(format!("generation lock poisoned: {e}")))? = Arc::new(next);
        *pending = Pending::default();

        log::info!("Committed index generation {number} ({count} documents)");
        Ok(())
    }

    async fn execute(&self, plan: &QueryPlan) -> Result<Arc<dyn HitSource>> {
        let generation = self.current()?;
        let hits = generation.matches(plan);
        log::debug!(
            "Generation {} matched {} documents",
            generation.number,
            hits.len()
        );
        Ok(Arc::new(RankedHits::new(hits)))
    }

    fn document_count(&self) -> usize {
        self.current().map(|g| g.docs.len()).unwrap_or(0)
    }
}

// ============================================================================
// Ranking
// ============================================================================

fn rank_order(a: &Hit, b: &Hit) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.key.cmp(&b.key))
}

#[derive(Debug)]
struct RankState {
    hits: Vec<Hit>,
    /// `hits[..sorted]` is in final rank order and outranks everything after it.
    sorted: usize,
}

impl RankState {
    fn rank_prefix(&mut self, end: usize) {
        if end <= self.sorted {
            return;
        }
        let rest = &mut self.hits[self.sorted..];
        let take = end - self.sorted;
        if take < rest.len() {
            rest.select_nth_unstable_by(take - 1, rank_order);
        }
        rest[..take].sort_by(rank_order);
        self.sorted = end;
    }
}

/// Matches ranked on demand, only as far as a window needs.
#[derive(Debug)]
struct RankedHits {
    count: usize,
    state: Mutex<RankState>,
}

impl RankedHits {
    fn new(hits: Vec<Hit>) -> Self {
        Self {
            count: hits.len(),
            state: Mutex::new(RankState { hits, sorted: 0 }),
        }
    }
}

#[async_trait]
impl HitSource for RankedHits {
    fn count(&self) -> usize {
        self.count
    }

    async fn fetch(&self, start: usize, end: usize) -> Result<Vec<Hit>> {
        let mut state = self
            .state
            .lock()
            .map_err(|e| Error::engine(format!("rank state lock poisoned: {e}")))?;
        let end = end.min(state.hits.len());
        let start = start.min(end);
        state.rank_prefix(end);
        Ok(state.hits[start..end].to_vec())
    }
}

// ============================================================================
// Tests
// ============================================================================
