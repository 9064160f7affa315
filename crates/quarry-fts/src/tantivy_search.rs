//! Tantivy search backend implementation.
//!
//! Provides `TantivySearch`, a backend over a Tantivy index. This module is
//! only available with the `fts-tantivy` feature.
//!
//! A planned query becomes one `BooleanQuery`:
//!
//! - the text clause, one `TermQuery` per term (`Must` or `Should` per mode)
//! - a zero-score type clause accepting any of the planned record types
//! - one zero-score clause per filter predicate, accepting any operand
//!
//! Filter and type clauses contribute no score, so filtering never reorders
//! matches. Field boosts are not applied: all searchable text shares one
//! Tantivy field. Ties are left in Tantivy's own order, which is stable for
//! a given committed index.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use quarry_core::record::PrimaryKey;
use quarry_core::store::RecordStore;
use quarry_core::{Error, Result};
use tantivy::collector::{Count, TopDocs};
use tantivy::query::{BooleanQuery, ConstScoreQuery, Occur, Query, TermQuery};
use tantivy::schema::{Field, IndexRecordOption, Value};
use tantivy::{Searcher, TantivyDocument, Term};

use crate::document::{Document, DocumentKey};
use crate::engine::SearchEngine;
use crate::indexer::Indexer;
use crate::loader::BackendKind;
use crate::manager::IndexManager;
use crate::query::QueryPlan;
use crate::registry::ResolvedType;
use crate::results::{Hit, HitSource, StaticHits};
use crate::schema::QuarrySchema;
use crate::types::BackendOptions;

/// Tantivy-based search backend.
pub type TantivySearch = IndexManager<TantivyEngine>;

impl IndexManager<TantivyEngine> {
    /// Create a Tantivy backend.
    ///
    /// Opens or creates the index at `options.index_path`, or builds one in
    /// memory when no path is configured.
    pub fn new(options: BackendOptions, store: Arc<dyn RecordStore>) -> Result<Self> {
        let engine = TantivyEngine::open(&options)?;
        Ok(Self::with_engine(engine, store, options))
    }
}

/// Tantivy engine behind [`TantivySearch`].
#[derive(Debug)]
pub struct TantivyEngine {
    indexer: Indexer,
}

impl TantivyEngine {
    /// Open the engine for `options`.
    pub fn open(options: &BackendOptions) -> Result<Self> {
        let schema = QuarrySchema::build();
        let indexer = match &options.index_path {
            Some(path) => Indexer::new(Path::new(path), &schema, options.writer_buffer_bytes)?,
            None => Indexer::new_in_memory(&schema, options.writer_buffer_bytes)?,
        };
        Ok(Self { indexer })
    }

    /// Check if an index exists at the given path.
    pub fn index_exists(index_path: &Path) -> bool {
        index_path.join("meta.json").exists()
    }

    fn build_query(&self, plan: &QueryPlan) -> Box<dyn Query> {
        let s = self.indexer.schema();

        let occur = if plan.require_all {
            Occur::Must
        } else {
            Occur::Should
        };
        let text_clauses = plan
            .terms
            .iter()
            .map(|term| (occur, term_query(s.text, term, IndexRecordOption::WithFreqs)))
            .collect();

        let type_clauses = plan
            .record_types
            .iter()
            .map(|t| (Occur::Should, term_query(s.record_type, t, IndexRecordOption::Basic)))
            .collect();

        let mut clauses: Vec<(Occur, Box<dyn Query>)> = vec![
            (Occur::Must, Box::new(BooleanQuery::new(text_clauses)) as Box<dyn Query>),
            (Occur::Must, zero_score(BooleanQuery::new(type_clauses))),
        ];

        for predicate in &plan.filters {
            let options = predicate
                .values()
                .iter()
                .map(|value| {
                    let token = QuarrySchema::facet_token(&predicate.field, value);
                    (Occur::Should, term_query(s.facets, &token, IndexRecordOption::Basic))
                })
                .collect();
            clauses.push((Occur::Must, zero_score(BooleanQuery::new(options))));
        }

        Box::new(BooleanQuery::new(clauses))
    }
}

fn term_query(field: Field, text: &str, option: IndexRecordOption) -> Box<dyn Query> {
    Box::new(TermQuery::new(Term::from_field_text(field, text), option))
}

fn zero_score(query: BooleanQuery) -> Box<dyn Query> {
    Box::new(ConstScoreQuery::new(Box::new(query), 0.0))
}

#[async_trait]
impl SearchEngine for TantivyEngine {
    fn kind(&self) -> BackendKind {
        BackendKind::Tantivy
    }

    async fn prepare_type(&self, resolved: &ResolvedType) -> Result<()> {
        log::debug!("Tantivy index ready for '{}'", resolved.name());
        Ok(())
    }

    async fn stage_upsert(&self, docs: Vec<Document>) -> Result<()> {
        self.indexer.upsert(&docs)
    }

    async fn stage_delete(&self, key: &DocumentKey) -> Result<()> {
        self.indexer.delete(key)
    }

    async fn clear(&self) -> Result<()> {
        self.indexer.clear()
    }

    async fn commit(&self) -> Result<()> {
        let opstamp = self.indexer.commit()?;
        log::info!(
            "Committed Tantivy index at opstamp {opstamp} ({} documents)",
            self.document_count()
        );
        Ok(())
    }

    async fn execute(&self, plan: &QueryPlan) -> Result<Arc<dyn HitSource>> {
        if plan.filters.iter().any(|f| f.values().is_empty()) {
            return Ok(Arc::new(StaticHits::default()));
        }

        let query = self.build_query(plan);
        let searcher = self.indexer.searcher();
        let count = searcher
            .search(query.as_ref(), &Count)
            .map_err(|e| Error::engine_with_source("Search failed", e))?;

        Ok(Arc::new(TantivyHits {
            searcher,
            query,
            schema: self.indexer.schema().clone(),
            count,
        }))
    }

    fn document_count(&self) -> usize {
        self.indexer.searcher().num_docs() as usize
    }
}

/// Hits of one query against one searcher generation.
struct TantivyHits {
    searcher: Searcher,
    query: Box<dyn Query>,
    schema: QuarrySchema,
    count: usize,
}

impl TantivyHits {
    fn identity(&self, doc: &TantivyDocument) -> Result<DocumentKey> {
        let record_type = doc
            .get_first(self.schema.record_type)
            .and_then(|v| v.as_str())
            .map(String::from);
        let pk = doc.get_first(self.schema.pk).and_then(|v| v.as_i64());
        match (record_type, pk) {
            (Some(record_type), Some(pk)) => Ok(DocumentKey::new(record_type, PrimaryKey(pk))),
            _ => Err(Error::engine("Indexed document is missing its identity")),
        }
    }
}

#[async_trait]
impl HitSource for TantivyHits {
    fn count(&self) -> usize {
        self.count
    }

    async fn fetch(&self, start: usize, end: usize) -> Result<Vec<Hit>> {
        let end = end.min(self.count);
        if start >= end {
            return Ok(Vec::new());
        }

        let top_docs = self
            .searcher
            .search(
                self.query.as_ref(),
                &TopDocs::with_limit(end - start).and_offset(start),
            )
            .map_err(|e| Error::engine_with_source("Search failed", e))?;

        let mut hits = Vec::with_capacity(top_docs.len());
        for (score, address) in top_docs {
            let doc: TantivyDocument = self
                .searcher
                .doc(address)
                .map_err(|e| Error::engine_with_source("Failed to retrieve document", e))?;
            hits.push(Hit {
                key: self.identity(&doc)?,
                score,
            });
        }
        Ok(hits)
    }
}

// ============================================================================
// Tests
// ============================================================================
