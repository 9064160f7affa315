//! Index manager: the lifecycle state machine over a [`SearchEngine`].
//!
//! ```text
//!            reset_index                add_type / add / delete
//!  (any) ───────────────▶ Empty ─────────────────────────────▶ Populating
//!                           │                                      │
//!                           │ refresh_index                        │ refresh_index
//!                           ▼                                      ▼
//!                         Ready ◀──────────────────────────────────┘
//! ```
//!
//! An engine that restores persisted documents starts in `Populating`: the
//! index is usable once its record types are registered again and
//! `refresh_index` is called.
//!
//! The manager owns the type registry and the record store handle. It maps
//! records to documents, hands them to the engine, and wraps engine hits in
//! a [`ResultSet`] that rehydrates through the store.

use std::sync::Arc;

use async_trait::async_trait;
use quarry_core::Result;
use quarry_core::record::{Record, RecordType};
use quarry_core::state::{IndexState, IndexStateHandle};
use quarry_core::store::RecordStore;
use tokio::sync::RwLock;

use crate::backend::SearchBackend;
use crate::document::{Document, DocumentMapper};
use crate::engine::SearchEngine;
use crate::loader::BackendKind;
use crate::query::{self, SearchQuery};
use crate::registry::RecordTypeRegistry;
use crate::results::ResultSet;
use crate::types::BackendOptions;

/// A search backend built from an engine plus shared lifecycle logic.
pub struct IndexManager<E: SearchEngine> {
    engine: E,
    registry: RwLock<RecordTypeRegistry>,
    store: Arc<dyn RecordStore>,
    state: IndexStateHandle,
    options: BackendOptions,
}

impl<E: SearchEngine> IndexManager<E> {
    /// Wrap `engine`, rehydrating results through `store`.
    pub fn with_engine(engine: E, store: Arc<dyn RecordStore>, options: BackendOptions) -> Self {
        let state = IndexStateHandle::new(engine.kind().name());
        let restored = engine.document_count();
        if restored > 0 {
            // Schemas are not persisted; searches need the types again.
            log::info!(
                "Restored {restored} indexed documents; waiting for record types before serving"
            );
            state.set_state(IndexState::Populating);
        }
        Self {
            engine,
            registry: RwLock::new(RecordTypeRegistry::new()),
            store,
            state,
            options,
        }
    }

    /// The underlying engine.
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// The record store results are rehydrated from.
    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    async fn documents_for(&self, records: &[Record]) -> Vec<Document> {
        let registry = self.registry.read().await;
        records
            .iter()
            .filter_map(|record| match registry.resolve(&record.record_type) {
                Some(resolved) => Some(DocumentMapper::to_document(&resolved, record)),
                None => {
                    log::debug!(
                        "Skipping {}: type '{}' is not registered",
                        DocumentMapper::identity_of(record),
                        record.record_type
                    );
                    None
                }
            })
            .collect()
    }
}

#[async_trait]
impl<E: SearchEngine> SearchBackend for IndexManager<E> {
    fn name(&self) -> &str {
        self.state.name()
    }

    fn kind(&self) -> BackendKind {
        self.engine.kind()
    }

    fn options(&self) -> &BackendOptions {
        &self.options
    }

    fn state_handle(&self) -> &IndexStateHandle {
        &self.state
    }

    async fn reset_index(&self) -> Result<()> {
        self.engine.clear().await?;
        self.state.set_state(IndexState::Empty);
        Ok(())
    }

    async fn add_type(&self, record_type: RecordType) -> Result<()> {
        let name = record_type.name().to_string();
        let mut registry = self.registry.write().await;
        let outcome = registry.register(record_type);
        if !outcome.is_change() {
            return Ok(());
        }

        // Subtypes inherit fields, so their storage may change too.
        for subtype in registry.resolve_subtypes(&name) {
            if let Some(resolved) = registry.resolve(&subtype) {
                self.engine.prepare_type(&resolved).await?;
            }
        }
        log::debug!("Registered record type '{name}' ({outcome:?})");
        self.state.set_state(IndexState::Populating);
        Ok(())
    }

    async fn add(&self, record: &Record) -> Result<()> {
        self.add_bulk(std::slice::from_ref(record)).await.map(|_| ())
    }

    async fn add_bulk(&self, records: &[Record]) -> Result<usize> {
        let docs = self.documents_for(records).await;
        let staged = docs.len();
        if staged > 0 {
            self.engine.stage_upsert(docs).await?;
            self.state.set_state(IndexState::Populating);
        }
        Ok(staged)
    }

    async fn delete(&self, record: &Record) -> Result<()> {
        self.engine
            .stage_delete(&DocumentMapper::identity_of(record))
            .await?;
        self.state.set_state(IndexState::Populating);
        Ok(())
    }

    async fn refresh_index(&self) -> Result<()> {
        self.engine.commit().await?;
        self.state.set_state(IndexState::Ready);
        Ok(())
    }

    async fn search(&self, query: SearchQuery) -> Result<ResultSet> {
        let plan = {
            let registry = self.registry.read().await;
            query::compile(&query, &registry, self.options.query_mode)?
        };
        let Some(plan) = plan else {
            return Ok(ResultSet::empty());
        };

        let hits = self.engine.execute(&plan).await?;
        let results = ResultSet::new(hits, Arc::clone(&self.store));
        Ok(match query.window {
            Some(window) => results.slice(window),
            None => results,
        })
    }

    async fn registered_types(&self) -> Vec<String> {
        self.registry.read().await.names()
    }

    fn document_count(&self) -> usize {
        self.engine.document_count()
    }
}

impl<E: SearchEngine> std::fmt::Debug for IndexManager<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexManager")
            .field("kind", &self.engine.kind())
            .field("state", &self.state.state())
            .field("options", &self.options)
            .finish()
    }
}
