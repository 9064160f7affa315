//! Full index rebuild.
//!
//! `IndexRebuilder` drives the recovery path: reset the index, register
//! every record type, stream each type's records from the store into the
//! backend in batches, then refresh once at the end. Until that refresh, a
//! backend with generational commits keeps serving the previous index.
//!
//! A failed rebuild may leave staged partial state. Run it again: the first
//! step is a reset.
//!
//! # Usage
//!
//! ```rust,ignore
//! use quarry_fts::IndexRebuilder;
//!
//! let stats = IndexRebuilder::new()
//!     .with_batch_size(500)
//!     .rebuild(backend.as_ref(), &record_types, store.as_ref())
//!     .await?;
//! println!("Indexed {} documents", stats.documents_indexed);
//! ```

use std::collections::BTreeMap;

use futures::TryStreamExt;
use quarry_core::Result;
use quarry_core::record::{Record, RecordType};
use quarry_core::store::RecordStore;

use crate::backend::SearchBackend;

/// Statistics about a rebuild.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RebuildStats {
    /// Number of record types registered.
    pub types_registered: usize,
    /// Number of documents staged and committed.
    pub documents_indexed: usize,
    /// Documents indexed per record type.
    pub per_type: BTreeMap<String, usize>,
}

/// Progress notifications emitted during a rebuild.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RebuildEvent {
    /// The index was reset.
    Reset,
    /// A record type was registered.
    TypeRegistered(String),
    /// A batch of records was staged.
    BatchIndexed {
        /// Record type of the batch.
        record_type: String,
        /// Records staged for this type so far.
        total: usize,
    },
    /// A record type was fully streamed.
    TypeFinished {
        /// Record type.
        record_type: String,
        /// Records staged for this type.
        count: usize,
    },
    /// The rebuilt index was committed.
    Refreshed,
}

type ProgressFn = Box<dyn Fn(&RebuildEvent) + Send + Sync>;

/// Full index rebuild orchestration.
pub struct IndexRebuilder {
    batch_size: usize,
    progress: Option<ProgressFn>,
}

impl Default for IndexRebuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl IndexRebuilder {
    /// Create a rebuilder with the default batch size.
    pub fn new() -> Self {
        Self {
            batch_size: 100,
            progress: None,
        }
    }

    /// Set the number of records staged per call to the backend.
    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size.max(1);
        self
    }

    /// Receive progress events.
    pub fn with_progress<F>(mut self, progress: F) -> Self
    where
        F: Fn(&RebuildEvent) + Send + Sync + 'static,
    {
        self.progress = Some(Box::new(progress));
        self
    }

    /// Rebuild `backend` from every record of `record_types` in `store`.
    pub async fn rebuild(
        &self,
        backend: &dyn SearchBackend,
        record_types: &[RecordType],
        store: &dyn RecordStore,
    ) -> Result<RebuildStats> {
        let mut stats = RebuildStats::default();

        backend.reset_index().await?;
        self.emit(RebuildEvent::Reset);

        for record_type in record_types {
            let name = record_type.name().to_string();
            backend.add_type(record_type.clone()).await?;
            stats.types_registered += 1;
            self.emit(RebuildEvent::TypeRegistered(name));
        }

        for record_type in record_types {
            let count = self.index_type(backend, record_type.name(), store).await?;
            stats.documents_indexed += count;
            stats.per_type.insert(record_type.name().to_string(), count);
        }

        backend.refresh_index().await?;
        self.emit(RebuildEvent::Refreshed);

        log::info!(
            "Rebuilt {} index: {} types, {} documents",
            backend.name(),
            stats.types_registered,
            stats.documents_indexed
        );
        Ok(stats)
    }

    async fn index_type(
        &self,
        backend: &dyn SearchBackend,
        record_type: &str,
        store: &dyn RecordStore,
    ) -> Result<usize> {
        let mut records = store.scan(record_type);
        let mut batch: Vec<Record> = Vec::with_capacity(self.batch_size);
        let mut total = 0;

        while let Some(record) = records.try_next().await? {
            batch.push(record);
            if batch.len() >= self.batch_size {
                total += backend.add_bulk(&batch).await?;
                batch.clear();
                self.emit(RebuildEvent::BatchIndexed {
                    record_type: record_type.to_string(),
                    total,
                });
            }
        }
        if !batch.is_empty() {
            total += backend.add_bulk(&batch).await?;
            self.emit(RebuildEvent::BatchIndexed {
                record_type: record_type.to_string(),
                total,
            });
        }

        self.emit(RebuildEvent::TypeFinished {
            record_type: record_type.to_string(),
            count: total,
        });
        Ok(total)
    }

    fn emit(&self, event: RebuildEvent) {
        log::debug!("Rebuild progress: {event:?}");
        if let Some(progress) = &self.progress {
            progress(&event);
        }
    }
}

impl std::fmt::Debug for IndexRebuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexRebuilder")
            .field("batch_size", &self.batch_size)
            .field("progress", &self.progress.is_some())
            .finish()
    }
}

/// Rebuild with default settings.
pub async fn rebuild_all(
    backend: &dyn SearchBackend,
    record_types: &[RecordType],
    store: &dyn RecordStore,
) -> Result<RebuildStats> {
    IndexRebuilder::new()
        .rebuild(backend, record_types, store)
        .await
}

// ============================================================================
// Tests
// ============================================================================
