//! Search backend trait.
//!
//! This module defines the `SearchBackend` trait that all search
//! implementations satisfy: the index lifecycle (reset, register type,
//! add, delete, refresh) plus query execution.
//!
//! # Backends
//!
//! - `DatabaseSearch`: embedded generational inverted index (always available)
//! - `TantivySearch`: Tantivy index (requires `fts-tantivy` feature)
//!
//! # Example
//!
//! ```rust,ignore
//! use quarry_fts::{get_backend, BackendRegistry, SearchQuery};
//!
//! let backend = get_backend("default", &BackendRegistry::default(), store)?;
//! backend.add_type(page_type).await?;
//! backend.add(&record).await?;
//! backend.refresh_index().await?;
//!
//! let results = backend.search(SearchQuery::new("hello", "Page")).await?;
//! println!("Found {} results", results.len());
//! ```

use async_trait::async_trait;
use quarry_core::Result;
use quarry_core::record::{Record, RecordType};
use quarry_core::state::{IndexState, IndexStateHandle};

use crate::loader::BackendKind;
use crate::query::SearchQuery;
use crate::results::ResultSet;
use crate::types::BackendOptions;

/// Abstract search backend trait.
///
/// Writes are staged; [`refresh_index`](Self::refresh_index) is the single
/// point after which they are guaranteed visible to searches. Between a
/// write and the next refresh, concurrent searches may or may not see it.
///
/// `reset_index` and full rebuilds must be serialized by the caller.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Get the backend name for diagnostics.
    fn name(&self) -> &str;

    /// Concrete backend kind.
    fn kind(&self) -> BackendKind;

    /// Options the backend was built with.
    fn options(&self) -> &BackendOptions;

    /// Lifecycle state handle.
    fn state_handle(&self) -> &IndexStateHandle;

    /// Current lifecycle state.
    fn state(&self) -> IndexState {
        self.state_handle().state()
    }

    /// Whether every staged write has been committed.
    fn is_ready(&self) -> bool {
        self.state().is_ready()
    }

    /// Discard every document of every type. Idempotent.
    ///
    /// Registered types are kept. The reset is staged like any other write.
    async fn reset_index(&self) -> Result<()>;

    /// Register a record type and prepare storage for it.
    async fn add_type(&self, record_type: RecordType) -> Result<()>;

    /// Index or re-index one record. Unregistered types are skipped.
    async fn add(&self, record: &Record) -> Result<()>;

    /// Index many records, returning how many were staged.
    async fn add_bulk(&self, records: &[Record]) -> Result<usize>;

    /// Remove a record's document. Unknown records are ignored.
    async fn delete(&self, record: &Record) -> Result<()>;

    /// Commit staged writes.
    async fn refresh_index(&self) -> Result<()>;

    /// Execute a search.
    ///
    /// Blank text and unregistered target types return an empty result set.
    async fn search(&self, query: SearchQuery) -> Result<ResultSet>;

    /// Names of registered record types.
    async fn registered_types(&self) -> Vec<String>;

    /// Number of committed documents.
    fn document_count(&self) -> usize;
}
