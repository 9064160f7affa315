//! Pluggable full-text search over structured records.
//!
//! Records live in a [`RecordStore`](quarry_core::RecordStore); this crate
//! keeps a search index beside them. Every backend exposes the same
//! [`SearchBackend`] contract, so callers pick one by name at startup and
//! never touch engine details.
//!
//! # Features
//!
//! - `fts-tantivy`: Enable the Tantivy backend
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      quarry-fts                             │
//! ├─────────────────────────────────────────────────────────────┤
//! │  get_backend / BackendRegistry (name or locator → backend)  │
//! ├─────────────────────────────────────────────────────────────┤
//! │  SearchBackend trait                                        │
//! │  └── IndexManager<E: SearchEngine>                          │
//! │      ├── DatabaseSearch (generational inverted index)       │
//! │      └── TantivySearch  (Tantivy, feature-gated)            │
//! ├─────────────────────────────────────────────────────────────┤
//! │  RecordTypeRegistry   DocumentMapper   FilterPredicate      │
//! │  SearchQuery → QueryPlan → HitSource → ResultSet            │
//! ├─────────────────────────────────────────────────────────────┤
//! │  IndexRebuilder (reset, register, stream, refresh)          │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use quarry_fts::{get_backend, BackendRegistry, FilterPredicate, SearchQuery};
//!
//! let backend = get_backend("default", &BackendRegistry::default(), store.clone())?;
//! backend.add_type(page_type).await?;
//! backend.add_bulk(&records).await?;
//! backend.refresh_index().await?;
//!
//! let results = backend
//!     .search(SearchQuery::new("hello", "Page").filter(FilterPredicate::eq("live", true)))
//!     .await?;
//! for record in results.slice(0..10).records().await? {
//!     println!("{}", record.pk);
//! }
//! ```

// Core modules (always available)
pub mod analysis;
pub mod backend;
pub mod database;
pub mod document;
pub mod engine;
pub mod filter;
pub mod loader;
pub mod manager;
pub mod query;
pub mod rebuild;
pub mod registry;
pub mod results;
pub mod snapshot;
pub mod types;

// Feature-gated Tantivy modules
#[cfg(feature = "fts-tantivy")]
pub mod schema;

#[cfg(feature = "fts-tantivy")]
pub mod indexer;

#[cfg(feature = "fts-tantivy")]
pub mod tantivy_search;

// Re-exports
pub use backend::SearchBackend;
pub use database::{DatabaseEngine, DatabaseSearch};
pub use document::{Document, DocumentKey, DocumentMapper};
pub use engine::SearchEngine;
pub use filter::{FilterOp, FilterPredicate};
pub use loader::{BackendKind, BackendRegistry, get_backend};
pub use manager::IndexManager;
pub use query::{QueryPlan, SearchQuery};
pub use rebuild::{IndexRebuilder, RebuildEvent, RebuildStats, rebuild_all};
pub use registry::{RecordTypeRegistry, ResolvedType};
pub use results::{Hit, HitSource, ResultSet};
pub use snapshot::{IndexMetadata, Snapshot};
pub use types::{BackendConfig, BackendOptions, BackendsConfig, QueryMode};

#[cfg(feature = "fts-tantivy")]
pub use schema::QuarrySchema;

#[cfg(feature = "fts-tantivy")]
pub use indexer::Indexer;

#[cfg(feature = "fts-tantivy")]
pub use tantivy_search::{TantivyEngine, TantivySearch};
