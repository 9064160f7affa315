//! Engine seam beneath the index manager.
//!
//! A [`SearchEngine`] stores documents and answers planned queries. It owns
//! the write staging area: upserts, deletes and clears are staged and only
//! become visible to [`execute`](SearchEngine::execute) after
//! [`commit`](SearchEngine::commit).

use std::sync::Arc;

use async_trait::async_trait;
use quarry_core::Result;

use crate::document::{Document, DocumentKey};
use crate::loader::BackendKind;
use crate::query::QueryPlan;
use crate::registry::ResolvedType;
use crate::results::HitSource;

/// Storage and query engine for one backend instance.
#[async_trait]
pub trait SearchEngine: Send + Sync + 'static {
    /// Kind tag of the backend this engine implements.
    fn kind(&self) -> BackendKind;

    /// Prepare engine storage for a newly registered or changed type.
    async fn prepare_type(&self, resolved: &ResolvedType) -> Result<()>;

    /// Stage documents for insertion, replacing any with the same identity.
    async fn stage_upsert(&self, docs: Vec<Document>) -> Result<()>;

    /// Stage removal of one identity. Unknown identities are ignored.
    async fn stage_delete(&self, key: &DocumentKey) -> Result<()>;

    /// Stage removal of every document.
    async fn clear(&self) -> Result<()>;

    /// Make every staged change visible.
    async fn commit(&self) -> Result<()>;

    /// Run a plan against the committed documents.
    async fn execute(&self, plan: &QueryPlan) -> Result<Arc<dyn HitSource>>;

    /// Committed document count.
    fn document_count(&self) -> usize;
}
