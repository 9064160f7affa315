//! Lazy, sliceable result sets.
//!
//! A [`ResultSet`] is a window over ranked hits held by an engine-specific
//! [`HitSource`]. Its length is known up front from the index; hits are
//! only ranked and fetched for the window actually read, and records are
//! rehydrated from the store one hit at a time. Hits whose source record
//! has been deleted since indexing are dropped from the realised output,
//! so [`ResultSet::len`] may exceed the number of records returned.

use std::ops::{Bound, RangeBounds};
use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use quarry_core::Result;
use quarry_core::record::Record;
use quarry_core::store::RecordStore;

use crate::document::{DocumentKey, DocumentMapper};

/// A ranked match.
#[derive(Debug, Clone, PartialEq)]
pub struct Hit {
    /// Identity of the matched document.
    pub key: DocumentKey,
    /// Relevance score, higher first.
    pub score: f32,
}

/// Ranked hits produced by one query execution.
#[async_trait]
pub trait HitSource: Send + Sync {
    /// Number of matches at index time.
    fn count(&self) -> usize;

    /// Hits at ranks `[start, end)`; `end` never exceeds [`count`](Self::count).
    async fn fetch(&self, start: usize, end: usize) -> Result<Vec<Hit>>;
}

#[derive(Clone)]
struct Backing {
    hits: Arc<dyn HitSource>,
    store: Arc<dyn RecordStore>,
}

/// Ordered, lazily realised search results.
#[derive(Clone)]
pub struct ResultSet {
    backing: Option<Backing>,
    start: usize,
    end: usize,
}

impl ResultSet {
    /// Results over every hit of `hits`, rehydrated through `store`.
    pub fn new(hits: Arc<dyn HitSource>, store: Arc<dyn RecordStore>) -> Self {
        let end = hits.count();
        Self {
            backing: Some(Backing { hits, store }),
            start: 0,
            end,
        }
    }

    /// A result set with nothing in it.
    pub fn empty() -> Self {
        Self {
            backing: None,
            start: 0,
            end: 0,
        }
    }

    /// Number of hits in this window, as counted by the index.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Whether the window holds no hits.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sub-window relative to this one. Bounds past the end are clamped.
    pub fn slice(&self, range: impl RangeBounds<usize>) -> Self {
        let len = self.len();
        let lo = match range.start_bound() {
            Bound::Included(&n) => n,
            Bound::Excluded(&n) => n.saturating_add(1),
            Bound::Unbounded => 0,
        }
        .min(len);
        let hi = match range.end_bound() {
            Bound::Included(&n) => n.saturating_add(1),
            Bound::Excluded(&n) => n,
            Bound::Unbounded => len,
        }
        .clamp(lo, len);

        Self {
            backing: self.backing.clone(),
            start: self.start + lo,
            end: self.start + hi,
        }
    }

    /// Ranked hits in this window, without rehydration.
    pub async fn hits(&self) -> Result<Vec<Hit>> {
        match &self.backing {
            Some(backing) if !self.is_empty() => backing.hits.fetch(self.start, self.end).await,
            _ => Ok(Vec::new()),
        }
    }

    /// The record at `index`, or `None` when out of range or stale.
    pub async fn get(&self, index: usize) -> Result<Option<Record>> {
        if index >= self.len() {
            return Ok(None);
        }
        let mut records = self.slice(index..index + 1).records().await?;
        Ok(records.pop())
    }

    /// Rehydrate every hit in this window, skipping stale ones.
    pub async fn records(&self) -> Result<Vec<Record>> {
        let Some(backing) = &self.backing else {
            return Ok(Vec::new());
        };
        let hits = self.hits().await?;
        rehydrate_all(backing.store.as_ref(), &hits).await
    }

    /// Stream rehydrated records, fetching `page_size` hits at a time.
    pub fn stream(&self, page_size: usize) -> BoxStream<'static, Result<Record>> {
        let page_size = page_size.max(1);
        let pages = stream::unfold(
            (self.clone(), 0usize, false),
            move |(results, offset, failed)| async move {
                if failed || offset >= results.len() {
                    return None;
                }
                let next = (offset + page_size).min(results.len());
                match results.slice(offset..next).records().await {
                    Ok(records) => {
                        let page: Vec<Result<Record>> = records.into_iter().map(Ok).collect();
                        Some((page, (results, next, false)))
                    }
                    Err(e) => Some((vec![Err(e)], (results, next, true))),
                }
            },
        );
        pages.flat_map(stream::iter).boxed()
    }
}

impl std::fmt::Debug for ResultSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultSet")
            .field("start", &self.start)
            .field("end", &self.end)
            .finish()
    }
}

async fn rehydrate_all(store: &dyn RecordStore, hits: &[Hit]) -> Result<Vec<Record>> {
    let mut records = Vec::with_capacity(hits.len());
    for hit in hits {
        if let Some(record) = DocumentMapper::rehydrate(store, &hit.key).await? {
            records.push(record);
        }
    }
    Ok(records)
}

/// Hits already ranked in memory.
#[derive(Debug, Default)]
pub struct StaticHits {
    hits: Vec<Hit>,
}

impl StaticHits {
    /// Wrap hits that are already in rank order.
    pub fn new(hits: Vec<Hit>) -> Self {
        Self { hits }
    }
}

#[async_trait]
impl HitSource for StaticHits {
    fn count(&self) -> usize {
        self.hits.len()
    }

    async fn fetch(&self, start: usize, end: usize) -> Result<Vec<Hit>> {
        let end = end.min(self.hits.len());
        let start = start.min(end);
        Ok(self.hits[start..end].to_vec())
    }
}

// ============================================================================
// Tests
// ============================================================================
