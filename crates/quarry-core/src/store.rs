//! Record storage collaborator.
//!
//! Search backends never own records. They hold identities and ask a
//! [`RecordStore`] for the live record when a match is realised, and
//! enumerate a type's records through it during a full rebuild.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::RwLock;

use async_trait::async_trait;
use futures::StreamExt;
use futures::stream::{self, BoxStream};

use crate::error::{Error, Result};
use crate::record::{PrimaryKey, Record};

/// Access to the persistent record store.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Fetch the current record of `record_type` with key `pk`.
    ///
    /// Returns `Ok(None)` when the record no longer exists.
    async fn get(&self, record_type: &str, pk: PrimaryKey) -> Result<Option<Record>>;

    /// Enumerate every current record whose concrete type is `record_type`.
    ///
    /// Records of subtypes are not included; callers scan each type.
    fn scan<'a>(&'a self, record_type: &'a str) -> BoxStream<'a, Result<Record>>;
}

/// In-memory record store keyed by (concrete type, primary key).
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<BTreeMap<(String, PrimaryKey), Record>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding `records`.
    pub fn from_records(records: impl IntoIterator<Item = Record>) -> Self {
        let map = records
            .into_iter()
            .map(|r| ((r.record_type.clone(), r.pk), r))
            .collect();
        Self {
            records: RwLock::new(map),
        }
    }

    /// Load records from a JSON array file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::io_with_path(e, path))?;
        let records: Vec<Record> = serde_json::from_str(&content)
            .map_err(|e| Error::parse(format!("Invalid records file {}: {e}", path.display())))?;
        log::debug!("Loaded {} records from {}", records.len(), path.display());
        Ok(Self::from_records(records))
    }

    /// Insert or replace a record, returning the previous version.
    pub fn insert(&self, record: Record) -> Result<Option<Record>> {
        let mut records = self
            .records
            .write()
            .map_err(|e| Error::storage(format!("store lock poisoned: {e}")))?;
        Ok(records.insert((record.record_type.clone(), record.pk), record))
    }

    /// Remove a record, returning it if it existed.
    pub fn remove(&self, record_type: &str, pk: PrimaryKey) -> Result<Option<Record>> {
        let mut records = self
            .records
            .write()
            .map_err(|e| Error::storage(format!("store lock poisoned: {e}")))?;
        Ok(records.remove(&(record_type.to_string(), pk)))
    }

    /// Number of stored records across all types.
    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    /// Whether the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn snapshot_type(&self, record_type: &str) -> Result<Vec<Record>> {
        let records = self
            .records
            .read()
            .map_err(|e| Error::storage(format!("store lock poisoned: {e}")))?;
        Ok(records
            .values()
            .filter(|r| r.record_type == record_type)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn get(&self, record_type: &str, pk: PrimaryKey) -> Result<Option<Record>> {
        let records = self
            .records
            .read()
            .map_err(|e| Error::storage(format!("store lock poisoned: {e}")))?;
        Ok(records.get(&(record_type.to_string(), pk)).cloned())
    }

    fn scan<'a>(&'a self, record_type: &'a str) -> BoxStream<'a, Result<Record>> {
        match self.snapshot_type(record_type) {
            Ok(records) => stream::iter(records.into_iter().map(Ok)).boxed(),
            Err(e) => stream::once(async move { Err(e) }).boxed(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
