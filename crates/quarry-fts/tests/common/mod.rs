//! Shared fixture: a base type, a subtype, and four records.

use std::sync::Arc;

use quarry_core::record::{FieldKind, FieldValue, IndexedField, Record, RecordType};
use quarry_core::store::{MemoryStore, RecordStore};
use quarry_fts::{BackendOptions, DatabaseSearch, SearchBackend};

pub const BASE: &str = "SearchTest";
pub const CHILD: &str = "SearchTestChild";

/// `SearchTest`: searchable, filterable title; boolean `live`; derived
/// `callable` that always reads "Callable".
pub fn base_type() -> RecordType {
    RecordType::new(BASE)
        .field(IndexedField::text("title").filterable())
        .field(IndexedField::boolean("live"))
        .field(IndexedField::derived("callable", FieldKind::Text, |_| {
            FieldValue::from("Callable")
        }))
}

/// `SearchTestChild`: inherits every field of `SearchTest`.
pub fn child_type() -> RecordType {
    RecordType::new(CHILD).child_of(BASE)
}

pub fn record_types() -> Vec<RecordType> {
    vec![base_type(), child_type()]
}

/// The four fixture records, keyed 1..=4: testa, testb, child_a, child_b.
pub fn records() -> Vec<Record> {
    vec![
        Record::new(BASE, 1).with("title", "Hello World"),
        Record::new(BASE, 2).with("title", "Hello").with("live", true),
        Record::new(CHILD, 3).with("title", "Hello").with("live", true),
        Record::new(CHILD, 4).with("title", "World").with("live", false),
    ]
}

/// Test harness: a populated store plus a database backend over it.
pub struct TestHarness {
    pub store: Arc<MemoryStore>,
    pub backend: DatabaseSearch,
}

impl TestHarness {
    /// Store holding the fixture records; nothing indexed yet.
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::from_records(records()));
        let backend = DatabaseSearch::new(BackendOptions::default(), store.clone()).unwrap();
        Self { store, backend }
    }

    /// Store and index both hold the fixture records.
    pub async fn indexed() -> Self {
        let harness = Self::new();
        populate(&harness.backend).await;
        harness
    }

    pub fn store_handle(&self) -> Arc<dyn RecordStore> {
        self.store.clone()
    }
}

/// Register the fixture types, index the fixture records, refresh.
pub async fn populate(backend: &dyn SearchBackend) {
    for record_type in record_types() {
        backend.add_type(record_type).await.unwrap();
    }
    backend.add_bulk(&records()).await.unwrap();
    backend.refresh_index().await.unwrap();
}

/// Primary keys of `records`, sorted.
pub fn sorted_pks(records: &[Record]) -> Vec<i64> {
    let mut pks: Vec<i64> = records.iter().map(|r| r.pk.0).collect();
    pks.sort_unstable();
    pks
}
