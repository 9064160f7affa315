//! Rebuilding an index from the record store.

use quarry_core::state::IndexState;
use quarry_fts::{IndexRebuilder, SearchBackend, SearchQuery, rebuild_all};

use crate::common::{BASE, CHILD, TestHarness, record_types};

#[tokio::test]
async fn test_reset_then_rebuild_restores_results() {
    let harness = TestHarness::indexed().await;
    harness.store.remove(BASE, 1.into()).unwrap();

    harness.backend.reset_index().await.unwrap();
    let stats = rebuild_all(&harness.backend, &record_types(), harness.store.as_ref())
        .await
        .unwrap();

    assert_eq!(stats.documents_indexed, 3);
    assert_eq!(stats.per_type.get(CHILD), Some(&2));
    assert_eq!(harness.backend.state(), IndexState::Ready);

    let results = harness.backend.search(SearchQuery::new("Hello", BASE)).await.unwrap();
    assert_eq!(results.len(), 2);
}

#[tokio::test]
async fn test_queries_see_previous_generation_during_rebuild() {
    let harness = TestHarness::indexed().await;
    let before = harness.backend.search(SearchQuery::new("Hello", BASE)).await.unwrap();

    harness.backend.reset_index().await.unwrap();
    let during = harness.backend.search(SearchQuery::new("Hello", BASE)).await.unwrap();
    assert_eq!(during.len(), 3);

    IndexRebuilder::new()
        .with_batch_size(1)
        .rebuild(&harness.backend, &record_types(), harness.store.as_ref())
        .await
        .unwrap();

    // A result set keeps reading the generation it was produced from.
    assert_eq!(before.len(), 3);
    assert_eq!(before.records().await.unwrap().len(), 3);
}
