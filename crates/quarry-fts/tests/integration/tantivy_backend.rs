//! The same contract against the Tantivy backend.

use quarry_fts::{
    BackendOptions, BackendRegistry, FilterPredicate, SearchBackend, SearchQuery, TantivySearch,
    get_backend,
};

use quarry_core::record::IndexedField;

use crate::common::{
    BASE, CHILD, TestHarness, base_type, child_type, populate, records, sorted_pks,
};

async fn tantivy(harness: &TestHarness) -> TantivySearch {
    let backend = TantivySearch::new(BackendOptions::default(), harness.store_handle()).unwrap();
    populate(&backend).await;
    backend
}

#[tokio::test]
async fn test_tantivy_matches_database_counts() {
    let harness = TestHarness::indexed().await;
    let backend = tantivy(&harness).await;

    for (text, expected) in [("", 0), ("Hello", 3), ("World", 2), ("Callable", 4)] {
        let results = backend.search(SearchQuery::new(text, BASE)).await.unwrap();
        assert_eq!(results.len(), expected, "{text:?}");
    }

    let child = backend.search(SearchQuery::new("Hello", CHILD)).await.unwrap();
    assert_eq!(sorted_pks(&child.records().await.unwrap()), vec![3]);
}

#[tokio::test]
async fn test_tantivy_filters() {
    let harness = TestHarness::new();
    let backend = tantivy(&harness).await;

    let live = SearchQuery::new("Hello", BASE).filter(FilterPredicate::eq("live", true));
    let results = backend.search(live).await.unwrap();
    assert_eq!(sorted_pks(&results.records().await.unwrap()), vec![2, 3]);

    let titled =
        SearchQuery::new("Hello", BASE).filter(FilterPredicate::one_of("title", ["Hello"]));
    assert_eq!(backend.search(titled).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_tantivy_parent_filter_with_overriding_subtype() {
    let harness = TestHarness::new();
    let backend = TantivySearch::new(BackendOptions::default(), harness.store_handle()).unwrap();
    backend.add_type(base_type()).await.unwrap();
    backend
        .add_type(child_type().field(IndexedField::text("title").boost(2.0)))
        .await
        .unwrap();
    backend.add_bulk(&records()).await.unwrap();
    backend.refresh_index().await.unwrap();

    let query = SearchQuery::new("Hello", BASE)
        .filter(FilterPredicate::parse("title__in=Hello,true").unwrap());
    let results = backend.search(query).await.unwrap();
    assert_eq!(sorted_pks(&results.records().await.unwrap()), vec![2, 3]);
}

#[tokio::test]
async fn test_tantivy_delete_and_slice() {
    let harness = TestHarness::new();
    let backend = tantivy(&harness).await;

    let results = backend.search(SearchQuery::new("Hello", BASE)).await.unwrap();
    assert_eq!(results.slice(1..3).len(), 2);

    let testa = harness.store.remove(BASE, 1.into()).unwrap().unwrap();
    backend.delete(&testa).await.unwrap();
    backend.refresh_index().await.unwrap();
    assert_eq!(
        backend.search(SearchQuery::new("Hello", BASE)).await.unwrap().len(),
        2
    );
}

#[test]
fn test_tantivy_loads_by_locator() {
    let harness = TestHarness::new();
    let backend = get_backend(
        "quarry_fts::tantivy_search::TantivySearch",
        &BackendRegistry::default(),
        harness.store_handle(),
    )
    .unwrap();
    assert_eq!(backend.kind(), quarry_fts::BackendKind::Tantivy);
}
