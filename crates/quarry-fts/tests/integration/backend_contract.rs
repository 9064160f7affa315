//! The search backend contract, exercised against the database backend.

use quarry_core::Error;
use quarry_core::record::{IndexedField, Record};
use quarry_core::state::IndexState;
use quarry_fts::{FilterPredicate, QueryMode, SearchBackend, SearchQuery};

use crate::common::{
    BASE, CHILD, TestHarness, base_type, child_type, records, sorted_pks,
};

async fn count(harness: &TestHarness, query: SearchQuery) -> usize {
    harness.backend.search(query).await.unwrap().len()
}

#[tokio::test]
async fn test_blank_query_returns_nothing() {
    let harness = TestHarness::indexed().await;
    assert_eq!(count(&harness, SearchQuery::new("", BASE)).await, 0);
    assert_eq!(count(&harness, SearchQuery::new("   ", BASE)).await, 0);
    assert_eq!(count(&harness, SearchQuery::new("!!", BASE)).await, 0);
}

#[tokio::test]
async fn test_text_matches_include_subtypes() {
    let harness = TestHarness::indexed().await;

    let hello = harness.backend.search(SearchQuery::new("Hello", BASE)).await.unwrap();
    assert_eq!(hello.len(), 3);
    assert_eq!(sorted_pks(&hello.records().await.unwrap()), vec![1, 2, 3]);

    let world = harness.backend.search(SearchQuery::new("World", BASE)).await.unwrap();
    assert_eq!(sorted_pks(&world.records().await.unwrap()), vec![1, 4]);
}

#[tokio::test]
async fn test_matching_is_case_insensitive() {
    let harness = TestHarness::indexed().await;
    assert_eq!(count(&harness, SearchQuery::new("hELLO", BASE)).await, 3);
}

#[tokio::test]
async fn test_derived_field_is_searchable() {
    let harness = TestHarness::indexed().await;
    assert_eq!(count(&harness, SearchQuery::new("Callable", BASE)).await, 4);
}

#[tokio::test]
async fn test_boolean_filter() {
    let harness = TestHarness::indexed().await;
    let query = SearchQuery::new("Hello", BASE).filter(FilterPredicate::eq("live", true));
    let results = harness.backend.search(query).await.unwrap();
    assert_eq!(sorted_pks(&results.records().await.unwrap()), vec![2, 3]);
}

#[tokio::test]
async fn test_membership_filter() {
    let harness = TestHarness::indexed().await;
    let query =
        SearchQuery::new("Hello", BASE).filter(FilterPredicate::one_of("title", ["Hello"]));
    let results = harness.backend.search(query).await.unwrap();
    assert_eq!(sorted_pks(&results.records().await.unwrap()), vec![2, 3]);
}

#[tokio::test]
async fn test_missing_boolean_filters_as_null() {
    let harness = TestHarness::indexed().await;
    let query = SearchQuery::new("Callable", BASE)
        .filter(FilterPredicate::eq("live", quarry_core::FieldValue::Null));
    let results = harness.backend.search(query).await.unwrap();
    assert_eq!(sorted_pks(&results.records().await.unwrap()), vec![1]);
}

#[tokio::test]
async fn test_parent_filter_applies_to_subtype_overriding_field() {
    let harness = TestHarness::new();
    let backend = &harness.backend;
    backend.add_type(base_type()).await.unwrap();
    backend
        .add_type(child_type().field(IndexedField::text("title").boost(2.0)))
        .await
        .unwrap();
    backend.add_bulk(&records()).await.unwrap();
    backend.refresh_index().await.unwrap();

    let unfiltered = backend.search(SearchQuery::new("Hello", BASE)).await.unwrap();
    assert_eq!(unfiltered.len(), 3);

    let query = SearchQuery::new("Hello", BASE).filter(FilterPredicate::eq("title", "Hello"));
    let results = backend.search(query).await.unwrap();
    assert_eq!(sorted_pks(&results.records().await.unwrap()), vec![2, 3]);

    let query = SearchQuery::new("Hello", CHILD).filter(FilterPredicate::eq("title", "Hello"));
    let results = backend.search(query).await.unwrap();
    assert_eq!(sorted_pks(&results.records().await.unwrap()), vec![3]);
}

#[tokio::test]
async fn test_parsed_filters_take_the_field_kind() {
    let harness = TestHarness::indexed().await;
    let parsed = |expr: &str| FilterPredicate::parse(expr).unwrap();

    let query = SearchQuery::new("Hello", BASE).filter(parsed("live=true"));
    let results = harness.backend.search(query).await.unwrap();
    assert_eq!(sorted_pks(&results.records().await.unwrap()), vec![2, 3]);

    let query = SearchQuery::new("Hello", BASE).filter(parsed("title=2024"));
    assert_eq!(count(&harness, query).await, 0);

    let query = SearchQuery::new("Hello", BASE).filter(parsed("title__in=Hello,true"));
    let results = harness.backend.search(query).await.unwrap();
    assert_eq!(sorted_pks(&results.records().await.unwrap()), vec![2, 3]);

    let query = SearchQuery::new("Hello", BASE).filter(parsed("live=maybe"));
    let err = harness.backend.search(query).await.unwrap_err();
    assert!(matches!(err, Error::InvalidFilter { .. }));
}

#[tokio::test]
async fn test_numeric_text_value_filters_as_text() {
    let harness = TestHarness::indexed().await;
    let record = Record::new(BASE, 5).with("title", "2024");
    harness.store.insert(record.clone()).unwrap();
    harness.backend.add(&record).await.unwrap();
    harness.backend.refresh_index().await.unwrap();

    let query =
        SearchQuery::new("2024", BASE).filter(FilterPredicate::parse("title=2024").unwrap());
    let results = harness.backend.search(query).await.unwrap();
    assert_eq!(sorted_pks(&results.records().await.unwrap()), vec![5]);
}

#[tokio::test]
async fn test_empty_membership_matches_nothing() {
    let harness = TestHarness::indexed().await;
    let query = SearchQuery::new("Hello", BASE)
        .filter(FilterPredicate::one_of("title", Vec::<String>::new()));
    assert_eq!(count(&harness, query).await, 0);
}

#[tokio::test]
async fn test_invalid_filters_are_rejected() {
    let harness = TestHarness::indexed().await;

    for predicate in [
        FilterPredicate::eq("nope", true),
        FilterPredicate::eq("callable", "Callable"),
        FilterPredicate::eq("live", "yes"),
    ] {
        let err = harness
            .backend
            .search(SearchQuery::new("Hello", BASE).filter(predicate.clone()))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidFilter { .. }), "{predicate}");
    }
}

#[tokio::test]
async fn test_single_result_access() {
    let harness = TestHarness::indexed().await;
    let results = harness.backend.search(SearchQuery::new("World", CHILD)).await.unwrap();
    assert_eq!(results.len(), 1);

    let record = results.get(0).await.unwrap().unwrap();
    assert_eq!(record, Record::new(CHILD, 4).with("title", "World").with("live", false));
    assert!(results.get(1).await.unwrap().is_none());
}

#[tokio::test]
async fn test_slicing() {
    let harness = TestHarness::indexed().await;
    let results = harness.backend.search(SearchQuery::new("Hello", BASE)).await.unwrap();

    let window = results.slice(1..3);
    assert_eq!(window.len(), 2);
    let all = results.records().await.unwrap();
    assert_eq!(window.records().await.unwrap(), all[1..3].to_vec());

    let windowed = harness
        .backend
        .search(SearchQuery::new("Hello", BASE).window(1..3))
        .await
        .unwrap();
    assert_eq!(windowed.records().await.unwrap(), all[1..3].to_vec());
}

#[tokio::test]
async fn test_subtype_search_excludes_parent() {
    let harness = TestHarness::indexed().await;
    let results = harness.backend.search(SearchQuery::new("Hello", CHILD)).await.unwrap();
    assert_eq!(sorted_pks(&results.records().await.unwrap()), vec![3]);
}

#[tokio::test]
async fn test_unregistered_type_returns_nothing() {
    let harness = TestHarness::indexed().await;
    assert_eq!(count(&harness, SearchQuery::new("Hello", "Unknown")).await, 0);
}

#[tokio::test]
async fn test_query_modes() {
    let harness = TestHarness::indexed().await;
    assert_eq!(count(&harness, SearchQuery::new("hello world", BASE)).await, 1);
    assert_eq!(
        count(&harness, SearchQuery::new("hello world", BASE).mode(QueryMode::Or)).await,
        4
    );
    assert_eq!(
        count(&harness, SearchQuery::new("hello world absent", BASE)).await,
        4
    );
    assert_eq!(
        count(
            &harness,
            SearchQuery::new("hello world absent", BASE).mode(QueryMode::And)
        )
        .await,
        0
    );
}

#[tokio::test]
async fn test_ranking_prefers_more_matching_terms() {
    let harness = TestHarness::indexed().await;
    let results = harness
        .backend
        .search(SearchQuery::new("hello world", BASE).mode(QueryMode::Or))
        .await
        .unwrap();
    let first = results.get(0).await.unwrap().unwrap();
    assert_eq!(first.pk.0, 1);
}

#[tokio::test]
async fn test_delete_takes_effect_after_refresh() {
    let harness = TestHarness::indexed().await;
    let testa = Record::new(BASE, 1).with("title", "Hello World");

    harness.backend.delete(&testa).await.unwrap();
    assert_eq!(harness.backend.state(), IndexState::Populating);
    assert_eq!(count(&harness, SearchQuery::new("Hello", BASE)).await, 3);

    harness.store.remove(BASE, testa.pk).unwrap();
    harness.backend.refresh_index().await.unwrap();
    assert_eq!(count(&harness, SearchQuery::new("Hello", BASE)).await, 2);
}

#[tokio::test]
async fn test_stale_hits_are_skipped() {
    let harness = TestHarness::indexed().await;
    harness.store.remove(BASE, 1.into()).unwrap();

    let results = harness.backend.search(SearchQuery::new("Hello", BASE)).await.unwrap();
    assert_eq!(results.len(), 3);
    assert_eq!(sorted_pks(&results.records().await.unwrap()), vec![2, 3]);
}

#[tokio::test]
async fn test_re_adding_replaces_document() {
    let harness = TestHarness::indexed().await;
    let updated = Record::new(BASE, 1).with("title", "Goodbye");
    harness.store.insert(updated.clone()).unwrap();
    harness.backend.add(&updated).await.unwrap();
    harness.backend.refresh_index().await.unwrap();

    assert_eq!(count(&harness, SearchQuery::new("Hello", BASE)).await, 2);
    assert_eq!(count(&harness, SearchQuery::new("Goodbye", BASE)).await, 1);
    assert_eq!(harness.backend.document_count(), 4);
}

#[tokio::test]
async fn test_reset_keeps_types_and_empties_index() {
    let harness = TestHarness::indexed().await;
    harness.backend.reset_index().await.unwrap();
    assert_eq!(harness.backend.state(), IndexState::Empty);

    harness.backend.refresh_index().await.unwrap();
    assert_eq!(count(&harness, SearchQuery::new("Hello", BASE)).await, 0);
    assert_eq!(
        harness.backend.registered_types().await,
        vec![BASE.to_string(), CHILD.to_string()]
    );
}

#[tokio::test]
async fn test_lifecycle_states() {
    let harness = TestHarness::new();
    assert_eq!(harness.backend.state(), IndexState::Empty);

    harness
        .backend
        .add_type(crate::common::base_type())
        .await
        .unwrap();
    assert_eq!(harness.backend.state(), IndexState::Populating);

    harness.backend.refresh_index().await.unwrap();
    assert!(harness.backend.is_ready());
}

#[tokio::test]
async fn test_deleting_live_record_drops_one_filtered_match() {
    let harness = TestHarness::indexed().await;
    let live = || SearchQuery::new("Hello", BASE).filter(FilterPredicate::eq("live", true));
    assert_eq!(count(&harness, live()).await, 2);

    let testb = harness.store.remove(BASE, 2.into()).unwrap().unwrap();
    harness.backend.delete(&testb).await.unwrap();
    harness.backend.refresh_index().await.unwrap();
    assert_eq!(count(&harness, live()).await, 1);
}
