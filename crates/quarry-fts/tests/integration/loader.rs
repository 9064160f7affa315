//! Backend resolution by short name and by locator.

use quarry_core::{Error, IndexState};
use quarry_fts::{
    BackendConfig, BackendKind, BackendOptions, BackendRegistry, BackendsConfig, SearchBackend,
    SearchQuery, get_backend,
};

use crate::common::{BASE, TestHarness, populate, record_types};

#[tokio::test]
async fn test_load_by_name_and_by_locator() {
    let harness = TestHarness::new();
    let registry = BackendRegistry::default();

    let by_name = get_backend("default", &registry, harness.store_handle()).unwrap();
    let by_path = get_backend(
        "quarry_fts::database::DatabaseSearch",
        &registry,
        harness.store_handle(),
    )
    .unwrap();
    assert_eq!(by_name.kind(), BackendKind::Database);
    assert_eq!(by_path.kind(), BackendKind::Database);

    // Loaded backends honour the full contract.
    populate(by_name.as_ref()).await;
    let results = by_name.search(SearchQuery::new("Hello", BASE)).await.unwrap();
    assert_eq!(results.len(), 3);
}

#[test]
fn test_invalid_identifiers() {
    let harness = TestHarness::new();
    let registry = BackendRegistry::default();

    for identifier in ["quarry_fts::doesntexist::DoesntExist", "I'm not a backend!", ""] {
        let err = get_backend(identifier, &registry, harness.store_handle()).err().expect("expected error");
        assert!(matches!(err, Error::InvalidBackend { .. }), "{identifier:?}");
    }
}

#[tokio::test]
async fn test_configured_index_path_persists_across_loads() {
    let temp_dir = tempfile::tempdir().unwrap();
    let mut entries = BackendsConfig::new();
    entries.insert(
        "ondisk".to_string(),
        BackendConfig::new("quarry_fts::database").with_options(BackendOptions {
            index_path: Some(temp_dir.path().to_string_lossy().to_string()),
            ..Default::default()
        }),
    );
    let registry = BackendRegistry::new(entries);
    let harness = TestHarness::new();

    {
        let backend = get_backend("ondisk", &registry, harness.store_handle()).unwrap();
        populate(backend.as_ref()).await;
    }

    let reloaded = get_backend("ondisk", &registry, harness.store_handle()).unwrap();
    assert_eq!(reloaded.document_count(), 4);
    assert_eq!(reloaded.state(), IndexState::Populating);

    for record_type in record_types() {
        reloaded.add_type(record_type).await.unwrap();
    }
    reloaded.refresh_index().await.unwrap();
    assert!(reloaded.is_ready());
    assert_eq!(reloaded.document_count(), 4);
    let results = reloaded.search(SearchQuery::new("Hello", BASE)).await.unwrap();
    assert_eq!(results.len(), 3);
    assert!(quarry_fts::loader::index_exists(
        BackendKind::Database,
        temp_dir.path()
    ));
}
