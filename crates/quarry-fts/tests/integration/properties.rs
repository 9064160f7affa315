//! Property tests for result slicing and filter conjunction.

use std::collections::BTreeSet;
use std::sync::Arc;

use proptest::prelude::*;
use quarry_core::record::{IndexedField, Record, RecordType};
use quarry_core::store::MemoryStore;
use quarry_fts::{
    BackendOptions, DatabaseSearch, FilterPredicate, QueryMode, SearchBackend, SearchQuery,
};

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

fn item_type() -> RecordType {
    RecordType::new("Item")
        .field(IndexedField::text("title"))
        .field(IndexedField::boolean("live"))
        .field(IndexedField::integer("rank"))
}

async fn indexed(records: &[Record]) -> DatabaseSearch {
    let store = Arc::new(MemoryStore::from_records(records.to_vec()));
    let backend = DatabaseSearch::new(BackendOptions::default(), store).unwrap();
    backend.add_type(item_type()).await.unwrap();
    backend.add_bulk(records).await.unwrap();
    backend.refresh_index().await.unwrap();
    backend
}

fn items(attrs: &[(bool, i64, u8)]) -> Vec<Record> {
    attrs
        .iter()
        .enumerate()
        .map(|(pk, &(live, rank, extra))| {
            let title = "item ".to_string() + &"extra ".repeat(extra as usize);
            Record::new("Item", pk as i64)
                .with("title", title)
                .with("live", live)
                .with("rank", rank)
        })
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn slice_matches_slice_of_realised_results(
        attrs in prop::collection::vec((any::<bool>(), 0i64..3, 0u8..3), 0..20),
        lo in 0usize..25,
        len in 0usize..25,
    ) {
        let records = items(&attrs);
        runtime().block_on(async {
            let backend = indexed(&records).await;
            let query = SearchQuery::new("item extra", "Item").mode(QueryMode::Or);
            let results = backend.search(query).await.unwrap();
            let all = results.records().await.unwrap();

            let hi = lo + len;
            let expected_lo = lo.min(all.len());
            let expected_hi = hi.min(all.len()).max(expected_lo);
            let window = results.slice(lo..hi);

            prop_assert_eq!(window.len(), expected_hi - expected_lo);
            prop_assert_eq!(
                window.records().await.unwrap(),
                all[expected_lo..expected_hi].to_vec()
            );
            Ok(())
        })?;
    }

    #[test]
    fn filters_are_a_conjunction(
        attrs in prop::collection::vec((any::<bool>(), 0i64..3, 0u8..2), 0..20),
        live in any::<bool>(),
        rank in 0i64..3,
    ) {
        let records = items(&attrs);
        runtime().block_on(async {
            let backend = indexed(&records).await;
            let query = SearchQuery::new("item", "Item")
                .filter(FilterPredicate::eq("live", live))
                .filter(FilterPredicate::eq("rank", rank));
            let found: BTreeSet<i64> = backend
                .search(query)
                .await
                .unwrap()
                .records()
                .await
                .unwrap()
                .iter()
                .map(|r| r.pk.0)
                .collect();

            let expected: BTreeSet<i64> = attrs
                .iter()
                .enumerate()
                .filter(|(_, (l, r, _))| *l == live && *r == rank)
                .map(|(pk, _)| pk as i64)
                .collect();
            prop_assert_eq!(found, expected);
            Ok(())
        })?;
    }
}
