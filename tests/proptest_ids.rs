//! Property-based tests for id assignment.
//!
//! For any sequence of create/delete operations, every id returned by
//! create is unique for the store's lifetime — deletions never free an
//! id for reuse.
//!
//! Run with: cargo test --test proptest_ids

use proptest::prelude::*;
use std::collections::HashSet;
use taskd::store::TaskStore;
use tempfile::TempDir;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Interleaved creates and deletes never hand out the same id twice.
    #[test]
    fn create_ids_are_unique_for_the_store_lifetime(ops in prop::collection::vec(any::<bool>(), 1..60)) {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        rt.block_on(async move {
            let dir = TempDir::new().unwrap();
            let store = TaskStore::open(dir.path()).await.unwrap();

            let mut issued: HashSet<String> = HashSet::new();
            let mut live: Vec<String> = Vec::new();

            for (i, create) in ops.iter().enumerate() {
                if *create || live.is_empty() {
                    let t = store.create(format!("task {i}"), false).await.unwrap();
                    prop_assert!(
                        issued.insert(t.id.clone()),
                        "id {} was issued twice", t.id
                    );
                    live.push(t.id);
                } else {
                    // Delete the oldest live task; its id must stay retired.
                    let id = live.remove(0);
                    store.delete(&id).await.unwrap();
                }
            }

            // The surviving collection carries no duplicates either.
            let ids: Vec<String> = store.list().await.into_iter().map(|t| t.id).collect();
            let unique: HashSet<&String> = ids.iter().collect();
            prop_assert_eq!(unique.len(), ids.len());
            Ok(())
        })?;
    }
}
