// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Integration tests for the `DocumentStore` contract.

use docket_store::{Document, DocumentStore, Error, Fields, Filter, MemoryStore, Modification};
use serde_json::json;

type TestResult = Result<(), Error>;

const COLLECTION: &str = "globals";

fn block_on<F: std::future::Future>(f: F) -> F::Output {
    futures::executor::block_on(f)
}

/// Exercises every operation the cache relies on against any store.
async fn contract<S: DocumentStore>(store: &S) -> TestResult {
    assert!(store.get(COLLECTION, &Filter::identifier("settings")).await?.is_none());

    let id = store.create(COLLECTION, Document::with_identifier("settings")).await?;
    let created = store.get(COLLECTION, &Filter::id(id.clone())).await?.expect("created document");
    assert_eq!(created.identifier(), Some("settings"));
    assert_eq!(created.id(), Some(id.clone()));

    let mut fields = Fields::new();
    fields.insert("motd".to_owned(), json!("hello"));
    fields.insert("mode".to_owned(), json!("normal"));
    assert!(store.update(COLLECTION, &id, fields).await?);

    assert!(store.unset(COLLECTION, "settings", &["mode".to_owned()]).await?);

    let counted = store
        .find_and_modify(COLLECTION, &Filter::id(id.clone()), Modification::increment("n", 2))
        .await?
        .expect("document to modify");
    assert_eq!(counted.get("n"), Some(&json!(2)));

    let loaded = store.get(COLLECTION, &Filter::identifier("settings")).await?.expect("loaded document");
    assert_eq!(loaded.get("motd"), Some(&json!("hello")));
    assert!(loaded.get("mode").is_none());
    assert_eq!(loaded.get("n"), Some(&json!(2)));
    Ok(())
}

#[test]
fn memory_store_honors_the_contract() -> TestResult {
    block_on(contract(&MemoryStore::new()))
}

#[cfg(feature = "test-util")]
#[test]
fn mock_store_honors_the_contract() -> TestResult {
    let store = docket_store::testing::MockStore::new();
    block_on(contract(&store))?;
    assert_eq!(store.operations().len(), 7);
    Ok(())
}

#[test]
fn writes_to_missing_documents_report_no_match() -> TestResult {
    block_on(async {
        let store = MemoryStore::new();
        let id = docket_store::DocumentId::new("missing");

        assert!(!store.update(COLLECTION, &id, Fields::new()).await?);
        assert!(!store.unset(COLLECTION, "missing", &["x".to_owned()]).await?);
        assert!(
            store
                .find_and_modify(COLLECTION, &Filter::id(id), Modification::set("x", 1))
                .await?
                .is_none()
        );
        Ok(())
    })
}
