// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Integration tests for `IdentifierCache` first access.

use docket::{Document, DocumentStore, Error, IdentifierCache, MemoryStore};
use docket_store::testing::{MockStore, StoreOp};
use serde_json::json;

type TestResult = Result<(), Error>;

const COLLECTION: &str = "globals";

fn block_on<F: std::future::Future>(f: F) -> F::Output {
    futures::executor::block_on(f)
}

fn is_create(op: &StoreOp) -> bool {
    matches!(op, StoreOp::Create { .. })
}

#[test]
fn new_identifier_gets_a_document_with_identifier_and_id() -> TestResult {
    block_on(async {
        let cache = IdentifierCache::new(MemoryStore::new());
        let handle = cache.acquire("fresh").await?;

        let document = handle.get();
        let mut fields: Vec<&String> = document.iter().map(|(field, _)| field).collect();
        fields.sort();
        assert_eq!(fields, ["_id", "identifier"]);
        assert_eq!(document.identifier(), Some("fresh"));
        assert_eq!(document.id().as_ref(), Some(handle.id()));
        Ok(())
    })
}

#[test]
fn existing_document_is_loaded_without_creating_another() -> TestResult {
    block_on(async {
        let store = MockStore::new();
        let mut seed = Document::with_identifier("settings");
        seed.insert("motd", "hello");
        let id = store.inner().create(COLLECTION, seed).await?;

        let cache = IdentifierCache::new(store);
        let handle = cache.acquire("settings").await?;

        assert_eq!(handle.id(), &id);
        assert_eq!(handle.get_field("motd"), Some(json!("hello")));
        assert_eq!(cache.store().count(is_create), 0);
        assert_eq!(cache.store().inner().document_count(COLLECTION), 1);
        Ok(())
    })
}

#[test]
fn second_acquire_is_served_from_memory() -> TestResult {
    block_on(async {
        let cache = IdentifierCache::new(MockStore::new());

        let first = cache.acquire("settings").await?;
        let store_calls = cache.store().operations().len();
        let second = cache.acquire("settings").await?;

        assert!(first.is_same_entry(&second));
        assert_eq!(cache.store().operations().len(), store_calls);
        assert_eq!(cache.store().count(is_create), 1);
        Ok(())
    })
}

#[test]
fn first_access_creates_then_reads_back_by_id() -> TestResult {
    block_on(async {
        let cache = IdentifierCache::new(MockStore::new());
        let handle = cache.acquire("settings").await?;

        let ops = cache.store().operations();
        assert_eq!(ops.len(), 3);
        assert!(matches!(&ops[0], StoreOp::Get { filter, .. } if filter.to_string().contains("identifier")));
        assert!(is_create(&ops[1]));
        assert!(matches!(&ops[2], StoreOp::Get { filter: docket::Filter::Id(id), .. } if id == handle.id()));
        Ok(())
    })
}

#[test]
fn failed_first_access_caches_nothing_and_next_acquire_retries() -> TestResult {
    block_on(async {
        let cache = IdentifierCache::new(MockStore::new());
        cache.store().fail_when(is_create);

        let error = cache.acquire("flaky").await.unwrap_err();
        assert!(error.is_unavailable());
        assert!(!cache.contains("flaky"));
        assert!(cache.is_empty());
        assert_eq!(cache.store().inner().document_count(COLLECTION), 0);

        cache.store().clear_failures();
        let handle = cache.acquire("flaky").await?;
        assert_eq!(handle.identifier(), "flaky");
        assert!(cache.contains("flaky"));
        assert_eq!(cache.store().count(is_create), 2);
        assert_eq!(cache.store().inner().document_count(COLLECTION), 1);
        Ok(())
    })
}

#[test]
fn unreachable_store_fails_the_lookup() {
    block_on(async {
        let cache = IdentifierCache::new(MockStore::new());
        cache.store().fail_when(|_| true);

        let error = cache.acquire("anything").await.unwrap_err();
        assert!(matches!(error, Error::Unavailable(_)));
        assert_eq!(cache.store().count(is_create), 0);
    });
}

#[test]
fn failed_read_back_after_create_is_not_cached() {
    block_on(async {
        let cache = IdentifierCache::new(MockStore::new());
        // Let the identifier lookup and the insert through, fail only the read-back by id.
        cache
            .store()
            .fail_when(|op| matches!(op, StoreOp::Get { filter: docket::Filter::Id(_), .. }));

        let error = cache.acquire("a").await.unwrap_err();
        assert!(error.is_unavailable());
        assert!(!cache.contains("a"));
    });
}

#[test]
fn distinct_identifiers_get_distinct_documents() -> TestResult {
    block_on(async {
        let cache = IdentifierCache::new(MemoryStore::new());
        let a = cache.acquire("a").await?;
        let b = cache.acquire("b").await?;

        assert!(!a.is_same_entry(&b));
        assert_ne!(a.id(), b.id());
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.identifiers(), ["a", "b"]);
        Ok(())
    })
}

#[test]
fn peek_never_touches_the_store() -> TestResult {
    block_on(async {
        let cache = IdentifierCache::new(MockStore::new());
        assert!(cache.peek("settings").is_none());
        assert!(cache.store().operations().is_empty());

        let handle = cache.acquire("settings").await?;
        cache.store().clear_operations();

        let peeked = cache.peek("settings").expect("entry should be resident");
        assert!(peeked.is_same_entry(&handle));
        assert!(cache.store().operations().is_empty());
        Ok(())
    })
}
