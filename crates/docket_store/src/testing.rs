// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Mock store implementation for testing.
//!
//! This module provides `MockStore`, a [`MemoryStore`] wrapper that records every call,
//! supports failure injection for testing error paths, and can delay calls to open
//! race windows between concurrent tasks.

use std::{sync::Arc, time::Duration};

use parking_lot::Mutex;

use crate::{CollectionName, Document, DocumentId, DocumentStore, Error, Fields, Filter, MemoryStore, Modification};

/// Recorded store operation with full context.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreOp {
    /// A point lookup.
    Get {
        /// The collection searched.
        collection: CollectionName,
        /// The lookup filter.
        filter: Filter,
    },
    /// An insert.
    Create {
        /// The target collection.
        collection: CollectionName,
        /// The document as passed in, before an id was assigned.
        document: Document,
    },
    /// A merge-update by id.
    Update {
        /// The target collection.
        collection: CollectionName,
        /// The document id.
        id: DocumentId,
        /// The fields merged into the document.
        fields: Fields,
    },
    /// A field removal by identifier.
    Unset {
        /// The target collection.
        collection: CollectionName,
        /// The logical identifier.
        identifier: String,
        /// The removed fields.
        fields: Vec<String>,
    },
    /// An atomic find-and-modify.
    FindAndModify {
        /// The target collection.
        collection: CollectionName,
        /// The lookup filter.
        filter: Filter,
        /// The applied modification.
        modification: Modification,
    },
}

impl StoreOp {
    /// Returns `true` for operations that only read.
    #[must_use]
    pub fn is_read(&self) -> bool {
        matches!(self, Self::Get { .. })
    }
}

type FailPredicate = Box<dyn Fn(&StoreOp) -> bool + Send + Sync>;

/// A configurable mock store for testing.
///
/// Data lives in an inner [`MemoryStore`], so the mock behaves like a real store unless
/// told otherwise. All operations are recorded, including the ones that fail.
///
/// # Examples
///
/// ```
/// use docket_store::{Document, DocumentStore, Filter};
/// use docket_store::testing::{MockStore, StoreOp};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let store = MockStore::new();
///
/// // Fail every insert
/// store.fail_when(|op| matches!(op, StoreOp::Create { .. }));
/// assert!(store.create("globals", Document::with_identifier("a")).await.is_err());
///
/// store.clear_failures();
/// assert!(store.create("globals", Document::with_identifier("a")).await.is_ok());
/// assert_eq!(store.operations().len(), 2);
/// # }
/// ```
#[derive(Clone, Default)]
pub struct MockStore {
    inner: MemoryStore,
    operations: Arc<Mutex<Vec<StoreOp>>>,
    fail_when: Arc<Mutex<Option<FailPredicate>>>,
    latency: Arc<Mutex<Option<Duration>>>,
}

impl std::fmt::Debug for MockStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockStore")
            .field("inner", &self.inner)
            .field("operations", &self.operations)
            .field("fail_when", &self.fail_when.lock().is_some())
            .field("latency", &self.latency)
            .finish()
    }
}

impl MockStore {
    /// Creates an empty mock store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a mock store over existing data.
    #[must_use]
    pub fn with_store(inner: MemoryStore) -> Self {
        Self {
            inner,
            ..Self::default()
        }
    }

    /// Returns the wrapped store. Calls made on it directly are not recorded.
    #[must_use]
    pub fn inner(&self) -> &MemoryStore {
        &self.inner
    }

    /// Sets a predicate that decides which operations fail with [`Error::Unavailable`].
    ///
    /// # Examples
    ///
    /// ```
    /// use docket_store::testing::{MockStore, StoreOp};
    ///
    /// let store = MockStore::new();
    ///
    /// // Fail all operations
    /// store.fail_when(|_| true);
    ///
    /// // Fail only writes
    /// store.fail_when(|op| !op.is_read());
    /// ```
    pub fn fail_when<F>(&self, predicate: F)
    where
        F: Fn(&StoreOp) -> bool + Send + Sync + 'static,
    {
        *self.fail_when.lock() = Some(Box::new(predicate));
    }

    /// Clears the failure predicate, allowing all operations to succeed.
    pub fn clear_failures(&self) {
        *self.fail_when.lock() = None;
    }

    /// Delays every subsequent operation by `latency` before it runs.
    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock() = Some(latency);
    }

    /// Returns a clone of all recorded operations.
    #[must_use]
    pub fn operations(&self) -> Vec<StoreOp> {
        self.operations.lock().clone()
    }

    /// Returns the number of recorded operations that satisfy `predicate`.
    #[must_use]
    pub fn count(&self, predicate: impl Fn(&StoreOp) -> bool) -> usize {
        self.operations.lock().iter().filter(|op| predicate(op)).count()
    }

    /// Clears all recorded operations.
    pub fn clear_operations(&self) {
        self.operations.lock().clear();
    }

    /// Records the operation, waits out the configured latency and reports whether it should fail.
    async fn begin(&self, op: StoreOp) -> Result<(), Error> {
        let fail = self.fail_when.lock().as_ref().is_some_and(|predicate| predicate(&op));
        self.operations.lock().push(op);

        let latency = *self.latency.lock();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        if fail {
            Err(Error::unavailable("mock: store unavailable"))
        } else {
            Ok(())
        }
    }
}

impl DocumentStore for MockStore {
    async fn get(&self, collection: CollectionName, filter: &Filter) -> Result<Option<Document>, Error> {
        self.begin(StoreOp::Get {
            collection,
            filter: filter.clone(),
        })
        .await?;
        self.inner.get(collection, filter).await
    }

    async fn create(&self, collection: CollectionName, document: Document) -> Result<DocumentId, Error> {
        self.begin(StoreOp::Create {
            collection,
            document: document.clone(),
        })
        .await?;
        self.inner.create(collection, document).await
    }

    async fn update(&self, collection: CollectionName, id: &DocumentId, fields: Fields) -> Result<bool, Error> {
        self.begin(StoreOp::Update {
            collection,
            id: id.clone(),
            fields: fields.clone(),
        })
        .await?;
        self.inner.update(collection, id, fields).await
    }

    async fn unset(&self, collection: CollectionName, identifier: &str, fields: &[String]) -> Result<bool, Error> {
        self.begin(StoreOp::Unset {
            collection,
            identifier: identifier.to_owned(),
            fields: fields.to_vec(),
        })
        .await?;
        self.inner.unset(collection, identifier, fields).await
    }

    async fn find_and_modify(&self, collection: CollectionName, filter: &Filter, modification: Modification) -> Result<Option<Document>, Error> {
        self.begin(StoreOp::FindAndModify {
            collection,
            filter: filter.clone(),
            modification: modification.clone(),
        })
        .await?;
        self.inner.find_and_modify(collection, filter, modification).await
    }
}
