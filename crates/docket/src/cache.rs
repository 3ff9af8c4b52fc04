// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The identifier cache and its resident entries.

use std::{fmt::Debug, sync::Arc, time::Instant};

use async_once_cell::OnceCell;
use dashmap::DashMap;
use docket_store::{CollectionName, Document, DocumentId, DocumentStore, Error, Filter, ID_FIELD};
use parking_lot::RwLock;

use crate::{
    Handle,
    builder::IdentifierCacheBuilder,
    telemetry::{CacheActivity, CacheOperation, CacheTelemetry},
};

/// Type alias for cache names used in telemetry.
pub type CacheName = &'static str;

/// The resident copy of one document.
///
/// The id and identifier never change after the entry is built; only the document does.
#[derive(Debug)]
pub(crate) struct Entry {
    pub(crate) id: DocumentId,
    pub(crate) identifier: String,
    pub(crate) document: RwLock<Document>,
}

impl Entry {
    fn new(identifier: &str, document: Document) -> Result<Self, Error> {
        let id = document
            .id()
            .ok_or_else(|| Error::MalformedDocument(format!("document for identifier {identifier:?} has no string {ID_FIELD}")))?;

        Ok(Self {
            id,
            identifier: identifier.to_owned(),
            document: RwLock::new(document),
        })
    }
}

/// Per-identifier slot. Empty while the first access is in flight or after it failed.
type Slot = Arc<OnceCell<Arc<Entry>>>;

/// State shared by a cache, its clones and every handle it gave out.
pub(crate) struct Shared<S> {
    pub(crate) name: CacheName,
    pub(crate) collection: CollectionName,
    pub(crate) store: S,
    pub(crate) telemetry: CacheTelemetry,
    table: DashMap<String, Slot>,
    coalesce: bool,
}

impl<S> Shared<S> {
    pub(crate) fn record(&self, operation: CacheOperation, activity: CacheActivity, identifier: &str, started: Instant) {
        self.telemetry.record(self.name, operation, activity, identifier, started.elapsed());
    }

    fn resident(&self, identifier: &str) -> Option<Arc<Entry>> {
        self.table.get(identifier).and_then(|slot| slot.value().get().cloned())
    }

    fn slot(&self, identifier: &str) -> Slot {
        // The shard lock is released before the slot is awaited.
        Arc::clone(
            self.table
                .entry(identifier.to_owned())
                .or_insert_with(|| Arc::new(OnceCell::new()))
                .value(),
        )
    }

    /// Drops a slot whose initialization failed once no other task holds it.
    ///
    /// The caller releases its own reference first, so the last waiter to give up always
    /// sees a count of one and removes the slot.
    fn discard_failed(&self, identifier: &str, slot: Slot) {
        let failed = Arc::as_ptr(&slot);
        drop(slot);
        self.table.remove_if(identifier, |_, resident| {
            std::ptr::eq(Arc::as_ptr(resident), failed) && resident.get().is_none() && Arc::strong_count(resident) == 1
        });
    }

    fn resident_count(&self) -> usize {
        self.table.iter().filter(|slot| slot.value().get().is_some()).count()
    }
}

/// A process-local write-through cache of singleton documents, keyed by identifier.
///
/// Each identifier maps to at most one resident document. The first
/// [`acquire`](Self::acquire) of an identifier loads its document from the store, or
/// creates it when the store has none; every later acquire is answered from memory. The
/// returned [`Handle`] reads from memory and writes through to the store.
///
/// Clones share the same table, so a cache is typically built once by the host and passed
/// around by clone.
///
/// # Examples
///
/// ```
/// use docket::{IdentifierCache, MemoryStore};
/// use serde_json::json;
/// # futures::executor::block_on(async {
///
/// let cache = IdentifierCache::new(MemoryStore::new());
///
/// let settings = cache.acquire("settings").await?;
/// assert!(settings.set("motd", "hello").await.is_persisted());
///
/// // A second handle sees the same document without touching the store.
/// let again = cache.acquire("settings").await?;
/// assert_eq!(again.get_field("motd"), Some(json!("hello")));
/// # Ok::<(), docket::Error>(())
/// # });
/// ```
pub struct IdentifierCache<S> {
    shared: Arc<Shared<S>>,
}

impl<S> Clone for IdentifierCache<S> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<S> Debug for IdentifierCache<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentifierCache")
            .field("name", &self.shared.name)
            .field("collection", &self.shared.collection)
            .field("coalesce_first_access", &self.shared.coalesce)
            .field("len", &self.shared.resident_count())
            .finish_non_exhaustive()
    }
}

impl<S: DocumentStore> IdentifierCache<S> {
    /// Creates a cache builder over the given store.
    ///
    /// # Examples
    ///
    /// ```
    /// use docket::{IdentifierCache, MemoryStore, TelemetryConfig};
    ///
    /// let cache = IdentifierCache::builder(MemoryStore::new())
    ///     .name("server_globals")
    ///     .collection("globals")
    ///     .telemetry(TelemetryConfig::new().with_logs())
    ///     .build();
    ///
    /// assert_eq!(cache.name(), "server_globals");
    /// ```
    #[must_use]
    pub fn builder(store: S) -> IdentifierCacheBuilder<S> {
        IdentifierCacheBuilder::new(store)
    }

    /// Creates a cache with the default configuration.
    #[must_use]
    pub fn new(store: S) -> Self {
        Self::builder(store).build()
    }

    pub(crate) fn from_parts(
        name: CacheName,
        collection: CollectionName,
        store: S,
        coalesce: bool,
        telemetry: CacheTelemetry,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                name,
                collection,
                store,
                telemetry,
                table: DashMap::new(),
                coalesce,
            }),
        }
    }

    /// Returns a handle to the document for `identifier`, loading or creating it on first access.
    ///
    /// The first access looks the document up by identifier and, if the store has none,
    /// inserts a document holding only the identifier. Later accesses never reach the store.
    ///
    /// # Errors
    ///
    /// Returns the store's error if the first access fails. Nothing is cached in that case,
    /// so the next call retries. A loaded document without a string `_id` yields
    /// [`Error::MalformedDocument`]; a created document that cannot be read back yields
    /// [`Error::NotFound`].
    pub async fn acquire(&self, identifier: &str) -> Result<Handle<S>, Error> {
        let started = Instant::now();
        let shared = &self.shared;

        if let Some(entry) = shared.resident(identifier) {
            shared.record(CacheOperation::Acquire, CacheActivity::Hit, identifier, started);
            return Ok(Handle::new(entry, Arc::clone(shared)));
        }

        let result = if shared.coalesce {
            self.acquire_coalesced(identifier).await
        } else {
            self.acquire_racing(identifier).await
        };

        match result {
            Ok((entry, activity)) => {
                shared.record(CacheOperation::Acquire, activity, identifier, started);
                if activity != CacheActivity::Hit {
                    shared.telemetry.record_size(shared.name, shared.resident_count());
                }
                Ok(Handle::new(entry, Arc::clone(shared)))
            }
            Err(error) => {
                shared.record(CacheOperation::Acquire, CacheActivity::Error, identifier, started);
                Err(error)
            }
        }
    }

    /// Concurrent first accesses share a single load-or-create.
    async fn acquire_coalesced(&self, identifier: &str) -> Result<(Arc<Entry>, CacheActivity), Error> {
        let slot = self.shared.slot(identifier);
        let mut activity = CacheActivity::Hit;

        let result = slot
            .get_or_try_init(async {
                let (entry, loaded) = self.load_or_create(identifier).await?;
                activity = loaded;
                Ok::<_, Error>(Arc::new(entry))
            })
            .await
            .map(Arc::clone);

        match result {
            Ok(entry) => Ok((entry, activity)),
            Err(error) => {
                self.shared.discard_failed(identifier, slot);
                Err(error)
            }
        }
    }

    /// Every first access runs its own load-or-create; the first to finish becomes resident.
    async fn acquire_racing(&self, identifier: &str) -> Result<(Arc<Entry>, CacheActivity), Error> {
        let (entry, activity) = self.load_or_create(identifier).await?;
        let candidate = Arc::new(entry);

        let slot = self.shared.slot(identifier);
        let resident = Arc::clone(slot.get_or_init(async { Arc::clone(&candidate) }).await);

        if Arc::ptr_eq(&resident, &candidate) {
            Ok((resident, activity))
        } else if resident.id == candidate.id {
            Ok((resident, CacheActivity::Hit))
        } else {
            // The losing document stays in the store.
            Ok((resident, CacheActivity::Duplicate))
        }
    }

    async fn load_or_create(&self, identifier: &str) -> Result<(Entry, CacheActivity), Error> {
        let shared = &self.shared;

        if let Some(document) = shared.store.get(shared.collection, &Filter::identifier(identifier)).await? {
            return Ok((Entry::new(identifier, document)?, CacheActivity::Loaded));
        }

        let id = shared.store.create(shared.collection, Document::with_identifier(identifier)).await?;
        let filter = Filter::id(id);
        let fetched = shared.store.get(shared.collection, &filter).await?;
        let document = fetched.ok_or(Error::NotFound {
            collection: shared.collection,
            filter,
        })?;

        Ok((Entry::new(identifier, document)?, CacheActivity::Created))
    }
}

impl<S> IdentifierCache<S> {
    /// Returns a handle for `identifier` if its document is already resident.
    ///
    /// Never touches the store.
    #[must_use]
    pub fn peek(&self, identifier: &str) -> Option<Handle<S>> {
        self.shared
            .resident(identifier)
            .map(|entry| Handle::new(entry, Arc::clone(&self.shared)))
    }

    /// Returns `true` if the document for `identifier` is resident.
    #[must_use]
    pub fn contains(&self, identifier: &str) -> bool {
        self.shared.resident(identifier).is_some()
    }

    /// Returns the number of resident documents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.shared.resident_count()
    }

    /// Returns `true` if no document is resident.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the identifiers of all resident documents, sorted.
    #[must_use]
    pub fn identifiers(&self) -> Vec<String> {
        let mut identifiers: Vec<String> = self
            .shared
            .table
            .iter()
            .filter(|slot| slot.value().get().is_some())
            .map(|slot| slot.key().clone())
            .collect();
        identifiers.sort_unstable();
        identifiers
    }

    /// Returns the name of this cache for telemetry identification.
    #[must_use]
    pub fn name(&self) -> CacheName {
        self.shared.name
    }

    /// Returns the collection documents are stored in.
    #[must_use]
    pub fn collection(&self) -> CollectionName {
        self.shared.collection
    }

    /// Returns the underlying store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.shared.store
    }
}
