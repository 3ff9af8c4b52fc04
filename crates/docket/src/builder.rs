// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Builder for configuring an [`IdentifierCache`].

use docket_store::{CollectionName, DocumentStore};

use crate::{IdentifierCache, TelemetryConfig, cache::CacheName};

/// Default telemetry name of a cache.
pub const DEFAULT_NAME: CacheName = "docket";

/// Default collection documents are stored in.
pub const DEFAULT_COLLECTION: CollectionName = "globals";

/// Builder for constructing an [`IdentifierCache`].
///
/// Created by [`IdentifierCache::builder`].
///
/// # Examples
///
/// ```
/// use docket::{IdentifierCache, MemoryStore};
///
/// let cache = IdentifierCache::builder(MemoryStore::new())
///     .collection("server_globals")
///     .coalesce_first_access(true)
///     .build();
///
/// assert_eq!(cache.collection(), "server_globals");
/// ```
#[derive(Debug)]
pub struct IdentifierCacheBuilder<S> {
    store: S,
    name: CacheName,
    collection: CollectionName,
    coalesce: bool,
    telemetry: TelemetryConfig,
}

impl<S: DocumentStore> IdentifierCacheBuilder<S> {
    pub(crate) fn new(store: S) -> Self {
        Self {
            store,
            name: DEFAULT_NAME,
            collection: DEFAULT_COLLECTION,
            coalesce: true,
            telemetry: TelemetryConfig::default(),
        }
    }

    /// Sets the name used to identify this cache in telemetry output.
    #[must_use]
    pub fn name(mut self, name: CacheName) -> Self {
        self.name = name;
        self
    }

    /// Sets the collection documents are loaded from and created in.
    #[must_use]
    pub fn collection(mut self, collection: CollectionName) -> Self {
        self.collection = collection;
        self
    }

    /// Controls whether concurrent first accesses to the same identifier share one
    /// load-or-create.
    ///
    /// Enabled by default. When disabled, every concurrent first access runs its own
    /// load-or-create and may insert its own document; the first to finish becomes resident
    /// and the others are reported as duplicates. The extra documents stay in the store.
    #[must_use]
    pub fn coalesce_first_access(mut self, enabled: bool) -> Self {
        self.coalesce = enabled;
        self
    }

    /// Configures logs and metrics for this cache.
    #[must_use]
    pub fn telemetry(mut self, config: TelemetryConfig) -> Self {
        self.telemetry = config;
        self
    }

    /// Builds the cache.
    #[must_use]
    pub fn build(self) -> IdentifierCache<S> {
        IdentifierCache::from_parts(self.name, self.collection, self.store, self.coalesce, self.telemetry.build())
    }
}
