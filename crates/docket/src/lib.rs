// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! A process-local write-through cache of singleton documents, keyed by identifier.
//!
//! Frequently read "global" documents, such as server-wide settings or counters, live in a
//! document store but are read far more often than they change. [`IdentifierCache`] keeps
//! one resident copy per identifier, loads or creates it on first access, answers reads
//! from memory, and writes every change through to the store.
//!
//! - Reads ([`Handle::get`], [`Handle::get_field`]) never touch the store.
//! - Writes ([`Handle::set`], [`Handle::set_bulk`], [`Handle::unset`]) update memory
//!   first and report the store side as a [`WriteOutcome`].
//! - Counters ([`Handle::increment`]) are updated atomically by the store, and memory
//!   follows the value the store returns.
//!
//! The store is anything implementing [`DocumentStore`]; [`MemoryStore`] is an in-process
//! implementation.
//!
//! # Examples
//!
//! ```
//! use docket::{IdentifierCache, MemoryStore, TelemetryConfig};
//! use serde_json::json;
//! # futures::executor::block_on(async {
//!
//! let cache = IdentifierCache::builder(MemoryStore::new())
//!     .collection("globals")
//!     .telemetry(TelemetryConfig::new().with_logs())
//!     .build();
//!
//! let settings = cache.acquire("settings").await?;
//! let outcome = settings.set("motd", "welcome").await;
//! assert!(outcome.is_persisted());
//!
//! let visits = settings.increment("visits", 1).await?;
//! assert_eq!(visits, 1);
//! assert_eq!(settings.get_field("motd"), Some(json!("welcome")));
//! # Ok::<(), docket::Error>(())
//! # });
//! ```
//!
//! # Concurrent first access
//!
//! By default, concurrent first accesses to the same identifier share one load-or-create,
//! so exactly one document is created. See
//! [`IdentifierCacheBuilder::coalesce_first_access`] for the alternative.
//!
//! # Features
//!
//! - `metrics`: OpenTelemetry metrics via `TelemetryConfig::with_metrics`.
//! - `test-util`: re-exports `MockStore` for testing against failures and latency.

pub mod builder;
mod cache;
mod handle;
mod outcome;
mod telemetry;

#[doc(inline)]
pub use builder::IdentifierCacheBuilder;
#[doc(inline)]
pub use cache::{CacheName, IdentifierCache};
#[doc(inline)]
pub use docket_store::{
    CollectionName, Document, DocumentId, DocumentStore, Error, Fields, Filter, ID_FIELD, IDENTIFIER_FIELD, MemoryStore,
    Modification, Result,
};
#[doc(inline)]
pub use handle::Handle;
#[doc(inline)]
pub use outcome::WriteOutcome;
#[doc(inline)]
pub use telemetry::TelemetryConfig;

#[cfg(any(feature = "test-util", test))]
#[doc(inline)]
pub use docket_store::testing::{MockStore, StoreOp};
