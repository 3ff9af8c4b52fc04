// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Document model and store abstraction for the `docket` identifier cache.
//!
//! This crate defines the [`DocumentStore`] trait that durable backends implement, the
//! [`Document`] model they exchange with the cache, and the [`Error`] type shared by
//! both layers.
//!
//! # Overview
//!
//! A store holds collections of schemaless documents. Each document carries a
//! store-assigned [`DocumentId`] under [`ID_FIELD`] and a caller-chosen logical identifier
//! under [`IDENTIFIER_FIELD`]. The cache in `docket` keeps one resident copy per
//! identifier and writes every change through to the store.
//!
//! # Implementing a Store
//!
//! Implement all methods of [`DocumentStore`]. [`MemoryStore`] is a complete in-process
//! implementation and a good reference:
//!
//! ```
//! use docket_store::{Document, DocumentStore, Filter, MemoryStore, Modification};
//! use serde_json::json;
//! # futures::executor::block_on(async {
//!
//! let store = MemoryStore::new();
//! store.create("globals", Document::with_identifier("visits")).await?;
//!
//! let after = store
//!     .find_and_modify("globals", &Filter::identifier("visits"), Modification::increment("count", 1))
//!     .await?;
//! assert_eq!(after.and_then(|d| d.get("count").cloned()), Some(json!(1)));
//! # Ok::<(), docket_store::Error>(())
//! # });
//! ```
//!
//! # Testing
//!
//! Enable the `test-util` feature for [`testing::MockStore`], which records calls and
//! injects failures and latency.

mod document;
pub mod error;
mod memory;
mod store;
#[cfg(any(feature = "test-util", test))]
pub mod testing;

#[doc(inline)]
pub use document::{CollectionName, Document, DocumentId, Fields, Filter, ID_FIELD, IDENTIFIER_FIELD, Modification, is_reserved_field};
#[doc(inline)]
pub use error::{Error, Result};
#[doc(inline)]
pub use memory::MemoryStore;
#[doc(inline)]
pub use store::DocumentStore;
