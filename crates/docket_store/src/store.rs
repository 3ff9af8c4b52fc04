// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The core trait for document store backends.
//!
//! [`DocumentStore`] is the boundary between the identifier cache and durable storage.
//! Implement it over a database driver, then hand the store to `docket` to get a
//! write-through cache of singleton documents.

use crate::{CollectionName, Document, DocumentId, Error, Fields, Filter, Modification};

/// Trait for document store implementations.
///
/// Every method is a single round-trip to the store and returns an error if the store
/// cannot be reached. Implementations must be safe to call from many tasks at once;
/// [`find_and_modify`](Self::find_and_modify) must be atomic with respect to every other
/// call on the same document.
pub trait DocumentStore: Send + Sync {
    /// Looks up the first document matching `filter`.
    fn get(&self, collection: CollectionName, filter: &Filter) -> impl Future<Output = Result<Option<Document>, Error>> + Send;

    /// Inserts a document and returns the id the store assigned to it.
    ///
    /// Any `_id` already present in `document` is replaced.
    fn create(&self, collection: CollectionName, document: Document) -> impl Future<Output = Result<DocumentId, Error>> + Send;

    /// Shallow-merges `fields` into the document with the given id.
    ///
    /// Returns `false` if no document matched.
    fn update(&self, collection: CollectionName, id: &DocumentId, fields: Fields) -> impl Future<Output = Result<bool, Error>> + Send;

    /// Removes the named fields from the document matching `identifier`.
    ///
    /// Returns `false` if no document matched.
    fn unset(&self, collection: CollectionName, identifier: &str, fields: &[String]) -> impl Future<Output = Result<bool, Error>> + Send;

    /// Atomically applies `modification` to the first document matching `filter` and
    /// returns the document as it is after the modification.
    ///
    /// Returns `None` if no document matched.
    fn find_and_modify(
        &self,
        collection: CollectionName,
        filter: &Filter,
        modification: Modification,
    ) -> impl Future<Output = Result<Option<Document>, Error>> + Send;
}
