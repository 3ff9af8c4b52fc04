// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! In-process document store.

use std::{collections::HashMap, sync::Arc};

use parking_lot::Mutex;
use serde_json::Value;
use uuid::Uuid;

use crate::{CollectionName, Document, DocumentId, DocumentStore, Error, Fields, Filter, ID_FIELD, Modification};

type Collections = HashMap<CollectionName, Vec<Document>>;

/// A document store that keeps everything in process memory.
///
/// Documents within a collection keep their insertion order, so when several documents
/// match a filter the oldest one wins. Every call runs under one lock, which makes
/// [`find_and_modify`](DocumentStore::find_and_modify) atomic. Clones share the same data.
///
/// # Examples
///
/// ```
/// use docket_store::{Document, DocumentStore, Filter, MemoryStore};
/// # futures::executor::block_on(async {
///
/// let store = MemoryStore::new();
/// let id = store.create("globals", Document::with_identifier("settings")).await?;
///
/// let found = store.get("globals", &Filter::identifier("settings")).await?;
/// assert_eq!(found.and_then(|d| d.id()), Some(id));
/// # Ok::<(), docket_store::Error>(())
/// # });
/// ```
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    collections: Arc<Mutex<Collections>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of every document in a collection, in insertion order.
    #[must_use]
    pub fn documents(&self, collection: CollectionName) -> Vec<Document> {
        self.collections.lock().get(collection).cloned().unwrap_or_default()
    }

    /// Returns the number of documents in a collection.
    #[must_use]
    pub fn document_count(&self, collection: CollectionName) -> usize {
        self.collections.lock().get(collection).map_or(0, Vec::len)
    }

    /// Deletes the document with the given id, returning `true` if it existed.
    ///
    /// Deletion is not part of [`DocumentStore`]; it exists to simulate documents removed
    /// behind the cache's back.
    pub fn delete(&self, collection: CollectionName, id: &DocumentId) -> bool {
        let mut collections = self.collections.lock();
        let Some(documents) = collections.get_mut(collection) else {
            return false;
        };
        let filter = Filter::Id(id.clone());
        let before = documents.len();
        documents.retain(|document| !filter.matches(document));
        documents.len() != before
    }

    fn find_mut<'a>(collections: &'a mut Collections, collection: CollectionName, filter: &Filter) -> Option<&'a mut Document> {
        collections.get_mut(collection)?.iter_mut().find(|document| filter.matches(document))
    }
}

fn apply(document: &mut Document, modification: Modification) -> Result<(), Error> {
    match modification {
        Modification::Increment { field, delta } => {
            let current = match document.get(&field) {
                None => 0,
                Some(value) => value.as_i64().ok_or_else(|| Error::NotACounter { field: field.clone() })?,
            };
            let next = current.checked_add(delta).ok_or_else(|| Error::NotACounter { field: field.clone() })?;
            document.insert(field, next);
        }
        Modification::Set { field, value } => {
            document.insert(field, value);
        }
    }
    Ok(())
}

impl DocumentStore for MemoryStore {
    async fn get(&self, collection: CollectionName, filter: &Filter) -> Result<Option<Document>, Error> {
        let collections = self.collections.lock();
        Ok(collections
            .get(collection)
            .and_then(|documents| documents.iter().find(|document| filter.matches(document)))
            .cloned())
    }

    async fn create(&self, collection: CollectionName, mut document: Document) -> Result<DocumentId, Error> {
        let id = DocumentId::new(Uuid::new_v4().simple().to_string());
        document.insert(ID_FIELD, Value::String(id.as_str().to_owned()));
        self.collections.lock().entry(collection).or_default().push(document);
        Ok(id)
    }

    async fn update(&self, collection: CollectionName, id: &DocumentId, mut fields: Fields) -> Result<bool, Error> {
        fields.remove(ID_FIELD);
        let mut collections = self.collections.lock();
        match Self::find_mut(&mut collections, collection, &Filter::Id(id.clone())) {
            Some(document) => {
                document.merge(fields);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn unset(&self, collection: CollectionName, identifier: &str, fields: &[String]) -> Result<bool, Error> {
        let mut collections = self.collections.lock();
        match Self::find_mut(&mut collections, collection, &Filter::identifier(identifier)) {
            Some(document) => {
                for field in fields.iter().filter(|field| field.as_str() != ID_FIELD) {
                    document.remove(field);
                }
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn find_and_modify(&self, collection: CollectionName, filter: &Filter, modification: Modification) -> Result<Option<Document>, Error> {
        let mut collections = self.collections.lock();
        let Some(document) = Self::find_mut(&mut collections, collection, filter) else {
            return Ok(None);
        };
        apply(document, modification)?;
        Ok(Some(document.clone()))
    }
}
