// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Accessors bound to a single resident document.

use std::{fmt::Debug, sync::Arc, time::Instant};

use docket_store::{Document, DocumentId, DocumentStore, Error, Fields, Filter, Modification, is_reserved_field};
use serde::{Serialize, de::DeserializeOwned, ser::Error as _};
use serde_json::Value;

use crate::{
    WriteOutcome,
    cache::{Entry, Shared},
    telemetry::{CacheActivity, CacheOperation},
};

/// An accessor for the resident document of one identifier.
///
/// Handles hold no data of their own: every handle for an identifier operates on the same
/// resident entry, so a write through one handle is immediately visible through all of
/// them. Reads never touch the store.
///
/// Writes ([`set`](Self::set), [`set_bulk`](Self::set_bulk), [`set_from`](Self::set_from),
/// [`unset`](Self::unset)) update memory first and then the store, and report the store's
/// side as a [`WriteOutcome`]. They are not atomic against concurrent writers of the same
/// field; use [`increment`](Self::increment) for counters.
///
/// # Examples
///
/// ```
/// use docket::{IdentifierCache, MemoryStore};
/// use serde_json::json;
/// # futures::executor::block_on(async {
///
/// let cache = IdentifierCache::new(MemoryStore::new());
/// let stats = cache.acquire("stats").await?;
///
/// assert_eq!(stats.increment("visits", 5).await?, 5);
/// assert_eq!(stats.increment_one("visits").await?, 6);
///
/// assert!(stats.unset("visits").await.is_persisted());
/// assert_eq!(stats.get_field("visits"), None);
/// # Ok::<(), docket::Error>(())
/// # });
/// ```
pub struct Handle<S> {
    entry: Arc<Entry>,
    shared: Arc<Shared<S>>,
}

impl<S> Clone for Handle<S> {
    fn clone(&self) -> Self {
        Self {
            entry: Arc::clone(&self.entry),
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<S> Debug for Handle<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Handle")
            .field("identifier", &self.entry.identifier)
            .field("id", &self.entry.id)
            .finish_non_exhaustive()
    }
}

impl<S> Handle<S> {
    pub(crate) fn new(entry: Arc<Entry>, shared: Arc<Shared<S>>) -> Self {
        Self { entry, shared }
    }

    /// Returns the identifier this handle is bound to.
    #[must_use]
    pub fn identifier(&self) -> &str {
        &self.entry.identifier
    }

    /// Returns the store-assigned id of the document.
    #[must_use]
    pub fn id(&self) -> &DocumentId {
        &self.entry.id
    }

    /// Returns `true` if both handles operate on the same resident entry.
    #[must_use]
    pub fn is_same_entry(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.entry, &other.entry)
    }

    /// Returns a copy of the current resident document.
    #[must_use]
    pub fn get(&self) -> Document {
        self.entry.document.read().clone()
    }

    /// Returns the current value of a field, or `None` if it was never set.
    #[must_use]
    pub fn get_field(&self, field: &str) -> Option<Value> {
        self.entry.document.read().get(field).cloned()
    }

    /// Deserializes the resident document into a record type.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Serialization`] if the document does not fit `T`.
    pub fn get_as<T: DeserializeOwned>(&self) -> Result<T, Error> {
        Ok(serde_json::from_value(Value::Object(self.get().into_fields()))?)
    }

    /// Deserializes a single field, returning `Ok(None)` if the field is absent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Serialization`] if the value does not fit `T`.
    pub fn get_field_as<T: DeserializeOwned>(&self, field: &str) -> Result<Option<T>, Error> {
        self.get_field(field).map(serde_json::from_value).transpose().map_err(Error::from)
    }
}

impl<S: DocumentStore> Handle<S> {
    /// Sets one field in memory, then writes it to the store.
    pub async fn set(&self, field: &str, value: impl Into<Value>) -> WriteOutcome {
        let mut fields = Fields::new();
        fields.insert(field.to_owned(), value.into());
        self.write(CacheOperation::Set, fields).await
    }

    /// Shallow-merges `fields` into memory, then writes them to the store in one update.
    ///
    /// Top-level fields are replaced as a whole; fields not named are left untouched.
    pub async fn set_bulk(&self, fields: Fields) -> WriteOutcome {
        self.write(CacheOperation::SetBulk, fields).await
    }

    /// Serializes `record` and applies its fields like [`set_bulk`](Self::set_bulk).
    ///
    /// Reserved fields carried by the record are skipped when they match the resident
    /// document, so a record read with [`get_as`](Self::get_as) can be written back.
    /// Records that do not serialize to an object are refused.
    pub async fn set_from<T: Serialize + ?Sized>(&self, record: &T) -> WriteOutcome {
        let fields = match serde_json::to_value(record) {
            Ok(Value::Object(fields)) => fields,
            Ok(_) => {
                let error = serde_json::Error::custom("record does not serialize to an object");
                return self.refuse(CacheOperation::SetBulk, Error::Serialization(error));
            }
            Err(error) => return self.refuse(CacheOperation::SetBulk, Error::Serialization(error)),
        };

        let fields: Fields = {
            let resident = self.entry.document.read();
            fields
                .into_iter()
                .filter(|(field, value)| !(is_reserved_field(field) && resident.get(field) == Some(value)))
                .collect()
        };

        self.write(CacheOperation::SetBulk, fields).await
    }

    /// Removes a field from memory, then from the store.
    pub async fn unset(&self, field: &str) -> WriteOutcome {
        let started = Instant::now();
        if is_reserved_field(field) {
            return self.refuse(CacheOperation::Unset, Error::ReservedField(field.to_owned()));
        }

        self.entry.document.write().remove(field);

        let fields = [field.to_owned()];
        let result = self
            .shared
            .store
            .unset(self.shared.collection, &self.entry.identifier, &fields)
            .await;
        self.finish(CacheOperation::Unset, WriteOutcome::from_store(result), started)
    }

    /// Atomically adds `delta` to a counter field and returns the new value.
    ///
    /// The store performs the arithmetic: a field with a value is incremented, an absent
    /// or `null` field is set to `delta`. The resident copy is then updated with the value
    /// the store returned, never with a locally computed sum, so concurrent increments from
    /// other processes are never lost.
    ///
    /// # Errors
    ///
    /// - [`Error::ReservedField`] for `_id` and `identifier`.
    /// - The store's error if the call fails. Memory is unchanged in that case.
    /// - [`Error::NotFound`] if the document vanished from the store.
    /// - [`Error::NotACounter`] if the field does not hold an integer after the update.
    pub async fn increment(&self, field: &str, delta: i64) -> Result<i64, Error> {
        let started = Instant::now();
        let result = self.apply_increment(field, delta).await;

        let activity = match &result {
            Ok(_) => CacheActivity::Persisted,
            Err(Error::ReservedField(_)) => CacheActivity::Refused,
            Err(_) => CacheActivity::Error,
        };
        self.shared
            .record(CacheOperation::Increment, activity, &self.entry.identifier, started);

        result
    }

    /// Increments a counter field by one.
    ///
    /// # Errors
    ///
    /// See [`increment`](Self::increment).
    pub async fn increment_one(&self, field: &str) -> Result<i64, Error> {
        self.increment(field, 1).await
    }

    /// Replaces the resident document with the copy held by the store.
    ///
    /// Use this to recover after a diverged write.
    ///
    /// # Errors
    ///
    /// Returns the store's error, or [`Error::NotFound`] if the document no longer exists.
    /// Memory is unchanged on failure.
    pub async fn reload(&self) -> Result<(), Error> {
        let started = Instant::now();
        let result = self.fetch().await.map(|document| {
            *self.entry.document.write() = document;
        });

        let activity = if result.is_ok() { CacheActivity::Loaded } else { CacheActivity::Error };
        self.shared
            .record(CacheOperation::Reload, activity, &self.entry.identifier, started);

        result
    }

    async fn write(&self, operation: CacheOperation, fields: Fields) -> WriteOutcome {
        let started = Instant::now();
        if let Some(field) = fields.keys().find(|field| is_reserved_field(field)) {
            return self.refuse(operation, Error::ReservedField(field.clone()));
        }

        self.entry.document.write().merge(fields.clone());

        let result = self.shared.store.update(self.shared.collection, &self.entry.id, fields).await;
        self.finish(operation, WriteOutcome::from_store(result), started)
    }

    async fn apply_increment(&self, field: &str, delta: i64) -> Result<i64, Error> {
        if is_reserved_field(field) {
            return Err(Error::ReservedField(field.to_owned()));
        }

        let defined = self.entry.document.read().get(field).is_some_and(|value| !value.is_null());
        let modification = if defined {
            Modification::increment(field, delta)
        } else {
            Modification::set(field, delta)
        };

        let collection = self.shared.collection;
        let filter = Filter::id(self.entry.id.clone());
        let updated = self.shared.store.find_and_modify(collection, &filter, modification).await?;
        let document = updated.ok_or(Error::NotFound { collection, filter })?;

        let value = document
            .get(field)
            .and_then(Value::as_i64)
            .ok_or_else(|| Error::NotACounter { field: field.to_owned() })?;

        self.entry.document.write().insert(field, value);
        Ok(value)
    }

    async fn fetch(&self) -> Result<Document, Error> {
        let collection = self.shared.collection;
        let filter = Filter::id(self.entry.id.clone());
        let fetched = self.shared.store.get(collection, &filter).await?;
        fetched.ok_or(Error::NotFound { collection, filter })
    }

    fn refuse(&self, operation: CacheOperation, error: Error) -> WriteOutcome {
        self.shared
            .record(operation, CacheActivity::Refused, &self.entry.identifier, Instant::now());
        WriteOutcome::Refused(error)
    }

    fn finish(&self, operation: CacheOperation, outcome: WriteOutcome, started: Instant) -> WriteOutcome {
        let activity = match &outcome {
            WriteOutcome::Persisted => CacheActivity::Persisted,
            WriteOutcome::Rejected => CacheActivity::Rejected,
            WriteOutcome::Failed(_) => CacheActivity::Error,
            WriteOutcome::Refused(_) => CacheActivity::Refused,
        };
        self.shared.record(operation, activity, &self.entry.identifier, started);
        outcome
    }
}
