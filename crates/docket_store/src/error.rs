// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Error types for store and cache operations.

use thiserror::Error;

use crate::{CollectionName, Filter};

/// An error from a document store or from the cache built on top of it.
///
/// # Thread safety
///
/// This type is thread-safe.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The store could not be reached or the driver failed the call.
    #[error("document store unavailable: {0}")]
    Unavailable(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// A document that was expected to exist is missing.
    #[error("no document matching {filter} in collection {collection}")]
    NotFound {
        /// The collection searched.
        collection: CollectionName,
        /// The filter that matched nothing.
        filter: Filter,
    },

    /// A stored document violates the document model, e.g. it has no `_id`.
    #[error("malformed document: {0}")]
    MalformedDocument(String),

    /// An increment left a value in the field that is not an integer.
    #[error("field {field} does not hold an integer counter")]
    NotACounter {
        /// The field that was incremented.
        field: String,
    },

    /// A write targeted a field that is managed by the store.
    #[error("field {0} is reserved and cannot be written")]
    ReservedField(String),

    /// The store accepted the call but reported that no document was modified.
    #[error("the document store did not apply the write")]
    Rejected,

    /// Converting between a record type and a document failed.
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Wraps a transport or driver failure.
    ///
    /// This is the constructor store implementations use to surface their own errors.
    ///
    /// # Examples
    ///
    /// ```
    /// use docket_store::Error;
    ///
    /// let error = Error::unavailable("connection refused");
    /// assert!(error.to_string().contains("connection refused"));
    /// ```
    pub fn unavailable(cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Unavailable(cause.into())
    }

    /// Returns `true` if the error came from the store being unreachable.
    #[must_use]
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

/// A specialized [`Result`] type for store and cache operations.
pub type Result<T> = std::result::Result<T, Error>;
