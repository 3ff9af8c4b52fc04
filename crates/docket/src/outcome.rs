// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Results of write-through operations.

use docket_store::Error;

/// The result of a write-through operation on a [`Handle`](crate::Handle).
///
/// Writes update the resident document first and the store second, so a write never
/// fails as a whole: it reports how far it got. After a diverged write the resident copy
/// holds values the store does not; [`Handle::reload`](crate::Handle::reload) restores the
/// persisted copy.
///
/// # Examples
///
/// ```
/// use docket::{Error, WriteOutcome};
///
/// let outcome = WriteOutcome::Failed(Error::unavailable("timeout"));
/// assert!(outcome.is_diverged());
/// assert!(outcome.into_result().is_err());
/// ```
#[derive(Debug)]
#[must_use = "a write can diverge from the store; inspect the outcome"]
pub enum WriteOutcome {
    /// Memory and store were both updated.
    Persisted,
    /// Memory was updated but the store matched no document.
    Rejected,
    /// Memory was updated but the store call failed.
    Failed(Error),
    /// Nothing was touched because the write was invalid.
    Refused(Error),
}

impl WriteOutcome {
    /// Returns `true` if the store holds the written values.
    #[must_use]
    pub fn is_persisted(&self) -> bool {
        matches!(self, Self::Persisted)
    }

    /// Returns `true` if memory was updated but the store was not.
    #[must_use]
    pub fn is_diverged(&self) -> bool {
        matches!(self, Self::Rejected | Self::Failed(_))
    }

    /// Returns `true` if the write was refused before anything changed.
    #[must_use]
    pub fn is_refused(&self) -> bool {
        matches!(self, Self::Refused(_))
    }

    /// Converts the outcome into a `Result`, mapping [`Rejected`](Self::Rejected) to
    /// [`Error::Rejected`].
    ///
    /// # Errors
    ///
    /// Returns the error for every outcome other than [`Persisted`](Self::Persisted).
    pub fn into_result(self) -> Result<(), Error> {
        match self {
            Self::Persisted => Ok(()),
            Self::Rejected => Err(Error::Rejected),
            Self::Failed(error) | Self::Refused(error) => Err(error),
        }
    }

    pub(crate) fn from_store(result: Result<bool, Error>) -> Self {
        match result {
            Ok(true) => Self::Persisted,
            Ok(false) => Self::Rejected,
            Err(error) => Self::Failed(error),
        }
    }
}
