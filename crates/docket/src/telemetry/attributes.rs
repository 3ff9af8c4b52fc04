// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#[cfg(any(feature = "metrics", test))]
pub(crate) const DOCKET_NAME: &str = "docket.name";

#[cfg(test)]
pub(crate) const DOCKET_EVENT_NAME: &str = "docket.event";

#[cfg(any(feature = "metrics", test))]
pub(crate) const DOCKET_OPERATION_NAME: &str = "docket.operation";

#[cfg(any(feature = "metrics", test))]
pub(crate) const DOCKET_ACTIVITY_NAME: &str = "docket.activity";

#[cfg(test)]
pub(crate) const DOCKET_IDENTIFIER_NAME: &str = "docket.identifier";

#[cfg(test)]
pub(crate) const DOCKET_DURATION_NAME: &str = "docket.duration_ns";
