// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Cache telemetry: structured `tracing` events and optional OpenTelemetry metrics.
//!
//! Every cache and handle operation reports one event through [`CacheTelemetry::record`].
//! Logs are opt-in per cache; metrics additionally require the `metrics` feature.

use std::time::Duration;

#[cfg(any(feature = "metrics", test))]
use opentelemetry::{
    KeyValue,
    metrics::{Counter, Gauge, Histogram},
};
use tracing::Level;

pub(crate) mod attributes;
mod config;
#[cfg(any(feature = "metrics", test))]
pub(crate) mod metrics;
#[cfg(test)]
pub(crate) mod testing;

pub use config::TelemetryConfig;

/// Records cache operations as logs and metrics.
///
/// Built from a [`TelemetryConfig`]; a default instance records nothing.
#[derive(Clone, Debug, Default)]
pub(crate) struct CacheTelemetry {
    logging_enabled: bool,
    #[cfg(any(feature = "metrics", test))]
    event_counter: Option<Counter<u64>>,
    #[cfg(any(feature = "metrics", test))]
    operation_duration: Option<Histogram<f64>>,
    #[cfg(any(feature = "metrics", test))]
    cache_size: Option<Gauge<u64>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CacheOperation {
    Acquire,
    Set,
    SetBulk,
    Unset,
    Increment,
    Reload,
}

impl CacheOperation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Acquire => "docket.acquire",
            Self::Set => "docket.set",
            Self::SetBulk => "docket.set_bulk",
            Self::Unset => "docket.unset",
            Self::Increment => "docket.increment",
            Self::Reload => "docket.reload",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CacheActivity {
    /// The entry was already resident.
    Hit,
    /// The entry was loaded from an existing document.
    Loaded,
    /// A new document was created for the entry.
    Created,
    /// A concurrent first access created a second document that did not become resident.
    Duplicate,
    Persisted,
    /// The store matched no document for a write.
    Rejected,
    /// The write was refused before touching memory or the store.
    Refused,
    Error,
}

impl CacheActivity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hit => "docket.hit",
            Self::Loaded => "docket.loaded",
            Self::Created => "docket.created",
            Self::Duplicate => "docket.duplicate",
            Self::Persisted => "docket.persisted",
            Self::Rejected => "docket.rejected",
            Self::Refused => "docket.refused",
            Self::Error => "docket.error",
        }
    }

    pub fn level(self) -> Level {
        match self {
            Self::Hit | Self::Persisted => Level::DEBUG,
            Self::Loaded | Self::Created => Level::INFO,
            Self::Duplicate | Self::Rejected | Self::Refused => Level::WARN,
            Self::Error => Level::ERROR,
        }
    }
}

impl CacheTelemetry {
    /// Records one cache operation.
    pub(crate) fn record(&self, name: &'static str, operation: CacheOperation, activity: CacheActivity, identifier: &str, duration: Duration) {
        #[cfg(any(feature = "metrics", test))]
        {
            let attrs = [
                KeyValue::new(attributes::DOCKET_NAME, name),
                KeyValue::new(attributes::DOCKET_OPERATION_NAME, operation.as_str()),
                KeyValue::new(attributes::DOCKET_ACTIVITY_NAME, activity.as_str()),
            ];

            if let Some(c) = &self.event_counter {
                c.add(1, &attrs);
            }

            if let Some(h) = &self.operation_duration {
                h.record(duration.as_secs_f64(), &attrs);
            }
        }

        if self.logging_enabled {
            Self::emit(name, operation, activity, identifier, duration);
        }
    }

    /// Records the number of resident entries.
    #[cfg_attr(not(any(feature = "metrics", test)), expect(unused_variables, reason = "no-op without the metrics feature"))]
    pub(crate) fn record_size(&self, name: &'static str, size: usize) {
        #[cfg(any(feature = "metrics", test))]
        if let Some(g) = &self.cache_size {
            g.record(u64::try_from(size).unwrap_or(u64::MAX), &[KeyValue::new(attributes::DOCKET_NAME, name)]);
        }
    }

    fn emit(name: &'static str, operation: CacheOperation, activity: CacheActivity, identifier: &str, duration: Duration) {
        let op = operation.as_str();
        let act = activity.as_str();
        let duration_ns = duration.as_nanos();

        // Tracing levels must be constant, hence one macro arm per level.
        // Field names must match the constants in attributes.rs.
        macro_rules! emit_event {
            ($level:ident) => {
                tracing::$level!(
                    docket.name = name,
                    docket.operation = op,
                    docket.activity = act,
                    docket.identifier = identifier,
                    docket.duration_ns = duration_ns,
                    "docket.event"
                )
            };
        }

        match activity.level() {
            Level::ERROR => emit_event!(error),
            Level::WARN => emit_event!(warn),
            Level::INFO => emit_event!(info),
            _ => emit_event!(debug),
        }
    }
}
