// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Telemetry configuration for identifier caches.

#[cfg(any(feature = "metrics", test))]
use opentelemetry::metrics::{Meter, MeterProvider};

use crate::telemetry::CacheTelemetry;

/// Configuration for cache telemetry.
///
/// Everything is disabled by default. Enable logs and/or metrics with the builder
/// methods, then pass this to the cache builder via
/// [`telemetry`](crate::IdentifierCacheBuilder::telemetry).
///
/// # Examples
///
/// ```
/// use docket::TelemetryConfig;
///
/// // Emit a `tracing` event per operation
/// let config = TelemetryConfig::new().with_logs();
/// ```
///
/// With the `metrics` feature, metrics are recorded through any OpenTelemetry meter
/// provider:
///
/// ```ignore
/// let config = TelemetryConfig::new()
///     .with_logs()
///     .with_metrics(&meter_provider);
/// ```
#[derive(Clone, Debug, Default)]
pub struct TelemetryConfig {
    logs_enabled: bool,
    #[cfg(any(feature = "metrics", test))]
    meter: Option<Meter>,
}

impl TelemetryConfig {
    /// Creates a new telemetry configuration with everything disabled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables structured logging for cache operations.
    ///
    /// Each operation emits one `docket.event` through the `tracing` crate. Installing a
    /// subscriber is up to the host.
    #[must_use]
    pub fn with_logs(self) -> Self {
        Self { logs_enabled: true, ..self }
    }

    /// Enables metrics collection using the provided meter provider.
    #[cfg(any(feature = "metrics", test))]
    #[cfg_attr(docsrs, doc(cfg(feature = "metrics")))]
    #[must_use]
    pub fn with_metrics(mut self, provider: &dyn MeterProvider) -> Self {
        self.meter = Some(crate::telemetry::metrics::create_meter(provider));
        self
    }

    /// Returns `true` if logging is enabled.
    #[must_use]
    pub fn logs_enabled(&self) -> bool {
        self.logs_enabled
    }

    pub(crate) fn build(self) -> CacheTelemetry {
        #[cfg(any(feature = "metrics", test))]
        use crate::telemetry::metrics::{create_event_counter, create_operation_duration_histogram, create_size_gauge};

        CacheTelemetry {
            logging_enabled: self.logs_enabled,
            #[cfg(any(feature = "metrics", test))]
            event_counter: self.meter.as_ref().map(create_event_counter),
            #[cfg(any(feature = "metrics", test))]
            operation_duration: self.meter.as_ref().map(create_operation_duration_histogram),
            #[cfg(any(feature = "metrics", test))]
            cache_size: self.meter.as_ref().map(create_size_gauge),
        }
    }
}
