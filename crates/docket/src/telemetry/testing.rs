// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Test utilities for telemetry validation.

use std::io::Write;
use std::sync::Arc;

use opentelemetry::KeyValue;
use opentelemetry_sdk::metrics::data::{AggregatedMetrics, Metric, MetricData, ResourceMetrics, ScopeMetrics};
use opentelemetry_sdk::metrics::{InMemoryMetricExporter, SdkMeterProvider};
use parking_lot::Mutex;
use tracing_subscriber::fmt::MakeWriter;

/// Collects OpenTelemetry metrics in memory for assertions.
#[derive(Debug)]
pub(crate) struct MetricTester {
    exporter: InMemoryMetricExporter,
    provider: SdkMeterProvider,
}

impl MetricTester {
    #[must_use]
    pub fn new() -> Self {
        let exporter = InMemoryMetricExporter::default();
        Self {
            provider: SdkMeterProvider::builder().with_periodic_exporter(exporter.clone()).build(),
            exporter,
        }
    }

    #[must_use]
    pub fn meter_provider(&self) -> &SdkMeterProvider {
        &self.provider
    }

    fn with_metrics<T>(&self, f: impl Fn(&Metric) -> Vec<T>) -> Vec<T> {
        self.provider.force_flush().unwrap();
        self.exporter
            .get_finished_metrics()
            .unwrap()
            .iter()
            .flat_map(ResourceMetrics::scope_metrics)
            .flat_map(ScopeMetrics::metrics)
            .flat_map(f)
            .collect()
    }

    /// Flushes pending data points and returns every attribute seen so far.
    #[must_use]
    pub fn collect_attributes(&self) -> Vec<KeyValue> {
        self.collect_points().into_iter().flatten().collect()
    }

    /// Flushes pending data points and returns the attribute set of each one.
    #[must_use]
    pub fn collect_points(&self) -> Vec<Vec<KeyValue>> {
        self.with_metrics(points_of)
    }

    /// Flushes pending data points and returns the names of the metrics that have any.
    #[must_use]
    pub fn collect_names(&self) -> Vec<String> {
        self.with_metrics(|metric| vec![metric.name().to_owned()])
    }

    pub fn assert_attributes_contain(&self, expected: &[KeyValue]) {
        let attributes = self.collect_attributes();
        for attr in expected {
            assert!(attributes.contains(attr), "attribute {attr:?} not found in: {attributes:?}");
        }
    }

    /// Asserts that a single data point carries all of `expected`.
    pub fn assert_point_with(&self, expected: &[KeyValue]) {
        let points = self.collect_points();
        assert!(
            points.iter().any(|point| expected.iter().all(|attr| point.contains(attr))),
            "no data point with {expected:?} in: {points:?}"
        );
    }
}

fn points_of(metric: &Metric) -> Vec<Vec<KeyValue>> {
    macro_rules! points {
        ($data:expr) => {
            match $data {
                MetricData::Gauge(d) => d.data_points().map(|p| p.attributes().cloned().collect()).collect(),
                MetricData::Sum(d) => d.data_points().map(|p| p.attributes().cloned().collect()).collect(),
                MetricData::Histogram(d) => d.data_points().map(|p| p.attributes().cloned().collect()).collect(),
                MetricData::ExponentialHistogram(d) => d.data_points().map(|p| p.attributes().cloned().collect()).collect(),
            }
        };
    }

    match metric.data() {
        AggregatedMetrics::F64(data) => points!(data),
        AggregatedMetrics::U64(data) => points!(data),
        AggregatedMetrics::I64(data) => points!(data),
    }
}

/// Captures formatted `tracing` output into a shared buffer.
///
/// Install with `tracing::subscriber::set_default(capture.subscriber())`, which scopes the
/// capture to the current thread.
#[derive(Debug, Clone, Default)]
pub(crate) struct LogCapture {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl LogCapture {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn output(&self) -> String {
        String::from_utf8_lossy(&self.buffer.lock()).into_owned()
    }

    pub fn assert_contains(&self, expected: &str) {
        let output = self.output();
        assert!(output.contains(expected), "log output does not contain '{expected}', got:\n{output}");
    }

    #[must_use]
    pub fn subscriber(&self) -> impl tracing::Subscriber {
        use tracing_subscriber::layer::SubscriberExt;
        tracing_subscriber::registry().with(
            tracing_subscriber::fmt::layer()
                .with_writer(self.clone())
                .with_ansi(false),
        )
    }
}

impl<'a> MakeWriter<'a> for LogCapture {
    type Writer = LogCaptureWriter;

    fn make_writer(&'a self) -> Self::Writer {
        LogCaptureWriter {
            buffer: Arc::clone(&self.buffer),
        }
    }
}

pub(crate) struct LogCaptureWriter {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl Write for LogCaptureWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buffer.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
