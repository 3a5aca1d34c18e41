//! Prometheus-backed metrics registry.
//!
//! # Design
//! - Encapsulates collector registration to keep the public API small.
//! - Counters track files, compressor attempts, and relocations by outcome.

use std::sync::Arc;

use prometheus::core::Collector;
use prometheus::{Encoder, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use serde::Serialize;

use crate::error::{TelemetryError, TelemetryResult};

/// Prometheus-backed metrics registry shared across the pipeline and API.
#[derive(Clone)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

struct MetricsInner {
    registry: Registry,
    files_processed_total: IntCounterVec,
    tool_attempts_total: IntCounterVec,
    relocations_total: IntCounterVec,
    http_requests_total: IntCounterVec,
    ingestion_running: IntGauge,
    files_in_flight: IntGauge,
}

/// Point-in-time view of the gauges, used by health reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    /// Whether the ingestion pipeline is running.
    pub ingestion_running: bool,
    /// Files currently being compressed.
    pub files_in_flight: i64,
}

impl Metrics {
    /// Construct a registry with every collector registered.
    ///
    /// # Errors
    ///
    /// Returns an error if a collector cannot be built or registered.
    pub fn new() -> TelemetryResult<Self> {
        let registry = Registry::new();

        let files_processed_total = counter_vec(
            "files_processed_total",
            "Files processed by final outcome profile",
            &["profile"],
        )?;
        let tool_attempts_total = counter_vec(
            "tool_attempts_total",
            "Compressor attempts by profile and status",
            &["profile", "status"],
        )?;
        let relocations_total = counter_vec(
            "relocations_total",
            "Source file relocations by status",
            &["status"],
        )?;
        let http_requests_total = counter_vec(
            "http_requests_total",
            "Total HTTP requests received",
            &["route", "code"],
        )?;
        let ingestion_running = gauge(
            "ingestion_running",
            "1 while the ingestion pipeline is running",
        )?;
        let files_in_flight = gauge("files_in_flight", "Files currently being compressed")?;

        register(&registry, "files_processed_total", &files_processed_total)?;
        register(&registry, "tool_attempts_total", &tool_attempts_total)?;
        register(&registry, "relocations_total", &relocations_total)?;
        register(&registry, "http_requests_total", &http_requests_total)?;
        register(&registry, "ingestion_running", &ingestion_running)?;
        register(&registry, "files_in_flight", &files_in_flight)?;

        Ok(Self {
            inner: Arc::new(MetricsInner {
                registry,
                files_processed_total,
                tool_attempts_total,
                relocations_total,
                http_requests_total,
                ingestion_running,
                files_in_flight,
            }),
        })
    }

    /// Count a finished file under its outcome label.
    pub fn inc_file_processed(&self, profile: &str) {
        self.inner
            .files_processed_total
            .with_label_values(&[profile])
            .inc();
    }

    /// Count one compressor attempt.
    pub fn inc_tool_attempt(&self, profile: &str, status: &str) {
        self.inner
            .tool_attempts_total
            .with_label_values(&[profile, status])
            .inc();
    }

    /// Count one relocation by status (`processed`, `failed`, `abandoned`).
    pub fn inc_relocation(&self, status: &str) {
        self.inner
            .relocations_total
            .with_label_values(&[status])
            .inc();
    }

    /// Increment the HTTP request counter for the given route and status code.
    pub fn inc_http_request(&self, route: &str, status: u16) {
        let code = status.to_string();
        self.inner
            .http_requests_total
            .with_label_values(&[route, code.as_str()])
            .inc();
    }

    /// Flip the running gauge.
    pub fn set_ingestion_running(&self, running: bool) {
        self.inner.ingestion_running.set(i64::from(running));
    }

    /// Set the number of files being compressed.
    pub fn set_files_in_flight(&self, count: usize) {
        self.inner
            .files_in_flight
            .set(i64::try_from(count).unwrap_or(i64::MAX));
    }

    /// Current gauge values.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            ingestion_running: self.inner.ingestion_running.get() > 0,
            files_in_flight: self.inner.files_in_flight.get(),
        }
    }

    /// Render the registry in the Prometheus text exposition format.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails or produces invalid UTF-8.
    pub fn render(&self) -> TelemetryResult<String> {
        let encoder = TextEncoder::new();
        let families = self.inner.registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&families, &mut buffer)
            .map_err(|source| TelemetryError::MetricsEncode { source })?;
        String::from_utf8(buffer).map_err(|source| TelemetryError::MetricsUtf8 { source })
    }
}

fn counter_vec(
    name: &'static str,
    help: &str,
    labels: &[&str],
) -> TelemetryResult<IntCounterVec> {
    IntCounterVec::new(Opts::new(name, help), labels)
        .map_err(|source| TelemetryError::MetricsCollector { name, source })
}

fn gauge(name: &'static str, help: &str) -> TelemetryResult<IntGauge> {
    IntGauge::with_opts(Opts::new(name, help))
        .map_err(|source| TelemetryError::MetricsCollector { name, source })
}

fn register<C>(registry: &Registry, name: &'static str, collector: &C) -> TelemetryResult<()>
where
    C: Collector + Clone + 'static,
{
    registry
        .register(Box::new(collector.clone()))
        .map_err(|source| TelemetryError::MetricsRegister { name, source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    #[test]
    fn counters_render_with_labels() -> Result<()> {
        let metrics = Metrics::new()?;
        metrics.inc_file_processed("Standard");
        metrics.inc_tool_attempt("RGBFallback", "no_reduction");
        metrics.inc_relocation("processed");
        metrics.inc_http_request("/api/status", 200);

        let rendered = metrics.render()?;
        assert!(rendered.contains("files_processed_total{profile=\"Standard\"} 1"));
        assert!(rendered.contains("tool_attempts_total"));
        assert!(rendered.contains("relocations_total{status=\"processed\"} 1"));
        assert!(rendered.contains("http_requests_total"));
        Ok(())
    }

    #[test]
    fn snapshot_reflects_gauges() -> Result<()> {
        let metrics = Metrics::new()?;
        assert!(!metrics.snapshot().ingestion_running);

        metrics.set_ingestion_running(true);
        metrics.set_files_in_flight(3);
        let snapshot = metrics.snapshot();
        assert!(snapshot.ingestion_running);
        assert_eq!(snapshot.files_in_flight, 3);
        Ok(())
    }
}
