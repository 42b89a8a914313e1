//! Lightweight request telemetry for the internal SDK client, independent
//! of the server-side `observability::metrics` registry (the client may run
//! embedded in a process that never starts its own Prometheus exporter).

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Counters for one client instance.
#[derive(Debug, Default)]
pub struct TelemetryCollector {
    name: String,
    enabled: bool,
    requests_total: AtomicU64,
    requests_failed: AtomicU64,
    rate_limit_hits: AtomicU64,
}

impl TelemetryCollector {
    pub fn new(name: impl Into<String>, enabled: bool) -> Self {
        Self {
            name: name.into(),
            enabled,
            requests_total: AtomicU64::new(0),
            requests_failed: AtomicU64::new(0),
            rate_limit_hits: AtomicU64::new(0),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn requests_total(&self) -> u64 {
        self.requests_total.load(Ordering::Relaxed)
    }

    pub fn requests_failed(&self) -> u64 {
        self.requests_failed.load(Ordering::Relaxed)
    }

    pub fn rate_limit_hits(&self) -> u64 {
        self.rate_limit_hits.load(Ordering::Relaxed)
    }

    pub fn record_rate_limit_hit(&self) {
        if self.enabled {
            self.rate_limit_hits.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn start_timer(&self) -> RequestTimer<'_> {
        RequestTimer {
            collector: self,
            start: Instant::now(),
        }
    }
}

impl Clone for TelemetryCollector {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            enabled: self.enabled,
            requests_total: AtomicU64::new(self.requests_total()),
            requests_failed: AtomicU64::new(self.requests_failed()),
            rate_limit_hits: AtomicU64::new(self.rate_limit_hits()),
        }
    }
}

pub struct RequestTimer<'a> {
    collector: &'a TelemetryCollector,
    start: Instant,
}

impl RequestTimer<'_> {
    pub fn success(self) {
        if self.collector.enabled {
            self.collector.requests_total.fetch_add(1, Ordering::Relaxed);
            tracing::trace!(
                client = self.collector.name(),
                elapsed_ms = self.start.elapsed().as_millis() as u64,
                "sdk request succeeded"
            );
        }
    }

    pub fn failure(self) {
        if self.collector.enabled {
            self.collector.requests_total.fetch_add(1, Ordering::Relaxed);
            self.collector.requests_failed.fetch_add(1, Ordering::Relaxed);
            tracing::trace!(
                client = self.collector.name(),
                elapsed_ms = self.start.elapsed().as_millis() as u64,
                "sdk request failed"
            );
        }
    }
}
