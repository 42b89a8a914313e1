// Prometheus metrics registry for the aggregation/payout pipeline

use prometheus::{
    Encoder, Gauge, GaugeVec, Histogram, HistogramOpts, HistogramVec, IntCounter, IntCounterVec,
    IntGauge, IntGaugeVec, Opts, Registry, TextEncoder,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::config::MetricsConfig;

const NAMESPACE: &str = "aegis_aggregator";

/// Error type for metrics operations
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    #[error("Failed to register metric: {0}")]
    RegistrationError(String),

    #[error("Failed to record metric: {0}")]
    RecordError(String),

    #[error("Failed to export metrics: {0}")]
    ExportError(String),

    #[error("Metric not found: {0}")]
    NotFound(String),
}

/// Global metrics registry
pub struct MetricsRegistry {
    registry: Arc<Registry>,
    config: MetricsConfig,

    // HTTP metrics (the internal payout-trigger endpoint)
    pub http_requests_total: IntCounterVec,
    pub http_request_duration_seconds: HistogramVec,

    // Source Client / Source Router metrics (C3/C4)
    pub source_fetch_total: IntCounterVec,
    pub source_fetch_duration_seconds: HistogramVec,
    pub source_fetch_failures_total: IntCounterVec,
    pub source_circuit_open: IntGaugeVec,

    // TTL Cache metrics (C2)
    pub cache_hits_total: IntCounterVec,
    pub cache_misses_total: IntCounterVec,
    pub cache_evictions_total: IntCounter,
    pub cache_size: IntGaugeVec,

    // Conflict Resolver / Aggregator metrics (C5-C7)
    pub aggregation_duration_seconds: HistogramVec,
    pub data_quality_score: GaugeVec,
    pub conflicts_detected_total: IntCounterVec,

    // Data Router metrics (C8)
    pub router_requests_total: IntCounterVec,
    pub router_duration_seconds: Histogram,

    // Policy Monitor metrics (C11)
    pub monitor_cycles_total: IntCounter,
    pub monitor_policies_scanned_total: IntCounter,
    pub monitor_policies_triggered_total: IntCounterVec,
    pub monitor_evaluation_errors_total: IntCounter,

    // Payout Engine metrics (C10)
    pub payouts_processed_total: IntCounter,
    pub payouts_failed_total: IntCounter,
    pub payout_amount_total: Gauge,
    pub payout_duration_seconds: Histogram,

    // Escrow Abstraction metrics (C9)
    pub escrow_release_attempts_total: IntCounterVec,
    pub escrow_release_failures_total: IntCounterVec,

    // Dead Letter Queue metrics (C12)
    pub dlq_items_total: IntGaugeVec,
    pub dlq_retry_attempts_total: IntCounterVec,
    pub dlq_success_total: IntCounterVec,
    pub dlq_failures_total: IntCounterVec,

    // System metrics
    pub uptime_seconds: Gauge,
    pub build_info: IntCounterVec,
}

macro_rules! register {
    ($registry:expr, $metric:expr) => {
        $registry
            .register(Box::new($metric.clone()))
            .map_err(|e| MetricsError::RegistrationError(e.to_string()))?;
    };
}

impl MetricsRegistry {
    pub fn new(config: MetricsConfig) -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let http_requests_total = IntCounterVec::new(
            Opts::new("http_requests_total", "Total HTTP requests").namespace(NAMESPACE),
            &["method", "path", "status"],
        )
        .map_err(|e| MetricsError::RegistrationError(e.to_string()))?;
        register!(registry, http_requests_total);

        let http_request_duration_seconds = HistogramVec::new(
            HistogramOpts::new("http_request_duration_seconds", "HTTP request duration in seconds")
                .namespace(NAMESPACE)
                .buckets(config.latency_buckets.clone()),
            &["method", "path"],
        )
        .map_err(|e| MetricsError::RegistrationError(e.to_string()))?;
        register!(registry, http_request_duration_seconds);

        let source_fetch_total = IntCounterVec::new(
            Opts::new("source_fetch_total", "Total Source Client fetch attempts").namespace(NAMESPACE),
            &["source", "kind"],
        )
        .map_err(|e| MetricsError::RegistrationError(e.to_string()))?;
        register!(registry, source_fetch_total);

        let source_fetch_duration_seconds = HistogramVec::new(
            HistogramOpts::new("source_fetch_duration_seconds", "Source Client fetch duration in seconds")
                .namespace(NAMESPACE)
                .buckets(config.latency_buckets.clone()),
            &["source", "kind"],
        )
        .map_err(|e| MetricsError::RegistrationError(e.to_string()))?;
        register!(registry, source_fetch_duration_seconds);

        let source_fetch_failures_total = IntCounterVec::new(
            Opts::new("source_fetch_failures_total", "Total failed Source Client fetches").namespace(NAMESPACE),
            &["source", "kind"],
        )
        .map_err(|e| MetricsError::RegistrationError(e.to_string()))?;
        register!(registry, source_fetch_failures_total);

        let source_circuit_open = IntGaugeVec::new(
            Opts::new("source_circuit_open", "1 if the Source Router considers this source unhealthy").namespace(NAMESPACE),
            &["source"],
        )
        .map_err(|e| MetricsError::RegistrationError(e.to_string()))?;
        register!(registry, source_circuit_open);

        let cache_hits_total = IntCounterVec::new(
            Opts::new("cache_hits_total", "Total TTL cache hits").namespace(NAMESPACE),
            &["kind"],
        )
        .map_err(|e| MetricsError::RegistrationError(e.to_string()))?;
        register!(registry, cache_hits_total);

        let cache_misses_total = IntCounterVec::new(
            Opts::new("cache_misses_total", "Total TTL cache misses").namespace(NAMESPACE),
            &["kind"],
        )
        .map_err(|e| MetricsError::RegistrationError(e.to_string()))?;
        register!(registry, cache_misses_total);

        let cache_evictions_total = IntCounter::with_opts(
            Opts::new("cache_evictions_total", "Total TTL cache evictions").namespace(NAMESPACE),
        )
        .map_err(|e| MetricsError::RegistrationError(e.to_string()))?;
        register!(registry, cache_evictions_total);

        let cache_size = IntGaugeVec::new(
            Opts::new("cache_size", "Current TTL cache entry count").namespace(NAMESPACE),
            &["kind"],
        )
        .map_err(|e| MetricsError::RegistrationError(e.to_string()))?;
        register!(registry, cache_size);

        let aggregation_duration_seconds = HistogramVec::new(
            HistogramOpts::new("aggregation_duration_seconds", "Flight/weather aggregation duration in seconds")
                .namespace(NAMESPACE)
                .buckets(config.latency_buckets.clone()),
            &["kind"],
        )
        .map_err(|e| MetricsError::RegistrationError(e.to_string()))?;
        register!(registry, aggregation_duration_seconds);

        let data_quality_score = GaugeVec::new(
            Opts::new("data_quality_score", "Most recent dataQualityScore for a resolved record").namespace(NAMESPACE),
            &["kind"],
        )
        .map_err(|e| MetricsError::RegistrationError(e.to_string()))?;
        register!(registry, data_quality_score);

        let conflicts_detected_total = IntCounterVec::new(
            Opts::new("conflicts_detected_total", "Total source disagreements recorded by the Conflict Resolver").namespace(NAMESPACE),
            &["kind", "field"],
        )
        .map_err(|e| MetricsError::RegistrationError(e.to_string()))?;
        register!(registry, conflicts_detected_total);

        let router_requests_total = IntCounterVec::new(
            Opts::new("router_requests_total", "Total Data Router getDataForPolicy calls").namespace(NAMESPACE),
            &["status"],
        )
        .map_err(|e| MetricsError::RegistrationError(e.to_string()))?;
        register!(registry, router_requests_total);

        let router_duration_seconds = Histogram::with_opts(
            HistogramOpts::new("router_duration_seconds", "Data Router end-to-end duration in seconds")
                .namespace(NAMESPACE)
                .buckets(config.latency_buckets.clone()),
        )
        .map_err(|e| MetricsError::RegistrationError(e.to_string()))?;
        register!(registry, router_duration_seconds);

        let monitor_cycles_total = IntCounter::with_opts(
            Opts::new("monitor_cycles_total", "Total completed Policy Monitor scan cycles").namespace(NAMESPACE),
        )
        .map_err(|e| MetricsError::RegistrationError(e.to_string()))?;
        register!(registry, monitor_cycles_total);

        let monitor_policies_scanned_total = IntCounter::with_opts(
            Opts::new("monitor_policies_scanned_total", "Total policies evaluated across all scan cycles").namespace(NAMESPACE),
        )
        .map_err(|e| MetricsError::RegistrationError(e.to_string()))?;
        register!(registry, monitor_policies_scanned_total);

        let monitor_policies_triggered_total = IntCounterVec::new(
            Opts::new("monitor_policies_triggered_total", "Total policies whose trigger predicate fired").namespace(NAMESPACE),
            &["coverage_type"],
        )
        .map_err(|e| MetricsError::RegistrationError(e.to_string()))?;
        register!(registry, monitor_policies_triggered_total);

        let monitor_evaluation_errors_total = IntCounter::with_opts(
            Opts::new("monitor_evaluation_errors_total", "Total per-policy evaluation errors swallowed by the monitor").namespace(NAMESPACE),
        )
        .map_err(|e| MetricsError::RegistrationError(e.to_string()))?;
        register!(registry, monitor_evaluation_errors_total);

        let payouts_processed_total = IntCounter::with_opts(
            Opts::new("payouts_processed_total", "Total policies paid out successfully").namespace(NAMESPACE),
        )
        .map_err(|e| MetricsError::RegistrationError(e.to_string()))?;
        register!(registry, payouts_processed_total);

        let payouts_failed_total = IntCounter::with_opts(
            Opts::new("payouts_failed_total", "Total policies that failed eligibility or the chain adapter").namespace(NAMESPACE),
        )
        .map_err(|e| MetricsError::RegistrationError(e.to_string()))?;
        register!(registry, payouts_failed_total);

        let payout_amount_total = Gauge::with_opts(
            Opts::new("payout_amount_total", "Total payout amount released in the most recent batch").namespace(NAMESPACE),
        )
        .map_err(|e| MetricsError::RegistrationError(e.to_string()))?;
        register!(registry, payout_amount_total);

        let payout_duration_seconds = Histogram::with_opts(
            HistogramOpts::new("payout_duration_seconds", "processTriggeredPayouts batch duration in seconds")
                .namespace(NAMESPACE)
                .buckets(config.latency_buckets.clone()),
        )
        .map_err(|e| MetricsError::RegistrationError(e.to_string()))?;
        register!(registry, payout_duration_seconds);

        let escrow_release_attempts_total = IntCounterVec::new(
            Opts::new("escrow_release_attempts_total", "Total EscrowService.release_escrow calls").namespace(NAMESPACE),
            &["chain"],
        )
        .map_err(|e| MetricsError::RegistrationError(e.to_string()))?;
        register!(registry, escrow_release_attempts_total);

        let escrow_release_failures_total = IntCounterVec::new(
            Opts::new("escrow_release_failures_total", "Total EscrowService.release_escrow failures").namespace(NAMESPACE),
            &["chain"],
        )
        .map_err(|e| MetricsError::RegistrationError(e.to_string()))?;
        register!(registry, escrow_release_failures_total);

        let dlq_items_total = IntGaugeVec::new(
            Opts::new("dlq_items_total", "Total items in DLQ").namespace(NAMESPACE),
            &["status"],
        )
        .map_err(|e| MetricsError::RegistrationError(e.to_string()))?;
        register!(registry, dlq_items_total);

        let dlq_retry_attempts_total = IntCounterVec::new(
            Opts::new("dlq_retry_attempts_total", "Total DLQ retry attempts").namespace(NAMESPACE),
            &["item_type"],
        )
        .map_err(|e| MetricsError::RegistrationError(e.to_string()))?;
        register!(registry, dlq_retry_attempts_total);

        let dlq_success_total = IntCounterVec::new(
            Opts::new("dlq_success_total", "Total DLQ successes").namespace(NAMESPACE),
            &["item_type"],
        )
        .map_err(|e| MetricsError::RegistrationError(e.to_string()))?;
        register!(registry, dlq_success_total);

        let dlq_failures_total = IntCounterVec::new(
            Opts::new("dlq_failures_total", "Total DLQ permanent failures").namespace(NAMESPACE),
            &["item_type"],
        )
        .map_err(|e| MetricsError::RegistrationError(e.to_string()))?;
        register!(registry, dlq_failures_total);

        let uptime_seconds = Gauge::with_opts(
            Opts::new("uptime_seconds", "System uptime in seconds").namespace(NAMESPACE),
        )
        .map_err(|e| MetricsError::RegistrationError(e.to_string()))?;
        register!(registry, uptime_seconds);

        let build_info = IntCounterVec::new(
            Opts::new("build_info", "Build information").namespace(NAMESPACE),
            &["version", "rustc_version"],
        )
        .map_err(|e| MetricsError::RegistrationError(e.to_string()))?;
        register!(registry, build_info);

        build_info
            .with_label_values(&[env!("CARGO_PKG_VERSION"), "unknown"])
            .inc();

        if config.include_process_metrics {
            let process_collector = prometheus::process_collector::ProcessCollector::for_self();
            registry
                .register(Box::new(process_collector))
                .map_err(|e| MetricsError::RegistrationError(e.to_string()))?;
        }

        Ok(Self {
            registry: Arc::new(registry),
            config,
            http_requests_total,
            http_request_duration_seconds,
            source_fetch_total,
            source_fetch_duration_seconds,
            source_fetch_failures_total,
            source_circuit_open,
            cache_hits_total,
            cache_misses_total,
            cache_evictions_total,
            cache_size,
            aggregation_duration_seconds,
            data_quality_score,
            conflicts_detected_total,
            router_requests_total,
            router_duration_seconds,
            monitor_cycles_total,
            monitor_policies_scanned_total,
            monitor_policies_triggered_total,
            monitor_evaluation_errors_total,
            payouts_processed_total,
            payouts_failed_total,
            payout_amount_total,
            payout_duration_seconds,
            escrow_release_attempts_total,
            escrow_release_failures_total,
            dlq_items_total,
            dlq_retry_attempts_total,
            dlq_success_total,
            dlq_failures_total,
            uptime_seconds,
            build_info,
        })
    }

    /// Export metrics in Prometheus text format
    pub fn export(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(|e| MetricsError::ExportError(e.to_string()))?;

        String::from_utf8(buffer).map_err(|e| MetricsError::ExportError(e.to_string()))
    }

    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }

    pub fn config(&self) -> &MetricsConfig {
        &self.config
    }
}

/// Timer for measuring operation duration
pub struct Timer {
    start: Instant,
    histogram: Histogram,
}

impl Timer {
    pub fn new(histogram: Histogram) -> Self {
        Self {
            start: Instant::now(),
            histogram,
        }
    }

    pub fn observe_duration(self) -> Duration {
        let duration = self.start.elapsed();
        self.histogram.observe(duration.as_secs_f64());
        duration
    }
}

pub fn start_timer(histogram: &Histogram) -> Timer {
    Timer::new(histogram.clone())
}
