//! C6 Flight Aggregator: cache-check -> fan-out fetch -> resolve ->
//! cache-write for one `(flightNumber, date)` key (spec §4.5).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::NaiveDate;

use crate::cache::{generate_key, Clock, SystemClock, TtlCache};
use crate::config::AggregatorConfig;
use crate::domain::{CanonicalFlight, CoreError, Result};
use crate::resolver::{resolve_flights, ResolverConfig};
use crate::sources::{FetchOutcome, SourceClient, SourceRouter};

use super::AggregationResult;

const DOMAIN: &str = "flight";

pub struct FlightAggregator {
    router: SourceRouter<CanonicalFlight>,
    cache: TtlCache<CanonicalFlight>,
    max_sources: usize,
    per_source_timeout: Duration,
    aggregator_timeout: Duration,
    min_quality_score: f64,
    resolver_config: ResolverConfig,
}

impl FlightAggregator {
    pub fn new(
        clients: Vec<Arc<dyn SourceClient<Output = CanonicalFlight>>>,
        config: &AggregatorConfig,
    ) -> Self {
        Self::with_clock(clients, config, Arc::new(SystemClock))
    }

    /// Construct with an injected clock, for deterministic TTL-expiry tests
    /// (spec testable scenarios S1/S2).
    pub fn with_clock(
        clients: Vec<Arc<dyn SourceClient<Output = CanonicalFlight>>>,
        config: &AggregatorConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            router: SourceRouter::new(clients),
            cache: TtlCache::with_clock(Duration::from_secs(config.cache_ttl_flight_seconds), clock),
            max_sources: config.max_sources,
            per_source_timeout: config.per_source_timeout(),
            aggregator_timeout: config.aggregator_timeout(),
            min_quality_score: config.min_acceptable_quality_score,
            resolver_config: ResolverConfig::default(),
        }
    }

    pub async fn get_flight_status(
        &self,
        flight_number: &str,
        date: NaiveDate,
    ) -> Result<AggregationResult<CanonicalFlight>> {
        let start = Instant::now();
        let key = generate_key(&[flight_number, &date.to_string()]);

        if let Some(cached) = self.cache.get(&key).await {
            return Ok(AggregationResult {
                quality_score: cached.data_quality_score,
                data: cached,
                from_cache: true,
                sources_used: Vec::new(),
                conflicts: Vec::new(),
                processing_time_ms: start.elapsed().as_millis() as u64,
            });
        }

        let fetch = self.fetch_and_resolve(flight_number, date, &key);
        let mut result = tokio::time::timeout(self.aggregator_timeout, fetch)
            .await
            .map_err(|_| CoreError::DeadlineExceeded(self.aggregator_timeout))??;
        result.processing_time_ms = start.elapsed().as_millis() as u64;
        Ok(result)
    }

    async fn fetch_and_resolve(
        &self,
        flight_number: &str,
        date: NaiveDate,
        key: &str,
    ) -> Result<AggregationResult<CanonicalFlight>> {
        let sources = self.router.get_sources(key, self.max_sources).await;
        if sources.is_empty() {
            return Err(CoreError::NoSourcesAvailable {
                domain: DOMAIN,
                key: key.to_string(),
            });
        }

        let mut priorities = HashMap::new();
        let attempted = sources.len();
        let mut handles = Vec::with_capacity(attempted);
        for source in &sources {
            priorities.insert(source.name().to_string(), source.priority());
            let source = Arc::clone(source);
            let timeout = self.per_source_timeout;
            let key = key.to_string();
            handles.push(tokio::spawn(async move {
                let name = source.name().to_string();
                let outcome = match tokio::time::timeout(timeout, source.fetch(&key, Some(date))).await {
                    Ok(Ok(Some(record))) => FetchOutcome::Success(record),
                    Ok(Ok(None)) => FetchOutcome::Absent,
                    Ok(Err(e)) => FetchOutcome::Failed(e),
                    Err(_) => FetchOutcome::Failed(CoreError::DeadlineExceeded(timeout)),
                };
                (name, outcome)
            }));
        }

        let mut records = Vec::new();
        let mut sources_used = Vec::new();
        for handle in handles {
            let (name, outcome) = handle
                .await
                .map_err(|e| CoreError::persistence(format!("source task panicked: {e}")))?;
            match outcome {
                FetchOutcome::Success(record) => {
                    self.router.mark_healthy(&name).await;
                    sources_used.push(name);
                    records.push(record);
                }
                FetchOutcome::Absent => {
                    self.router.mark_healthy(&name).await;
                }
                FetchOutcome::Failed(_) => {
                    self.router.mark_unhealthy(&name).await;
                }
            }
        }

        if records.is_empty() {
            return Err(CoreError::NoSuccessfulResponses {
                domain: DOMAIN,
                key: key.to_string(),
                attempted,
            });
        }

        let (resolved, conflicts) = resolve_flights(&records, &priorities, &self.resolver_config)?;
        resolved.validate()?;
        if resolved.data_quality_score < self.min_quality_score {
            return Err(CoreError::LowQualityData {
                score: resolved.data_quality_score,
                minimum: self.min_quality_score,
            });
        }

        self.cache.set(key.to_string(), resolved.clone()).await;

        Ok(AggregationResult {
            quality_score: resolved.data_quality_score,
            data: resolved,
            from_cache: false,
            sources_used,
            conflicts,
            processing_time_ms: 0,
        })
    }
}
