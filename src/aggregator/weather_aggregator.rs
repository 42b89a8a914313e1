//! C7 Weather Aggregator: the same pipeline as the Flight Aggregator (spec
//! §4.6), keyed by coordinates rounded to a configured grid, with its own
//! health table and cache instance.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::NaiveDate;

use crate::cache::{Clock, SystemClock, TtlCache};
use crate::config::AggregatorConfig;
use crate::domain::{CanonicalWeatherObservation, CoreError, Coordinates, Result};
use crate::resolver::{resolve_weather, ResolverConfig};
use crate::sources::{FetchOutcome, SourceClient, SourceRouter};

use super::AggregationResult;

const DOMAIN: &str = "weather";

pub struct WeatherAggregator {
    router: SourceRouter<CanonicalWeatherObservation>,
    cache: TtlCache<CanonicalWeatherObservation>,
    max_sources: usize,
    per_source_timeout: Duration,
    aggregator_timeout: Duration,
    min_quality_score: f64,
    grid_decimals: u32,
    resolver_config: ResolverConfig,
}

impl WeatherAggregator {
    pub fn new(
        clients: Vec<Arc<dyn SourceClient<Output = CanonicalWeatherObservation>>>,
        config: &AggregatorConfig,
    ) -> Self {
        Self::with_clock(clients, config, Arc::new(SystemClock))
    }

    pub fn with_clock(
        clients: Vec<Arc<dyn SourceClient<Output = CanonicalWeatherObservation>>>,
        config: &AggregatorConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            router: SourceRouter::new(clients),
            cache: TtlCache::with_clock(Duration::from_secs(config.cache_ttl_weather_seconds), clock),
            max_sources: config.max_sources,
            per_source_timeout: config.per_source_timeout(),
            aggregator_timeout: config.aggregator_timeout(),
            min_quality_score: config.min_acceptable_quality_score,
            grid_decimals: config.weather_coordinate_grid_decimals,
            resolver_config: ResolverConfig::default(),
        }
    }

    pub async fn get_weather(
        &self,
        coordinates: Coordinates,
        date_hint: Option<NaiveDate>,
    ) -> Result<AggregationResult<CanonicalWeatherObservation>> {
        let start = Instant::now();
        let key = coordinates.cache_key(self.grid_decimals);

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

        let fetch = self.fetch_and_resolve(date_hint, &key);
        let mut result = tokio::time::timeout(self.aggregator_timeout, fetch)
            .await
            .map_err(|_| CoreError::DeadlineExceeded(self.aggregator_timeout))??;
        result.processing_time_ms = start.elapsed().as_millis() as u64;
        Ok(result)
    }

    async fn fetch_and_resolve(
        &self,
        date_hint: Option<NaiveDate>,
        key: &str,
    ) -> Result<AggregationResult<CanonicalWeatherObservation>> {
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
                let outcome = match tokio::time::timeout(timeout, source.fetch(&key, date_hint)).await {
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

        let (resolved, conflicts) = resolve_weather(&records, &priorities, &self.resolver_config)?;
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::WeatherCondition;
    use crate::sources::FixtureWeatherSource;

    fn config() -> AggregatorConfig {
        AggregatorConfig::default()
    }

    #[tokio::test]
    async fn repeat_call_for_same_coordinates_is_a_cache_hit() {
        let clients: Vec<Arc<dyn SourceClient<Output = CanonicalWeatherObservation>>> =
            vec![Arc::new(FixtureWeatherSource::new("source-a", 10, 0.9))];
        let aggregator = WeatherAggregator::new(clients, &config());

        let coords = Coordinates::new(40.7128, -74.0060);
        let first = aggregator.get_weather(coords, None).await.unwrap();
        assert!(!first.from_cache);

        let second = aggregator.get_weather(coords, None).await.unwrap();
        assert!(second.from_cache);
    }

    #[tokio::test]
    async fn severe_condition_survives_resolution() {
        let key = Coordinates::new(10.0, 10.0).cache_key(4);
        let source = FixtureWeatherSource::new("source-a", 10, 0.9).with_fixture(
            key,
            WeatherCondition::Thunderstorm,
            28.0,
            40.0,
            0.9,
        );
        let clients: Vec<Arc<dyn SourceClient<Output = CanonicalWeatherObservation>>> =
            vec![Arc::new(source)];
        let aggregator = WeatherAggregator::new(clients, &config());

        let result = aggregator
            .get_weather(Coordinates::new(10.0, 10.0), None)
            .await
            .unwrap();
        assert!(result.data.is_severe());
    }
}
