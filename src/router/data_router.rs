//! C8 Data Router: orchestrates one flight fetch plus N parallel weather
//! fetches with a bounded concurrency budget (spec §4.7).

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::NaiveDate;
use futures::stream::{self, StreamExt};

use crate::aggregator::{FlightAggregator, WeatherAggregator};
use crate::config::AggregatorConfig;
use crate::domain::{CanonicalFlight, CanonicalWeatherObservation, CoreError, Coordinates, Result};

use super::airports;

/// Request shape for `getDataForPolicy` (spec §4.7).
#[derive(Debug, Clone)]
pub struct PolicyDataRequest {
    pub flight_number: String,
    pub date: NaiveDate,
    pub airports: Option<Vec<String>>,
    pub include_weather: bool,
    pub weather_coordinates: Option<Vec<Coordinates>>,
}

impl PolicyDataRequest {
    pub fn new(flight_number: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            flight_number: flight_number.into(),
            date,
            airports: None,
            include_weather: true,
            weather_coordinates: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PolicyDataMetadata {
    pub flight_from_cache: bool,
    pub flight_sources_used: Vec<String>,
    pub flight_quality_score: f64,
    pub weather_quality_scores: Vec<f64>,
    pub processing_time_ms: u64,
}

#[derive(Debug, Clone)]
pub struct PolicyDataResponse {
    pub flight: CanonicalFlight,
    pub weather_observations: Vec<CanonicalWeatherObservation>,
    pub metadata: PolicyDataMetadata,
}

pub struct DataRouter {
    flight_aggregator: Arc<FlightAggregator>,
    weather_aggregator: Arc<WeatherAggregator>,
    max_concurrent_weather_requests: usize,
    router_timeout: Duration,
}

impl DataRouter {
    pub fn new(
        flight_aggregator: Arc<FlightAggregator>,
        weather_aggregator: Arc<WeatherAggregator>,
        config: &AggregatorConfig,
    ) -> Self {
        Self {
            flight_aggregator,
            weather_aggregator,
            max_concurrent_weather_requests: config.max_concurrent_weather_requests,
            router_timeout: config.router_timeout(),
        }
    }

    pub async fn get_data_for_policy(&self, request: PolicyDataRequest) -> Result<PolicyDataResponse> {
        let call = self.get_data_for_policy_inner(request);
        tokio::time::timeout(self.router_timeout, call)
            .await
            .map_err(|_| CoreError::DeadlineExceeded(self.router_timeout))?
    }

    async fn get_data_for_policy_inner(&self, request: PolicyDataRequest) -> Result<PolicyDataResponse> {
        let start = Instant::now();

        let flight_result = self
            .flight_aggregator
            .get_flight_status(&request.flight_number, request.date)
            .await?;

        let mut metadata = PolicyDataMetadata {
            flight_from_cache: flight_result.from_cache,
            flight_sources_used: flight_result.sources_used.clone(),
            flight_quality_score: flight_result.quality_score,
            weather_quality_scores: Vec::new(),
            processing_time_ms: 0,
        };

        if !request.include_weather {
            metadata.processing_time_ms = start.elapsed().as_millis() as u64;
            return Ok(PolicyDataResponse {
                flight: flight_result.data,
                weather_observations: Vec::new(),
                metadata,
            });
        }

        let locations = self.resolve_weather_locations(&request, &flight_result.data);
        let weather_observations = self.fetch_weather_batch(&locations).await;

        metadata.weather_quality_scores = weather_observations.iter().map(|w| w.data_quality_score).collect();
        metadata.processing_time_ms = start.elapsed().as_millis() as u64;

        Ok(PolicyDataResponse {
            flight: flight_result.data,
            weather_observations,
            metadata,
        })
    }

    fn resolve_weather_locations(
        &self,
        request: &PolicyDataRequest,
        flight: &CanonicalFlight,
    ) -> Vec<Coordinates> {
        if let Some(coords) = &request.weather_coordinates {
            return coords.clone();
        }
        if let Some(airports) = &request.airports {
            return airports.iter().filter_map(|iata| airports::lookup(iata)).collect();
        }
        [&flight.origin_iata, &flight.destination_iata]
            .into_iter()
            .filter_map(|iata| airports::lookup(iata))
            .collect()
    }

    /// Execute one weather fetch per distinct location, bounded by
    /// `maxConcurrentWeatherRequests`, with settle-all semantics: a failed
    /// location is dropped rather than failing the whole batch.
    async fn fetch_weather_batch(&self, locations: &[Coordinates]) -> Vec<CanonicalWeatherObservation> {
        let aggregator = Arc::clone(&self.weather_aggregator);
        stream::iter(locations.iter().copied())
            .map(|coords| {
                let aggregator = Arc::clone(&aggregator);
                async move { aggregator.get_weather(coords, None).await }
            })
            .buffer_unordered(self.max_concurrent_weather_requests.max(1))
            .filter_map(|result| async move { result.ok().map(|r| r.data) })
            .collect()
            .await
    }
}
