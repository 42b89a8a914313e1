//! Deterministic fixture source clients used when `useRealProviders = false`
//! (spec §6 Configuration surface). These stand in for real provider
//! adapters in demos and in environments without live credentials.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use std::collections::HashMap;
use std::sync::Mutex;

use crate::domain::{
    CanonicalFlight, CanonicalWeatherObservation, Coordinates, FlightStatus, Result,
    SourceContribution, WeatherCondition,
};

use super::contract::SourceClient;

/// A fixture flight source that serves canned responses keyed by flight
/// number, falling back to a generic SCHEDULED record for unknown keys.
pub struct FixtureFlightSource {
    name: String,
    priority: i32,
    reliability: f64,
    fixtures: Mutex<HashMap<String, (FlightStatus, Option<u32>, Option<u32>)>>,
}

impl FixtureFlightSource {
    pub fn new(name: impl Into<String>, priority: i32, reliability: f64) -> Self {
        Self {
            name: name.into(),
            priority,
            reliability,
            fixtures: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_fixture(
        self,
        flight_number: impl Into<String>,
        status: FlightStatus,
        departure_delay_minutes: Option<u32>,
        arrival_delay_minutes: Option<u32>,
    ) -> Self {
        self.fixtures
            .lock()
            .unwrap()
            .insert(flight_number.into(), (status, departure_delay_minutes, arrival_delay_minutes));
        self
    }
}

#[async_trait]
impl SourceClient for FixtureFlightSource {
    type Output = CanonicalFlight;

    fn name(&self) -> &str {
        &self.name
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn reliability(&self) -> f64 {
        self.reliability
    }

    async fn is_available(&self) -> bool {
        true
    }

    async fn fetch(&self, key: &str, date_hint: Option<NaiveDate>) -> Result<Option<CanonicalFlight>> {
        let fixtures = self.fixtures.lock().unwrap();
        let (status, dep_delay, arr_delay) = fixtures
            .get(key)
            .cloned()
            .unwrap_or((FlightStatus::Scheduled, None, None));
        let scheduled_departure = date_hint
            .map(|d| d.and_hms_opt(12, 0, 0).unwrap().and_utc())
            .unwrap_or_else(Utc::now);

        let contribution = SourceContribution::new(
            self.name.clone(),
            self.reliability,
            vec!["flightStatus".into(), "departureDelayMinutes".into()],
            Utc::now(),
        );

        Ok(Some(CanonicalFlight::single_source(
            key,
            scheduled_departure,
            "JFK",
            "LAX",
            status,
            dep_delay,
            arr_delay,
            contribution,
        )))
    }
}

/// A fixture weather source that serves canned responses keyed by a
/// rounded-coordinate cache key.
pub struct FixtureWeatherSource {
    name: String,
    priority: i32,
    reliability: f64,
    fixtures: Mutex<HashMap<String, (WeatherCondition, f64, f64, f64)>>,
}

impl FixtureWeatherSource {
    pub fn new(name: impl Into<String>, priority: i32, reliability: f64) -> Self {
        Self {
            name: name.into(),
            priority,
            reliability,
            fixtures: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_fixture(
        self,
        coord_key: impl Into<String>,
        condition: WeatherCondition,
        temperature_celsius: f64,
        wind_speed_kmh: f64,
        precipitation_probability: f64,
    ) -> Self {
        self.fixtures.lock().unwrap().insert(
            coord_key.into(),
            (condition, temperature_celsius, wind_speed_kmh, precipitation_probability),
        );
        self
    }
}

#[async_trait]
impl SourceClient for FixtureWeatherSource {
    type Output = CanonicalWeatherObservation;

    fn name(&self) -> &str {
        &self.name
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn reliability(&self) -> f64 {
        self.reliability
    }

    async fn is_available(&self) -> bool {
        true
    }

    async fn fetch(&self, key: &str, _date_hint: Option<NaiveDate>) -> Result<Option<CanonicalWeatherObservation>> {
        let fixtures = self.fixtures.lock().unwrap();
        let (condition, temp, wind, precip) = fixtures
            .get(key)
            .cloned()
            .unwrap_or((WeatherCondition::Clear, 20.0, 10.0, 0.1));

        let coordinates = parse_coord_key(key).unwrap_or(Coordinates::new(0.0, 0.0));

        let contribution = SourceContribution::new(
            self.name.clone(),
            self.reliability,
            vec!["weatherCondition".into(), "temperatureCelsius".into()],
            Utc::now(),
        );

        Ok(Some(CanonicalWeatherObservation::single_source(
            coordinates,
            None,
            Utc::now(),
            temp,
            wind,
            precip,
            condition,
            contribution,
        )))
    }
}

fn parse_coord_key(key: &str) -> Option<Coordinates> {
    let (lat, lon) = key.split_once(',')?;
    Some(Coordinates::new(lat.parse().ok()?, lon.parse().ok()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fixture_flight_source_returns_configured_status() {
        let source = FixtureFlightSource::new("fixture-a", 10, 0.9).with_fixture(
            "UA456",
            FlightStatus::Delayed,
            Some(45),
            Some(40),
        );
        let result = source.fetch("UA456", None).await.unwrap().unwrap();
        assert_eq!(result.flight_status, FlightStatus::Delayed);
        assert_eq!(result.departure_delay_minutes, Some(45));
    }

    #[tokio::test]
    async fn fixture_flight_source_defaults_to_scheduled() {
        let source = FixtureFlightSource::new("fixture-a", 10, 0.9);
        let result = source.fetch("DL789", None).await.unwrap().unwrap();
        assert_eq!(result.flight_status, FlightStatus::Scheduled);
    }

    #[tokio::test]
    async fn fixture_weather_source_parses_coordinates_from_key() {
        let source = FixtureWeatherSource::new("fixture-w", 10, 0.9);
        let result = source.fetch("40.7128,-74.0060", None).await.unwrap().unwrap();
        assert_eq!(result.coordinates.lat, 40.7128);
        assert_eq!(result.coordinates.lon, -74.0060);
    }
}
