//! CanonicalWeatherObservation: the source-agnostic, merged weather record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::{CoreError, Result};
use super::provenance::SourceContribution;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WeatherCondition {
    Clear,
    PartlyCloudy,
    Cloudy,
    LightRain,
    ModerateRain,
    HeavyRain,
    Thunderstorm,
    Snow,
    Fog,
    Mist,
    Unknown,
}

impl Default for WeatherCondition {
    fn default() -> Self {
        WeatherCondition::Unknown
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Round to a configured grid (spec §4.6) so nearby requests share a
    /// cache key and weather-source lookup.
    pub fn rounded(&self, decimals: u32) -> Self {
        let factor = 10f64.powi(decimals as i32);
        Self {
            lat: (self.lat * factor).round() / factor,
            lon: (self.lon * factor).round() / factor,
        }
    }

    pub fn cache_key(&self, decimals: u32) -> String {
        let r = self.rounded(decimals);
        format!("{:.*},{:.*}", decimals as usize, r.lat, decimals as usize, r.lon)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalWeatherObservation {
    pub coordinates: Coordinates,
    pub airport_iata: Option<String>,
    pub observation_timestamp_utc: DateTime<Utc>,

    pub temperature_celsius: f64,
    pub wind_speed_kmh: f64,
    pub precipitation_probability: f64,
    pub weather_condition: WeatherCondition,

    pub source_contributions: Vec<SourceContribution>,
    pub data_quality_score: f64,
    pub last_updated_utc: DateTime<Utc>,
}

impl CanonicalWeatherObservation {
    #[allow(clippy::too_many_arguments)]
    pub fn single_source(
        coordinates: Coordinates,
        airport_iata: Option<String>,
        observation_timestamp_utc: DateTime<Utc>,
        temperature_celsius: f64,
        wind_speed_kmh: f64,
        precipitation_probability: f64,
        weather_condition: WeatherCondition,
        contribution: SourceContribution,
    ) -> Self {
        let now = contribution.observed_at_utc;
        Self {
            coordinates,
            airport_iata,
            observation_timestamp_utc,
            temperature_celsius,
            wind_speed_kmh,
            precipitation_probability,
            weather_condition,
            data_quality_score: contribution.confidence,
            source_contributions: vec![contribution],
            last_updated_utc: now,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(-90.0..=90.0).contains(&self.coordinates.lat) {
            return Err(CoreError::invalid_record("latitude out of range [-90, 90]"));
        }
        if !(-180.0..=180.0).contains(&self.coordinates.lon) {
            return Err(CoreError::invalid_record("longitude out of range [-180, 180]"));
        }
        if !(-60.0..=60.0).contains(&self.temperature_celsius) {
            return Err(CoreError::invalid_record("temperatureCelsius out of range [-60, 60]"));
        }
        if !(0.0..=1.0).contains(&self.precipitation_probability) {
            return Err(CoreError::invalid_record(
                "precipitationProbability must be within [0, 1]",
            ));
        }
        if !(0.0..=1.0).contains(&self.data_quality_score) {
            return Err(CoreError::invalid_record("dataQualityScore must be within [0, 1]"));
        }
        Ok(())
    }

    /// Conditions that the Policy Monitor's weather-disruption predicate
    /// treats as severe (spec §4.8).
    pub fn is_severe(&self) -> bool {
        matches!(
            self.weather_condition,
            WeatherCondition::Thunderstorm | WeatherCondition::Snow | WeatherCondition::HeavyRain
        )
    }
}
