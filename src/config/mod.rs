//! Configuration surface (spec §6). Loaded via `figment`: a TOML file
//! layered with `AEGIS_`-prefixed environment variable overrides, mirroring
//! the file+env layering convention used across the example pack for
//! secrets such as provider credentials.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::domain::Result;
use crate::storage::DatabaseConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregatorConfig {
    pub max_sources: usize,
    pub per_source_timeout_ms: u64,
    pub aggregator_timeout_ms: u64,
    pub router_timeout_ms: u64,
    pub cache_ttl_flight_seconds: u64,
    pub cache_ttl_weather_seconds: u64,
    pub max_concurrent_weather_requests: usize,
    pub monitor_interval_ms: u64,
    pub max_policies_per_check: usize,
    pub default_delay_threshold_minutes: u32,
    pub min_acceptable_quality_score: f64,
    pub use_real_providers: bool,
    pub weather_coordinate_grid_decimals: u32,
    /// Shared secret the internal HTTP surface requires on `X-Internal-Secret`
    /// (spec §6). Empty disables the check, for local development only.
    pub internal_secret: String,
    pub logging: LoggingConfig,
    pub database: DatabaseConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            max_sources: 3,
            per_source_timeout_ms: 30_000,
            aggregator_timeout_ms: 30_000,
            router_timeout_ms: 45_000,
            cache_ttl_flight_seconds: 300,
            cache_ttl_weather_seconds: 900,
            max_concurrent_weather_requests: 3,
            monitor_interval_ms: 300_000,
            max_policies_per_check: 50,
            default_delay_threshold_minutes: 15,
            min_acceptable_quality_score: 0.3,
            use_real_providers: false,
            weather_coordinate_grid_decimals: 4,
            internal_secret: String::new(),
            logging: LoggingConfig::default(),
            database: DatabaseConfig::default(),
        }
    }
}

impl AggregatorConfig {
    /// Load from a TOML file, falling back to defaults for any field not
    /// present, with `AEGIS_`-prefixed environment variables taking final
    /// precedence.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        use figment::providers::{Env, Format, Toml};
        use figment::Figment;

        let figment = Figment::from(figment::providers::Serialized::defaults(
            AggregatorConfig::default(),
        ))
        .merge(Toml::file(path.as_ref()))
        .merge(Env::prefixed("AEGIS_").split("__"));

        figment
            .extract()
            .map_err(|e| crate::domain::CoreError::config(e.to_string()))
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_sources == 0 {
            return Err(crate::domain::CoreError::config("maxSources must be > 0"));
        }
        if !(0.0..=1.0).contains(&self.min_acceptable_quality_score) {
            return Err(crate::domain::CoreError::config(
                "minAcceptableQualityScore must be within [0, 1]",
            ));
        }
        if self.max_concurrent_weather_requests == 0 {
            return Err(crate::domain::CoreError::config(
                "maxConcurrentWeatherRequests must be > 0",
            ));
        }
        Ok(())
    }

    pub fn per_source_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.per_source_timeout_ms)
    }

    pub fn aggregator_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.aggregator_timeout_ms)
    }

    pub fn router_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.router_timeout_ms)
    }

    pub fn monitor_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.monitor_interval_ms)
    }
}
