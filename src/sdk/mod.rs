//! C13 internal SDK client: a typed Rust client for the two abstract
//! internal API surfaces named in spec.md §6 (`InternalPayoutsProcessTriggered`,
//! `GetPolicyDataForQuote`), authenticated by a shared secret.

pub mod client;
pub mod config;
pub mod error;
pub mod retry;
pub mod telemetry;
pub mod types;

pub use client::{AegisSdkClient, ClientBuilder};
pub use config::{ClientConfig, ClientConfigBuilder, PoolConfig, RateLimitConfig, RetryConfig, TelemetryConfig};
pub use error::{IntoSdkError, SdkError, SdkResult};
pub use retry::RetryPolicy;
pub use telemetry::TelemetryCollector;
pub use types::{
    HealthResponse, PerPolicyResultDto, PolicyDataQuoteRequest, PolicyDataQuoteResponse,
    PolicyOutcomeDto, ProcessTriggeredRequest, ProcessTriggeredSummary,
};
