//! aegis-aggregator - flight/weather data aggregation and policy-trigger
//! payout pipeline for parametric travel insurance.
//!
//! Canonical flight and weather records are assembled from multiple
//! unreliable provider sources (TTL-cached, conflict-resolved, quality
//! scored), routed to a periodic Policy Monitor that evaluates
//! coverage-specific trigger predicates, and handed to an idempotent Payout
//! Engine that releases escrowed funds through a chain-agnostic adapter.

pub mod aggregator;
pub mod cache;
pub mod cli;
pub mod config;
pub mod crypto;
pub mod dlq;
pub mod domain;
pub mod escrow;
pub mod monitor;
pub mod observability;
pub mod payout;
pub mod resolver;
pub mod router;
pub mod sdk;
pub mod sources;
pub mod storage;

pub use domain::{
    freshness_decay, CanonicalFlight, CanonicalWeatherObservation, ChainProvider, Conflict,
    ConflictingValue, CoreError, Coordinates, CoverageType, Escrow, EscrowStatus, FlightStatus,
    Policy, PolicyOwner, PolicyStatus, PolicyTerms, PayoutRecord, PayoutStatus, Result,
    SourceContribution, UserWallet, WalletType, WeatherCondition,
};

pub use cache::{generate_key, Clock, FixedClock, SystemClock, TtlCache};

pub use sources::{CooldownPolicy, FetchOutcome, FixtureFlightSource, FixtureWeatherSource, SourceClient, SourceRouter};

pub use resolver::{resolve_flights, resolve_weather, ResolverConfig};

pub use aggregator::{AggregationResult, FlightAggregator, WeatherAggregator};

pub use router::{DataRouter, PolicyDataMetadata, PolicyDataRequest, PolicyDataResponse};

pub use escrow::{
    derive_blockchain_id, generate_policy_escrow_id, generate_user_escrow_id,
    parse_policy_escrow_id, parse_user_escrow_id, AccountInfo, BlockchainServiceRegistry,
    ChainReceipt, CreateEscrowParams, EscrowHandle, EscrowService, PaygoEscrowService,
    ParsedPolicyEscrowId, ParsedUserEscrowId, TransactionStatus, WalletHandle,
};

pub use payout::{check_eligibility, EligibilityError, PayoutEngine, PayoutSummary, PerPolicyResult};

pub use monitor::{evaluate, PolicyMonitor, ScanReport, TriggerOutcome, TriggeredPolicy};

pub use storage::{
    DatabaseConfig, DatabasePool, DatabaseType, EscrowRepository, PayoutRepository, PolicyRepository,
    PoolStats, SqliteEscrowRepository, SqlitePayoutRepository, SqlitePolicyRepository, SqlitePool,
    SqliteUserWalletRepository, UserWalletRepository,
};
#[cfg(feature = "postgres")]
pub use storage::PostgresPool;

pub use crypto::WalletCipher;

pub use dlq::{
    BackoffStrategy, BackoffType, DlqConfig, DlqError, DlqItem, DlqItemHandler, DlqItemStatus,
    DlqMetadata, DlqProcessor, DlqResult, DlqStats, DlqStore, ExponentialBackoff, FailureReason,
    FixedBackoff, InMemoryDlqStore, LinearBackoff, ProcessingResult, ProcessingStats, RetryAttempt,
    RetryPolicy,
};

pub use config::AggregatorConfig;

pub use observability::{
    init_observability, init_tracing_with_config, CacheHealthCheck, ComponentHealth,
    CorrelationId, DatabaseHealthCheck, ExternalServiceHealthCheck, FunctionHealthCheck,
    HealthCheck, HealthChecker, HealthConfig, HealthStatus, LogEntry, LogLevel, LoggingConfig,
    LoggingFormat, MetricsError, MetricsRegistry, ObservabilityConfig, ObservabilityMetricsConfig,
    ObservabilityStack, OtlpConfig, PerformanceLogger, RequestId, StructuredLogger, Timer,
    TraceContext, TraceContextLayer, TracingConfig, TracingFormat, start_timer,
};

pub use sdk::{AegisSdkClient, ProcessTriggeredRequest, ProcessTriggeredSummary, PolicyDataQuoteRequest, PolicyDataQuoteResponse, SdkError, SdkResult};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize default tracing output. For full control over format, level,
/// and OTLP export, use [`observability::init_tracing_with_config`] instead.
pub fn init() -> Result<()> {
    observability::init_tracing();
    Ok(())
}
