use std::sync::Arc;

use anyhow::Result;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::NaiveDate;
use tower::timeout::TimeoutLayer;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use uuid::Uuid;

use aegis_aggregator::{
    cli::{Cli, Commands},
    config::AggregatorConfig,
    domain::ChainProvider,
    escrow::{BlockchainServiceRegistry, PaygoEscrowService},
    monitor::PolicyMonitor,
    observability::{ObservabilityConfig, ObservabilityStack},
    payout::PayoutEngine,
    router::{DataRouter, PolicyDataRequest},
    sources::{FixtureFlightSource, FixtureWeatherSource, SourceClient},
    storage::{
        DatabasePool, SqliteEscrowRepository, SqlitePayoutRepository, SqlitePolicyRepository,
        SqliteUserWalletRepository,
    },
    FlightAggregator, InMemoryDlqStore, WeatherAggregator,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    let config = match &cli.config {
        Some(path) => AggregatorConfig::load(path)?,
        None => AggregatorConfig::default(),
    };
    config.validate().map_err(|e| anyhow::anyhow!(e))?;

    let observability = ObservabilityStack::init(&ObservabilityConfig::default())
        .map_err(|e| anyhow::anyhow!(e))?;

    info!("aegis-aggregator v{}", aegis_aggregator::VERSION);

    match &cli.command {
        Commands::Init { database_url } => {
            init_database(&config, database_url.as_deref()).await?;
        }
        Commands::Serve { bind } => {
            serve(config, observability, bind).await?;
        }
        Commands::Check => {
            run_one_check(&config).await?;
        }
        Commands::Trigger {
            policy_ids,
            reason,
            requested_by,
        } => {
            trigger(&config, policy_ids, reason, requested_by).await?;
        }
        Commands::Quote { flight_number, date } => {
            quote(&config, flight_number, *date).await?;
        }
    }

    Ok(())
}

async fn init_database(config: &AggregatorConfig, database_url: Option<&str>) -> Result<()> {
    let mut db_config = config.database.clone();
    if let Some(url) = database_url {
        db_config.url = url.to_string();
    }

    info!("initializing database: {}", db_config.url);
    let pool = DatabasePool::new(&db_config).await?;
    pool.run_migrations().await?;
    info!("database initialized");
    Ok(())
}

/// Construct the aggregation pipeline (Source Router -> Flight/Weather
/// Aggregator -> Data Router) from fixture sources, per `useRealProviders =
/// false` (spec §6). Swapping in real provider adapters only requires a
/// different `Vec<Arc<dyn SourceClient<...>>>` here.
fn build_data_router(config: &AggregatorConfig) -> Arc<DataRouter> {
    let flight_clients: Vec<Arc<dyn SourceClient<Output = _>>> = vec![
        Arc::new(FixtureFlightSource::new("primary-flight-api", 1, 0.95)),
        Arc::new(FixtureFlightSource::new("secondary-flight-api", 2, 0.85)),
    ];
    let weather_clients: Vec<Arc<dyn SourceClient<Output = _>>> = vec![
        Arc::new(FixtureWeatherSource::new("primary-weather-api", 1, 0.9)),
        Arc::new(FixtureWeatherSource::new("secondary-weather-api", 2, 0.8)),
    ];

    let flight_aggregator = Arc::new(FlightAggregator::new(flight_clients, config));
    let weather_aggregator = Arc::new(WeatherAggregator::new(weather_clients, config));

    Arc::new(DataRouter::new(flight_aggregator, weather_aggregator, config))
}

async fn build_payout_engine(config: &AggregatorConfig) -> Result<Arc<PayoutEngine>> {
    let db_pool = DatabasePool::new(&config.database).await?;
    if config.database.run_migrations {
        db_pool.run_migrations().await?;
    }

    let pool = match &db_pool {
        DatabasePool::Sqlite(p) => p.pool().clone(),
        #[cfg(feature = "postgres")]
        DatabasePool::Postgres(_) => {
            anyhow::bail!("postgres repositories are not wired into the payout engine yet")
        }
    };

    let policies = Arc::new(SqlitePolicyRepository::new(pool.clone()));
    let escrows = Arc::new(SqliteEscrowRepository::new(pool.clone()));
    let payouts = Arc::new(SqlitePayoutRepository::new(pool.clone()));
    let wallets = Arc::new(SqliteUserWalletRepository::new(pool));

    let mut registry = BlockchainServiceRegistry::new(ChainProvider::Paygo);
    registry.register(Arc::new(PaygoEscrowService::new()));

    Ok(Arc::new(PayoutEngine::new(
        policies,
        escrows,
        payouts,
        wallets,
        Arc::new(registry),
        Arc::new(InMemoryDlqStore::new()),
    )))
}

async fn run_one_check(config: &AggregatorConfig) -> Result<()> {
    let payout_engine = build_payout_engine(config).await?;
    let data_router = build_data_router(config);

    let db_pool = DatabasePool::new(&config.database).await?;
    let pool = match &db_pool {
        DatabasePool::Sqlite(p) => p.pool().clone(),
        #[cfg(feature = "postgres")]
        DatabasePool::Postgres(_) => anyhow::bail!("postgres repositories not wired yet"),
    };
    let policies = Arc::new(SqlitePolicyRepository::new(pool));

    let monitor = PolicyMonitor::new(policies, data_router, payout_engine, config);
    let report = monitor.run_one_cycle().await;

    info!(
        scanned = report.scanned,
        triggered = report.triggered.len(),
        errors = report.evaluation_errors,
        "check cycle complete"
    );
    for triggered in &report.triggered {
        println!(
            "triggered policy={} reason={} confidence={:.2}",
            triggered.policy_id, triggered.reason, triggered.confidence
        );
    }
    Ok(())
}

async fn serve(
    config: AggregatorConfig,
    observability: ObservabilityStack,
    bind: &str,
) -> Result<()> {
    let payout_engine = build_payout_engine(&config).await?;
    let data_router = build_data_router(&config);

    let db_pool = DatabasePool::new(&config.database).await?;
    let pool = match &db_pool {
        DatabasePool::Sqlite(p) => p.pool().clone(),
        #[cfg(feature = "postgres")]
        DatabasePool::Postgres(_) => anyhow::bail!("postgres repositories not wired yet"),
    };
    let policies = Arc::new(SqlitePolicyRepository::new(pool));

    let monitor = Arc::new(PolicyMonitor::new(
        policies,
        Arc::clone(&data_router),
        Arc::clone(&payout_engine),
        &config,
    ));
    monitor.start().await;

    let state = Arc::new(ServerState {
        config: config.clone(),
        data_router,
        payout_engine,
        observability,
    });

    let app = Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route(
            "/internal/payouts/process-triggered",
            post(process_triggered_handler),
        )
        .route("/internal/policy-data/quote", post(policy_data_quote_handler))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(axum::error_handling::HandleErrorLayer::new(handle_timeout_error))
                .layer(TimeoutLayer::new(config.router_timeout())),
        )
        .with_state(state);

    info!("internal API listening on {}", bind);
    let listener = tokio::net::TcpListener::bind(bind).await?;
    axum::serve(listener, app).await?;

    monitor.stop().await;
    Ok(())
}

async fn handle_timeout_error(error: tower::BoxError) -> impl IntoResponse {
    if error.is::<tower::timeout::error::Elapsed>() {
        (StatusCode::REQUEST_TIMEOUT, "request timed out".to_string())
    } else {
        (StatusCode::INTERNAL_SERVER_ERROR, format!("unhandled error: {error}"))
    }
}

struct ServerState {
    config: AggregatorConfig,
    data_router: Arc<DataRouter>,
    payout_engine: Arc<PayoutEngine>,
    observability: ObservabilityStack,
}

fn authorized(state: &ServerState, headers: &HeaderMap) -> bool {
    if state.config.internal_secret.is_empty() {
        return true;
    }
    match headers.get("X-Internal-Secret").and_then(|v| v.to_str().ok()) {
        Some(value) => constant_time_eq::constant_time_eq(
            value.as_bytes(),
            state.config.internal_secret.as_bytes(),
        ),
        None => false,
    }
}

async fn health_handler(State(state): State<Arc<ServerState>>) -> impl axum::response::IntoResponse {
    match state.observability.health() {
        Some(checker) => {
            let report = checker.check_health().await;
            Json(report).into_response()
        }
        None => StatusCode::OK.into_response(),
    }
}

async fn metrics_handler(State(state): State<Arc<ServerState>>) -> impl axum::response::IntoResponse {
    match state.observability.metrics() {
        Some(registry) => match registry.export() {
            Ok(body) => (StatusCode::OK, body).into_response(),
            Err(e) => {
                error!(error = %e, "failed to export metrics");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        },
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

#[derive(serde::Deserialize)]
struct ProcessTriggeredBody {
    policy_ids: Vec<Uuid>,
    reason: String,
    #[serde(default)]
    #[allow(dead_code)]
    requested_by: Option<String>,
}

async fn process_triggered_handler(
    State(state): State<Arc<ServerState>>,
    headers: HeaderMap,
    Json(body): Json<ProcessTriggeredBody>,
) -> impl axum::response::IntoResponse {
    if !authorized(&state, &headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    let summary = state
        .payout_engine
        .process_triggered_payouts(&body.policy_ids, &body.reason)
        .await;

    Json(serde_json::json!({
        "processedCount": summary.processed_count,
        "failedCount": summary.failed_count,
        "totalAmount": summary.total_amount.to_string(),
    }))
    .into_response()
}

#[derive(serde::Deserialize)]
struct QuoteBody {
    flight_number: String,
    date: NaiveDate,
}

async fn policy_data_quote_handler(
    State(state): State<Arc<ServerState>>,
    headers: HeaderMap,
    Json(body): Json<QuoteBody>,
) -> impl axum::response::IntoResponse {
    if !authorized(&state, &headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    let request = PolicyDataRequest::new(body.flight_number, body.date);
    match state.data_router.get_data_for_policy(request).await {
        Ok(response) => Json(serde_json::json!({
            "flight": response.flight,
            "weatherObservations": response.weather_observations,
        }))
        .into_response(),
        Err(e) => {
            error!(error = %e, "policy data quote failed");
            StatusCode::BAD_GATEWAY.into_response()
        }
    }
}

async fn trigger(
    config: &AggregatorConfig,
    policy_ids: &[Uuid],
    reason: &str,
    requested_by: &str,
) -> Result<()> {
    let payout_engine = build_payout_engine(config).await?;
    info!(requested_by, "manually triggering payout batch");
    let summary = payout_engine.process_triggered_payouts(policy_ids, reason).await;

    println!(
        "processed={} failed={} total_amount={}",
        summary.processed_count, summary.failed_count, summary.total_amount
    );
    for result in &summary.per_policy_results {
        println!("{:?}", result);
    }
    Ok(())
}

async fn quote(config: &AggregatorConfig, flight_number: &str, date: NaiveDate) -> Result<()> {
    let data_router = build_data_router(config);
    let request = PolicyDataRequest::new(flight_number, date);
    let response = data_router.get_data_for_policy(request).await?;

    println!("{}", serde_json::to_string_pretty(&serde_json::json!({
        "flight": response.flight,
        "weatherObservations": response.weather_observations,
        "metadata": {
            "flightFromCache": response.metadata.flight_from_cache,
            "flightQualityScore": response.metadata.flight_quality_score,
            "processingTimeMs": response.metadata.processing_time_ms,
        },
    }))?);
    Ok(())
}
