/// End-to-end integration test wiring real SQLite-backed repositories
/// through the Data Router, Policy Monitor, and Payout Engine (the
/// combined S5 + S6 flow), in place of the in-memory fakes used by the
/// module-level unit tests.
mod helpers;

use std::sync::Arc;

use aegis_aggregator::config::AggregatorConfig;
use aegis_aggregator::domain::{
    CanonicalFlight, CanonicalWeatherObservation, ChainProvider, EscrowStatus, FlightStatus,
    PolicyStatus,
};
use aegis_aggregator::dlq::InMemoryDlqStore;
use aegis_aggregator::escrow::{BlockchainServiceRegistry, PaygoEscrowService};
use aegis_aggregator::sources::{FixtureFlightSource, SourceClient};
use aegis_aggregator::storage::{
    EscrowRepository, PayoutRepository, PolicyRepository, SqliteEscrowRepository,
    SqlitePayoutRepository, SqlitePolicyRepository, SqliteUserWalletRepository,
    UserWalletRepository,
};
use aegis_aggregator::{DataRouter, FlightAggregator, PayoutEngine, PolicyMonitor, WeatherAggregator};

use helpers::fixtures::{test_escrow, test_policy, test_wallet};

#[tokio::test]
async fn monitor_scan_cycle_drives_a_real_persisted_payout() {
    let (pool, _dir) = helpers::create_test_sqlite_db().await;

    let policy_repo = Arc::new(SqlitePolicyRepository::new(pool.clone()));
    let escrow_repo = Arc::new(SqliteEscrowRepository::new(pool.clone()));
    let payout_repo = Arc::new(SqlitePayoutRepository::new(pool.clone()));
    let wallet_repo = Arc::new(SqliteUserWalletRepository::new(pool));

    let policy = test_policy();
    policy_repo.upsert(&policy).await.expect("seed policy");
    let escrow = test_escrow(policy.policy_id);
    escrow_repo.upsert(&escrow).await.expect("seed escrow");
    let wallet = test_wallet();
    wallet_repo.upsert(&wallet).await.expect("seed wallet");

    let config = AggregatorConfig::default();
    let flight_clients: Vec<Arc<dyn SourceClient<Output = CanonicalFlight>>> = vec![Arc::new(
        FixtureFlightSource::new("source-a", 10, 0.9).with_fixture(
            &policy.flight_id,
            FlightStatus::Delayed,
            Some(45),
            Some(45),
        ),
    )];
    let weather_clients: Vec<Arc<dyn SourceClient<Output = CanonicalWeatherObservation>>> = Vec::new();
    let flight_aggregator = Arc::new(FlightAggregator::new(flight_clients, &config));
    let weather_aggregator = Arc::new(WeatherAggregator::new(weather_clients, &config));
    let data_router = Arc::new(DataRouter::new(flight_aggregator, weather_aggregator, &config));

    let mut registry = BlockchainServiceRegistry::new(ChainProvider::Paygo);
    registry.register(Arc::new(PaygoEscrowService::new()));
    let payout_engine = Arc::new(PayoutEngine::new(
        policy_repo.clone(),
        escrow_repo.clone(),
        payout_repo.clone(),
        wallet_repo,
        Arc::new(registry),
        Arc::new(InMemoryDlqStore::new()),
    ));

    let monitor = Arc::new(PolicyMonitor::new(
        policy_repo.clone(),
        data_router,
        payout_engine,
        &config,
    ));

    let report = monitor.run_one_cycle().await;
    assert_eq!(report.scanned, 1);
    assert_eq!(report.triggered.len(), 1);
    assert_eq!(
        report.triggered[0].reason,
        "Flight delayed by 45 minutes, exceeding threshold of 15 minutes"
    );

    let updated_policy = policy_repo.get(policy.policy_id).await.expect("get").expect("present");
    assert_eq!(updated_policy.status, PolicyStatus::Claimed);

    let updated_escrow = escrow_repo
        .get_by_policy(policy.policy_id)
        .await
        .expect("get")
        .expect("present");
    assert_eq!(updated_escrow.status, EscrowStatus::Released);

    let payout = payout_repo
        .get_by_policy(policy.policy_id)
        .await
        .expect("get")
        .expect("present");
    assert_eq!(payout.status, aegis_aggregator::domain::PayoutStatus::Completed);

    // A second cycle must not re-trigger: the policy is no longer ACTIVE, so
    // it drops out of the SCANNING query and the payout row is untouched.
    let second_report = monitor.run_one_cycle().await;
    assert_eq!(second_report.scanned, 0);
    let payout_after = payout_repo
        .get_by_policy(policy.policy_id)
        .await
        .expect("get")
        .expect("present");
    assert_eq!(payout_after.payout_id, payout.payout_id);
}
