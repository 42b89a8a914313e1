/// Integration tests for the SQLite repository implementations (spec §6)
/// against a real, migrated database rather than in-memory fakes.
mod helpers;

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use aegis_aggregator::domain::{ChainProvider, EscrowStatus, PayoutRecord, PayoutStatus, PolicyStatus};
use aegis_aggregator::storage::{
    EscrowRepository, PayoutRepository, PolicyRepository, SqliteEscrowRepository,
    SqlitePayoutRepository, SqlitePolicyRepository, SqliteUserWalletRepository,
    UserWalletRepository,
};

use helpers::builders::{EscrowBuilder, PolicyBuilder};
use helpers::fixtures::test_wallet;

#[tokio::test]
async fn policy_round_trips_through_upsert_and_get() {
    let (pool, _dir) = helpers::create_test_sqlite_db().await;
    let repo = SqlitePolicyRepository::new(pool);

    let policy = PolicyBuilder::default().build();
    repo.upsert(&policy).await.expect("upsert");

    let loaded = repo.get(policy.policy_id).await.expect("get").expect("present");
    assert_eq!(loaded.policy_id, policy.policy_id);
    assert_eq!(loaded.status, PolicyStatus::Active);
    assert_eq!(loaded.flight_id, policy.flight_id);
}

#[tokio::test]
async fn policy_upsert_is_an_update_on_conflict() {
    let (pool, _dir) = helpers::create_test_sqlite_db().await;
    let repo = SqlitePolicyRepository::new(pool);

    let mut policy = PolicyBuilder::default().status(PolicyStatus::Pending).build();
    repo.upsert(&policy).await.expect("insert");

    policy.status = PolicyStatus::Active;
    repo.upsert(&policy).await.expect("update");

    let loaded = repo.get(policy.policy_id).await.expect("get").expect("present");
    assert_eq!(loaded.status, PolicyStatus::Active);
}

#[tokio::test]
async fn list_active_unexpired_excludes_expired_and_non_active_policies() {
    let (pool, _dir) = helpers::create_test_sqlite_db().await;
    let repo = SqlitePolicyRepository::new(pool);

    let now = Utc::now();
    let active = PolicyBuilder::default().expires_at(now + Duration::days(1)).build();
    let expired = PolicyBuilder::default()
        .status(PolicyStatus::Active)
        .expires_at(now - Duration::days(1))
        .build();
    let claimed = PolicyBuilder::default()
        .status(PolicyStatus::Claimed)
        .expires_at(now + Duration::days(1))
        .build();

    for p in [&active, &expired, &claimed] {
        repo.upsert(p).await.expect("upsert");
    }

    let listed = repo.list_active_unexpired(now, 10).await.expect("list");
    let ids: Vec<Uuid> = listed.iter().map(|p| p.policy_id).collect();
    assert!(ids.contains(&active.policy_id));
    assert!(!ids.contains(&expired.policy_id));
    assert!(!ids.contains(&claimed.policy_id));
}

#[tokio::test]
async fn list_active_unexpired_honors_the_limit_and_orders_by_expiry() {
    let (pool, _dir) = helpers::create_test_sqlite_db().await;
    let repo = SqlitePolicyRepository::new(pool);

    let now = Utc::now();
    let soon = PolicyBuilder::default().expires_at(now + Duration::hours(1)).build();
    let later = PolicyBuilder::default().expires_at(now + Duration::days(10)).build();
    repo.upsert(&later).await.expect("upsert later");
    repo.upsert(&soon).await.expect("upsert soon");

    let listed = repo.list_active_unexpired(now, 1).await.expect("list");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].policy_id, soon.policy_id);
}

#[tokio::test]
async fn escrow_round_trips_and_is_findable_by_policy() {
    let (pool, _dir) = helpers::create_test_sqlite_db().await;
    let repo = SqliteEscrowRepository::new(pool);

    let policy_id = Uuid::new_v4();
    let escrow = EscrowBuilder::default().policy_id(policy_id).build();
    repo.upsert(&escrow).await.expect("upsert");

    let by_id = repo.get(&escrow.internal_id).await.expect("get").expect("present");
    assert_eq!(by_id.internal_id, escrow.internal_id);

    let by_policy = repo.get_by_policy(policy_id).await.expect("get_by_policy").expect("present");
    assert_eq!(by_policy.internal_id, escrow.internal_id);
}

#[tokio::test]
async fn escrow_upsert_updates_status_in_place() {
    let (pool, _dir) = helpers::create_test_sqlite_db().await;
    let repo = SqliteEscrowRepository::new(pool);

    let mut escrow = EscrowBuilder::default().status(EscrowStatus::Active).build();
    repo.upsert(&escrow).await.expect("insert");

    escrow.status = EscrowStatus::Released;
    repo.upsert(&escrow).await.expect("update");

    let loaded = repo.get(&escrow.internal_id).await.expect("get").expect("present");
    assert_eq!(loaded.status, EscrowStatus::Released);
}

#[tokio::test]
async fn payout_create_is_idempotent_on_conflicting_policy_id() {
    let (pool, _dir) = helpers::create_test_sqlite_db().await;
    let policy_repo = SqlitePolicyRepository::new(pool.clone());
    let payout_repo = SqlitePayoutRepository::new(pool);

    let policy = PolicyBuilder::default().build();
    policy_repo.upsert(&policy).await.expect("upsert policy");

    let now = Utc::now();
    let first = PayoutRecord {
        payout_id: Uuid::new_v4(),
        policy_id: policy.policy_id,
        escrow_id: "INS-FIRST".to_string(),
        amount: Decimal::new(100_000, 2),
        status: PayoutStatus::Completed,
        tx_hash: Some("0xfirst".to_string()),
        error_message: None,
        processed_at: Some(now),
        created_at: now,
        updated_at: now,
    };
    payout_repo.create(&first).await.expect("first create");

    // A retry attempt with a different payout_id for the same policy must be
    // a silent no-op (spec invariant 1): the persisted row stays the first one.
    let retry = PayoutRecord { payout_id: Uuid::new_v4(), ..first.clone() };
    payout_repo.create(&retry).await.expect("retry create");

    let loaded = payout_repo
        .get_by_policy(policy.policy_id)
        .await
        .expect("get_by_policy")
        .expect("present");
    assert_eq!(loaded.payout_id, first.payout_id);
    assert_eq!(loaded.tx_hash, first.tx_hash);
}

#[tokio::test]
async fn wallet_round_trips_and_get_primary_filters_by_chain() {
    let (pool, _dir) = helpers::create_test_sqlite_db().await;
    let repo = SqliteUserWalletRepository::new(pool);

    let wallet = test_wallet();
    repo.upsert(&wallet).await.expect("upsert");

    let found = repo
        .get_primary(&wallet.user_id, ChainProvider::Paygo)
        .await
        .expect("get_primary")
        .expect("present");
    assert_eq!(found.id, wallet.id);

    let missing = repo
        .get_primary(&wallet.user_id, ChainProvider::Ethereum)
        .await
        .expect("get_primary");
    assert!(missing.is_none());
}
