/// Test fixtures for common test data
///
/// Provides factory methods for creating test data objects

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use aegis_aggregator::domain::{
    ChainProvider, CoverageType, Escrow, EscrowStatus, Policy, PolicyOwner, PolicyStatus,
    PolicyTerms, UserWallet,
};

/// A user ID shared by the fixture policy, escrow, and wallet below.
pub fn test_user_id() -> String {
    "user-1".to_string()
}

/// An ACTIVE flight-delay policy, ready to be fed to the Payout Engine or
/// Policy Monitor.
pub fn test_policy() -> Policy {
    let now = Utc::now();
    Policy {
        policy_id: Uuid::new_v4(),
        policy_number: format!("POL-{}", Uuid::new_v4().simple()),
        owner: PolicyOwner::User(test_user_id()),
        coverage_type: CoverageType::FlightDelay,
        coverage_amount: Decimal::new(100_000, 2),
        premium: Decimal::new(1_500, 2),
        payout_amount: Decimal::new(100_000, 2),
        status: PolicyStatus::Active,
        expires_at: now + Duration::days(1),
        flight_id: "UA456".to_string(),
        terms: PolicyTerms { delay_threshold_minutes: Some(15) },
        created_at: now,
        updated_at: now,
    }
}

/// An ACTIVE escrow tied to `policy_id`, funded for the same amount as
/// [`test_policy`].
pub fn test_escrow(policy_id: Uuid) -> Escrow {
    let now = Utc::now();
    Escrow {
        internal_id: aegis_aggregator::escrow::generate_policy_escrow_id("paygo-primary", policy_id),
        blockchain_id: format!("0x{}", Uuid::new_v4().simple()),
        policy_id: Some(policy_id),
        user_id: Some(test_user_id()),
        chain: ChainProvider::Paygo,
        status: EscrowStatus::Active,
        amount: Decimal::new(100_000, 2),
        expires_at: now + Duration::days(30),
        created_at: now,
        updated_at: now,
    }
}

/// A custodial wallet for [`test_user_id`], primary on the Paygo chain.
pub fn test_wallet() -> UserWallet {
    UserWallet::custodial(test_user_id(), "paygo:wallet:00000001", ChainProvider::Paygo, vec![0u8; 48])
}
