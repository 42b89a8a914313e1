/// Builder patterns for test data
///
/// Provides flexible builder patterns for creating test objects
/// with custom fields

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use aegis_aggregator::domain::{
    ChainProvider, CoverageType, Escrow, EscrowStatus, Policy, PolicyOwner, PolicyStatus,
    PolicyTerms,
};

/// Builder for `Policy`.
pub struct PolicyBuilder {
    policy_id: Uuid,
    policy_number: String,
    owner: PolicyOwner,
    coverage_type: CoverageType,
    coverage_amount: Decimal,
    premium: Decimal,
    payout_amount: Decimal,
    status: PolicyStatus,
    expires_at: DateTime<Utc>,
    flight_id: String,
    delay_threshold_minutes: Option<u32>,
}

impl Default for PolicyBuilder {
    fn default() -> Self {
        Self {
            policy_id: Uuid::new_v4(),
            policy_number: format!("POL-{}", Uuid::new_v4().simple()),
            owner: PolicyOwner::User("user-1".to_string()),
            coverage_type: CoverageType::FlightDelay,
            coverage_amount: Decimal::new(100_000, 2),
            premium: Decimal::new(1_500, 2),
            payout_amount: Decimal::new(100_000, 2),
            status: PolicyStatus::Active,
            expires_at: Utc::now() + Duration::days(1),
            flight_id: "UA456".to_string(),
            delay_threshold_minutes: Some(15),
        }
    }
}

impl PolicyBuilder {
    pub fn policy_id(mut self, id: Uuid) -> Self {
        self.policy_id = id;
        self
    }

    pub fn owner(mut self, owner: PolicyOwner) -> Self {
        self.owner = owner;
        self
    }

    pub fn coverage_type(mut self, coverage_type: CoverageType) -> Self {
        self.coverage_type = coverage_type;
        self
    }

    pub fn status(mut self, status: PolicyStatus) -> Self {
        self.status = status;
        self
    }

    pub fn expires_at(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = expires_at;
        self
    }

    pub fn flight_id(mut self, flight_id: impl Into<String>) -> Self {
        self.flight_id = flight_id.into();
        self
    }

    pub fn delay_threshold_minutes(mut self, minutes: Option<u32>) -> Self {
        self.delay_threshold_minutes = minutes;
        self
    }

    pub fn build(self) -> Policy {
        let now = Utc::now();
        Policy {
            policy_id: self.policy_id,
            policy_number: self.policy_number,
            owner: self.owner,
            coverage_type: self.coverage_type,
            coverage_amount: self.coverage_amount,
            premium: self.premium,
            payout_amount: self.payout_amount,
            status: self.status,
            expires_at: self.expires_at,
            flight_id: self.flight_id,
            terms: PolicyTerms { delay_threshold_minutes: self.delay_threshold_minutes },
            created_at: now,
            updated_at: now,
        }
    }
}

/// Builder for `Escrow`.
pub struct EscrowBuilder {
    internal_id: String,
    blockchain_id: String,
    policy_id: Option<Uuid>,
    chain: ChainProvider,
    status: EscrowStatus,
    amount: Decimal,
    expires_at: DateTime<Utc>,
}

impl Default for EscrowBuilder {
    fn default() -> Self {
        Self {
            internal_id: aegis_aggregator::escrow::generate_policy_escrow_id(
                "paygo-primary",
                Uuid::new_v4(),
            ),
            blockchain_id: format!("0x{}", Uuid::new_v4().simple()),
            policy_id: None,
            chain: ChainProvider::Paygo,
            status: EscrowStatus::Active,
            amount: Decimal::new(100_000, 2),
            expires_at: Utc::now() + Duration::days(30),
        }
    }
}

impl EscrowBuilder {
    pub fn policy_id(mut self, policy_id: Uuid) -> Self {
        self.policy_id = Some(policy_id);
        self
    }

    pub fn status(mut self, status: EscrowStatus) -> Self {
        self.status = status;
        self
    }

    pub fn amount(mut self, amount: Decimal) -> Self {
        self.amount = amount;
        self
    }

    pub fn build(self) -> Escrow {
        let now = Utc::now();
        Escrow {
            internal_id: self.internal_id,
            blockchain_id: self.blockchain_id,
            policy_id: self.policy_id,
            user_id: None,
            chain: self.chain,
            status: self.status,
            amount: self.amount,
            expires_at: self.expires_at,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_builder_applies_overrides() {
        let policy = PolicyBuilder::default()
            .status(PolicyStatus::Pending)
            .flight_id("DL789")
            .build();
        assert_eq!(policy.status, PolicyStatus::Pending);
        assert_eq!(policy.flight_id, "DL789");
    }

    #[test]
    fn escrow_builder_links_to_a_policy() {
        let policy_id = Uuid::new_v4();
        let escrow = EscrowBuilder::default().policy_id(policy_id).build();
        assert_eq!(escrow.policy_id, Some(policy_id));
    }
}
