//! Step 2 of the payout transaction sketch: eligibility checks that fail the
//! individual policy without throwing (spec §4.9 step 2).

use chrono::Utc;
use thiserror::Error;

use crate::domain::{Escrow, EscrowStatus, Policy, PolicyStatus, UserWallet};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EligibilityError {
    #[error("policy not found")]
    PolicyNotFound,
    #[error("no user wallet on file")]
    NoUserWallet,
    #[error("no active or pending escrow")]
    NoEscrow,
    #[error("policy status {0:?} is not ACTIVE")]
    PolicyNotActive(PolicyStatus),
    #[error("escrow already {0:?}")]
    EscrowAlreadyTerminal(EscrowStatus),
    #[error("escrow expired")]
    EscrowExpired,
    #[error("invalid payout amount")]
    InvalidPayoutAmount,
}

/// Validates the per-policy preconditions from spec §4.9 step 2. Returning
/// `Err` here is a recorded per-policy failure, never a panic or an
/// engine-wide abort.
pub fn check_eligibility(
    policy: Option<&Policy>,
    wallet: Option<&UserWallet>,
    escrow: Option<&Escrow>,
) -> Result<(), EligibilityError> {
    let policy = policy.ok_or(EligibilityError::PolicyNotFound)?;
    wallet.ok_or(EligibilityError::NoUserWallet)?;
    let escrow = escrow.ok_or(EligibilityError::NoEscrow)?;

    if policy.status != PolicyStatus::Active {
        return Err(EligibilityError::PolicyNotActive(policy.status));
    }
    if escrow.status.is_terminal() {
        return Err(EligibilityError::EscrowAlreadyTerminal(escrow.status));
    }
    if escrow.is_expired(Utc::now()) {
        return Err(EligibilityError::EscrowExpired);
    }
    if policy.payout_amount.is_sign_negative() || policy.payout_amount.is_zero() {
        return Err(EligibilityError::InvalidPayoutAmount);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal::Decimal;
    use uuid::Uuid;

    fn active_policy() -> Policy {
        Policy {
            policy_id: Uuid::new_v4(),
            policy_number: "POL-1".into(),
            owner: crate::domain::PolicyOwner::User("u1".into()),
            coverage_type: crate::domain::CoverageType::FlightDelay,
            coverage_amount: Decimal::new(100000, 2),
            premium: Decimal::new(1000, 2),
            payout_amount: Decimal::new(100000, 2),
            status: PolicyStatus::Active,
            expires_at: Utc::now() + Duration::days(1),
            flight_id: "UA456".into(),
            terms: crate::domain::PolicyTerms { delay_threshold_minutes: Some(15) },
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn active_escrow() -> Escrow {
        Escrow {
            internal_id: "INS-X".into(),
            blockchain_id: "0xabc".into(),
            policy_id: None,
            user_id: None,
            chain: crate::domain::ChainProvider::Paygo,
            status: EscrowStatus::Active,
            amount: Decimal::new(100000, 2),
            expires_at: Utc::now() + Duration::days(1),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn a_wallet() -> UserWallet {
        UserWallet::custodial("u1", "paygo:wallet:1", crate::domain::ChainProvider::Paygo, vec![])
    }

    #[test]
    fn rejects_missing_policy() {
        assert_eq!(
            check_eligibility(None, Some(&a_wallet()), Some(&active_escrow())),
            Err(EligibilityError::PolicyNotFound)
        );
    }

    #[test]
    fn rejects_already_claimed_policy() {
        let mut p = active_policy();
        p.status = PolicyStatus::Claimed;
        assert_eq!(
            check_eligibility(Some(&p), Some(&a_wallet()), Some(&active_escrow())),
            Err(EligibilityError::PolicyNotActive(PolicyStatus::Claimed))
        );
    }

    #[test]
    fn rejects_terminal_escrow() {
        let mut e = active_escrow();
        e.status = EscrowStatus::Released;
        assert_eq!(
            check_eligibility(Some(&active_policy()), Some(&a_wallet()), Some(&e)),
            Err(EligibilityError::EscrowAlreadyTerminal(EscrowStatus::Released))
        );
    }

    #[test]
    fn accepts_a_well_formed_eligible_policy() {
        assert!(check_eligibility(Some(&active_policy()), Some(&a_wallet()), Some(&active_escrow())).is_ok());
    }
}
