//! Policy: consumed (not owned) by this core. Mutated only by the Payout
//! Engine's ACTIVE -> CLAIMED / ACTIVE -> EXPIRED transitions.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::{CoreError, Result};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CoverageType {
    FlightDelay,
    FlightCancellation,
    WeatherDisruption,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PolicyStatus {
    Pending,
    Active,
    Claimed,
    Expired,
    Cancelled,
}

impl PolicyStatus {
    /// CLAIMED is terminal (spec testable property 3).
    pub fn is_terminal(&self) -> bool {
        matches!(self, PolicyStatus::Claimed)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum PolicyOwner {
    User(String),
    AnonymousSession(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PolicyTerms {
    pub delay_threshold_minutes: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Policy {
    pub policy_id: Uuid,
    pub policy_number: String,
    pub owner: PolicyOwner,

    pub coverage_type: CoverageType,
    pub coverage_amount: Decimal,
    pub premium: Decimal,
    pub payout_amount: Decimal,

    pub status: PolicyStatus,
    pub expires_at: DateTime<Utc>,
    pub flight_id: String,
    pub terms: PolicyTerms,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Policy {
    pub fn is_active_and_unexpired(&self, now: DateTime<Utc>) -> bool {
        self.status == PolicyStatus::Active && self.expires_at > now
    }

    /// Validate the one-way transition rule from spec invariant 3: the
    /// observed status sequence is a prefix of
    /// (PENDING, ACTIVE, {CLAIMED | EXPIRED | CANCELLED}).
    pub fn validate_transition(&self, next: PolicyStatus) -> Result<()> {
        let allowed = match self.status {
            PolicyStatus::Pending => matches!(next, PolicyStatus::Active | PolicyStatus::Cancelled),
            PolicyStatus::Active => matches!(
                next,
                PolicyStatus::Claimed | PolicyStatus::Expired | PolicyStatus::Cancelled
            ),
            PolicyStatus::Claimed | PolicyStatus::Expired | PolicyStatus::Cancelled => false,
        };
        if allowed {
            Ok(())
        } else {
            Err(CoreError::invalid_record(format!(
                "illegal policy transition {:?} -> {:?}",
                self.status, next
            )))
        }
    }

    pub fn delay_threshold_minutes(&self, default_minutes: u32) -> u32 {
        self.terms.delay_threshold_minutes.unwrap_or(default_minutes)
    }
}
