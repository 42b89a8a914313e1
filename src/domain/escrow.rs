//! Escrow: consumed by the Payout Engine via the chain-agnostic Escrow
//! Abstraction (C9). Status transitions are one-way and RELEASED/FULFILLED
//! are terminal (spec invariant 4).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::{CoreError, Result};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EscrowStatus {
    Pending,
    Active,
    Fulfilled,
    Released,
    Expired,
    Cancelled,
}

impl EscrowStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, EscrowStatus::Fulfilled | EscrowStatus::Released)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChainProvider {
    Paygo,
    Ethereum,
    Base,
    Solana,
}

impl ChainProvider {
    /// Unknown tags default to the primary provider (spec §6).
    pub fn parse_or_default(tag: &str, primary: ChainProvider) -> Self {
        match tag.to_ascii_uppercase().as_str() {
            "PAYGO" => ChainProvider::Paygo,
            "ETHEREUM" => ChainProvider::Ethereum,
            "BASE" => ChainProvider::Base,
            "SOLANA" => ChainProvider::Solana,
            _ => primary,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Escrow {
    pub internal_id: String,
    pub blockchain_id: String,
    pub policy_id: Option<Uuid>,
    pub user_id: Option<String>,
    pub chain: ChainProvider,
    pub status: EscrowStatus,
    pub amount: Decimal,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Escrow {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    pub fn validate_transition(&self, next: EscrowStatus) -> Result<()> {
        if self.status.is_terminal() {
            return Err(CoreError::invalid_record(format!(
                "escrow {} is terminal at {:?}, cannot move to {:?}",
                self.internal_id, self.status, next
            )));
        }
        Ok(())
    }
}
