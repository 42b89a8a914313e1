//! PayoutRecord: produced exclusively by the Payout Engine.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PayoutStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayoutRecord {
    pub payout_id: Uuid,
    pub policy_id: Uuid,
    pub escrow_id: String,
    pub amount: Decimal,
    pub status: PayoutStatus,
    pub tx_hash: Option<String>,
    pub error_message: Option<String>,
    pub processed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PayoutRecord {
    pub fn completed(policy_id: Uuid, escrow_id: String, amount: Decimal, tx_hash: String) -> Self {
        let now = Utc::now();
        Self {
            payout_id: Uuid::new_v4(),
            policy_id,
            escrow_id,
            amount,
            status: PayoutStatus::Completed,
            tx_hash: Some(tx_hash),
            error_message: None,
            processed_at: Some(now),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn failed(policy_id: Uuid, escrow_id: String, amount: Decimal, error_message: String) -> Self {
        let now = Utc::now();
        Self {
            payout_id: Uuid::new_v4(),
            policy_id,
            escrow_id,
            amount,
            status: PayoutStatus::Failed,
            tx_hash: None,
            error_message: Some(error_message),
            processed_at: Some(now),
            created_at: now,
            updated_at: now,
        }
    }
}
