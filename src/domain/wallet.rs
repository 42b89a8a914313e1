//! UserWallet: the recipient address record loaded by the Payout Engine's
//! eligibility check (spec §4.9 step 1/2).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::escrow::ChainProvider;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WalletType {
    Custodial,
    SelfCustody,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserWallet {
    pub id: Uuid,
    pub user_id: String,
    pub address: String,
    pub chain: ChainProvider,
    pub wallet_type: WalletType,
    /// Self-describing AES-256-GCM ciphertext (nonce + tag inline), present
    /// only for custodial wallets whose key this system holds on the user's
    /// behalf (spec §9 Design Notes).
    pub encrypted_secret: Option<Vec<u8>>,
    pub kms_key_id: Option<String>,
    pub is_primary: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserWallet {
    pub fn custodial(user_id: impl Into<String>, address: impl Into<String>, chain: ChainProvider, encrypted_secret: Vec<u8>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.into(),
            address: address.into(),
            chain,
            wallet_type: WalletType::Custodial,
            encrypted_secret: Some(encrypted_secret),
            kms_key_id: None,
            is_primary: true,
            created_at: now,
            updated_at: now,
        }
    }
}
