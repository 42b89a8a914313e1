// Database row shapes (SQLx). These mirror the domain types in `crate::domain`
// field-for-field but use SQL-native scalars (strings for UUIDs/timestamps,
// the decimal's string form for exact recovery) since sqlx's SQLite driver
// has no native `Decimal`/`Uuid`/`DateTime` bindings.

use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct PolicyRow {
    pub policy_id: String,
    pub policy_number: String,
    pub owner_kind: String,
    pub owner_ref: String,
    pub coverage_type: String,
    pub coverage_amount: String,
    pub premium: String,
    pub payout_amount: String,
    pub status: String,
    pub expires_at: String,
    pub flight_id: String,
    pub delay_threshold_minutes: Option<i64>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct EscrowRow {
    pub internal_id: String,
    pub blockchain_id: String,
    pub policy_id: Option<String>,
    pub user_id: Option<String>,
    pub chain: String,
    pub status: String,
    pub amount: String,
    pub expires_at: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct PayoutRecordRow {
    pub payout_id: String,
    pub policy_id: String,
    pub escrow_id: String,
    pub amount: String,
    pub status: String,
    pub tx_hash: Option<String>,
    pub error_message: Option<String>,
    pub processed_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct UserWalletRow {
    pub id: String,
    pub user_id: String,
    pub address: String,
    pub chain: String,
    pub wallet_type: String,
    pub encrypted_secret: Option<Vec<u8>>,
    pub kms_key_id: Option<String>,
    pub is_primary: bool,
    pub created_at: String,
    pub updated_at: String,
}
