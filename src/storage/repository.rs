//! Persistence traits and SQLite implementations for the four persistent
//! record types the Payout Engine and Policy Monitor read and write (spec
//! §6): `Policy`, `Escrow`, `PayoutRecord`, `UserWallet`.
//!
//! Queries are runtime-checked (`sqlx::query`/`query_as`, not the
//! `query!`/`query_as!` macros) so the crate does not depend on an offline
//! query cache or a live database at build time.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{Pool, Sqlite};
use tracing::info;
use uuid::Uuid;

use crate::domain::{
    ChainProvider, CoreError, CoverageType, Escrow, EscrowStatus, Policy, PolicyOwner,
    PolicyStatus, PolicyTerms, PayoutRecord, PayoutStatus, Result, UserWallet, WalletType,
};

use super::models::{EscrowRow, PayoutRecordRow, PolicyRow, UserWalletRow};

#[async_trait::async_trait]
pub trait PolicyRepository: Send + Sync {
    async fn get(&self, policy_id: Uuid) -> Result<Option<Policy>>;
    async fn upsert(&self, policy: &Policy) -> Result<()>;
    /// The Policy Monitor's SCANNING query (spec §4.8): active, unexpired
    /// policies, oldest-expiry first, bounded by `maxPoliciesPerCheck`.
    async fn list_active_unexpired(&self, now: DateTime<Utc>, limit: usize) -> Result<Vec<Policy>>;
}

#[async_trait::async_trait]
pub trait EscrowRepository: Send + Sync {
    async fn get(&self, internal_id: &str) -> Result<Option<Escrow>>;
    async fn get_by_policy(&self, policy_id: Uuid) -> Result<Option<Escrow>>;
    async fn upsert(&self, escrow: &Escrow) -> Result<()>;
}

#[async_trait::async_trait]
pub trait PayoutRepository: Send + Sync {
    async fn get_by_policy(&self, policy_id: Uuid) -> Result<Option<PayoutRecord>>;
    async fn create(&self, record: &PayoutRecord) -> Result<()>;
}

#[async_trait::async_trait]
pub trait UserWalletRepository: Send + Sync {
    async fn get_primary(&self, user_id: &str, chain: ChainProvider) -> Result<Option<UserWallet>>;
    async fn upsert(&self, wallet: &UserWallet) -> Result<()>;
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn parse_decimal(s: &str) -> Result<Decimal> {
    Decimal::from_str(s).map_err(|e| CoreError::persistence(format!("bad decimal {s}: {e}")))
}

#[derive(Clone)]
pub struct SqlitePolicyRepository {
    pool: Pool<Sqlite>,
}

impl SqlitePolicyRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    fn row_to_policy(&self, row: PolicyRow) -> Result<Policy> {
        let owner = match row.owner_kind.as_str() {
            "user" => PolicyOwner::User(row.owner_ref),
            "anonymous_session" => PolicyOwner::AnonymousSession(row.owner_ref),
            other => return Err(CoreError::invalid_record(format!("unknown owner kind {other}"))),
        };
        let coverage_type = match row.coverage_type.as_str() {
            "FLIGHT_DELAY" => CoverageType::FlightDelay,
            "FLIGHT_CANCELLATION" => CoverageType::FlightCancellation,
            "WEATHER_DISRUPTION" => CoverageType::WeatherDisruption,
            other => return Err(CoreError::invalid_record(format!("unknown coverage type {other}"))),
        };
        let status = match row.status.as_str() {
            "PENDING" => PolicyStatus::Pending,
            "ACTIVE" => PolicyStatus::Active,
            "CLAIMED" => PolicyStatus::Claimed,
            "EXPIRED" => PolicyStatus::Expired,
            "CANCELLED" => PolicyStatus::Cancelled,
            other => return Err(CoreError::invalid_record(format!("unknown policy status {other}"))),
        };
        Ok(Policy {
            policy_id: Uuid::from_str(&row.policy_id)
                .map_err(|e| CoreError::invalid_record(e.to_string()))?,
            policy_number: row.policy_number,
            owner,
            coverage_type,
            coverage_amount: parse_decimal(&row.coverage_amount)?,
            premium: parse_decimal(&row.premium)?,
            payout_amount: parse_decimal(&row.payout_amount)?,
            status,
            expires_at: parse_datetime(&row.expires_at),
            flight_id: row.flight_id,
            terms: PolicyTerms {
                delay_threshold_minutes: row.delay_threshold_minutes.map(|m| m as u32),
            },
            created_at: parse_datetime(&row.created_at),
            updated_at: parse_datetime(&row.updated_at),
        })
    }
}

#[async_trait::async_trait]
impl PolicyRepository for SqlitePolicyRepository {
    async fn get(&self, policy_id: Uuid) -> Result<Option<Policy>> {
        let row: Option<PolicyRow> = sqlx::query_as("SELECT * FROM policies WHERE policy_id = ?")
            .bind(policy_id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| self.row_to_policy(r)).transpose()
    }

    async fn upsert(&self, policy: &Policy) -> Result<()> {
        info!("upserting policy {}", policy.policy_id);
        let (owner_kind, owner_ref) = match &policy.owner {
            PolicyOwner::User(id) => ("user", id.as_str()),
            PolicyOwner::AnonymousSession(id) => ("anonymous_session", id.as_str()),
        };
        let coverage_type = match policy.coverage_type {
            CoverageType::FlightDelay => "FLIGHT_DELAY",
            CoverageType::FlightCancellation => "FLIGHT_CANCELLATION",
            CoverageType::WeatherDisruption => "WEATHER_DISRUPTION",
        };
        let status = match policy.status {
            PolicyStatus::Pending => "PENDING",
            PolicyStatus::Active => "ACTIVE",
            PolicyStatus::Claimed => "CLAIMED",
            PolicyStatus::Expired => "EXPIRED",
            PolicyStatus::Cancelled => "CANCELLED",
        };
        sqlx::query(
            r#"
            INSERT INTO policies (
                policy_id, policy_number, owner_kind, owner_ref, coverage_type,
                coverage_amount, premium, payout_amount, status, expires_at,
                flight_id, delay_threshold_minutes, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(policy_id) DO UPDATE SET
                status = excluded.status,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(policy.policy_id.to_string())
        .bind(&policy.policy_number)
        .bind(owner_kind)
        .bind(owner_ref)
        .bind(coverage_type)
        .bind(policy.coverage_amount.to_string())
        .bind(policy.premium.to_string())
        .bind(policy.payout_amount.to_string())
        .bind(status)
        .bind(policy.expires_at.to_rfc3339())
        .bind(policy.terms.delay_threshold_minutes.map(|m| m as i64))
        .bind(policy.flight_id.clone())
        .bind(policy.created_at.to_rfc3339())
        .bind(policy.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_active_unexpired(&self, now: DateTime<Utc>, limit: usize) -> Result<Vec<Policy>> {
        let rows: Vec<PolicyRow> = sqlx::query_as(
            "SELECT * FROM policies WHERE status = 'ACTIVE' AND expires_at > ? ORDER BY expires_at ASC LIMIT ?",
        )
        .bind(now.to_rfc3339())
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(|r| self.row_to_policy(r)).collect()
    }
}

#[derive(Clone)]
pub struct SqliteEscrowRepository {
    pool: Pool<Sqlite>,
}

impl SqliteEscrowRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    fn row_to_escrow(&self, row: EscrowRow) -> Result<Escrow> {
        let chain = ChainProvider::parse_or_default(&row.chain, ChainProvider::Paygo);
        let status = match row.status.as_str() {
            "PENDING" => EscrowStatus::Pending,
            "ACTIVE" => EscrowStatus::Active,
            "FULFILLED" => EscrowStatus::Fulfilled,
            "RELEASED" => EscrowStatus::Released,
            "EXPIRED" => EscrowStatus::Expired,
            "CANCELLED" => EscrowStatus::Cancelled,
            other => return Err(CoreError::invalid_record(format!("unknown escrow status {other}"))),
        };
        Ok(Escrow {
            internal_id: row.internal_id,
            blockchain_id: row.blockchain_id,
            policy_id: row
                .policy_id
                .map(|id| Uuid::from_str(&id))
                .transpose()
                .map_err(|e: uuid::Error| CoreError::invalid_record(e.to_string()))?,
            user_id: row.user_id,
            chain,
            status,
            amount: parse_decimal(&row.amount)?,
            expires_at: parse_datetime(&row.expires_at),
            created_at: parse_datetime(&row.created_at),
            updated_at: parse_datetime(&row.updated_at),
        })
    }
}

#[async_trait::async_trait]
impl EscrowRepository for SqliteEscrowRepository {
    async fn get(&self, internal_id: &str) -> Result<Option<Escrow>> {
        let row: Option<EscrowRow> =
            sqlx::query_as("SELECT * FROM escrows WHERE internal_id = ?")
                .bind(internal_id)
                .fetch_optional(&self.pool)
                .await?;
        row.map(|r| self.row_to_escrow(r)).transpose()
    }

    async fn get_by_policy(&self, policy_id: Uuid) -> Result<Option<Escrow>> {
        let row: Option<EscrowRow> =
            sqlx::query_as("SELECT * FROM escrows WHERE policy_id = ?")
                .bind(policy_id.to_string())
                .fetch_optional(&self.pool)
                .await?;
        row.map(|r| self.row_to_escrow(r)).transpose()
    }

    async fn upsert(&self, escrow: &Escrow) -> Result<()> {
        info!("upserting escrow {}", escrow.internal_id);
        let chain = match escrow.chain {
            ChainProvider::Paygo => "PAYGO",
            ChainProvider::Ethereum => "ETHEREUM",
            ChainProvider::Base => "BASE",
            ChainProvider::Solana => "SOLANA",
        };
        let status = match escrow.status {
            EscrowStatus::Pending => "PENDING",
            EscrowStatus::Active => "ACTIVE",
            EscrowStatus::Fulfilled => "FULFILLED",
            EscrowStatus::Released => "RELEASED",
            EscrowStatus::Expired => "EXPIRED",
            EscrowStatus::Cancelled => "CANCELLED",
        };
        sqlx::query(
            r#"
            INSERT INTO escrows (
                internal_id, blockchain_id, policy_id, user_id, chain, status,
                amount, expires_at, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(internal_id) DO UPDATE SET
                status = excluded.status,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&escrow.internal_id)
        .bind(&escrow.blockchain_id)
        .bind(escrow.policy_id.map(|id| id.to_string()))
        .bind(escrow.user_id.clone())
        .bind(chain)
        .bind(status)
        .bind(escrow.amount.to_string())
        .bind(escrow.expires_at.to_rfc3339())
        .bind(escrow.created_at.to_rfc3339())
        .bind(escrow.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[derive(Clone)]
pub struct SqlitePayoutRepository {
    pool: Pool<Sqlite>,
}

impl SqlitePayoutRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    fn row_to_record(&self, row: PayoutRecordRow) -> Result<PayoutRecord> {
        let status = match row.status.as_str() {
            "PENDING" => PayoutStatus::Pending,
            "PROCESSING" => PayoutStatus::Processing,
            "COMPLETED" => PayoutStatus::Completed,
            "FAILED" => PayoutStatus::Failed,
            "CANCELLED" => PayoutStatus::Cancelled,
            other => return Err(CoreError::invalid_record(format!("unknown payout status {other}"))),
        };
        Ok(PayoutRecord {
            payout_id: Uuid::from_str(&row.payout_id)
                .map_err(|e| CoreError::invalid_record(e.to_string()))?,
            policy_id: Uuid::from_str(&row.policy_id)
                .map_err(|e| CoreError::invalid_record(e.to_string()))?,
            escrow_id: row.escrow_id,
            amount: parse_decimal(&row.amount)?,
            status,
            tx_hash: row.tx_hash,
            error_message: row.error_message,
            processed_at: row.processed_at.as_deref().map(parse_datetime),
            created_at: parse_datetime(&row.created_at),
            updated_at: parse_datetime(&row.updated_at),
        })
    }
}

#[async_trait::async_trait]
impl PayoutRepository for SqlitePayoutRepository {
    async fn get_by_policy(&self, policy_id: Uuid) -> Result<Option<PayoutRecord>> {
        let row: Option<PayoutRecordRow> =
            sqlx::query_as("SELECT * FROM payout_records WHERE policy_id = ?")
                .bind(policy_id.to_string())
                .fetch_optional(&self.pool)
                .await?;
        row.map(|r| self.row_to_record(r)).transpose()
    }

    /// Idempotent create: a second attempt to pay the same policy is a
    /// silent no-op rather than a duplicate row (spec invariant 1).
    async fn create(&self, record: &PayoutRecord) -> Result<()> {
        info!("recording payout for policy {}", record.policy_id);
        let status = match record.status {
            PayoutStatus::Pending => "PENDING",
            PayoutStatus::Processing => "PROCESSING",
            PayoutStatus::Completed => "COMPLETED",
            PayoutStatus::Failed => "FAILED",
            PayoutStatus::Cancelled => "CANCELLED",
        };
        sqlx::query(
            r#"
            INSERT INTO payout_records (
                payout_id, policy_id, escrow_id, amount, status, tx_hash,
                error_message, processed_at, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(policy_id) DO NOTHING
            "#,
        )
        .bind(record.payout_id.to_string())
        .bind(record.policy_id.to_string())
        .bind(&record.escrow_id)
        .bind(record.amount.to_string())
        .bind(status)
        .bind(record.tx_hash.clone())
        .bind(record.error_message.clone())
        .bind(record.processed_at.map(|t| t.to_rfc3339()))
        .bind(record.created_at.to_rfc3339())
        .bind(record.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[derive(Clone)]
pub struct SqliteUserWalletRepository {
    pool: Pool<Sqlite>,
}

impl SqliteUserWalletRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    fn row_to_wallet(&self, row: UserWalletRow) -> Result<UserWallet> {
        let chain = ChainProvider::parse_or_default(&row.chain, ChainProvider::Paygo);
        let wallet_type = match row.wallet_type.as_str() {
            "custodial" => WalletType::Custodial,
            "self_custody" => WalletType::SelfCustody,
            other => return Err(CoreError::invalid_record(format!("unknown wallet type {other}"))),
        };
        Ok(UserWallet {
            id: Uuid::from_str(&row.id).map_err(|e| CoreError::invalid_record(e.to_string()))?,
            user_id: row.user_id,
            address: row.address,
            chain,
            wallet_type,
            encrypted_secret: row.encrypted_secret,
            kms_key_id: row.kms_key_id,
            is_primary: row.is_primary,
            created_at: parse_datetime(&row.created_at),
            updated_at: parse_datetime(&row.updated_at),
        })
    }
}

#[async_trait::async_trait]
impl UserWalletRepository for SqliteUserWalletRepository {
    async fn get_primary(&self, user_id: &str, chain: ChainProvider) -> Result<Option<UserWallet>> {
        let chain_str = match chain {
            ChainProvider::Paygo => "PAYGO",
            ChainProvider::Ethereum => "ETHEREUM",
            ChainProvider::Base => "BASE",
            ChainProvider::Solana => "SOLANA",
        };
        let row: Option<UserWalletRow> = sqlx::query_as(
            "SELECT * FROM user_wallets WHERE user_id = ? AND chain = ? AND is_primary = TRUE LIMIT 1",
        )
        .bind(user_id)
        .bind(chain_str)
        .fetch_optional(&self.pool)
        .await?;
        row.map(|r| self.row_to_wallet(r)).transpose()
    }

    async fn upsert(&self, wallet: &UserWallet) -> Result<()> {
        info!("upserting wallet {} for user {}", wallet.id, wallet.user_id);
        let chain = match wallet.chain {
            ChainProvider::Paygo => "PAYGO",
            ChainProvider::Ethereum => "ETHEREUM",
            ChainProvider::Base => "BASE",
            ChainProvider::Solana => "SOLANA",
        };
        let wallet_type = match wallet.wallet_type {
            WalletType::Custodial => "custodial",
            WalletType::SelfCustody => "self_custody",
        };
        sqlx::query(
            r#"
            INSERT INTO user_wallets (
                id, user_id, address, chain, wallet_type, encrypted_secret,
                kms_key_id, is_primary, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                address = excluded.address,
                is_primary = excluded.is_primary,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(wallet.id.to_string())
        .bind(&wallet.user_id)
        .bind(&wallet.address)
        .bind(chain)
        .bind(wallet_type)
        .bind(wallet.encrypted_secret.clone())
        .bind(wallet.kms_key_id.clone())
        .bind(wallet.is_primary)
        .bind(wallet.created_at.to_rfc3339())
        .bind(wallet.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
