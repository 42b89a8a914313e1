//! Persistent state layer: connection pooling and the four repositories
//! backing `Policy`, `Escrow`, `PayoutRecord`, and `UserWallet` (spec §6).

pub mod database;
pub mod models;
pub mod repository;

pub use database::{DatabaseConfig, DatabasePool, DatabaseType, PoolStats, SqlitePool};
#[cfg(feature = "postgres")]
pub use database::PostgresPool;

pub use repository::{
    EscrowRepository, PayoutRepository, PolicyRepository, SqliteEscrowRepository,
    SqlitePayoutRepository, SqlitePolicyRepository, SqliteUserWalletRepository,
    UserWalletRepository,
};
