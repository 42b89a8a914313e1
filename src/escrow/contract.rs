//! C9 Escrow Abstraction: a blockchain-agnostic capability interface
//! consumed only by the Payout Engine (spec §4.10).

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::{ChainProvider, Result};

#[derive(Debug, Clone)]
pub struct WalletHandle {
    pub address: String,
}

#[derive(Debug, Clone)]
pub struct AccountInfo {
    pub address: String,
    pub balance: Decimal,
}

#[derive(Debug, Clone)]
pub struct CreateEscrowParams {
    pub amount: Decimal,
    pub expires_at: DateTime<Utc>,
    pub policy_id: Option<Uuid>,
    pub user_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct EscrowHandle {
    pub blockchain_id: String,
}

/// A chain receipt for a state-changing call (fulfill/release). Spec
/// scenario S6 expects exactly `{hash: "0xabc", status: "success"}` from the
/// mock chain adapter.
#[derive(Debug, Clone)]
pub struct ChainReceipt {
    pub hash: String,
    pub status: String,
}

/// The escrow status getter returns a placeholder value because upstream
/// chain adapters do not yet expose a real status query (spec §9 open
/// questions). The Payout Engine must not rely on this for eligibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionStatus {
    Unknown,
    Pending,
    Confirmed,
    Failed,
}

#[async_trait]
pub trait EscrowService: Send + Sync {
    fn chain(&self) -> ChainProvider;

    async fn generate_new_wallet(&self) -> Result<WalletHandle>;
    async fn get_account_info(&self, address: &str) -> Result<AccountInfo>;
    async fn create_escrow(&self, params: CreateEscrowParams, signer: &str) -> Result<EscrowHandle>;
    async fn fulfill_escrow(&self, blockchain_id: &str, signer: &str) -> Result<ChainReceipt>;
    async fn release_escrow(&self, blockchain_id: &str, signer: &str) -> Result<ChainReceipt>;

    /// Unspecified pending a real adapter capability (spec §9); callers
    /// should treat the result as advisory only.
    async fn get_transaction_status(&self, tx_hash: &str) -> Result<TransactionStatus>;
}

/// Per-chain registry, the concrete realization of spec §9's
/// "`BlockchainServiceRegistry`" design note: global singletons become an
/// explicit registry passed through constructors.
pub struct BlockchainServiceRegistry {
    services: HashMap<ChainProvider, Arc<dyn EscrowService>>,
    primary: ChainProvider,
}

impl BlockchainServiceRegistry {
    pub fn new(primary: ChainProvider) -> Self {
        Self {
            services: HashMap::new(),
            primary,
        }
    }

    pub fn register(&mut self, service: Arc<dyn EscrowService>) {
        self.services.insert(service.chain(), service);
    }

    /// Select by provider tag (spec §6), falling back to the primary chain
    /// when the tag is unregistered.
    pub fn get(&self, chain: ChainProvider) -> Option<Arc<dyn EscrowService>> {
        self.services
            .get(&chain)
            .or_else(|| self.services.get(&self.primary))
            .cloned()
    }

    pub fn primary(&self) -> ChainProvider {
        self.primary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::escrow::paygo::PaygoEscrowService;

    #[test]
    fn registry_falls_back_to_primary_for_unregistered_chain() {
        let mut registry = BlockchainServiceRegistry::new(ChainProvider::Paygo);
        registry.register(Arc::new(PaygoEscrowService::new()));

        let service = registry.get(ChainProvider::Ethereum).unwrap();
        assert_eq!(service.chain(), ChainProvider::Paygo);
    }
}
