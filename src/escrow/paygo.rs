//! A deterministic in-memory `EscrowService` used when `useRealProviders =
//! false` and by tests exercising the Payout Engine (spec scenario S6: a
//! mock chain adapter returning `{hash: "0xabc", status: "success"}`).

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::domain::{ChainProvider, Result};

use super::contract::{
    AccountInfo, ChainReceipt, CreateEscrowParams, EscrowHandle, EscrowService, TransactionStatus,
    WalletHandle,
};

pub struct PaygoEscrowService {
    sequence: AtomicU64,
    fail_next_release: Mutex<bool>,
}

impl Default for PaygoEscrowService {
    fn default() -> Self {
        Self::new()
    }
}

impl PaygoEscrowService {
    pub fn new() -> Self {
        Self {
            sequence: AtomicU64::new(0),
            fail_next_release: Mutex::new(false),
        }
    }

    /// Test hook: make the next `release_escrow` call fail, to exercise the
    /// Payout Engine's chain-adapter failure path.
    pub fn fail_next_release(&self) {
        *self.fail_next_release.lock().unwrap() = true;
    }
}

#[async_trait]
impl EscrowService for PaygoEscrowService {
    fn chain(&self) -> ChainProvider {
        ChainProvider::Paygo
    }

    async fn generate_new_wallet(&self) -> Result<WalletHandle> {
        let n = self.sequence.fetch_add(1, Ordering::SeqCst);
        Ok(WalletHandle {
            address: format!("paygo:wallet:{n:08x}"),
        })
    }

    async fn get_account_info(&self, address: &str) -> Result<AccountInfo> {
        Ok(AccountInfo {
            address: address.to_string(),
            balance: Decimal::ZERO,
        })
    }

    async fn create_escrow(&self, _params: CreateEscrowParams, _signer: &str) -> Result<EscrowHandle> {
        let n = self.sequence.fetch_add(1, Ordering::SeqCst);
        Ok(EscrowHandle {
            blockchain_id: format!("0x{n:064x}"),
        })
    }

    async fn fulfill_escrow(&self, _blockchain_id: &str, _signer: &str) -> Result<ChainReceipt> {
        Ok(ChainReceipt {
            hash: "0xabc".to_string(),
            status: "success".to_string(),
        })
    }

    async fn release_escrow(&self, _blockchain_id: &str, _signer: &str) -> Result<ChainReceipt> {
        let mut fail = self.fail_next_release.lock().unwrap();
        if *fail {
            *fail = false;
            return Err(crate::domain::CoreError::chain_adapter("paygo release rejected"));
        }
        Ok(ChainReceipt {
            hash: "0xabc".to_string(),
            status: "success".to_string(),
        })
    }

    async fn get_transaction_status(&self, _tx_hash: &str) -> Result<TransactionStatus> {
        Ok(TransactionStatus::Unknown)
    }
}
