//! C9 Escrow Abstraction and the C4.11 Escrow Identifier Scheme.

pub mod contract;
pub mod identifier;
pub mod paygo;

pub use contract::{
    AccountInfo, BlockchainServiceRegistry, ChainReceipt, CreateEscrowParams, EscrowHandle,
    EscrowService, TransactionStatus, WalletHandle,
};
pub use identifier::{
    derive_blockchain_id, generate_policy_escrow_id, generate_user_escrow_id,
    parse_policy_escrow_id, parse_user_escrow_id, ParsedPolicyEscrowId, ParsedUserEscrowId,
};
pub use paygo::PaygoEscrowService;
