//! Wallet secret encryption (spec §9 Design Notes: AES-256-GCM, key derived
//! from a configured secret via SHA-256, self-describing ciphertext).

pub mod wallet_encryption;

pub use wallet_encryption::WalletCipher;
