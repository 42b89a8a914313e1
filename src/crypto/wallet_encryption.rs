//! AES-256-GCM encryption for custodial wallet secrets. The key is derived
//! by SHA-256 of a configured secret (spec §9); the ciphertext blob is
//! self-describing: a 12-byte nonce followed by the AES-GCM output (which
//! already carries the 16-byte auth tag), so decryption needs nothing beyond
//! the blob and the key.

use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{AeadCore, Aes256Gcm, Key, Nonce};
use sha2::{Digest, Sha256};

use crate::domain::{CoreError, Result};

const NONCE_LEN: usize = 12;

/// Symmetric cipher for `UserWallet::encrypted_secret` blobs, keyed by a
/// single configured secret shared across wallets.
pub struct WalletCipher {
    cipher: Aes256Gcm,
}

impl WalletCipher {
    pub fn new(secret: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(secret.as_bytes());
        let key_bytes = hasher.finalize();
        let key = Key::<Aes256Gcm>::from_slice(&key_bytes);
        Self {
            cipher: Aes256Gcm::new(key),
        }
    }

    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, plaintext)
            .map_err(|_| CoreError::persistence("wallet secret encryption failed"))?;
        let mut blob = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        blob.extend_from_slice(&nonce);
        blob.extend_from_slice(&ciphertext);
        Ok(blob)
    }

    pub fn decrypt(&self, blob: &[u8]) -> Result<Vec<u8>> {
        if blob.len() < NONCE_LEN {
            return Err(CoreError::persistence("wallet secret blob too short"));
        }
        let (nonce_bytes, ciphertext) = blob.split_at(NONCE_LEN);
        let nonce = Nonce::from_slice(nonce_bytes);
        self.cipher
            .decrypt(nonce, ciphertext)
            .map_err(|_| CoreError::persistence("wallet secret decryption failed: bad key or corrupt blob"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_encrypt_and_decrypt() {
        let cipher = WalletCipher::new("correct horse battery staple");
        let blob = cipher.encrypt(b"0xdeadbeefsecretkey").unwrap();
        let plaintext = cipher.decrypt(&blob).unwrap();
        assert_eq!(plaintext, b"0xdeadbeefsecretkey");
    }

    #[test]
    fn decryption_fails_with_wrong_key() {
        let a = WalletCipher::new("secret-a");
        let b = WalletCipher::new("secret-b");
        let blob = a.encrypt(b"payload").unwrap();
        assert!(b.decrypt(&blob).is_err());
    }

    #[test]
    fn ciphertext_is_self_describing_nonce_plus_tag() {
        let cipher = WalletCipher::new("secret");
        let blob = cipher.encrypt(b"x").unwrap();
        // 12-byte nonce + 1-byte plaintext + 16-byte GCM tag.
        assert_eq!(blob.len(), 12 + 1 + 16);
    }
}
