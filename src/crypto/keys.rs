//! Shared-secret key derivation
//!
//! Both values are pure functions of the secret, so both endpoints derive
//! the same material without exchanging anything:
//!
//! - key = SHA-256(secret)
//! - iv  = SHA-256(secret || "for initialisation vector")[..16]

use sha2::{Digest, Sha256};
use zeroize::Zeroize;

use crate::core::{IV_DERIVATION_SUFFIX, IV_SIZE, KEY_SIZE};

/// AES-256 key and initial counter block derived from a shared secret.
///
/// Zeroized on drop for security.
#[derive(Clone)]
pub struct SessionKeys {
    key: [u8; KEY_SIZE],
    iv: [u8; IV_SIZE],
}

impl SessionKeys {
    /// Derive the key material for `secret`.
    pub fn derive(secret: &str) -> Self {
        let key: [u8; KEY_SIZE] = Sha256::digest(secret.as_bytes()).into();

        let mut hasher = Sha256::new();
        hasher.update(secret.as_bytes());
        hasher.update(IV_DERIVATION_SUFFIX.as_bytes());
        let mut digest: [u8; KEY_SIZE] = hasher.finalize().into();

        let mut iv = [0u8; IV_SIZE];
        iv.copy_from_slice(&digest[..IV_SIZE]);
        digest.zeroize();

        Self { key, iv }
    }

    /// Get the cipher key.
    ///
    /// # Security
    /// Handle with care - this exposes sensitive key material.
    pub fn key(&self) -> &[u8; KEY_SIZE] {
        &self.key
    }

    /// Get the initial counter block.
    pub fn iv(&self) -> &[u8; IV_SIZE] {
        &self.iv
    }
}

impl Drop for SessionKeys {
    fn drop(&mut self) {
        self.key.zeroize();
        self.iv.zeroize();
    }
}

impl std::fmt::Debug for SessionKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionKeys")
            .field("key", &"[REDACTED]")
            .field("iv", &"[REDACTED]")
            .finish()
    }
}
