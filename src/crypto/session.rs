//! Stateful stream-cipher session
//!
//! An [`EncryptionSession`] holds two AES-256-CTR keystreams built from the
//! same [`SessionKeys`]: one consumed by [`encrypt`](EncryptionSession::encrypt),
//! one by [`decrypt`](EncryptionSession::decrypt). Both only ever move
//! forward, by exactly the number of bytes processed.
//!
//! There is no authentication and no per-message resynchronization. The
//! peer's decrypt keystream stays aligned with our encrypt keystream only if
//! every ciphertext is decrypted once, in order. A lost, duplicated or
//! reordered message shifts the keystream for everything after it on that
//! direction and the session cannot recover.

use aes::Aes256;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use ctr::cipher::{KeyIvInit, StreamCipher};

use super::keys::SessionKeys;
use crate::core::DecodeError;

type Keystream = ctr::Ctr128BE<Aes256>;

/// Encrypt/decrypt codec keyed from a shared secret.
pub struct EncryptionSession {
    encryptor: Keystream,
    decryptor: Keystream,
    /// Keystream bytes consumed by `encrypt`.
    encrypted: u64,
    /// Keystream bytes consumed by `decrypt`.
    decrypted: u64,
}

impl EncryptionSession {
    /// Create a session for `secret`.
    pub fn new(secret: &str) -> Self {
        Self::from_keys(&SessionKeys::derive(secret))
    }

    /// Create a session from derived key material.
    pub fn from_keys(keys: &SessionKeys) -> Self {
        Self {
            encryptor: Keystream::new(keys.key().into(), keys.iv().into()),
            decryptor: Keystream::new(keys.key().into(), keys.iv().into()),
            encrypted: 0,
            decrypted: 0,
        }
    }

    /// Encrypt `plaintext` and encode the ciphertext as standard base64.
    pub fn encrypt(&mut self, plaintext: &[u8]) -> String {
        let mut buffer = plaintext.to_vec();
        self.encryptor.apply_keystream(&mut buffer);
        self.encrypted += buffer.len() as u64;
        STANDARD.encode(buffer)
    }

    /// Decode base64 `ciphertext` and decrypt it.
    ///
    /// Fails only on malformed base64, in which case the keystream does not
    /// move. Ciphertext from a different secret, or from the wrong keystream
    /// position, decrypts to garbage without error.
    pub fn decrypt(&mut self, ciphertext: &str) -> Result<Vec<u8>, DecodeError> {
        let mut buffer = STANDARD
            .decode(ciphertext)
            .map_err(|err| DecodeError::InvalidEncoding(err.to_string()))?;
        self.decryptor.apply_keystream(&mut buffer);
        self.decrypted += buffer.len() as u64;
        Ok(buffer)
    }

    /// Get the number of keystream bytes consumed by `encrypt`.
    pub fn encrypt_position(&self) -> u64 {
        self.encrypted
    }

    /// Get the number of keystream bytes consumed by `decrypt`.
    pub fn decrypt_position(&self) -> u64 {
        self.decrypted
    }
}

impl std::fmt::Debug for EncryptionSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptionSession")
            .field("encrypt_position", &self.encrypted)
            .field("decrypt_position", &self.decrypted)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_ciphertext() {
        let mut session = EncryptionSession::new("shh");

        assert_eq!(session.encrypt(b"hello"), "Kknrh5Y=");
        // The keystream continues where the previous message stopped.
        assert_eq!(session.encrypt(b"hi"), "zfA=");
    }

    #[test]
    fn test_keystream_is_continuous() {
        let mut split = EncryptionSession::new("shh");
        let mut whole = EncryptionSession::new("shh");

        let parts = [split.encrypt(b"hello"), split.encrypt(b"hi")];
        let joined: Vec<u8> = parts
            .iter()
            .flat_map(|part| STANDARD.decode(part).unwrap())
            .collect();

        assert_eq!(joined, STANDARD.decode(whole.encrypt(b"hellohi")).unwrap());
    }

    #[test]
    fn test_roundtrip_between_peers() {
        let mut alice = EncryptionSession::new("shh");
        let mut bob = EncryptionSession::new("shh");

        for message in ["hello", "", "how are you?", "ünïcødé ✓"] {
            let ciphertext = alice.encrypt(message.as_bytes());
            assert_eq!(bob.decrypt(&ciphertext).unwrap(), message.as_bytes());
        }

        // The other direction runs on its own keystream.
        let ciphertext = bob.encrypt(b"hi");
        assert_eq!(alice.decrypt(&ciphertext).unwrap(), b"hi");
    }

    #[test]
    fn test_positions_track_bytes() {
        let mut alice = EncryptionSession::new("shh");
        let mut bob = EncryptionSession::new("shh");

        let ciphertext = alice.encrypt(b"hello");
        assert_eq!(alice.encrypt_position(), 5);
        assert_eq!(alice.decrypt_position(), 0);

        bob.decrypt(&ciphertext).unwrap();
        assert_eq!(bob.decrypt_position(), 5);
        assert_eq!(bob.encrypt_position(), 0);
    }

    #[test]
    fn test_wrong_secret_yields_garbage() {
        let mut alice = EncryptionSession::new("shh");
        let mut mallory = EncryptionSession::new("not shh");

        let ciphertext = alice.encrypt(b"attack at dawn");
        let decrypted = mallory.decrypt(&ciphertext).unwrap();

        assert_eq!(decrypted.len(), b"attack at dawn".len());
        assert_ne!(decrypted, b"attack at dawn");
    }

    #[test]
    fn test_invalid_base64_is_decode_error() {
        let mut session = EncryptionSession::new("shh");

        let result = session.decrypt("not base64!");
        assert!(matches!(result, Err(DecodeError::InvalidEncoding(_))));
        assert_eq!(session.decrypt_position(), 0);
    }

    #[test]
    fn test_dropped_message_desynchronizes_direction() {
        let mut alice = EncryptionSession::new("shh");
        let mut bob = EncryptionSession::new("shh");

        let first = alice.encrypt(b"first");
        let _lost = alice.encrypt(b"lost in transit");
        let later: Vec<String> = ["second", "third", "fourth"]
            .iter()
            .map(|m| alice.encrypt(m.as_bytes()))
            .collect();

        assert_eq!(bob.decrypt(&first).unwrap(), b"first");
        for (ciphertext, expected) in later.iter().zip(["second", "third", "fourth"]) {
            assert_ne!(bob.decrypt(ciphertext).unwrap(), expected.as_bytes());
        }

        // Bob's other direction is untouched.
        let reply = bob.encrypt(b"still fine");
        assert_eq!(alice.decrypt(&reply).unwrap(), b"still fine");
    }

    #[test]
    fn test_duplicated_message_desynchronizes_direction() {
        let mut alice = EncryptionSession::new("shh");
        let mut bob = EncryptionSession::new("shh");

        let first = alice.encrypt(b"first");
        let second = alice.encrypt(b"second");

        assert_eq!(bob.decrypt(&first).unwrap(), b"first");
        assert_ne!(bob.decrypt(&first).unwrap(), b"first");
        assert_ne!(bob.decrypt(&second).unwrap(), b"second");
    }
}
