//! lomy - Security Layer
//!
//! Implements the shared-secret stream cipher:
//! - SHA-256 key and IV derivation from the secret
//! - AES-256-CTR keystreams, one per direction, never reset
//! - Standard base64 encoding so ciphertext survives delimiter framing
//!
//! # Security
//!
//! The key and IV depend on the secret alone, so every session with the same
//! secret, and both directions of one session, run the same keystream.
//! Messages are not authenticated. This layer keeps casual observers out; it
//! does not resist an active attacker.

mod keys;
mod session;

pub use keys::SessionKeys;
pub use session::EncryptionSession;
