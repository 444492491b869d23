//! Wire and crypto constants.
//!
//! Both endpoints must agree on these values out-of-band; nothing here is
//! negotiated on the wire.

use std::time::Duration;

// =============================================================================
// FRAMING
// =============================================================================

/// Byte terminating every frame on the wire.
pub const FRAME_DELIMITER: u8 = b'\n';

/// Capacity of the send and receive queues of a duplex transport.
pub const DEFAULT_QUEUE_CAPACITY: usize = 4;

/// Largest accepted frame payload (delimiter excluded).
pub const DEFAULT_MAX_FRAME_LENGTH: usize = 64 * 1024;

/// How long `close()` waits for queued messages to reach the link.
pub const DEFAULT_CLOSE_TIMEOUT: Duration = Duration::from_secs(2);

// =============================================================================
// CRYPTO
// =============================================================================

/// AES-256 key size, equal to the SHA-256 output size.
pub const KEY_SIZE: usize = 32;

/// Initialization vector size (one AES block).
pub const IV_SIZE: usize = 16;

/// Suffix appended to the shared secret before hashing it into the IV.
pub const IV_DERIVATION_SUFFIX: &str = "for initialisation vector";

/// Marker sealed at the end of every encrypted plaintext.
///
/// Its absence after decryption is the heuristic signal that the two
/// endpoints hold different secrets.
pub const PLAINTEXT_MARKER: u8 = b'\n';

// =============================================================================
// SETUP
// =============================================================================

/// Address bound when only a listening port is configured.
pub const DEFAULT_LISTEN_HOST: [u8; 4] = [0, 0, 0, 0];

