//! Encrypted message transport.
//!
//! Wraps a [`DuplexTransport`] so that every message crosses the wire as the
//! base64 ciphertext of `message || '\n'`. The trailing marker is how the
//! receiving side notices that the secrets differ: a mismatched keystream
//! turns it into a random byte.

use tracing::warn;

use crate::core::{
    FrameError, MessageTransport, TransportError, FRAME_DELIMITER, PLAINTEXT_MARKER,
};
use crate::crypto::EncryptionSession;
use crate::transport::DuplexTransport;

/// Message transport with transparent encryption.
#[derive(Debug)]
pub struct EncryptedTransport {
    inner: DuplexTransport,
    cipher: EncryptionSession,
}

impl EncryptedTransport {
    /// Encrypt `inner` with keys derived from `secret`.
    pub fn new(inner: DuplexTransport, secret: &str) -> Self {
        Self::with_session(inner, EncryptionSession::new(secret))
    }

    /// Encrypt `inner` with an existing cipher session.
    pub fn with_session(inner: DuplexTransport, cipher: EncryptionSession) -> Self {
        Self { inner, cipher }
    }

    /// Get the cipher session.
    pub fn cipher(&self) -> &EncryptionSession {
        &self.cipher
    }

    /// Get the underlying plain transport.
    pub fn inner(&self) -> &DuplexTransport {
        &self.inner
    }

    /// Encrypt and queue a message for the peer.
    ///
    /// The message is validated before the keystream moves, so a rejected
    /// message leaves the session usable.
    pub async fn send(&mut self, message: &str) -> Result<(), TransportError> {
        if message.as_bytes().contains(&FRAME_DELIMITER) {
            return Err(TransportError::Rejected(FrameError::DelimiterInPayload));
        }

        let mut sealed = Vec::with_capacity(message.len() + 1);
        sealed.extend_from_slice(message.as_bytes());
        sealed.push(PLAINTEXT_MARKER);

        let encoded = base64_len(sealed.len());
        let max = self.inner.max_frame_length();
        if encoded > max {
            return Err(TransportError::Rejected(FrameError::TooLong {
                length: encoded,
                max,
            }));
        }

        let cipher = &mut self.cipher;
        self.inner.send_with(|| cipher.encrypt(&sealed)).await
    }

    /// Wait for the next message and decrypt it.
    ///
    /// Malformed base64 is reported as [`TransportError::Decode`] and leaves
    /// the keystream where it was. A missing marker or non-UTF-8 plaintext is
    /// reported as [`TransportError::SecretMismatch`].
    pub async fn receive(&mut self) -> Result<String, TransportError> {
        let ciphertext = self.inner.receive().await?;
        let mut plaintext = self.cipher.decrypt(&ciphertext)?;

        if plaintext.pop() != Some(PLAINTEXT_MARKER) {
            warn!("decrypted message lacks its end marker, secret likely mismatched");
            return Err(TransportError::SecretMismatch);
        }
        String::from_utf8(plaintext).map_err(|_| {
            warn!("decrypted message is not UTF-8, secret likely mismatched");
            TransportError::SecretMismatch
        })
    }

    /// Close the underlying transport.
    pub async fn close(self) -> Result<(), TransportError> {
        self.inner.close().await
    }
}

impl MessageTransport for EncryptedTransport {
    async fn send(&mut self, message: &str) -> Result<(), TransportError> {
        EncryptedTransport::send(self, message).await
    }

    async fn receive(&mut self) -> Result<String, TransportError> {
        EncryptedTransport::receive(self).await
    }

    async fn close(self) -> Result<(), TransportError> {
        EncryptedTransport::close(self).await
    }
}

/// Length of the padded base64 encoding of `len` bytes.
fn base64_len(len: usize) -> usize {
    len.div_ceil(3) * 4
}
