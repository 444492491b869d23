//! The one session between this process and its peer.

use std::net::SocketAddr;

use tracing::info;

use super::config::SessionConfig;
use super::encrypted::EncryptedTransport;
use crate::core::{LomyError, MessageTransport, TransportError};
use crate::transport::{DuplexTransport, PeerLink, PeerLocator};

/// A live session, plain or encrypted.
///
/// Owned by the front end; there is no registry of sessions.
#[derive(Debug)]
pub enum Session {
    /// Messages travel as plaintext frames.
    Plain(DuplexTransport),
    /// Messages travel as base64 ciphertext frames.
    Encrypted(EncryptedTransport),
}

impl Session {
    /// Establish the peer link and start the transport.
    pub async fn open(config: &SessionConfig) -> Result<Self, LomyError> {
        let link = PeerLocator::new(config.target.clone()).establish().await?;
        Ok(Self::over_link(link, config))
    }

    /// Start the transport over an established link.
    pub fn over_link(link: PeerLink, config: &SessionConfig) -> Self {
        info!(
            peer = %link.peer_addr(),
            origin = ?link.origin(),
            encrypted = config.is_encrypted(),
            "session established"
        );
        let transport = DuplexTransport::from_link(link, config.duplex);
        match config.secret.as_deref() {
            Some(secret) => Session::Encrypted(EncryptedTransport::new(transport, secret)),
            None => Session::Plain(transport),
        }
    }

    /// Check if messages are encrypted.
    pub fn is_encrypted(&self) -> bool {
        matches!(self, Session::Encrypted(_))
    }

    /// Get the remote address.
    pub fn peer_addr(&self) -> Option<SocketAddr> {
        match self {
            Session::Plain(transport) => transport.peer_addr(),
            Session::Encrypted(transport) => transport.inner().peer_addr(),
        }
    }

    /// Queue a message for the peer.
    pub async fn send(&mut self, message: &str) -> Result<(), TransportError> {
        match self {
            Session::Plain(transport) => transport.send(message).await,
            Session::Encrypted(transport) => transport.send(message).await,
        }
    }

    /// Wait for the next message from the peer.
    pub async fn receive(&mut self) -> Result<String, TransportError> {
        match self {
            Session::Plain(transport) => transport.receive().await,
            Session::Encrypted(transport) => transport.receive().await,
        }
    }

    /// Flush queued messages and release the link.
    pub async fn close(self) -> Result<(), TransportError> {
        match self {
            Session::Plain(transport) => transport.close().await,
            Session::Encrypted(transport) => transport.close().await,
        }
    }
}

impl MessageTransport for Session {
    async fn send(&mut self, message: &str) -> Result<(), TransportError> {
        Session::send(self, message).await
    }

    async fn receive(&mut self) -> Result<String, TransportError> {
        Session::receive(self).await
    }

    async fn close(self) -> Result<(), TransportError> {
        Session::close(self).await
    }
}
