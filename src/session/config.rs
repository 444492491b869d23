//! Session configuration.
//!
//! Collects the setup parameters supplied by the entry point: the peer
//! address, the listening address and the optional shared secret.

use std::net::SocketAddr;
use std::time::Duration;

use crate::core::ConfigError;
use crate::transport::{DuplexConfig, TargetSpec};

/// Validated session parameters.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Where to find the peer.
    pub target: TargetSpec,
    /// Shared secret; `None` disables encryption.
    pub secret: Option<String>,
    /// Queue and frame limits.
    pub duplex: DuplexConfig,
}

impl SessionConfig {
    /// Start building a configuration.
    pub fn builder() -> SessionConfigBuilder {
        SessionConfigBuilder::new()
    }

    /// Check if messages will be encrypted.
    pub fn is_encrypted(&self) -> bool {
        self.secret.is_some()
    }
}

impl std::fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionConfig")
            .field("target", &self.target)
            .field("secret", &self.secret.as_ref().map(|_| "[REDACTED]"))
            .field("duplex", &self.duplex)
            .finish()
    }
}

/// Builder for [`SessionConfig`].
#[derive(Clone, Default)]
pub struct SessionConfigBuilder {
    peer_addr: Option<String>,
    listen_addr: Option<SocketAddr>,
    listen_port: Option<u16>,
    secret: Option<String>,
    duplex: DuplexConfig,
}

impl SessionConfigBuilder {
    /// Create a new builder with no endpoints and no secret.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the peer address to dial first.
    pub fn peer_addr(mut self, addr: impl Into<String>) -> Self {
        self.peer_addr = Some(addr.into());
        self
    }

    /// Listen on `port` on every interface if dialing is not possible.
    pub fn listen_port(mut self, port: u16) -> Self {
        self.listen_port = Some(port);
        self
    }

    /// Listen on `addr` if dialing is not possible.
    ///
    /// Takes precedence over [`listen_port`](Self::listen_port).
    pub fn listen_addr(mut self, addr: SocketAddr) -> Self {
        self.listen_addr = Some(addr);
        self
    }

    /// Enable encryption with a shared secret.
    pub fn secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = Some(secret.into());
        self
    }

    /// Set the capacity of the send and receive queues.
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.duplex.queue_capacity = capacity;
        self
    }

    /// Set the largest frame payload accepted in either direction.
    pub fn max_frame_length(mut self, length: usize) -> Self {
        self.duplex.max_frame_length = length;
        self
    }

    /// Set how long closing waits for queued messages to reach the peer.
    pub fn close_timeout(mut self, timeout: Duration) -> Self {
        self.duplex.close_timeout = timeout;
        self
    }

    /// Validate and build the configuration.
    pub fn build(self) -> Result<SessionConfig, ConfigError> {
        let mut target = TargetSpec::new();

        match self.peer_addr {
            Some(addr) if addr.trim().is_empty() => return Err(ConfigError::EmptyPeerAddress),
            Some(addr) => target = target.peer_addr(addr),
            None => {}
        }

        if let Some(addr) = self.listen_addr {
            target = target.listen_addr(addr);
        } else if let Some(port) = self.listen_port {
            target = target.listen_port(port);
        }

        if !target.has_endpoint() {
            return Err(ConfigError::MissingEndpoint);
        }
        if matches!(self.secret.as_deref(), Some("")) {
            return Err(ConfigError::EmptySecret);
        }
        self.duplex.validate()?;

        Ok(SessionConfig {
            target,
            secret: self.secret,
            duplex: self.duplex,
        })
    }
}

impl std::fmt::Debug for SessionConfigBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionConfigBuilder")
            .field("peer_addr", &self.peer_addr)
            .field("listen_addr", &self.listen_addr)
            .field("listen_port", &self.listen_port)
            .field("secret", &self.secret.as_ref().map(|_| "[REDACTED]"))
            .field("duplex", &self.duplex)
            .finish()
    }
}
