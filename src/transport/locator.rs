//! Peer link establishment with dial-then-listen fallback.
//!
//! Neither endpoint is a designated client or server. Each side may be given
//! the other's address, a local listening address, or both:
//!
//! 1. With a peer address, dial it once (no retry, no timeout). A successful
//!    dial is the link.
//! 2. If the dial fails and a listening address is configured, bind it and
//!    accept exactly one inbound connection. Without a listening address the
//!    dial failure is returned as [`LocateError::Dial`].
//! 3. Without a peer address, go straight to step 2.
//!
//! Bind and accept failures are final: there is no further fallback.

use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tracing::{info, warn};

use crate::core::{LocateError, DEFAULT_LISTEN_HOST};

/// Where to find the peer.
///
/// Built with the chained setters; an empty target is rejected by
/// [`PeerLocator::establish`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetSpec {
    peer_addr: Option<String>,
    listen_addr: Option<SocketAddr>,
}

impl TargetSpec {
    /// Create an empty target.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the peer address to dial (`host:port`, resolved at dial time).
    pub fn peer_addr(mut self, addr: impl Into<String>) -> Self {
        self.peer_addr = Some(addr.into());
        self
    }

    /// Set the local address to listen on.
    pub fn listen_addr(mut self, addr: SocketAddr) -> Self {
        self.listen_addr = Some(addr);
        self
    }

    /// Listen on `port` on every IPv4 interface.
    pub fn listen_port(self, port: u16) -> Self {
        self.listen_addr(SocketAddr::new(IpAddr::V4(Ipv4Addr::from(DEFAULT_LISTEN_HOST)), port))
    }

    /// Get the peer address, if any.
    pub fn dial_target(&self) -> Option<&str> {
        self.peer_addr.as_deref()
    }

    /// Get the listening address, if any.
    pub fn listen_target(&self) -> Option<SocketAddr> {
        self.listen_addr
    }

    /// Check if at least one endpoint is configured.
    pub fn has_endpoint(&self) -> bool {
        self.peer_addr.is_some() || self.listen_addr.is_some()
    }
}

/// How the link came to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkOrigin {
    /// We dialed the peer.
    Dialed,
    /// The peer dialed us and we accepted.
    Accepted,
}

/// The single byte stream to the peer.
#[derive(Debug)]
pub struct PeerLink {
    stream: TcpStream,
    peer_addr: SocketAddr,
    origin: LinkOrigin,
}

impl PeerLink {
    /// Wrap an already connected stream.
    pub fn new(stream: TcpStream, peer_addr: SocketAddr, origin: LinkOrigin) -> Self {
        Self {
            stream,
            peer_addr,
            origin,
        }
    }

    /// Get the remote address.
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    /// Get the local address.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.stream.local_addr()
    }

    /// Get how the link was established.
    pub fn origin(&self) -> LinkOrigin {
        self.origin
    }

    /// Split into independently owned read and write halves.
    pub fn into_split(self) -> (OwnedReadHalf, OwnedWriteHalf) {
        self.stream.into_split()
    }

    /// Get the underlying stream.
    pub fn into_inner(self) -> TcpStream {
        self.stream
    }
}

/// Resolves a [`TargetSpec`] into a [`PeerLink`].
#[derive(Debug, Clone)]
pub struct PeerLocator {
    target: TargetSpec,
}

impl PeerLocator {
    /// Create a locator for the given target.
    pub fn new(target: TargetSpec) -> Self {
        Self { target }
    }

    /// Get the target.
    pub fn target(&self) -> &TargetSpec {
        &self.target
    }

    /// Establish the link, falling back from dialing to listening.
    pub async fn establish(&self) -> Result<PeerLink, LocateError> {
        if !self.target.has_endpoint() {
            return Err(LocateError::NoEndpoint);
        }

        if let Some(peer) = self.target.dial_target() {
            match Self::dial(peer).await {
                Ok(link) => return Ok(link),
                Err(source) => {
                    warn!(%peer, error = %source, "dial failed, no listener found on the other end");
                    if self.target.listen_target().is_none() {
                        return Err(LocateError::Dial {
                            addr: peer.to_string(),
                            source,
                        });
                    }
                    info!("switching to listening mode");
                }
            }
        }

        let addr = self.target.listen_target().ok_or(LocateError::NoEndpoint)?;
        Self::listen(addr).await
    }

    /// Dial the peer once.
    pub async fn dial(peer: &str) -> io::Result<PeerLink> {
        info!(%peer, "dialing");
        let stream = TcpStream::connect(peer).await?;
        let peer_addr = stream.peer_addr()?;
        info!(%peer_addr, "connected to peer");
        Ok(PeerLink::new(stream, peer_addr, LinkOrigin::Dialed))
    }

    /// Bind `addr`, accept exactly one connection, then stop listening.
    pub async fn listen(addr: SocketAddr) -> Result<PeerLink, LocateError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| LocateError::Bind { addr, source })?;
        let bound = listener.local_addr().unwrap_or(addr);
        info!(addr = %bound, "listening for incoming connection");

        let (stream, peer_addr) = listener
            .accept()
            .await
            .map_err(|source| LocateError::Accept { addr: bound, source })?;
        info!(%peer_addr, "accepted peer connection");

        Ok(PeerLink::new(stream, peer_addr, LinkOrigin::Accepted))
    }
}

/// Establish a link for `target`.
///
/// Shorthand for `PeerLocator::new(target.clone()).establish()`.
pub async fn establish(target: &TargetSpec) -> Result<PeerLink, LocateError> {
    PeerLocator::new(target.clone()).establish().await
}
