//! Error types for lomy.

use std::io;
use std::net::SocketAddr;

use thiserror::Error;

/// Errors that can occur when decoding a ciphertext frame.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Ciphertext is not valid base64.
    #[error("invalid encoding: {0}")]
    InvalidEncoding(String),
}

/// Errors raised by the delimiter codec.
#[derive(Debug, Error)]
pub enum FrameError {
    /// Underlying stream failed.
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    /// Frame payload exceeds the configured maximum.
    #[error("frame too long: {length} bytes (max {max})")]
    TooLong {
        /// Observed payload length.
        length: usize,
        /// Configured maximum.
        max: usize,
    },

    /// Frame payload is not UTF-8.
    #[error("frame payload is not valid UTF-8")]
    InvalidUtf8,

    /// Outbound payload contains the frame delimiter.
    #[error("payload contains the frame delimiter")]
    DelimiterInPayload,
}

/// Errors surfaced by a message transport.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Outbound message refused before it was queued; the session is intact.
    #[error("message rejected: {0}")]
    Rejected(#[source] FrameError),

    /// Reading or writing a frame failed on the link.
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),

    /// I/O error outside framing, such as a close that timed out.
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    /// Received ciphertext could not be decoded.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// The peer closed its end of the link.
    #[error("peer closed the link")]
    PeerClosed,

    /// The transport has shut down; no further messages will flow.
    #[error("transport closed")]
    Closed,

    /// Decrypted content is implausible; the shared secrets likely differ.
    #[error("decrypted message is implausible - secret likely mismatched")]
    SecretMismatch,

    /// A reader or writer task panicked or was aborted.
    #[error("transport task failed: {0}")]
    TaskFailed(String),
}

impl TransportError {
    /// Check if this error ends the session.
    ///
    /// Rejected messages and undecodable ciphertext are reported to the
    /// caller without tearing anything down; everything else means the link
    /// or the cipher state is gone for good.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, TransportError::Rejected(_) | TransportError::Decode(_))
    }
}

/// Errors while establishing the peer link.
#[derive(Debug, Error)]
pub enum LocateError {
    /// Neither a peer address nor a listening address was given.
    #[error("no peer address and no listening address configured")]
    NoEndpoint,

    /// Dialing failed and no listening fallback is configured.
    #[error("failed to dial {addr}: {source}")]
    Dial {
        /// Address that was dialed.
        addr: String,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// Binding the listening socket failed.
    #[error("failed to listen on {addr}: {source}")]
    Bind {
        /// Address that was bound.
        addr: SocketAddr,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// Accepting the inbound connection failed.
    #[error("failed to accept a connection on {addr}: {source}")]
    Accept {
        /// Address that was listening.
        addr: SocketAddr,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
}

/// Invalid session configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// At least one of peer address and listening address is required.
    #[error("at least one of peer address and listening address must be set")]
    MissingEndpoint,

    /// Peer address is empty.
    #[error("peer address is empty")]
    EmptyPeerAddress,

    /// Shared secret is present but empty.
    #[error("shared secret is empty")]
    EmptySecret,

    /// Queue capacity must be non-zero.
    #[error("queue capacity must be at least 1")]
    ZeroQueueCapacity,

    /// Maximum frame length must be non-zero.
    #[error("maximum frame length must be at least 1")]
    ZeroFrameLength,
}

/// Top-level lomy errors.
#[derive(Debug, Error)]
pub enum LomyError {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Link establishment error.
    #[error("setup error: {0}")]
    Locate(#[from] LocateError),

    /// Transport error.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}
