//! # lomy
//!
//! **Lo**w-ceremony **m**essaging between **y**ou and one peer.
//!
//! lomy links two processes over a single TCP connection and lets them
//! exchange newline-delimited text messages in both directions at once. It
//! provides:
//!
//! - **Rendezvous**: dial the peer, fall back to listening if nobody answers
//! - **Full duplex**: bounded send and receive queues drained by background tasks
//! - **Ordering**: messages arrive in the order they were sent, per direction
//! - **Optional encryption**: a shared secret turns on an AES-256 stream cipher
//!
//! ## Feature Flags
//!
//! - `transport` (default): Link establishment, framing, duplex queues
//! - `crypto` (default): Key derivation and the stream cipher
//! - `session` (default): [`Session`], which combines the two
//!
//! ## Modules
//!
//! - [`core`]: Core trait, constants, and error types (always included)
//! - [`transport`]: Transport layer (requires `transport` feature)
//! - [`crypto`]: Security layer (requires `crypto` feature)
//! - [`session`]: Session layer (requires `session` feature)
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use lomy::prelude::*;
//!
//! # async fn run() -> Result<(), LomyError> {
//! let config = SessionConfig::builder()
//!     .peer_addr("A-host:9000")
//!     .listen_port(9000)
//!     .secret("shh")
//!     .build()?;
//!
//! let mut session = Session::open(&config).await?;
//! session.send("hello").await?;
//! let reply = session.receive().await?;
//! println!("Them: {reply}");
//! session.close().await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

// Core module (always included)
pub mod core;

// Transport layer (feature-gated)
#[cfg(feature = "transport")]
#[cfg_attr(docsrs, doc(cfg(feature = "transport")))]
pub mod transport;

// Crypto layer (feature-gated)
#[cfg(feature = "crypto")]
#[cfg_attr(docsrs, doc(cfg(feature = "crypto")))]
pub mod crypto;

// Session layer (feature-gated)
#[cfg(feature = "session")]
#[cfg_attr(docsrs, doc(cfg(feature = "session")))]
pub mod session;

/// Prelude module for convenient imports.
pub mod prelude {
    // Core trait, constants and errors
    pub use crate::core::*;

    #[cfg(feature = "transport")]
    pub use crate::transport::{
        DuplexConfig, DuplexTransport, FrameCodec, LinkOrigin, PeerLink, PeerLocator, TargetSpec,
    };

    #[cfg(feature = "crypto")]
    pub use crate::crypto::*;

    #[cfg(feature = "session")]
    pub use crate::session::*;
}

// Re-export commonly used items at crate root
pub use crate::core::{LomyError, MessageTransport, TransportError};

#[cfg(feature = "transport")]
pub use crate::transport::{DuplexTransport, PeerLocator, TargetSpec};

#[cfg(feature = "crypto")]
pub use crate::crypto::EncryptionSession;

#[cfg(feature = "session")]
pub use crate::session::{Session, SessionConfig};
