//! lomy - Session Layer
//!
//! Ties the pieces together for the front end:
//! - [`SessionConfig`]: validated setup parameters
//! - [`Session`]: establish the link, then run a plain or encrypted transport
//! - [`EncryptedTransport`]: encryption on top of [`DuplexTransport`](crate::transport::DuplexTransport)
//!
//! ```text
//! SessionConfig ──> PeerLocator ──> PeerLink ──> DuplexTransport ──┐
//!                                                                  ├──> Session
//!                       secret ──> EncryptionSession ──────────────┘
//! ```

mod config;
mod encrypted;
#[allow(clippy::module_inception)]
mod session;

pub use config::{SessionConfig, SessionConfigBuilder};
pub use encrypted::EncryptedTransport;
pub use session::Session;
