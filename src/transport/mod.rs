//! lomy - Transport Layer
//!
//! This module turns a single TCP link to one peer into a message channel:
//!
//! - **Link establishment**: [`PeerLocator`] with dial-then-listen fallback
//! - **Framing**: [`FrameCodec`], one `\n`-terminated UTF-8 payload per frame
//! - **Queued duplex transport**: [`DuplexTransport`] with bounded send and
//!   receive queues serviced by a reader task and a writer task
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │            Front end (UI)               │
//! ├─────────────────────────────────────────┤
//! │    Session (plain | encrypted)          │
//! ├─────────────────────────────────────────┤
//! │         Transport Layer                 │  ← This module
//! │   locator, framing, duplex queues       │
//! ├─────────────────────────────────────────┤
//! │              TCP                        │
//! └─────────────────────────────────────────┘
//! ```

mod codec;
mod duplex;
mod locator;

pub use codec::FrameCodec;
pub use duplex::{DuplexConfig, DuplexTransport};
pub use locator::{establish, LinkOrigin, PeerLink, PeerLocator, TargetSpec};

#[cfg(test)]
pub(crate) use locator::test_util;
