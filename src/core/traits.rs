//! Core traits for lomy.
//!
//! These traits define the interface handed to the interactive front end.

use std::future::Future;

use super::error::TransportError;

/// A bidirectional message channel to exactly one peer.
///
/// Implemented by the plain duplex transport and by the encrypted wrapper,
/// so the front end never sees framing, queue depths or cipher state.
///
/// # Requirements
///
/// - Messages MUST NOT contain the frame delimiter; `send` rejects them.
/// - `receive` yields messages in the order the peer sent them.
/// - Any error for which [`TransportError::is_fatal`] holds ends the session.
///
/// # Example
///
/// ```ignore
/// async fn echo<T: MessageTransport>(mut transport: T) -> Result<(), TransportError> {
///     loop {
///         let message = transport.receive().await?;
///         transport.send(&message).await?;
///     }
/// }
/// ```
pub trait MessageTransport: Send {
    /// Queue a message for the peer.
    ///
    /// Waits only while the send queue is full.
    fn send(&mut self, message: &str) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Wait for the next message from the peer.
    ///
    /// Cancel-safe: dropping the future before it completes loses nothing.
    fn receive(&mut self) -> impl Future<Output = Result<String, TransportError>> + Send;

    /// Flush queued messages, release the link and stop background tasks.
    fn close(self) -> impl Future<Output = Result<(), TransportError>> + Send
    where
        Self: Sized;
}
