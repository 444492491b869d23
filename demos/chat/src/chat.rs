//! The chat loop: stdin lines go out, peer messages are printed.

use anyhow::{bail, Result};
use lomy::{Session, TransportError};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

/// Why the chat loop stopped without an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    /// Standard input reached end of file.
    InputClosed,
    /// The user pressed Ctrl-C.
    Interrupted,
}

/// Run the chat until input ends, the user interrupts, or the link fails.
///
/// The session is closed on every exit path that leaves it usable. Closing
/// gives up after the configured close timeout, so a stalled peer cannot
/// keep the process alive.
pub async fn run(mut session: Session) -> Result<Exit> {
    let mut input = BufReader::new(tokio::io::stdin()).lines();
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    println!(" ... Welcome to the chat ...");
    println!();

    let exit = loop {
        tokio::select! {
            _ = &mut ctrl_c => break Exit::Interrupted,

            line = input.next_line() => match line? {
                Some(line) => match session.send(&line).await {
                    Ok(()) => {}
                    Err(err) if !err.is_fatal() => warn!(%err, "message not sent"),
                    Err(err) => bail!(diagnose(err)),
                },
                None => break Exit::InputClosed,
            },

            received = session.receive() => match received {
                Ok(message) => println!("Them: {message}"),
                Err(err) if !err.is_fatal() => warn!(%err, "dropped unreadable message"),
                Err(err) => bail!(diagnose(err)),
            },
        }
    };

    info!(?exit, "closing session");
    if let Err(err) = session.close().await {
        warn!(%err, "session did not close cleanly");
    }
    Ok(exit)
}

/// Explain a fatal transport error to the user.
fn diagnose(err: TransportError) -> String {
    match err {
        TransportError::SecretMismatch => {
            "could not read the peer's message, secret likely mismatched".to_string()
        }
        TransportError::PeerClosed => "peer closed the connection".to_string(),
        other => format!("connection failed: {other}"),
    }
}
