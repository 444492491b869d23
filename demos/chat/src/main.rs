//! lomy chat
//!
//! Line-oriented chat with one peer. Every line typed on stdin is sent;
//! every message from the peer is printed as `Them: <message>`.
//!
//! Environment variables:
//! - LOMY_PEER_ADDRESS: Peer's `host:port` to dial first
//! - LOMY_LISTENING_PORT: Port to listen on if dialing fails
//! - LOMY_SECRET: Shared secret enabling encryption
//! - RUST_LOG: Log filter (default `lomy=info,lomy_chat=info,warn`)

mod chat;
mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::prelude::*;

use cli::Args;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    setup_logging(args.debug);

    let config = args.session_config()?;
    info!(?config, "starting lomy chat");

    let session = lomy::Session::open(&config)
        .await
        .context("could not connect to peer")?;

    let exit = chat::run(session).await?;
    info!(?exit, "chat finished");
    Ok(())
}

fn setup_logging(debug: bool) {
    let default_directive = if debug {
        "lomy=debug,lomy_chat=debug,info"
    } else {
        "lomy=info,lomy_chat=info,warn"
    };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_directive));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(env_filter)
        .init();
}
