//! Command-line arguments.

use clap::{ArgGroup, Parser};
use lomy::SessionConfig;

const AFTER_HELP: &str = "At least one of --peer-address and --listening-port must be set. \
If both are provided an attempt is made to dial the peer address; \
if that fails the program begins listening on the listening port.";

#[derive(Parser, Debug)]
#[command(name = "lomy-chat")]
#[command(about = "Chat with one peer over TCP")]
#[command(after_help = AFTER_HELP)]
#[command(group(
    ArgGroup::new("endpoint")
        .required(true)
        .multiple(true)
        .args(["peer_address", "listening_port"])
))]
pub struct Args {
    /// Peer's address and port, e.g. 192.168.0.18:9000
    #[arg(short, long, env = "LOMY_PEER_ADDRESS")]
    pub peer_address: Option<String>,

    /// Port on which to listen for incoming connections, e.g. 9000
    #[arg(short, long, env = "LOMY_LISTENING_PORT")]
    pub listening_port: Option<u16>,

    /// Shared secret; both peers must use the same one
    #[arg(short, long, env = "LOMY_SECRET", hide_env_values = true)]
    pub secret: Option<String>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

impl Args {
    /// Turn the arguments into a validated session configuration.
    pub fn session_config(&self) -> anyhow::Result<SessionConfig> {
        let mut builder = SessionConfig::builder();
        if let Some(addr) = &self.peer_address {
            builder = builder.peer_addr(addr);
        }
        if let Some(port) = self.listening_port {
            builder = builder.listen_port(port);
        }
        if let Some(secret) = &self.secret {
            builder = builder.secret(secret);
        }
        Ok(builder.build()?)
    }
}
