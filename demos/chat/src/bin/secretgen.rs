//! lomy Secret Generation Utility
//!
//! Generates a random shared secret for an encrypted lomy chat.
//!
//! # Usage
//!
//! ```bash
//! cargo run -p lomy-chat --bin secretgen
//! cargo run -p lomy-chat --bin secretgen -- --bytes 48
//! ```
//!
//! # Output Format
//!
//! The secret is printed in base64, ready to use as `LOMY_SECRET` on both
//! peers.

use base64::{Engine, engine::general_purpose::STANDARD};
use clap::Parser;
use rand::RngCore;

#[derive(Parser, Debug)]
#[command(name = "secretgen")]
#[command(about = "Generate a random shared secret for lomy-chat")]
struct Args {
    /// Number of random bytes in the secret
    #[arg(short, long, default_value_t = 32, value_parser = clap::value_parser!(u16).range(1..))]
    bytes: u16,

    /// Print only the secret
    #[arg(short, long)]
    quiet: bool,
}

fn generate(len: usize) -> String {
    let mut secret = vec![0u8; len];
    rand::thread_rng().fill_bytes(&mut secret);
    STANDARD.encode(&secret)
}

fn main() {
    let args = Args::parse();
    let secret = generate(usize::from(args.bytes));

    if args.quiet {
        println!("{secret}");
        return;
    }

    println!("Shared secret (base64) - KEEP SECRET!");
    println!("────────────────────────────────────────────────────────────────────");
    println!("{secret}");
    println!();

    println!("# Peer A (listens):");
    println!("LOMY_SECRET={secret} lomy-chat --listening-port 9000");
    println!();
    println!("# Peer B (dials A):");
    println!("LOMY_SECRET={secret} lomy-chat --peer-address <A-host>:9000");
    println!();
}
