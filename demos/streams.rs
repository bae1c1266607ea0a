//! Live Kiva event streams.
//!
//! Demonstrates:
//! - Creating a Session against a socket.io 0.9 host
//! - Opening several channels over one connection
//! - Merging channel streams and printing every payload
//!
//! Usage:
//!   cargo run --example streams
//!   cargo run --example streams -- streams.kiva.org
//!   RUST_LOG=kivaio=debug cargo run --example streams

// ============================================================================
// Imports
// ============================================================================

use futures_util::StreamExt;
use futures_util::stream::select_all;
use kivaio::{Result, Session};
use tracing_subscriber::EnvFilter;

// ============================================================================
// Constants
// ============================================================================

const DEFAULT_HOST: &str = "streams.kiva.org";

const CHANNELS: &[&str] = &[
    "loan.purchased",
    "loan.posted",
    "lender.registered",
    "lender.joinedTeam",
];

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("kivaio=info")),
        )
        .init();

    let host = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_HOST.to_owned());

    tokio::select! {
        result = run(&host) => {
            if let Err(e) = result {
                eprintln!("\n[ERROR] {e}");
                std::process::exit(1);
            }
        }
        _ = tokio::signal::ctrl_c() => println!("\nInterrupted"),
    }
}

async fn run(host: &str) -> Result<()> {
    println!("=== Kiva streams: {host} ===\n");

    let session = Session::new(host).await?;
    println!(
        "Session {} (heartbeat {}s, close {}s)\n",
        session.socket_id(),
        session.heartbeat_timeout().as_secs(),
        session.close_timeout().as_secs()
    );

    let mut streams = Vec::with_capacity(CHANNELS.len());
    for &name in CHANNELS {
        let channel = session.connect(name).await?;
        streams.push(
            channel
                .into_stream()
                .map(move |payload| format!("{name}: {payload}")),
        );
    }

    let mut merged = select_all(streams);
    while let Some(line) = merged.next().await {
        println!("{line}");
    }

    println!("\nConnection closed");
    Ok(())
}
