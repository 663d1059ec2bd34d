// ============================================
// File: crates/wordguard-client/src/main.rs
// ============================================
//! # Wordguard Client Entry Point
//!
//! Parses flags, loads the server certificate and plays one game on the
//! terminal. Exits 0 only when the game completes with a confirmed
//! commitment.
//!
//! ## Usage
//! ```bash
//! wordguard-client --dhost 127.0.0.1 --dport 4444 --cert trust/server.crt
//! wordguard-client --pin 3f9a...   # refuse any other certificate
//! ```

use std::path::PathBuf;

use clap::Parser;
use tracing::{debug, error};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use wordguard_client::config::{DEFAULT_CERT, DEFAULT_HOST, DEFAULT_PORT};
use wordguard_client::{ClientConfig, GameClient, Outcome, WELCOME};
use wordguard_core::crypto::RsaKeyPair;

/// Wordguard word-guess game client
#[derive(Parser, Debug)]
#[command(name = "wordguard-client")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Server host to connect to
    #[arg(long, default_value = DEFAULT_HOST)]
    dhost: String,

    /// Server port
    #[arg(long, default_value_t = DEFAULT_PORT)]
    dport: u16,

    /// Server certificate distributed by the operator
    #[arg(long, default_value = DEFAULT_CERT)]
    cert: PathBuf,

    /// Expected certificate fingerprint (hex SHA-256)
    #[arg(long)]
    pin: Option<String>,

    /// Debug logging on stderr
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(if cli.verbose { "debug" } else { "warn" });

    let config = ClientConfig {
        host: cli.dhost,
        port: cli.dport,
        cert: cli.cert,
        pin: cli.pin,
    };

    println!("{WELCOME}");
    println!();

    let outcome = run(&config).await;
    match &outcome {
        Outcome::Completed { .. } => println!("{outcome}"),
        _ => {
            error!("{}", outcome);
            println!("{outcome}");
            println!("CLIENT - Exiting wordguard client");
        }
    }
    std::process::exit(outcome.exit_code());
}

async fn run(config: &ClientConfig) -> Outcome {
    let identity = match config.load_identity() {
        Ok(identity) => identity,
        Err(e) => return Outcome::from_core_error(&e),
    };
    debug!(fingerprint = %identity.fingerprint, "Server certificate loaded");

    let addr = match config.resolve().await {
        Ok(addr) => addr,
        Err(e) => return Outcome::from_transport_error(&e),
    };

    let key = match tokio::task::spawn_blocking(RsaKeyPair::generate).await {
        Ok(Ok(key)) => key,
        Ok(Err(e)) => return Outcome::from_core_error(&e),
        Err(e) => {
            return Outcome::Protocol {
                reason: format!("key generation task failed: {e}"),
            }
        }
    };

    let client = GameClient::new(addr, identity.verifying_key, key);
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();
    client.play(stdin, &mut stdout).await
}

/// Logs to stderr so game text on stdout stays readable.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(filter)
        .try_init()
        .ok();
}
