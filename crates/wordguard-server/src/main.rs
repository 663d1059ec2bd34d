// ============================================
// File: crates/wordguard-server/src/main.rs
// ============================================
//! # Wordguard Server Entry Point
//!
//! ## Creation Reason
//! Main entry point for the wordguard game server binary.
//! Handles CLI parsing, logging setup, trust bootstrap and server start.
//!
//! ## Main Functionality
//! - CLI argument parsing with clap
//! - Logging initialization with tracing
//! - Configuration loading and flag overrides
//! - Trust material generation
//! - Server execution
//!
//! ## Usage
//! ```bash
//! # Start on the default port, generating trust material on first run
//! wordguard-server start
//!
//! # Custom port and extra words
//! wordguard-server start --lport 5555 --wordlist words.txt
//!
//! # Other commands
//! wordguard-server init-trust --force    # Regenerate certificates
//! wordguard-server validate -c server.toml
//! wordguard-server fingerprint           # Leaf fingerprint for client --pin
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - Clients need a copy of `<trust dir>/server.crt`
//! - `init-trust --force` invalidates every certificate already handed out
//!
//! ## Last Modified
//! v0.1.0 - Initial CLI implementation

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, reload, EnvFilter, Registry};

use wordguard_core::trust::{load_or_generate, store, ServerCredentials};
use wordguard_server::{Server, ServerConfig, ServerError, WordPool};

const DEFAULT_CONFIG: &str = "wordguard.toml";

/// Swaps the log filter once the configuration is known.
type LogHandle = reload::Handle<EnvFilter, Registry>;

// ============================================
// CLI Definition
// ============================================

/// Wordguard word-guess game server
#[derive(Parser, Debug)]
#[command(name = "wordguard-server")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the server
    ///
    /// Missing trust material is generated on startup.
    Start {
        /// Path to configuration file
        #[arg(short, long, default_value = DEFAULT_CONFIG)]
        config: PathBuf,

        /// Listen port (overrides config)
        #[arg(long)]
        lport: Option<u16>,

        /// Extra words, one per line (overrides config)
        #[arg(long)]
        wordlist: Option<PathBuf>,
    },

    /// Generate the root authority, leaf certificate and keys
    InitTrust {
        /// Path to configuration file
        #[arg(short, long, default_value = DEFAULT_CONFIG)]
        config: PathBuf,

        /// Replace existing material
        #[arg(long)]
        force: bool,
    },

    /// Validate configuration file
    Validate {
        /// Path to configuration file
        #[arg(short, long)]
        config: PathBuf,
    },

    /// Print the leaf certificate fingerprint
    Fingerprint {
        /// Path to configuration file
        #[arg(short, long, default_value = DEFAULT_CONFIG)]
        config: PathBuf,
    },
}

// ============================================
// Main
// ============================================

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_handle = init_logging("info");

    let result = match cli.command {
        Commands::Start { config, lport, wordlist } => {
            cmd_start(config, lport, wordlist, log_handle.as_ref()).await
        }
        Commands::InitTrust { config, force } => cmd_init_trust(config, force).await,
        Commands::Validate { config } => cmd_validate(config).await,
        Commands::Fingerprint { config } => cmd_fingerprint(config).await,
    };

    if let Err(e) = result {
        error!("{:#}", e);
        if e.downcast_ref::<ServerError>().is_some_and(ServerError::is_config_error) {
            error!("Check the file with `wordguard-server validate -c <path>`");
        }
        std::process::exit(1);
    }
}

// ============================================
// Commands
// ============================================

/// Starts the server.
async fn cmd_start(
    config_path: PathBuf,
    lport: Option<u16>,
    wordlist: Option<PathBuf>,
    log_handle: Option<&LogHandle>,
) -> anyhow::Result<()> {
    info!("Starting wordguard server...");

    let mut config = load_or_default_config(&config_path).await?;
    config.apply_overrides(lport, wordlist);
    config.validate()?;

    if std::env::var_os(EnvFilter::DEFAULT_ENV).is_none() {
        if let Some(handle) = log_handle {
            if let Err(e) = set_log_level(handle, &config.logging.level) {
                warn!(error = %e, "Could not apply configured log level");
            }
        }
    }

    let credentials = load_credentials(&config).await?;
    let words = WordPool::load(config.game.wordlist.as_deref()).await?;

    info!("════════════════════════════════════════");
    info!("Listen:       {}", config.listen_addr());
    info!("Words:        {}", words.len());
    info!("Trust dir:    {}", config.trust.dir.display());
    info!("Fingerprint:  {}", credentials.leaf.fingerprint()?);
    info!("════════════════════════════════════════");

    let server = Server::new(config, credentials, words);
    server.run().await?;

    Ok(())
}

/// Generates trust material and exits.
async fn cmd_init_trust(config_path: PathBuf, force: bool) -> anyhow::Result<()> {
    let config = load_or_default_config(&config_path).await?;
    let paths = config.trust_paths();
    let options = config.trust_options();

    let credentials = tokio::task::spawn_blocking(move || {
        if force {
            store::generate(&paths, &options)
        } else {
            load_or_generate(&paths, &options)
        }
    })
    .await??;

    println!("✅ Trust material ready in {}", config.trust.dir.display());
    println!();
    println!("   Hosts:        {}", credentials.leaf.body.hosts.join(", "));
    println!("   Expires:      {}", credentials.leaf.body.not_after);
    println!("   Fingerprint:  {}", credentials.leaf.fingerprint()?);
    println!();
    println!("Copy {} to each client.", config.trust_paths().leaf_cert().display());

    Ok(())
}

/// Validates configuration file.
async fn cmd_validate(config_path: PathBuf) -> anyhow::Result<()> {
    let config = ServerConfig::load(&config_path).await?;

    println!("✅ Configuration is valid");
    println!();
    println!("Network:");
    println!("   Listen:           {}", config.listen_addr());
    println!();
    println!("Game:");
    match &config.game.wordlist {
        Some(path) => println!("   Wordlist:         {}", path.display()),
        None => println!("   Wordlist:         (built-in words only)"),
    }
    println!();
    println!("Trust:");
    println!("   Directory:        {}", config.trust.dir.display());
    println!("   Hosts:            {}", config.trust.hosts.join(", "));
    println!("   Validity:         {} days", config.trust.validity_days);
    println!();
    println!("Limits:");
    println!("   Max Connections:  {}", config.max_connections());
    match config.idle_timeout() {
        Some(timeout) => println!("   Idle Timeout:     {}s", timeout.as_secs()),
        None => println!("   Idle Timeout:     disabled"),
    }
    println!();

    Ok(())
}

/// Prints the leaf fingerprint for client pinning.
async fn cmd_fingerprint(config_path: PathBuf) -> anyhow::Result<()> {
    let config = load_or_default_config(&config_path).await?;
    let leaf_path = config.trust_paths().leaf_cert();

    if !leaf_path.exists() {
        println!("❌ No certificate at {}. Run init-trust first.", leaf_path.display());
        std::process::exit(1);
    }

    let leaf = wordguard_core::trust::Certificate::read(&leaf_path)?;
    println!("{}", leaf.fingerprint()?);

    Ok(())
}

// ============================================
// Helper Functions
// ============================================

/// Initializes the tracing subscriber. `RUST_LOG` wins over `level`.
///
/// Returns `None` if a global subscriber was already installed.
fn init_logging(level: &str) -> Option<LogHandle> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let (filter, handle) = reload::Layer::new(filter);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .try_init()
        .ok()
        .map(|()| handle)
}

/// Replaces the active filter with `level`.
fn set_log_level(handle: &LogHandle, level: &str) -> Result<(), reload::Error> {
    handle.reload(EnvFilter::new(level))
}

/// Loads config, or defaults when the file does not exist.
async fn load_or_default_config(path: &Path) -> anyhow::Result<ServerConfig> {
    if path.exists() {
        Ok(ServerConfig::load(path).await?)
    } else {
        info!("Config file {} not found, using defaults", path.display());
        Ok(ServerConfig::default())
    }
}

/// Loads or creates trust material off the async runtime.
async fn load_credentials(config: &ServerConfig) -> anyhow::Result<ServerCredentials> {
    let paths = config.trust_paths();
    let options = config.trust_options();
    let credentials = tokio::task::spawn_blocking(move || load_or_generate(&paths, &options)).await??;
    Ok(credentials)
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::Level;

    #[test]
    fn test_configured_level_replaces_startup_filter() {
        let (filter, handle) = reload::Layer::new(EnvFilter::new("info"));
        let subscriber = tracing_subscriber::registry().with(filter);

        tracing::subscriber::with_default(subscriber, || {
            assert!(tracing::enabled!(Level::INFO));
            assert!(!tracing::enabled!(Level::DEBUG));

            set_log_level(&handle, "debug").unwrap();
            assert!(tracing::enabled!(Level::DEBUG));

            set_log_level(&handle, "warn").unwrap();
            assert!(!tracing::enabled!(Level::INFO));
        });
    }
}
