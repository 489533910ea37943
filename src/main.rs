use std::path::PathBuf;

use clap::Parser;
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info};

use vaa_relayer::error::{Error, Result};
use vaa_relayer::infrastructure::bootstrap;
use vaa_relayer::infrastructure::config::settings::Config;

/// Relay signed VAAs between a source chain and its destinations
#[derive(Parser, Debug)]
#[command(name = "vaa-relayer")]
#[command(version)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, env = "RELAYER_CONFIG", default_value = "config.toml")]
    config: PathBuf,
}

/// Resolves on Ctrl+C or, on unix, SIGTERM.
async fn termination() {
    #[cfg(unix)]
    {
        let mut sigterm = match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(stream) => stream,
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                let _ = signal::ctrl_c().await;
                return;
            }
        };
        tokio::select! {
            _ = signal::ctrl_c() => info!("Shutdown signal received (Ctrl+C)"),
            _ = sigterm.recv() => info!("Shutdown signal received (SIGTERM)"),
        }
    }

    #[cfg(not(unix))]
    {
        let _ = signal::ctrl_c().await;
        info!("Shutdown signal received (Ctrl+C)");
    }
}

async fn run(config: Config) -> Result<()> {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut relay = tokio::spawn(bootstrap::run(config, shutdown_rx));

    tokio::select! {
        joined = &mut relay => return flatten(joined),
        () = termination() => {
            let _ = shutdown_tx.send(true);
        }
    }

    flatten(relay.await)
}

fn flatten(joined: std::result::Result<Result<()>, tokio::task::JoinError>) -> Result<()> {
    joined.map_err(|e| Error::Connection(format!("relay task failed: {e}")))?
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let _ = rustls::crypto::ring::default_provider().install_default();

    let cli = Cli::parse();
    let config = match Config::load(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config from {}: {e}", cli.config.display());
            std::process::exit(1);
        }
    };

    config.init_logging();
    info!("vaa-relayer starting");

    if let Err(e) = run(config).await {
        error!(error = %e, "Fatal error");
        std::process::exit(1);
    }

    info!("vaa-relayer stopped");
}
