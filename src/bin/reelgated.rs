//! reelgated: Reelgate boundary daemon.
//!
//! Serves the prediction proxy over HTTP so clients never hold the
//! upstream API key.

use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use tracing::info;

use reelgate::server::config::{Config, Secrets};
use reelgate::server::routes::{AppState, router};
use reelgate::{ModelCatalog, ProxyService, ReelgateError, ReplicateClient};

/// Reelgate daemon: video generation boundary service.
#[derive(Parser)]
#[command(name = "reelgated")]
#[command(version = reelgate::PKG_VERSION)]
#[command(about = "Reelgate video generation boundary daemon")]
struct Args {
    /// Path to configuration file.
    #[arg(short, long)]
    config: Option<std::path::PathBuf>,

    /// Override the bind address from the config file.
    #[arg(short, long, env = "REELGATED_ADDRESS")]
    address: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "reelgate=info,reelgated=info,tower_http=info".into()),
        )
        .init();

    let args = Args::parse();

    // Load configuration; a missing API key is fatal at startup.
    let config = Config::load(args.config.as_deref())?;
    let secrets = Secrets::load()?;
    let api_key = secrets.replicate_api_key()?;

    let provider = ReplicateClient::with_options(
        api_key,
        &config.upstream.base_url,
        config.upstream.timeout(),
    )?;
    let service = ProxyService::new(Arc::new(provider), config.retry.to_retry_config());
    let state = AppState {
        service: Arc::new(service),
        catalog: Arc::new(ModelCatalog::with_embedded_seed()),
    };

    let address = args.address.unwrap_or(config.server.address);
    let addr: SocketAddr = address
        .parse()
        .map_err(|e| ReelgateError::Configuration(format!("Invalid address: {e}")))?;

    info!(version = %reelgate::version_string(), %addr, upstream = %config.upstream.base_url, "reelgated starting");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("reelgated stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
}
