//! Circuit-breaking gateway binary.
//!
//! Loads configuration, initializes logging, and serves the guarded fetch
//! endpoints. See `src/lib.rs` for the architecture overview.

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use breaker_gateway::config::{loader::load_config, GatewayConfig};
use breaker_gateway::http::HttpServer;
use breaker_gateway::observability::logging;

#[derive(Parser)]
#[command(name = "breaker-gateway")]
#[command(about = "Circuit-breaking gateway for flaky upstreams", long_about = None)]
struct Cli {
    /// Path to a TOML config file. Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init();

    let cli = Cli::parse();

    let config = match cli.config {
        Some(path) => load_config(&path)?,
        None => GatewayConfig::default(),
    };

    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstreams = config.upstreams.len(),
        failure_threshold = config.breaker.failure_threshold,
        retry_timeout_ms = config.breaker.retry_timeout_ms,
        "Configuration loaded"
    );

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let local_addr = listener.local_addr()?;

    tracing::info!(address = %local_addr, "Listening for connections");

    let server = HttpServer::new(config)?;
    server.run(listener).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
