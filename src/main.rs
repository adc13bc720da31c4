//! Accounting gateway
//!
//! Serves the `/accounting` API and forwards company-scoped calls to the
//! upstream pymo service.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request    ┌──────────┐    ┌────────────┐    ┌──────────────┐
//!     ─────────────────▶│   http   │───▶│ accounting │───▶│   upstream   │────▶ pymo
//!                       │  server  │    │  handlers  │    │    client    │
//!     Client Response   └──────────┘    └─────┬──────┘    └──────────────┘
//!     ◀─────────────────                      │
//!                                ┌────────────┼────────────┐
//!                                ▼            ▼            ▼
//!                           ┌────────┐  ┌──────────┐  ┌─────────┐
//!                           │ ledger │  │ settings │  │ storage │
//!                           └────────┘  └──────────┘  └─────────┘
//! ```

use accounting_gateway::config::load_config;
use accounting_gateway::http::{AppState, HttpServer};
use accounting_gateway::lifecycle::{signals, Shutdown};
use accounting_gateway::observability::{logging, metrics};
use clap::Parser;
use std::path::PathBuf;
use tokio::net::TcpListener;

#[derive(Parser)]
#[command(name = "accounting-gateway")]
#[command(about = "Accounting API gateway in front of pymo", long_about = None)]
struct Args {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = load_config(args.config.as_deref())?;
    logging::init_logging(&config.observability);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        bind_address = %config.server.bind_address,
        upstream = %config.upstream.base_url(),
        request_timeout_secs = config.server.request_timeout_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.server.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    tokio::spawn(signals::listen_for_signals(shutdown.clone()));

    let state = AppState::from_config(&config)?;
    let server = HttpServer::with_state(config, state);
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
