//! Dynamic API Gateway
//!
//! Accepts service registrations at runtime and forwards traffic to them.
//!
//! # Architecture Overview
//!
//! ```text
//!                        ┌──────────────────────────────────────────────────┐
//!   POST /configure      │                    GATEWAY                       │
//!   ─────────────────────┼─▶ configure ──▶ compile tree ──▶ build router    │
//!                        │                                      │           │
//!                        │                                      ▼           │
//!                        │                          services snapshot       │
//!                        │                          (ArcSwap<Router>)       │
//!   /services/{prefix}/… │                                      │           │
//!   ─────────────────────┼─▶ dispatch ──▶ mounts ──▶ leaf ──▶ reverse proxy ─┼──▶ Backend
//!   ◀────────────────────┼──────────────────────────────────────────────────┼─── response
//!                        └──────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use dynamic_gateway::config::{load_config, GatewayConfig};
use dynamic_gateway::lifecycle::signals::trigger_on_signal;
use dynamic_gateway::observability::{logging, metrics};
use dynamic_gateway::{GatewayServer, Shutdown};

#[derive(Parser)]
#[command(name = "gateway")]
#[command(about = "Runtime-configurable API gateway", long_about = None)]
struct Args {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => GatewayConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.listener.bind_address = bind;
    }

    logging::init_logging(&config.observability);
    tracing::info!("gateway v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        services_namespace = %config.routes.services_namespace,
        request_timeout_secs = config.timeouts.request_secs,
        upstream_timeout_secs = config.timeouts.upstream_secs,
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

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(trigger_on_signal(shutdown));

    let server = GatewayServer::new(config);
    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
