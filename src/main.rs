//! Membership gateway.
//!
//! ```text
//!                 ┌──────────────────────────────────────────────────────┐
//!                 │                 MEMBERSHIP GATEWAY                   │
//!   Admin client  │  ┌────────┐   ┌────────────┐   ┌──────────────────┐  │
//!   ──────────────┼─▶│  http  │──▶│   admin    │──▶│ security         │  │
//!                 │  │ server │   │  handlers  │   │ login rate limit │  │
//!                 │  └────────┘   └─────┬──────┘   └──────────────────┘  │
//!                 │                     │ jobs                           │
//!                 │                     ▼                                │
//!                 │             ┌───────────────┐   ┌────────────────┐   │   Email / SMS
//!                 │             │ notifications │──▶│ resilience     │───┼─▶ endpoints
//!                 │             │ batch + client│   │ retry, backoff │   │
//!                 │             └───────────────┘   └────────────────┘   │
//!                 │   config (toml, hot reload) · observability · lifecycle
//!                 └──────────────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use membership_gateway::config::loader::{parse_config, ADMIN_PASSWORD_ENV};
use membership_gateway::config::watcher::ConfigWatcher;
use membership_gateway::config::{load_config, GatewayConfig};
use membership_gateway::observability::{logging, metrics};
use membership_gateway::{HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "membership-gateway")]
#[command(about = "Admin login and notification delivery gateway", long_about = None)]
struct Args {
    /// Path to a TOML configuration file. Watched for changes.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config: GatewayConfig = match &args.config {
        Some(path) => load_config(path)?,
        None => parse_config("", std::env::var(ADMIN_PASSWORD_ENV).ok())?,
    };

    logging::init_tracing(&config.observability.log_level);
    tracing::info!("membership-gateway v{} starting", env!("CARGO_PKG_VERSION"));

    if config.admin.password == GatewayConfig::default().admin.password {
        tracing::warn!("Admin password is the built-in placeholder; set ADMIN_PASSWORD");
    }

    tracing::info!(
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
        max_retries = config.retries.max_retries,
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

    let (_watcher, config_updates) = match &args.config {
        Some(path) => {
            let (watcher, updates) = ConfigWatcher::new(path);
            (Some(watcher.run()?), updates)
        }
        None => (None, mpsc::unbounded_channel().1),
    };

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config)?;
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(shutdown.clone().trigger_on_ctrl_c());

    server.run(listener, config_updates, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
