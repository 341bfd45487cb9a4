//! Caching Forward HTTP Proxy
//!
//! A forwarding HTTP proxy with an in-memory LRU response cache, built with
//! Tokio.
//!
//! # Architecture Overview
//!
//! ```text
//!                  ┌────────────────────────────────────────────────┐
//!                  │                 CACHING PROXY                   │
//!                  │                                                 │
//!   Client ───────▶│  net/listener ──▶ http/handler ──▶ cache lookup │
//!                  │                        │               │ miss   │
//!                  │                        │               ▼        │
//!                  │                        │        upstream ───────┼──▶ Origin
//!                  │                        ▼               │        │    Server
//!   Client ◀───────┼── streamed response ◀─┴── relay ◀──────┘        │
//!                  │             │                                   │
//!                  │             └──▶ cache insert (bounded LRU)     │
//!                  │                                                 │
//!                  │  config · lifecycle · observability             │
//!                  └────────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;

use caching_proxy::config::{self, ProxyConfig};
use caching_proxy::lifecycle::{signals, Shutdown};
use caching_proxy::net::Listener;
use caching_proxy::observability;
use caching_proxy::ProxyServer;

#[derive(Parser)]
#[command(name = "caching-proxy")]
#[command(about = "Caching forward HTTP proxy", long_about = None)]
struct Cli {
    /// Port to listen on.
    port: u16,

    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => config::load_config(path)?,
        None => ProxyConfig::default(),
    };

    // The CLI port wins over whatever the config file says.
    let mut bind_addr: SocketAddr = config.listener.bind_address.parse()?;
    bind_addr.set_port(cli.port);
    config.listener.bind_address = bind_addr.to_string();

    observability::logging::init_logging(&config.observability);

    tracing::info!("caching-proxy v0.1.0 starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        max_connections = config.listener.max_connections,
        max_object_bytes = config.cache.max_object_bytes,
        max_cache_bytes = config.cache.max_cache_bytes,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => observability::metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = Listener::bind(&config.listener).await?;

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        signals::wait_for_signal().await;
        shutdown.trigger();
    });

    let server = ProxyServer::new(config);
    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
