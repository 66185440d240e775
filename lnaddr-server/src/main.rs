//! Lightning address HTTP server.
//!
//! # Usage
//!
//! ```bash
//! # Run with default config (config.toml in current directory)
//! LN_ADDRESS_DOMAIN=pay.example.com cargo run -p lnaddr-server --release
//!
//! # Run with custom config path
//! CONFIG=/path/to/config.toml cargo run -p lnaddr-server
//!
//! # Configure logging level
//! RUST_LOG=debug cargo run -p lnaddr-server
//! ```
//!
//! # Environment Variables
//!
//! - `CONFIG` - Path to TOML configuration file (default: `config.toml`)
//! - `HOST` - Override bind address (default: `0.0.0.0`)
//! - `PORT` - Override port (default: `8000`)
//! - `LN_ADDRESS_DOMAIN` - Domain of the served address
//! - `LN_USERNAME` - Username of the served address (default: `nwc`)
//! - `NODE_BASE_URL` - NWC proxy base URL
//! - `WITHDRAW_TOKEN` - Secret enabling withdraw offers
//! - `RUST_LOG` - Log level filter (default: `info`)

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::http::Method;
use lnaddr::LnurlHandler;
use lnaddr::funding::TimeoutFundingSource;
use lnaddr_http::{NwcProxyConfig, NwcProxyFunding};
use tower_http::cors;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use lnaddr_server::config::ServerConfig;
use lnaddr_server::handlers::{AppState, lnurl_router};
use lnaddr_server::session::K1Store;

const K1_PURGE_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() {
    // A missing .env file is fine.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = run().await {
        tracing::error!("Server failed: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = ServerConfig::load()?;
    let lnurl_config = config.lnurl_config()?;
    tracing::info!(
        host = %config.host,
        port = config.port,
        address = %format!("{}@{}", config.username, lnurl_config.domain()),
        min_sats = config.min_sats,
        max_sats = config.max_sats,
        node = %config.node_base_url,
        withdrawals = config.withdrawals_enabled(),
        "Loaded configuration"
    );

    let funding = NwcProxyFunding::new(
        NwcProxyConfig::new(config.node_base_url.clone(), config.username.clone())
            .with_timeout(config.backend_timeout()),
    )?;
    let funding = TimeoutFundingSource::new(funding, config.backend_timeout());

    let k1_store = Arc::new(K1Store::new(config.k1_ttl()));
    let state = AppState {
        handler: Arc::new(LnurlHandler::new(lnurl_config, Arc::new(funding))),
        k1_store: Arc::clone(&k1_store),
        fee_reserve_sats: config.fee_reserve_sats,
        withdraw_token: config.withdraw_token.as_deref().map(Arc::from),
    };

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(K1_PURGE_INTERVAL);
        loop {
            interval.tick().await;
            let purged = k1_store.purge_expired();
            if purged > 0 {
                tracing::debug!(purged, "Purged expired withdraw tokens");
            }
        }
    });

    let app = lnurl_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(
            cors::CorsLayer::new()
                .allow_origin(cors::Any)
                .allow_methods([Method::GET])
                .allow_headers(cors::Any),
        );

    let addr = SocketAddr::new(config.host, config.port);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Lightning address server listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shut down gracefully");
    Ok(())
}

/// Waits for Ctrl-C or SIGTERM (Unix) to initiate graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => tracing::info!("Received Ctrl-C, shutting down..."),
                    _ = sigterm.recv() => tracing::info!("Received SIGTERM, shutting down..."),
                }
            }
            Err(e) => {
                tracing::warn!("Failed to install SIGTERM handler: {e}");
                if let Err(e) = ctrl_c.await {
                    tracing::error!("Failed to listen for Ctrl-C: {e}");
                }
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(e) = ctrl_c.await {
            tracing::error!("Failed to listen for Ctrl-C: {e}");
        }
        tracing::info!("Received Ctrl-C, shutting down...");
    }
}
