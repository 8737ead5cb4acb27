//! SARD server binary.
//!
//! Search-and-rescue dispatch API over JSON:API.
//!
//! # Usage
//!
//! ```bash
//! # With config file
//! sard --config config.yaml
//!
//! # With environment variables only
//! SARD_SERVER__PORT=9090 sard
//! ```

use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use tokio::signal;
use tracing::{info, warn};

use sard_api::auth::MemoryAuthenticator;
use sard_api::http::{create_router_with_body_limit, AppState};
use sard_domain::{types, Actor, PageBounds, ScopeSet};
use sard_server::{init_logging, logging::parse_log_level, LoggingConfig, ServerConfig};
use sard_storage::MemoryEntityStore;

/// SARD - Search-And-Rescue Dispatch API
#[derive(Parser, Debug)]
#[command(name = "sard")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file (YAML)
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = if let Some(config_path) = args.config {
        ServerConfig::load(&config_path)?
    } else {
        ServerConfig::from_env()?
    };

    let log_config = LoggingConfig {
        json_format: config.logging.json,
        default_level: parse_log_level(&config.logging.level),
    };
    init_logging(log_config);

    info!(version = env!("CARGO_PKG_VERSION"), "Starting SARD server");

    let store = MemoryEntityStore::new_shared();
    let authenticator = Arc::new(MemoryAuthenticator::new());

    if let Some(token) = &config.auth.admin_token {
        authenticator.register(token.clone(), admin_actor());
        warn!("Bootstrap admin token registered from configuration");
    }

    let bounds = PageBounds {
        default_limit: config.query.default_page_size,
        max_limit: config.query.max_page_size,
    };

    let state = AppState::new(store, authenticator).with_bounds(bounds);
    let router = create_router_with_body_limit(state, config.server.body_limit_bytes);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!(%addr, "HTTP server listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Actor granted every scope over every registered kind.
fn admin_actor() -> Actor {
    let mut scopes = ScopeSet::default();
    for kind in types::kinds() {
        for action in ["read", "write", "sudo", "internal"] {
            scopes.insert(format!("{kind}.{action}"));
        }
    }
    Actor::new("admin", scopes)
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
