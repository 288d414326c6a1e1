//! Claim Ledger - API Server Binary
//!
//! This binary starts the HTTP shell around the claim lifecycle.
//!
//! # Usage
//!
//! ```bash
//! # In-memory ledger, default policy
//! cargo run --bin claims-ledger-api
//!
//! # PostgreSQL ledger with per-claim stage registers
//! API_LEDGER_BACKEND=postgres API_DATABASE_URL=postgres://... \
//!     API_STAGE_SCOPE=per_claim cargo run --bin claims-ledger-api
//! ```
//!
//! # Environment Variables
//!
//! * `API_HOST` - Server host (default: 0.0.0.0)
//! * `API_PORT` - Server port (default: 8080)
//! * `API_JWT_SECRET` - JWT signing secret (required in production)
//! * `API_LEDGER_BACKEND` - `memory` or `postgres` (default: memory)
//! * `API_DATABASE_URL` - PostgreSQL connection string
//! * `API_LOG_LEVEL` - Log level: trace, debug, info, warn, error (default: info)
//! * `API_SCHEMA_VERSION` - `minimal` or `full`
//! * `API_STAGE_SCOPE` - `global` or `per_claim`
//! * `API_CALLER_SOURCE` - `resolved` or `asserted`
//! * `API_UPDATE_BY_HOME_GATE` - `host` or `home`
//! * `API_DETAILS_ACCESS` - `open` or `owner_only`

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use domain_claims::LedgerPort;
use infra_ledger::{create_pool, DatabaseConfig, MemoryLedger, PostgresLedger};
use interface_api::config::{ApiConfig, LedgerBackend};
use interface_api::create_router;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (useful for local development)
    dotenvy::dotenv().ok();

    let config = ApiConfig::from_env().context("invalid API_* configuration")?;
    init_tracing(&config.log_level);
    config.validate()?;

    tracing::info!(
        host = %config.host,
        port = %config.port,
        backend = ?config.ledger_backend,
        policy = ?config.lifecycle_policy(),
        "Starting claim ledger API server"
    );

    let ledger = open_ledger(&config).await?;
    let app = create_router(ledger, config.clone());

    let addr: SocketAddr = config
        .server_addr()
        .parse()
        .with_context(|| format!("invalid server address {}", config.server_addr()))?;

    tracing::info!(%addr, "Server listening");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Initializes the tracing subscriber; `RUST_LOG` wins over the configured level
fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

/// Builds the configured ledger adapter
async fn open_ledger(config: &ApiConfig) -> anyhow::Result<Arc<dyn LedgerPort>> {
    match config.ledger_backend {
        LedgerBackend::Memory => {
            tracing::warn!("Using in-memory ledger; records are lost on shutdown");
            Ok(Arc::new(MemoryLedger::new()))
        }
        LedgerBackend::Postgres => {
            let url = config
                .database_url
                .clone()
                .context("database_url is required for the postgres ledger backend")?;
            let pool = create_pool(DatabaseConfig::new(url)).await?;
            let ledger = PostgresLedger::new(pool);
            ledger.ensure_schema().await?;
            Ok(Arc::new(ledger))
        }
    }
}

/// Waits for Ctrl+C or SIGTERM so in-flight requests can finish
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
