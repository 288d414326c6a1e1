//! HTTP API Layer
//!
//! This crate exposes the claim lifecycle over HTTP using Axum.
//!
//! # Architecture
//!
//! - **Handlers**: `invoke` / `query` command endpoints and health checks
//! - **Middleware**: bearer authentication, correlation ids, audit logging
//! - **DTOs**: the `{function, args}` command body and its response
//! - **Error Handling**: claim errors mapped to HTTP status codes
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_api::create_router;
//!
//! let app = create_router(Arc::new(MemoryLedger::new()), config);
//! axum::serve(listener, app).await?;
//! ```

pub mod auth;
pub mod config;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;

use std::sync::Arc;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use domain_claims::{LedgerPort, LifecyclePolicy};

use crate::config::ApiConfig;
use crate::handlers::{chaincode, health};
use crate::middleware::{audit_middleware, auth_middleware};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<dyn LedgerPort>,
    pub config: ApiConfig,
    pub policy: LifecyclePolicy,
}

/// Creates the main API router
///
/// # Arguments
///
/// * `ledger` - Ledger adapter holding the claim records
/// * `config` - API configuration, including the lifecycle policy switches
pub fn create_router(ledger: Arc<dyn LedgerPort>, config: ApiConfig) -> Router {
    let policy = config.lifecycle_policy();
    let state = AppState {
        ledger,
        config,
        policy,
    };

    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check));

    // Protected API routes
    let api_routes = Router::new()
        .route("/invoke", post(chaincode::invoke))
        .route("/query", post(chaincode::query))
        .layer(axum_middleware::from_fn_with_state(state.clone(), audit_middleware))
        .layer(axum_middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .nest("/api/v1", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
