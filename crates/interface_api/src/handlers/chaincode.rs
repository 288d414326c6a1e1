//! Invoke and query handlers
//!
//! Both endpoints take the same `{function, args}` body. `invoke` runs
//! commands that write to the ledger, `query` runs read-only ones; a command
//! sent to the wrong endpoint is an unknown function there.

use std::sync::Arc;

use axum::{extract::State, Extension, Json};
use tracing::{info, instrument};
use validator::Validate;

use core_kernel::OperationMetadata;
use domain_claims::{ClaimError, Command, LifecycleService};

use crate::auth::{Claims, TokenIdentity};
use crate::dto::chaincode::{CommandRequest, CommandResponse};
use crate::error::ApiError;
use crate::middleware::CorrelationId;
use crate::AppState;

/// Runs a ledger-writing command
pub async fn invoke(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Extension(correlation): Extension<CorrelationId>,
    Json(request): Json<CommandRequest>,
) -> Result<Json<CommandResponse>, ApiError> {
    run(state, claims, correlation, request, false).await
}

/// Runs a read-only command
pub async fn query(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Extension(correlation): Extension<CorrelationId>,
    Json(request): Json<CommandRequest>,
) -> Result<Json<CommandResponse>, ApiError> {
    run(state, claims, correlation, request, true).await
}

#[instrument(
    skip(state, claims, request),
    fields(function = %request.function, user = %claims.sub, correlation_id = %correlation.0)
)]
async fn run(
    state: AppState,
    claims: Claims,
    correlation: CorrelationId,
    request: CommandRequest,
    read_only: bool,
) -> Result<Json<CommandResponse>, ApiError> {
    request.validate()?;

    let command = Command::parse(&request.function, &request.args, state.policy.schema)?;
    if command.is_query() != read_only {
        return Err(ClaimError::UnknownFunction(request.function).into());
    }
    let function = command.name();

    let metadata = OperationMetadata::with_correlation_id(correlation.0.clone())
        .initiated_by(claims.sub.clone())
        .with_context("function", function);
    let service = LifecycleService::new(
        state.ledger.clone(),
        Arc::new(TokenIdentity::from(claims)),
        state.policy,
    )
    .with_metadata(metadata);

    let payload = match command.execute(&service).await? {
        Some(bytes) => Some(
            serde_json::from_slice(&bytes)
                .map_err(|e| ApiError::Internal(format!("payload is not JSON: {}", e)))?,
        ),
        None => None,
    };

    info!(has_payload = payload.is_some(), "Command completed");

    Ok(Json(CommandResponse {
        function: function.to_string(),
        correlation_id: correlation.0,
        payload,
    }))
}
