//! Chaincode-style command DTOs

use serde::{Deserialize, Serialize};
use validator::Validate;

/// A positional command: function name plus string arguments
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CommandRequest {
    #[validate(length(min = 1, max = 64))]
    pub function: String,
    #[serde(default)]
    #[validate(length(max = 32))]
    pub args: Vec<String>,
}

/// Outcome of a command
#[derive(Debug, Serialize)]
pub struct CommandResponse {
    /// Canonical function name that ran
    pub function: String,
    pub correlation_id: String,
    /// Claim JSON or id array for reads; absent for mutations and for an
    /// `allowToUpdate` the caller is not yet entitled to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
}
