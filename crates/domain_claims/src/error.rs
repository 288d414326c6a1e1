//! Claims domain errors

use thiserror::Error;

use core_kernel::{CoreError, PortError};

use crate::role::Role;

/// Errors that can occur in the claims domain
///
/// Every variant is terminal for the invocation; the submitter resubmits.
#[derive(Debug, Error)]
pub enum ClaimError {
    #[error("Incorrect number of arguments for {function}: expected {expected}, got {actual}")]
    Arity {
        function: String,
        expected: usize,
        actual: usize,
    },

    #[error("Caller '{caller}' is not authorized for {operation}: requires {required}")]
    Unauthorized {
        operation: String,
        required: String,
        caller: String,
    },

    #[error("Claim not found: {0}")]
    NotFound(String),

    #[error("Claim already exists: {0}")]
    AlreadyExists(String),

    #[error("Corrupt ledger value at '{key}': {message}")]
    Decode { key: String, message: String },

    #[error("Failed to encode claim {claim_id}: {message}")]
    Encode { claim_id: String, message: String },

    #[error("Ledger {operation} failed: {source}")]
    Store {
        operation: &'static str,
        #[source]
        source: PortError,
    },

    #[error("Invalid claim id: {0}")]
    InvalidClaimId(#[from] CoreError),

    #[error("Function name is wrong or no function: '{0}'")]
    UnknownFunction(String),

    #[error("Caller identity unavailable: {0}")]
    Identity(#[source] PortError),
}

impl ClaimError {
    /// Creates an authorization failure for a required role
    pub fn unauthorized(operation: &str, required: Role, caller: impl Into<String>) -> Self {
        ClaimError::Unauthorized {
            operation: operation.to_string(),
            required: required.to_string(),
            caller: caller.into(),
        }
    }

    /// Wraps a ledger fault
    pub fn store(operation: &'static str, source: PortError) -> Self {
        ClaimError::Store { operation, source }
    }

    /// Creates a decode failure for a ledger key
    pub fn decode(key: impl Into<String>, message: impl ToString) -> Self {
        ClaimError::Decode {
            key: key.into(),
            message: message.to_string(),
        }
    }

    /// Returns true for failures caused by the caller rather than the ledger
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ClaimError::Arity { .. }
                | ClaimError::Unauthorized { .. }
                | ClaimError::NotFound(_)
                | ClaimError::AlreadyExists(_)
                | ClaimError::InvalidClaimId(_)
                | ClaimError::UnknownFunction(_)
                | ClaimError::Identity(_)
        )
    }

    /// Returns true if this error is an authorization rejection
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ClaimError::Unauthorized { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unauthorized_message_names_roles() {
        let error = ClaimError::unauthorized("transferToHost", Role::Host, "user_type3_0");
        let message = error.to_string();
        assert!(message.contains("transferToHost"));
        assert!(message.contains("user_type2_0"));
        assert!(message.contains("user_type3_0"));
        assert!(error.is_unauthorized());
    }

    #[test]
    fn test_store_errors_are_not_client_errors() {
        let error = ClaimError::store("put", PortError::connection("down"));
        assert!(!error.is_client_error());
        assert!(ClaimError::NotFound("K".into()).is_client_error());
    }
}
