//! Strongly-typed identifiers for ledger entities
//!
//! Claim identifiers are caller supplied and double as ledger keys, so they are
//! validated once at the edge and carried as a newtype afterwards.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// Ledger keys owned by the record store. A claim may not be stored under them.
pub const RESERVED_KEYS: [&str; 2] = ["State", "ClaimID"];

/// Identifier of a claim record, used verbatim as its ledger key
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClaimId(String);

impl ClaimId {
    /// Validates and wraps a caller-supplied identifier
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Validation` if the identifier is empty, contains a
    /// NUL character, or collides with a reserved register key.
    pub fn new(value: impl Into<String>) -> Result<Self, CoreError> {
        let value = value.into();
        if value.is_empty() {
            return Err(CoreError::validation("claim id must not be empty"));
        }
        if value.contains('\0') {
            return Err(CoreError::validation("claim id must not contain NUL"));
        }
        if RESERVED_KEYS.contains(&value.as_str()) {
            return Err(CoreError::validation(format!(
                "claim id '{}' is a reserved ledger key",
                value
            )));
        }
        Ok(Self(value))
    }

    /// Returns the identifier as a ledger key
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the identifier, returning the inner string
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ClaimId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ClaimId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for ClaimId {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ClaimId> for String {
    fn from(id: ClaimId) -> String {
        id.0
    }
}

impl AsRef<str> for ClaimId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claim_id_display() {
        let id = ClaimId::new("CLM-001").unwrap();
        assert_eq!(id.to_string(), "CLM-001");
        assert_eq!(id.as_str(), "CLM-001");
    }

    #[test]
    fn test_claim_id_rejects_empty() {
        assert!(ClaimId::new("").is_err());
    }

    #[test]
    fn test_claim_id_rejects_reserved_keys() {
        for key in RESERVED_KEYS {
            assert!(key.parse::<ClaimId>().is_err());
        }
    }
}
