//! Authentication and caller identity
//!
//! Bearer tokens carry the caller's custodian role. [`TokenIdentity`] turns a
//! validated token into the identity the claim lifecycle resolves callers
//! through.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use core_kernel::{DomainPort, PortError};
use domain_claims::{CallerIdentity, IdentityPort, Role};

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (username attribute)
    pub sub: String,
    /// Roles granted to the subject
    pub roles: Vec<String>,
    /// Expiration timestamp
    pub exp: i64,
    /// Issued at timestamp
    pub iat: i64,
}

/// Auth errors
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid token")]
    InvalidToken,
    #[error("Token expired")]
    TokenExpired,
}

/// Creates a new JWT token
///
/// # Arguments
///
/// * `subject` - Username attribute of the caller
/// * `roles` - Roles granted to the caller
/// * `secret` - JWT secret key
/// * `expiration_secs` - Token validity in seconds
pub fn create_token(
    subject: &str,
    roles: Vec<String>,
    secret: &str,
    expiration_secs: u64,
) -> Result<String, AuthError> {
    let now = Utc::now();
    let exp = now + Duration::seconds(expiration_secs as i64);

    let claims = Claims {
        sub: subject.to_string(),
        roles,
        exp: exp.timestamp(),
        iat: now.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|_| AuthError::InvalidToken)
}

/// Validates a JWT token
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, AuthError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        _ => AuthError::InvalidToken,
    })?;

    Ok(token_data.claims)
}

/// Identity port backed by a validated token
///
/// The caller is the first custodian role listed in the token's roles, or
/// the subject when none is listed.
#[derive(Debug, Clone)]
pub struct TokenIdentity {
    claims: Claims,
}

impl TokenIdentity {
    pub fn new(claims: Claims) -> Self {
        Self { claims }
    }

    /// Username attribute the token resolves to, if any
    pub fn username(&self) -> Option<&str> {
        self.claims
            .roles
            .iter()
            .map(String::as_str)
            .find(|r| Role::from_wire(r).is_some())
            .or_else(|| Some(self.claims.sub.as_str()).filter(|s| !s.is_empty()))
    }
}

impl From<Claims> for TokenIdentity {
    fn from(claims: Claims) -> Self {
        Self::new(claims)
    }
}

impl DomainPort for TokenIdentity {}

#[async_trait]
impl IdentityPort for TokenIdentity {
    async fn resolve_caller(&self) -> Result<CallerIdentity, PortError> {
        self.username()
            .map(CallerIdentity::new)
            .ok_or_else(|| PortError::unauthorized("Couldn't get attribute 'username'"))
    }
}
