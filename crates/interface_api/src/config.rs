//! API configuration

use serde::Deserialize;

use core_kernel::CoreError;
use domain_claims::{
    CallerSource, DetailsAccess, LifecyclePolicy, SchemaVersion, StageScope, UpdateByHomeGate,
};

/// Which ledger adapter backs the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LedgerBackend {
    #[default]
    Memory,
    Postgres,
}

/// API configuration
///
/// Every key can be set through an `API_`-prefixed environment variable,
/// e.g. `API_STAGE_SCOPE=per_claim`. Missing keys take their defaults.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// JWT secret for authentication
    pub jwt_secret: String,
    pub ledger_backend: LedgerBackend,
    /// Required when `ledger_backend` is `postgres`
    pub database_url: Option<String>,
    /// Log level
    pub log_level: String,

    pub schema_version: SchemaVersion,
    pub stage_scope: StageScope,
    pub caller_source: CallerSource,
    pub update_by_home_gate: UpdateByHomeGate,
    pub details_access: DetailsAccess,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            jwt_secret: "change-me-in-production".to_string(),
            ledger_backend: LedgerBackend::Memory,
            database_url: None,
            log_level: "info".to_string(),
            schema_version: SchemaVersion::default(),
            stage_scope: StageScope::default(),
            caller_source: CallerSource::default(),
            update_by_home_gate: UpdateByHomeGate::default(),
            details_access: DetailsAccess::default(),
        }
    }
}

impl ApiConfig {
    /// Loads configuration from environment
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::Environment::with_prefix("API"))
            .build()?
            .try_deserialize()
    }

    /// Checks settings that only make sense together
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.jwt_secret.is_empty() {
            return Err(CoreError::configuration("jwt_secret must not be empty"));
        }
        if self.ledger_backend == LedgerBackend::Postgres
            && self.database_url.as_deref().map_or(true, str::is_empty)
        {
            return Err(CoreError::configuration(
                "database_url is required for the postgres ledger backend",
            ));
        }
        Ok(())
    }

    /// Lifecycle switches for the claim domain
    pub fn lifecycle_policy(&self) -> LifecyclePolicy {
        LifecyclePolicy::default()
            .with_schema(self.schema_version)
            .with_stage_scope(self.stage_scope)
            .with_caller_source(self.caller_source)
            .with_update_by_home(self.update_by_home_gate)
            .with_details_access(self.details_access)
    }

    /// Returns the server address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
