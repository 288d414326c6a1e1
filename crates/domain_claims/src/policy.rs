//! Lifecycle policy
//!
//! Deployment switches for the places where the legacy chaincode and the
//! corrected design disagree. Defaults keep the legacy observable behavior
//! except for caller resolution, which defaults to the identity provider.

use serde::{Deserialize, Serialize};

use crate::claim::SchemaVersion;
use crate::role::Role;

/// Where the lifecycle stage register lives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageScope {
    /// One register under `"State"` shared by every claim
    ///
    /// Claims in flight at the same time overwrite each other's stage, and
    /// creating a claim resets the shared stage to `INITIATE`.
    #[default]
    Global,
    /// One register per claim
    PerClaim,
}

/// Where the caller's role comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallerSource {
    /// The identity provider decides; an asserted role must agree with it
    #[default]
    Resolved,
    /// The role asserted in the command arguments is trusted as given
    Asserted,
}

/// Role gating `updateByHome`
///
/// The legacy chaincode checks `Host` here. Whether home-office updates are
/// proxied through the host or the check is a defect was never settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateByHomeGate {
    #[default]
    Host,
    Home,
}

impl UpdateByHomeGate {
    pub fn role(&self) -> Role {
        match self {
            UpdateByHomeGate::Host => Role::Host,
            UpdateByHomeGate::Home => Role::Home,
        }
    }
}

/// Who may read a claim through `getClaimDetails`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetailsAccess {
    /// Anyone
    #[default]
    Open,
    /// Only the current custodian
    OwnerOnly,
}

/// Full set of lifecycle switches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LifecyclePolicy {
    pub schema: SchemaVersion,
    pub stage_scope: StageScope,
    pub caller_source: CallerSource,
    pub update_by_home: UpdateByHomeGate,
    pub details_access: DetailsAccess,
}

impl LifecyclePolicy {
    /// Legacy chaincode behavior, including trusting asserted roles
    pub fn legacy() -> Self {
        Self {
            caller_source: CallerSource::Asserted,
            ..Self::default()
        }
    }

    pub fn with_schema(mut self, schema: SchemaVersion) -> Self {
        self.schema = schema;
        self
    }

    pub fn with_stage_scope(mut self, scope: StageScope) -> Self {
        self.stage_scope = scope;
        self
    }

    pub fn with_caller_source(mut self, source: CallerSource) -> Self {
        self.caller_source = source;
        self
    }

    pub fn with_update_by_home(mut self, gate: UpdateByHomeGate) -> Self {
        self.update_by_home = gate;
        self
    }

    pub fn with_details_access(mut self, access: DetailsAccess) -> Self {
        self.details_access = access;
        self
    }
}
