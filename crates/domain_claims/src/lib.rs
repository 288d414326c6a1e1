//! Claim Custody Domain
//!
//! This crate implements the custody lifecycle of an insurance claim as it
//! moves between the initiating office, the host plan, the home plan and the
//! claims financial administrator (CFA).
//!
//! # Claim Lifecycle
//!
//! ```text
//! INITIATE -> HOST -> HOME -> HOME_AND_HOST -> CFA
//! ```
//!
//! Transfers are gated on the caller's role, not on the current stage. The
//! stage only decides which custodian [`LifecycleService::allow_to_update`]
//! hands the claim to.

pub mod claim;
pub mod command;
pub mod error;
pub mod lifecycle;
pub mod policy;
pub mod ports;
pub mod role;
pub mod stage;
pub mod store;

pub use claim::{Claim, SchemaVersion, UNDEFINED};
pub use command::Command;
pub use error::ClaimError;
pub use lifecycle::{Caller, LifecycleService};
pub use policy::{CallerSource, DetailsAccess, LifecyclePolicy, StageScope, UpdateByHomeGate};
pub use ports::{CallerIdentity, IdentityPort, LedgerPort, LedgerWrite};
pub use role::Role;
pub use stage::Stage;
pub use store::{ClaimStore, INDEX_KEY, STAGE_KEY};
