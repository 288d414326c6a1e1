//! Core Kernel - Foundational types shared by every crate in the workspace
//!
//! This crate provides the fundamental building blocks used across the ledger:
//! - Validated claim identifiers and the reserved ledger keys
//! - The port error type and adapter health abstractions
//! - Operation metadata for tracing

pub mod identifiers;
pub mod ports;
pub mod error;

pub use identifiers::{ClaimId, RESERVED_KEYS};
pub use ports::{
    PortError, DomainPort, HealthCheckable, HealthCheckResult, AdapterHealth,
    OperationMetadata,
};
pub use error::CoreError;
