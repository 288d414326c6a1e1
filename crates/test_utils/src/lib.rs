//! Test Utilities Crate
//!
//! Provides shared test infrastructure, fixtures, and helpers for the claim
//! ledger test suite.
//!
//! # Modules
//!
//! - `fixtures`: Wire role names and ready-made claim argument lists
//! - `builders`: Builder for positional `create` arguments
//! - `assertions`: Ledger and lifecycle assertion helpers
//! - `generators`: Property-based test data generators

pub mod assertions;
pub mod builders;
pub mod fixtures;
pub mod generators;

pub use assertions::*;
pub use builders::*;
pub use fixtures::*;
pub use generators::*;
