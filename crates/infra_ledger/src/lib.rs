//! Ledger Infrastructure
//!
//! Adapters implementing the claim domain's [`domain_claims::LedgerPort`]:
//!
//! - [`MemoryLedger`]: process-local map, for tests and single-node demos
//! - [`PostgresLedger`]: `ledger_state` table accessed through a SQLx pool
//!
//! Both apply write batches all or nothing.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_ledger::{create_pool, DatabaseConfig, PostgresLedger};
//!
//! let pool = create_pool(DatabaseConfig::new("postgres://localhost/claims_ledger")).await?;
//! let ledger = PostgresLedger::new(pool);
//! ledger.ensure_schema().await?;
//! ```

pub mod error;
pub mod memory;
pub mod pool;
pub mod postgres;

pub use error::LedgerError;
pub use memory::MemoryLedger;
pub use pool::{create_pool, DatabaseConfig, DatabasePool};
pub use postgres::PostgresLedger;
