//! PostgreSQL Ledger Adapter
//!
//! Stores every ledger key as one row of `ledger_state`. Keys are kept as
//! bytes because per-claim stage keys contain a NUL separator, which
//! PostgreSQL text columns reject.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_ledger::{create_pool, DatabaseConfig, PostgresLedger};
//! use std::sync::Arc;
//!
//! let pool = create_pool(DatabaseConfig::new(url)).await?;
//! let ledger = PostgresLedger::new(pool);
//! ledger.ensure_schema().await?;
//! let port: Arc<dyn LedgerPort> = Arc::new(ledger);
//! ```

use std::time::Instant;

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, info, instrument};

use core_kernel::{DomainPort, HealthCheckResult, HealthCheckable, PortError};
use domain_claims::{LedgerPort, LedgerWrite};

use crate::error::LedgerError;

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS ledger_state (
    key BYTEA PRIMARY KEY,
    value BYTEA NOT NULL,
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
)";

const SELECT_VALUE: &str = "SELECT value FROM ledger_state WHERE key = $1";

const UPSERT_VALUE: &str = "INSERT INTO ledger_state (key, value) VALUES ($1, $2)
    ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value, updated_at = now()";

const DELETE_KEY: &str = "DELETE FROM ledger_state WHERE key = $1";

/// PostgreSQL-backed implementation of [`LedgerPort`]
///
/// Write batches run inside one transaction, so a failed batch leaves no
/// partial writes behind.
#[derive(Debug, Clone)]
pub struct PostgresLedger {
    pool: PgPool,
}

impl PostgresLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Creates the `ledger_state` table if it does not exist
    #[instrument(skip(self))]
    pub async fn ensure_schema(&self) -> Result<(), LedgerError> {
        sqlx::query(CREATE_TABLE)
            .execute(&self.pool)
            .await
            .map_err(|e| LedgerError::SchemaFailed(e.to_string()))?;
        info!("Ledger schema ready");
        Ok(())
    }

    async fn fetch(&self, key: &str) -> Result<Option<Vec<u8>>, LedgerError> {
        let value = sqlx::query_scalar::<_, Vec<u8>>(SELECT_VALUE)
            .bind(key.as_bytes())
            .fetch_optional(&self.pool)
            .await?;
        Ok(value)
    }

    async fn apply(&self, writes: Vec<LedgerWrite>) -> Result<(), LedgerError> {
        let mut tx = self.pool.begin().await?;

        for write in &writes {
            match write {
                LedgerWrite::Put { key, value } => {
                    sqlx::query(UPSERT_VALUE)
                        .bind(key.as_bytes())
                        .bind(value.as_slice())
                        .execute(&mut *tx)
                        .await?;
                }
                LedgerWrite::Delete { key } => {
                    sqlx::query(DELETE_KEY)
                        .bind(key.as_bytes())
                        .execute(&mut *tx)
                        .await?;
                }
            }
        }

        tx.commit()
            .await
            .map_err(|e| LedgerError::TransactionFailed(e.to_string()))?;
        Ok(())
    }
}

impl DomainPort for PostgresLedger {}

#[async_trait]
impl HealthCheckable for PostgresLedger {
    /// Runs `SELECT 1` against the pool
    async fn health_check(&self) -> HealthCheckResult {
        let start = Instant::now();

        let result = sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await;

        match result {
            Ok(_) => HealthCheckResult::healthy(
                "postgres-ledger",
                start.elapsed().as_millis() as u64,
            ),
            Err(e) => HealthCheckResult::unhealthy(
                "postgres-ledger",
                format!("Database error: {}", e),
            ),
        }
    }
}

#[async_trait]
impl LedgerPort for PostgresLedger {
    #[instrument(skip(self))]
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, PortError> {
        let value = self.fetch(key).await?;
        debug!(found = value.is_some(), "Ledger read");
        Ok(value)
    }

    #[instrument(skip(self, value), fields(bytes = value.len()))]
    async fn put(&self, key: &str, value: Vec<u8>) -> Result<(), PortError> {
        sqlx::query(UPSERT_VALUE)
            .bind(key.as_bytes())
            .bind(value.as_slice())
            .execute(&self.pool)
            .await
            .map_err(LedgerError::from)?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete(&self, key: &str) -> Result<(), PortError> {
        sqlx::query(DELETE_KEY)
            .bind(key.as_bytes())
            .execute(&self.pool)
            .await
            .map_err(LedgerError::from)?;
        Ok(())
    }

    #[instrument(skip(self, writes), fields(writes = writes.len()))]
    async fn commit(&self, writes: Vec<LedgerWrite>) -> Result<(), PortError> {
        self.apply(writes).await?;
        debug!("Ledger batch committed");
        Ok(())
    }

    fn atomic_batches(&self) -> bool {
        true
    }
}
