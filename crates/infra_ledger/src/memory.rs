//! In-memory ledger
//!
//! Keeps every key in one map behind a single lock, so a write batch is
//! applied all or nothing. Nothing survives a restart.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use core_kernel::{DomainPort, HealthCheckResult, HealthCheckable, PortError};
use domain_claims::{LedgerPort, LedgerWrite};

/// Process-local implementation of [`LedgerPort`]
#[derive(Debug, Clone, Default)]
pub struct MemoryLedger {
    entries: Arc<RwLock<BTreeMap<String, Vec<u8>>>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently stored
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

impl DomainPort for MemoryLedger {}

#[async_trait]
impl HealthCheckable for MemoryLedger {
    async fn health_check(&self) -> HealthCheckResult {
        HealthCheckResult::healthy("memory-ledger", 0)
    }
}

#[async_trait]
impl LedgerPort for MemoryLedger {
    #[instrument(skip(self))]
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, PortError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    #[instrument(skip(self, value), fields(bytes = value.len()))]
    async fn put(&self, key: &str, value: Vec<u8>) -> Result<(), PortError> {
        self.entries.write().await.insert(key.to_string(), value);
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete(&self, key: &str) -> Result<(), PortError> {
        self.entries.write().await.remove(key);
        Ok(())
    }

    #[instrument(skip(self, writes), fields(writes = writes.len()))]
    async fn commit(&self, writes: Vec<LedgerWrite>) -> Result<(), PortError> {
        let mut entries = self.entries.write().await;
        for write in writes {
            match write {
                LedgerWrite::Put { key, value } => {
                    entries.insert(key, value);
                }
                LedgerWrite::Delete { key } => {
                    entries.remove(&key);
                }
            }
        }
        debug!(keys = entries.len(), "Batch applied");
        Ok(())
    }

    fn atomic_batches(&self) -> bool {
        true
    }
}
