//! Claims Domain Ports
//!
//! This module defines the port interfaces the claim lifecycle consumes:
//!
//! - **`LedgerPort`**: the external key-value ledger (get/put/delete plus an
//!   ordered write batch)
//! - **`IdentityPort`**: resolves the invoking caller from its credential
//!
//! # Usage
//!
//! ```rust,ignore
//! use domain_claims::{LifecycleService, LifecyclePolicy};
//! use std::sync::Arc;
//!
//! let ledger: Arc<dyn LedgerPort> = Arc::new(MemoryLedger::new());
//! let identity: Arc<dyn IdentityPort> = Arc::new(TokenIdentity::from(claims));
//! let service = LifecycleService::new(ledger, identity, LifecyclePolicy::default());
//! ```

use async_trait::async_trait;

use core_kernel::{DomainPort, HealthCheckable, PortError};

use crate::role::Role;

/// One write of a ledger batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerWrite {
    Put { key: String, value: Vec<u8> },
    Delete { key: String },
}

impl LedgerWrite {
    pub fn put(key: impl Into<String>, value: Vec<u8>) -> Self {
        LedgerWrite::Put {
            key: key.into(),
            value,
        }
    }

    pub fn delete(key: impl Into<String>) -> Self {
        LedgerWrite::Delete { key: key.into() }
    }

    /// Key touched by this write
    pub fn key(&self) -> &str {
        match self {
            LedgerWrite::Put { key, .. } | LedgerWrite::Delete { key } => key,
        }
    }
}

/// The key-value ledger the claim records live in
///
/// Each single-key call is atomic and durable once it returns `Ok`.
#[async_trait]
pub trait LedgerPort: DomainPort + HealthCheckable {
    /// Reads the value stored under `key`, `None` if absent
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, PortError>;

    /// Stores `value` under `key`, overwriting any previous value
    async fn put(&self, key: &str, value: Vec<u8>) -> Result<(), PortError>;

    /// Removes `key`. Removing an absent key succeeds.
    async fn delete(&self, key: &str) -> Result<(), PortError>;

    /// Applies `writes` in order
    ///
    /// The default applies each write with its own call and stops at the
    /// first fault, so earlier writes stay applied. Adapters that can apply
    /// the batch all-or-nothing override this and [`LedgerPort::atomic_batches`].
    async fn commit(&self, writes: Vec<LedgerWrite>) -> Result<(), PortError> {
        for write in writes {
            match write {
                LedgerWrite::Put { key, value } => self.put(&key, value).await?,
                LedgerWrite::Delete { key } => self.delete(&key).await?,
            }
        }
        Ok(())
    }

    /// Whether [`LedgerPort::commit`] is all-or-nothing
    fn atomic_batches(&self) -> bool {
        false
    }
}

/// The invoking caller as reported by the identity provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    /// The `username` attribute of the caller's credential
    pub username: String,
}

impl CallerIdentity {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
        }
    }

    /// The custodian role carried by the username attribute
    pub fn role(&self) -> Option<Role> {
        Role::from_wire(&self.username)
    }
}

impl From<Role> for CallerIdentity {
    fn from(role: Role) -> Self {
        Self::new(role.as_wire())
    }
}

/// Resolves who is invoking the current command
#[async_trait]
pub trait IdentityPort: DomainPort {
    /// Returns the caller, or `PortError::Unauthorized` when the credential
    /// carries no usable attribute
    async fn resolve_caller(&self) -> Result<CallerIdentity, PortError>;
}

/// In-memory ledger and identity for testing
///
/// The ledger records every write and can be told to fault on given keys,
/// which lets tests observe the all-or-nothing and sequential batch paths.
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use std::collections::{HashMap, HashSet};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::sync::RwLock;

    use core_kernel::HealthCheckResult;

    /// In-memory implementation of LedgerPort
    #[derive(Debug, Default)]
    pub struct MockLedger {
        entries: Arc<RwLock<HashMap<String, Vec<u8>>>>,
        failing_keys: Arc<RwLock<HashSet<String>>>,
        writes: AtomicUsize,
        atomic: bool,
    }

    impl MockLedger {
        /// Ledger applying batches one write at a time
        pub fn new() -> Self {
            Self::default()
        }

        /// Ledger applying batches all-or-nothing
        pub fn atomic() -> Self {
            Self {
                atomic: true,
                ..Self::default()
            }
        }

        /// Makes every later put or delete of `key` fail
        pub async fn fail_writes_to(&self, key: impl Into<String>) {
            self.failing_keys.write().await.insert(key.into());
        }

        /// Clears injected faults
        pub async fn heal(&self) {
            self.failing_keys.write().await.clear();
        }

        /// Stores raw bytes, bypassing fault injection
        pub async fn seed(&self, key: impl Into<String>, value: impl Into<Vec<u8>>) {
            self.entries.write().await.insert(key.into(), value.into());
        }

        /// Raw bytes under `key`
        pub async fn raw(&self, key: &str) -> Option<Vec<u8>> {
            self.entries.read().await.get(key).cloned()
        }

        /// Copy of the whole ledger
        pub async fn snapshot(&self) -> HashMap<String, Vec<u8>> {
            self.entries.read().await.clone()
        }

        /// Number of successful single-key writes so far
        pub fn write_count(&self) -> usize {
            self.writes.load(Ordering::SeqCst)
        }

        async fn check(&self, key: &str) -> Result<(), PortError> {
            if self.failing_keys.read().await.contains(key) {
                return Err(PortError::internal(format!("injected fault writing '{}'", key)));
            }
            Ok(())
        }
    }

    impl DomainPort for MockLedger {}

    #[async_trait]
    impl HealthCheckable for MockLedger {
        async fn health_check(&self) -> HealthCheckResult {
            HealthCheckResult::healthy("mock-ledger", 0)
        }
    }

    #[async_trait]
    impl LedgerPort for MockLedger {
        async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, PortError> {
            Ok(self.entries.read().await.get(key).cloned())
        }

        async fn put(&self, key: &str, value: Vec<u8>) -> Result<(), PortError> {
            self.check(key).await?;
            self.entries.write().await.insert(key.to_string(), value);
            self.writes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn delete(&self, key: &str) -> Result<(), PortError> {
            self.check(key).await?;
            self.entries.write().await.remove(key);
            self.writes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn commit(&self, writes: Vec<LedgerWrite>) -> Result<(), PortError> {
            if !self.atomic {
                for write in writes {
                    match write {
                        LedgerWrite::Put { key, value } => self.put(&key, value).await?,
                        LedgerWrite::Delete { key } => self.delete(&key).await?,
                    }
                }
                return Ok(());
            }

            for write in &writes {
                self.check(write.key()).await?;
            }
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
                self.writes.fetch_add(1, Ordering::SeqCst);
            }
            Ok(())
        }

        fn atomic_batches(&self) -> bool {
            self.atomic
        }
    }

    /// Identity provider returning a fixed caller
    #[derive(Debug, Clone, Default)]
    pub struct StaticIdentity {
        caller: Option<CallerIdentity>,
    }

    impl StaticIdentity {
        /// Caller holding `role`
        pub fn role(role: Role) -> Self {
            Self {
                caller: Some(role.into()),
            }
        }

        /// Caller with an arbitrary username attribute
        pub fn username(username: impl Into<String>) -> Self {
            Self {
                caller: Some(CallerIdentity::new(username)),
            }
        }

        /// Credential without a username attribute
        pub fn anonymous() -> Self {
            Self::default()
        }
    }

    impl DomainPort for StaticIdentity {}

    #[async_trait]
    impl IdentityPort for StaticIdentity {
        async fn resolve_caller(&self) -> Result<CallerIdentity, PortError> {
            self.caller
                .clone()
                .ok_or_else(|| PortError::unauthorized("Couldn't get attribute 'username'"))
        }
    }
}
