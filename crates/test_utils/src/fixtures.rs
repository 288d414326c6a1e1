//! Pre-built Test Fixtures
//!
//! Consistent, predictable claim data for unit and integration tests.

use std::sync::Arc;

use core_kernel::ClaimId;
use domain_claims::ports::mock::{MockLedger, StaticIdentity};
use domain_claims::{LifecyclePolicy, LifecycleService, Role};

use crate::builders::CreateArgsBuilder;

/// Wire names of the four custodian roles
pub struct RoleFixtures;

impl RoleFixtures {
    pub const INITIATOR: &'static str = "user_type1_0";
    pub const HOST: &'static str = "user_type2_0";
    pub const HOME: &'static str = "user_type3_0";
    pub const CFA: &'static str = "user_type4_0";

    /// A role string no custodian holds
    pub const STRANGER: &'static str = "auditor";
}

/// Claim data fixtures
pub struct ClaimFixtures;

impl ClaimFixtures {
    /// Seven positional fields of a minimal-schema create
    pub fn minimal_args(claim_id: &str) -> Vec<String> {
        CreateArgsBuilder::new(claim_id).minimal()
    }

    /// Twenty positional arguments of a full-schema create, led by `caller`
    pub fn full_args(caller: &str, claim_id: &str) -> Vec<String> {
        CreateArgsBuilder::new(claim_id).full(caller)
    }
}

/// A lifecycle service over a fresh mock ledger
pub struct LifecycleFixture {
    pub ledger: Arc<MockLedger>,
    pub service: LifecycleService,
}

impl LifecycleFixture {
    /// Service trusting asserted roles, over an all-or-nothing ledger
    pub fn legacy() -> Self {
        Self::with_policy(LifecyclePolicy::legacy())
    }

    /// Service with `policy`; resolved callers are the Initiator
    pub fn with_policy(policy: LifecyclePolicy) -> Self {
        Self::over(Arc::new(MockLedger::atomic()), policy)
    }

    /// Service with `policy` over an existing mock ledger
    pub fn over(ledger: Arc<MockLedger>, policy: LifecyclePolicy) -> Self {
        let service = LifecycleService::new(
            ledger.clone(),
            Arc::new(StaticIdentity::role(Role::Initiator)),
            policy,
        );
        Self { ledger, service }
    }

    /// Service over the same ledger with no resolvable caller, so every
    /// command must assert its role
    pub fn anonymous(&self, policy: LifecyclePolicy) -> LifecycleService {
        LifecycleService::new(self.ledger.clone(), Arc::new(StaticIdentity::anonymous()), policy)
    }

    /// Service over the same ledger acting as `role`
    pub fn acting_as(&self, role: Role) -> LifecycleService {
        LifecycleService::new(
            self.ledger.clone(),
            Arc::new(StaticIdentity::role(role)),
            *self.service.policy(),
        )
    }

    /// Creates a minimal-schema claim owned by the Initiator
    pub async fn seed(&self, claim_id: &str) -> ClaimId {
        self.service
            .create(RoleFixtures::INITIATOR, &ClaimFixtures::minimal_args(claim_id))
            .await
            .expect("fixture claim is created");
        ClaimId::new(claim_id).expect("fixture id is valid")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain_claims::SchemaVersion;

    #[test]
    fn test_arg_lists_match_schema_arity() {
        assert_eq!(
            ClaimFixtures::minimal_args("K1").len(),
            SchemaVersion::Minimal.arity()
        );
        assert_eq!(
            ClaimFixtures::full_args(RoleFixtures::INITIATOR, "K1").len(),
            SchemaVersion::Full.arity()
        );
    }

    #[test]
    fn test_role_fixtures_are_wire_names() {
        assert_eq!(Role::from_wire(RoleFixtures::HOST), Some(Role::Host));
        assert_eq!(Role::from_wire(RoleFixtures::STRANGER), None);
    }

    #[tokio::test]
    async fn test_seeded_fixture() {
        let fixture = LifecycleFixture::legacy();
        let id = fixture.seed("K1").await;
        assert_eq!(fixture.service.list_claim_ids().await.unwrap(), vec![id.to_string()]);
    }
}
