//! Lifecycle state machine
//!
//! Custody transfers and field updates are gated on the caller's role only.
//! The stage a transfer starts from is not checked: any Host may move a claim
//! to `HOST` at any point, and a CFA may take custody from whatever stage the
//! register holds. Stages only matter to [`LifecycleService::allow_to_update`].
//!
//! | Operation             | Required role     | Claim effect                      | Stage         |
//! |-----------------------|-------------------|-----------------------------------|---------------|
//! | transfer_to_host      | Host              | owner := Host                     | HOST          |
//! | transfer_to_home      | Home              | owner := Home                     | HOME          |
//! | transfer_to_host_by_home | Host           | owner := Host                     | HOME_AND_HOST |
//! | transfer_to_cfa       | CFA               | owner := CFA                      | CFA           |
//! | update_by_host        | Host              | approved amount, plan codes       | -             |
//! | update_by_home        | policy (Host)     | cost share, adjustment flag       | -             |
//! | update_by_host_for_cfa | Host             | final amount, payment method      | -             |
//!
//! Every mutation loads the claim, authorizes, edits a copy, and writes it
//! back under the key it was loaded from. A rejected or failed call leaves
//! the ledger untouched.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use core_kernel::{ClaimId, OperationMetadata};

use crate::claim::Claim;
use crate::error::ClaimError;
use crate::policy::{CallerSource, DetailsAccess, LifecyclePolicy};
use crate::ports::{IdentityPort, LedgerPort};
use crate::role::Role;
use crate::stage::Stage;
use crate::store::ClaimStore;

/// The caller an operation runs on behalf of
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    /// Role string as asserted or resolved
    pub name: String,
    /// Parsed role, `None` for strings that name no custodian
    pub role: Option<Role>,
}

impl Caller {
    fn named(name: impl Into<String>) -> Self {
        let name = name.into();
        let role = Role::from_wire(&name);
        Self { name, role }
    }
}

/// Role-gated operations over claim records
#[derive(Clone)]
pub struct LifecycleService {
    store: ClaimStore,
    identity: Arc<dyn IdentityPort>,
    policy: LifecyclePolicy,
    metadata: OperationMetadata,
}

impl LifecycleService {
    /// Creates a service over `ledger`, resolving callers through `identity`
    pub fn new(
        ledger: Arc<dyn LedgerPort>,
        identity: Arc<dyn IdentityPort>,
        policy: LifecyclePolicy,
    ) -> Self {
        Self {
            store: ClaimStore::new(ledger, policy.stage_scope),
            identity,
            policy,
            metadata: OperationMetadata::default(),
        }
    }

    /// Attaches request metadata recorded on every operation span
    pub fn with_metadata(mut self, metadata: OperationMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn policy(&self) -> &LifecyclePolicy {
        &self.policy
    }

    pub fn store(&self) -> &ClaimStore {
        &self.store
    }

    // ------------------------------------------------------------------
    // Caller resolution
    // ------------------------------------------------------------------

    /// Determines who is calling
    ///
    /// With `Resolved` the identity provider decides and a non-empty asserted
    /// role must equal the resolved one. With `Asserted` a non-empty asserted
    /// role is taken as given and the provider is only asked when the command
    /// carried none.
    pub async fn resolve_caller(&self, operation: &str, asserted: &str) -> Result<Caller, ClaimError> {
        if self.policy.caller_source == CallerSource::Asserted && !asserted.is_empty() {
            return Ok(Caller::named(asserted));
        }

        let resolved = self
            .identity
            .resolve_caller()
            .await
            .map_err(ClaimError::Identity)?;

        if !asserted.is_empty() && asserted != resolved.username {
            warn!(
                operation,
                asserted,
                resolved = %resolved.username,
                "Asserted role does not match caller identity"
            );
            return Err(ClaimError::Unauthorized {
                operation: operation.to_string(),
                required: resolved.username,
                caller: asserted.to_string(),
            });
        }

        Ok(Caller::named(resolved.username))
    }

    async fn authorize(&self, operation: &str, asserted: &str, required: Role) -> Result<Caller, ClaimError> {
        let caller = self.resolve_caller(operation, asserted).await?;
        if caller.role != Some(required) {
            warn!(operation, caller = %caller.name, required = %required, "Caller role rejected");
            return Err(ClaimError::unauthorized(operation, required, caller.name));
        }
        Ok(caller)
    }

    // ------------------------------------------------------------------
    // Creation
    // ------------------------------------------------------------------

    /// Creates a claim owned by the calling role
    ///
    /// `fields` are the data fields of the configured schema, without a
    /// leading role. The stage register is reset to `INITIATE`.
    #[instrument(skip(self, fields), fields(correlation = %self.metadata.correlation()))]
    pub async fn create(&self, asserted: &str, fields: &[String]) -> Result<Claim, ClaimError> {
        let caller = self.resolve_caller("create", asserted).await?;
        let owner = caller.role.ok_or_else(|| ClaimError::Unauthorized {
            operation: "create".to_string(),
            required: "a custodian role".to_string(),
            caller: caller.name.clone(),
        })?;

        let claim = Claim::from_fields(owner, self.policy.schema, fields)?;
        let id = claim.id()?;
        self.store.create(&id, &claim).await?;

        info!(claim_id = %id, owner = %owner, "Claim created");
        Ok(claim)
    }

    // ------------------------------------------------------------------
    // Custody transfers
    // ------------------------------------------------------------------

    async fn transfer(
        &self,
        operation: &'static str,
        asserted: &str,
        id: &ClaimId,
        custodian: Role,
        stage: Stage,
    ) -> Result<Claim, ClaimError> {
        let mut claim = self.store.get(id).await?;
        self.authorize(operation, asserted, custodian).await?;

        let previous = claim.owner.clone();
        claim.transfer_to(custodian);
        self.store.save_with_stage(id, &claim, stage).await?;

        info!(
            claim_id = %id,
            from = %previous,
            to = %custodian,
            stage = %stage,
            "Claim custody transferred"
        );
        Ok(claim)
    }

    /// Host takes custody; stage becomes `HOST`
    #[instrument(skip(self), fields(correlation = %self.metadata.correlation()))]
    pub async fn transfer_to_host(&self, asserted: &str, id: &ClaimId) -> Result<Claim, ClaimError> {
        self.transfer("transferToHost", asserted, id, Role::Host, Stage::Host)
            .await
    }

    /// Home takes custody; stage becomes `HOME`
    #[instrument(skip(self), fields(correlation = %self.metadata.correlation()))]
    pub async fn transfer_to_home(&self, asserted: &str, id: &ClaimId) -> Result<Claim, ClaimError> {
        self.transfer("transferToHome", asserted, id, Role::Home, Stage::Home)
            .await
    }

    /// Host takes custody back from Home; stage becomes `HOME_AND_HOST`
    #[instrument(skip(self), fields(correlation = %self.metadata.correlation()))]
    pub async fn transfer_to_host_by_home(
        &self,
        asserted: &str,
        id: &ClaimId,
    ) -> Result<Claim, ClaimError> {
        self.transfer("transferToHostByHome", asserted, id, Role::Host, Stage::HomeAndHost)
            .await
    }

    /// CFA takes custody; stage becomes `CFA`
    #[instrument(skip(self), fields(correlation = %self.metadata.correlation()))]
    pub async fn transfer_to_cfa(&self, asserted: &str, id: &ClaimId) -> Result<Claim, ClaimError> {
        self.transfer("transferToCfa", asserted, id, Role::Cfa, Stage::Cfa)
            .await
    }

    // ------------------------------------------------------------------
    // Field updates
    // ------------------------------------------------------------------

    async fn update(
        &self,
        operation: &'static str,
        asserted: &str,
        id: &ClaimId,
        required: Role,
        edit: impl FnOnce(&mut Claim),
    ) -> Result<Claim, ClaimError> {
        let mut claim = self.store.get(id).await?;
        self.authorize(operation, asserted, required).await?;

        edit(&mut claim);
        self.store.save(id, &claim).await?;

        info!(claim_id = %id, operation, "Claim updated");
        Ok(claim)
    }

    /// Host records the approved amount and plan codes
    #[instrument(skip(self), fields(correlation = %self.metadata.correlation()))]
    pub async fn update_by_host(
        &self,
        asserted: &str,
        id: &ClaimId,
        approved_amount: &str,
        local_plan_code: &str,
        remote_plan_code: &str,
    ) -> Result<Claim, ClaimError> {
        self.update("updateByHost", asserted, id, Role::Host, |claim| {
            claim.record_host_review(approved_amount, local_plan_code, remote_plan_code)
        })
        .await
    }

    /// Cost share and adjustment flag, gated by the configured role
    #[instrument(skip(self), fields(correlation = %self.metadata.correlation()))]
    pub async fn update_by_home(
        &self,
        asserted: &str,
        id: &ClaimId,
        cost_share: &str,
        adjustment_flag: &str,
    ) -> Result<Claim, ClaimError> {
        let required = self.policy.update_by_home.role();
        self.update("updateByHome", asserted, id, required, |claim| {
            claim.record_home_adjustment(cost_share, adjustment_flag)
        })
        .await
    }

    /// Host records the final approved amount and payment method for the CFA
    #[instrument(skip(self), fields(correlation = %self.metadata.correlation()))]
    pub async fn update_by_host_for_cfa(
        &self,
        asserted: &str,
        id: &ClaimId,
        final_approved_amount: &str,
        payment_method: &str,
    ) -> Result<Claim, ClaimError> {
        self.update("updateByHostForCfa", asserted, id, Role::Host, |claim| {
            claim.record_settlement(final_approved_amount, payment_method)
        })
        .await
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Returns the full claim
    ///
    /// With `OwnerOnly` access the caller must be the current owner.
    #[instrument(skip(self), fields(correlation = %self.metadata.correlation()))]
    pub async fn get_claim_details(&self, asserted: &str, id: &ClaimId) -> Result<Claim, ClaimError> {
        let claim = self.store.get(id).await?;

        if self.policy.details_access == DetailsAccess::OwnerOnly {
            let caller = self.resolve_caller("getClaimDetails", asserted).await?;
            if caller.name != claim.owner {
                warn!(claim_id = %id, caller = %caller.name, owner = %claim.owner, "Not Authorized User");
                return Err(ClaimError::Unauthorized {
                    operation: "getClaimDetails".to_string(),
                    required: claim.owner.clone(),
                    caller: caller.name,
                });
            }
        }

        Ok(claim)
    }

    /// Returns the claim if the caller is the custodian the current stage
    /// belongs to, `None` otherwise
    #[instrument(skip(self), fields(correlation = %self.metadata.correlation()))]
    pub async fn allow_to_update(&self, asserted: &str, id: &ClaimId) -> Result<Option<Claim>, ClaimError> {
        let claim = self.store.get(id).await?;
        let stage = self.store.get_stage(id).await?;
        let caller = self.resolve_caller("allowToUpdate", asserted).await?;

        match caller.role {
            Some(role) if stage.permits(role) => Ok(Some(claim)),
            _ => {
                info!(claim_id = %id, caller = %caller.name, stage = %stage, "Claim not open to caller at this stage");
                Ok(None)
            }
        }
    }

    /// Current stage governing a claim
    pub async fn stage(&self, id: &ClaimId) -> Result<Stage, ClaimError> {
        self.store.get_stage(id).await
    }

    /// Ids of every claim ever created
    pub async fn list_claim_ids(&self) -> Result<Vec<String>, ClaimError> {
        self.store.list_claim_ids().await
    }

    /// Removes a claim record
    #[instrument(skip(self), fields(correlation = %self.metadata.correlation()))]
    pub async fn delete(&self, id: &ClaimId) -> Result<(), ClaimError> {
        self.store.delete(id).await?;
        info!(claim_id = %id, "Claim deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::mock::{MockLedger, StaticIdentity};

    fn fields(id: &str) -> Vec<String> {
        [id, "2017-01-05", "P1", "M1", "S1", "99213", "150.00"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    fn service(identity: StaticIdentity, policy: LifecyclePolicy) -> (Arc<MockLedger>, LifecycleService) {
        let ledger = Arc::new(MockLedger::atomic());
        let service = LifecycleService::new(ledger.clone(), Arc::new(identity), policy);
        (ledger, service)
    }

    #[tokio::test]
    async fn test_resolved_caller_rejects_impersonation() {
        let (_, svc) = service(StaticIdentity::role(Role::Home), LifecyclePolicy::default());

        let err = svc.resolve_caller("transferToHost", "user_type2_0").await.unwrap_err();
        assert!(err.is_unauthorized());

        let caller = svc.resolve_caller("transferToHome", "").await.unwrap();
        assert_eq!(caller.role, Some(Role::Home));
    }

    #[tokio::test]
    async fn test_asserted_caller_skips_identity() {
        let (_, svc) = service(StaticIdentity::anonymous(), LifecyclePolicy::legacy());

        let caller = svc.resolve_caller("transferToHost", "user_type2_0").await.unwrap();
        assert_eq!(caller.role, Some(Role::Host));

        let err = svc.resolve_caller("transferToHost", "").await.unwrap_err();
        assert!(matches!(err, ClaimError::Identity(_)));
    }

    #[tokio::test]
    async fn test_create_requires_custodian_role() {
        let (ledger, svc) = service(StaticIdentity::username("auditor"), LifecyclePolicy::default());

        let err = svc.create("", &fields("K1")).await.unwrap_err();
        assert!(err.is_unauthorized());
        assert!(ledger.snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn test_transfer_sets_owner_and_stage() {
        let (_, svc) = service(StaticIdentity::role(Role::Host), LifecyclePolicy::legacy());
        svc.create("user_type1_0", &fields("K1")).await.unwrap();
        let id = ClaimId::new("K1").unwrap();

        let claim = svc.transfer_to_host("user_type2_0", &id).await.unwrap();

        assert_eq!(claim.owner, "user_type2_0");
        assert_eq!(svc.stage(&id).await.unwrap(), Stage::Host);
    }
}
