//! Record store
//!
//! Claim-aware helpers over the ledger port. Three kinds of keys live in the
//! ledger: each claim under its own id, the stage register under `"State"`
//! (or `"State\0<id>"` with per-claim scope), and the claim index under
//! `"ClaimID"`.
//!
//! Multi-key updates go out as one [`LedgerWrite`] batch with the stage
//! register first and the claim record last. Atomic adapters apply the batch
//! whole; with sequential adapters a fault can leave the stage ahead of the
//! claim, and resubmitting the same command repairs it.

use std::sync::Arc;

use tracing::{debug, instrument, warn};

use core_kernel::ClaimId;

use crate::claim::Claim;
use crate::error::ClaimError;
use crate::policy::StageScope;
use crate::ports::{LedgerPort, LedgerWrite};
use crate::stage::Stage;

/// Ledger key of the global stage register
pub const STAGE_KEY: &str = "State";

/// Ledger key of the claim index
pub const INDEX_KEY: &str = "ClaimID";

/// Claim persistence over a [`LedgerPort`]
#[derive(Clone)]
pub struct ClaimStore {
    ledger: Arc<dyn LedgerPort>,
    scope: StageScope,
}

impl ClaimStore {
    /// Creates a store with the given stage register scope
    pub fn new(ledger: Arc<dyn LedgerPort>, scope: StageScope) -> Self {
        Self { ledger, scope }
    }

    pub fn scope(&self) -> StageScope {
        self.scope
    }

    /// Ledger key of the stage register governing `id`
    pub fn stage_key(&self, id: &ClaimId) -> String {
        match self.scope {
            StageScope::Global => STAGE_KEY.to_string(),
            StageScope::PerClaim => format!("{}\0{}", STAGE_KEY, id),
        }
    }

    /// Loads a claim
    ///
    /// The ledger key is authoritative: the returned record's `claim_id` is
    /// `id`, whatever the stored `claimId` field holds.
    ///
    /// # Errors
    ///
    /// * `ClaimError::NotFound` if nothing is stored under `id`
    /// * `ClaimError::Decode` if the stored bytes are not a claim
    #[instrument(skip(self), fields(claim_id = %id))]
    pub async fn get(&self, id: &ClaimId) -> Result<Claim, ClaimError> {
        let bytes = self
            .ledger
            .get(id.as_str())
            .await
            .map_err(|e| ClaimError::store("get", e))?
            .ok_or_else(|| ClaimError::NotFound(id.to_string()))?;

        debug!(bytes = bytes.len(), "Loaded claim record");
        let mut claim = Claim::decode(id.as_str(), &bytes)?;
        if claim.claim_id != id.as_str() {
            warn!(stored = %claim.claim_id, "Stored claimId differs from its ledger key");
            claim.claim_id = id.to_string();
        }
        Ok(claim)
    }

    /// Stores a new claim, appends it to the index, and resets its stage
    /// register to `INITIATE`
    ///
    /// # Errors
    ///
    /// * `ClaimError::AlreadyExists` if any value is stored under `id`,
    ///   readable or not
    /// * `ClaimError::Store` if the batch fails
    #[instrument(skip(self, claim), fields(claim_id = %id))]
    pub async fn create(&self, id: &ClaimId, claim: &Claim) -> Result<(), ClaimError> {
        let existing = self
            .ledger
            .get(id.as_str())
            .await
            .map_err(|e| ClaimError::store("get", e))?;
        if existing.is_some() {
            return Err(ClaimError::AlreadyExists(id.to_string()));
        }

        let mut index = self.index_for_append().await?;
        if !index.iter().any(|known| known == id.as_str()) {
            index.push(id.to_string());
        }
        let index_bytes = serde_json::to_vec(&index).map_err(|e| ClaimError::Encode {
            claim_id: id.to_string(),
            message: e.to_string(),
        })?;

        let writes = vec![
            LedgerWrite::put(self.stage_key(id), Stage::Initiate.as_str().as_bytes().to_vec()),
            LedgerWrite::put(INDEX_KEY, index_bytes),
            LedgerWrite::put(id.as_str(), claim.encode()?),
        ];
        self.ledger
            .commit(writes)
            .await
            .map_err(|e| ClaimError::store("commit", e))?;

        debug!(indexed = index.len(), "Created claim record");
        Ok(())
    }

    /// Overwrites the claim stored under `id`
    #[instrument(skip(self, claim), fields(claim_id = %id))]
    pub async fn save(&self, id: &ClaimId, claim: &Claim) -> Result<(), ClaimError> {
        self.ledger
            .put(id.as_str(), claim.encode()?)
            .await
            .map_err(|e| ClaimError::store("put", e))?;

        debug!("Saved claim record");
        Ok(())
    }

    /// Overwrites the claim under `id` and moves its stage register in one
    /// batch
    #[instrument(skip(self, claim), fields(claim_id = %id, stage = %stage))]
    pub async fn save_with_stage(
        &self,
        id: &ClaimId,
        claim: &Claim,
        stage: Stage,
    ) -> Result<(), ClaimError> {
        let writes = vec![
            LedgerWrite::put(self.stage_key(id), stage.as_str().as_bytes().to_vec()),
            LedgerWrite::put(id.as_str(), claim.encode()?),
        ];
        self.ledger
            .commit(writes)
            .await
            .map_err(|e| ClaimError::store("commit", e))?;

        debug!(atomic = self.ledger.atomic_batches(), "Saved claim record and stage");
        Ok(())
    }

    /// Removes a claim record
    ///
    /// No existence check: deleting an absent claim succeeds. The index keeps
    /// the id, and a per-claim stage register is removed with the record.
    #[instrument(skip(self), fields(claim_id = %id))]
    pub async fn delete(&self, id: &ClaimId) -> Result<(), ClaimError> {
        let mut writes = Vec::with_capacity(2);
        if self.scope == StageScope::PerClaim {
            writes.push(LedgerWrite::delete(self.stage_key(id)));
        }
        writes.push(LedgerWrite::delete(id.as_str()));

        self.ledger
            .commit(writes)
            .await
            .map_err(|e| ClaimError::store("delete", e))?;

        debug!("Deleted claim record");
        Ok(())
    }

    /// Reads the stage register governing `id`
    ///
    /// An absent register reads as `INITIATE`.
    #[instrument(skip(self), fields(claim_id = %id))]
    pub async fn get_stage(&self, id: &ClaimId) -> Result<Stage, ClaimError> {
        let key = self.stage_key(id);
        let Some(bytes) = self
            .ledger
            .get(&key)
            .await
            .map_err(|e| ClaimError::store("get", e))?
        else {
            return Ok(Stage::Initiate);
        };

        let name = std::str::from_utf8(&bytes).map_err(|e| ClaimError::decode(&key, e))?;
        name.parse().map_err(|e| ClaimError::decode(&key, e))
    }

    /// Writes the stage register governing `id`
    #[instrument(skip(self), fields(claim_id = %id, stage = %stage))]
    pub async fn set_stage(&self, id: &ClaimId, stage: Stage) -> Result<(), ClaimError> {
        self.ledger
            .put(&self.stage_key(id), stage.as_str().as_bytes().to_vec())
            .await
            .map_err(|e| ClaimError::store("put", e))
    }

    /// Reads the claim index, empty if no claim was ever created
    pub async fn list_claim_ids(&self) -> Result<Vec<String>, ClaimError> {
        match self
            .ledger
            .get(INDEX_KEY)
            .await
            .map_err(|e| ClaimError::store("get", e))?
        {
            Some(bytes) => {
                serde_json::from_slice(&bytes).map_err(|e| ClaimError::decode(INDEX_KEY, e))
            }
            None => Ok(Vec::new()),
        }
    }

    /// Reads the index ahead of an append; an unreadable index starts over
    /// empty so it never blocks creation
    async fn index_for_append(&self) -> Result<Vec<String>, ClaimError> {
        match self.list_claim_ids().await {
            Err(ClaimError::Decode { message, .. }) => {
                warn!(error = %message, "Claim index unreadable, rebuilding from empty");
                Ok(Vec::new())
            }
            other => other,
        }
    }
}
