//! Claim record
//!
//! The record is a flat document of string fields. Amounts and counts stay
//! decimal strings exactly as submitted; nothing here parses or rounds them.

use serde::{Deserialize, Serialize};

use core_kernel::ClaimId;

use crate::error::ClaimError;
use crate::role::Role;

/// Sentinel stored in fields that no custodian has set yet
pub const UNDEFINED: &str = "UNDEFINED";

/// Positional layout of the create command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaVersion {
    /// Seven data fields; the creator comes from the identity port
    #[default]
    Minimal,
    /// Caller role followed by nineteen data fields
    Full,
}

impl SchemaVersion {
    /// Number of data fields a new claim is built from
    pub fn field_count(&self) -> usize {
        match self {
            SchemaVersion::Minimal => 7,
            SchemaVersion::Full => 19,
        }
    }

    /// Exact argument count of the create command
    pub fn arity(&self) -> usize {
        match self {
            SchemaVersion::Minimal => self.field_count(),
            SchemaVersion::Full => self.field_count() + 1,
        }
    }

    /// Whether the first create argument is the caller's asserted role
    pub fn leads_with_caller_role(&self) -> bool {
        matches!(self, SchemaVersion::Full)
    }
}

/// An insurance claim as stored in the ledger
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Claim {
    pub claim_id: String,
    pub provider_id: String,
    pub member_id: String,
    pub subscriber_id: String,

    pub service_date: String,
    pub admission_date: String,
    pub diag_code: String,
    pub procedure_code: String,
    pub procedure_date: String,
    pub bill_code: String,
    pub service_unit_count: String,
    pub revenue_code: String,
    pub revenue_desc: String,
    pub admission_hour_code: String,
    pub admission_type_code: String,
    pub admission_service_code: String,
    pub units_of_service: String,

    pub charged_amount: String,
    pub non_covered_amount: String,
    pub approved_amount: String,
    pub final_approved_amount: String,

    pub local_plan_code: String,
    pub remote_plan_code: String,
    pub cost_share: String,
    pub adjustment_flag: String,
    pub payment_method: String,

    /// Wire role of the current custodian
    pub owner: String,
}

impl Claim {
    /// Builds a new claim from the positional data fields of a create command
    ///
    /// `fields` must hold exactly `schema.field_count()` values in the
    /// schema's order. Fields the custodians fill in later start as
    /// [`UNDEFINED`] and the owner is the creating role.
    ///
    /// # Errors
    ///
    /// * `ClaimError::Arity` if the field count does not match the schema
    /// * `ClaimError::InvalidClaimId` if the first field is not a usable id
    pub fn from_fields(
        owner: Role,
        schema: SchemaVersion,
        fields: &[String],
    ) -> Result<Self, ClaimError> {
        if fields.len() != schema.field_count() {
            return Err(ClaimError::Arity {
                function: "create".to_string(),
                expected: schema.field_count(),
                actual: fields.len(),
            });
        }
        ClaimId::new(fields[0].as_str())?;

        let mut claim = Claim::pending(owner);
        let f = |i: usize| fields[i].clone();

        match schema {
            SchemaVersion::Minimal => {
                claim.claim_id = f(0);
                claim.service_date = f(1);
                claim.provider_id = f(2);
                claim.member_id = f(3);
                claim.subscriber_id = f(4);
                claim.procedure_code = f(5);
                claim.charged_amount = f(6);
            }
            SchemaVersion::Full => {
                claim.claim_id = f(0);
                claim.provider_id = f(1);
                claim.member_id = f(2);
                claim.subscriber_id = f(3);
                claim.service_date = f(4);
                claim.admission_date = f(5);
                claim.diag_code = f(6);
                claim.procedure_code = f(7);
                claim.procedure_date = f(8);
                claim.bill_code = f(9);
                claim.service_unit_count = f(10);
                claim.revenue_code = f(11);
                claim.revenue_desc = f(12);
                claim.admission_hour_code = f(13);
                claim.admission_type_code = f(14);
                claim.admission_service_code = f(15);
                claim.units_of_service = f(16);
                claim.charged_amount = f(17);
                claim.non_covered_amount = f(18);
            }
        }

        Ok(claim)
    }

    /// Empty claim with every custodian-owned field set to the sentinel
    fn pending(owner: Role) -> Self {
        Self {
            approved_amount: UNDEFINED.to_string(),
            final_approved_amount: UNDEFINED.to_string(),
            local_plan_code: UNDEFINED.to_string(),
            remote_plan_code: UNDEFINED.to_string(),
            cost_share: UNDEFINED.to_string(),
            adjustment_flag: UNDEFINED.to_string(),
            payment_method: UNDEFINED.to_string(),
            owner: owner.to_string(),
            ..Default::default()
        }
    }

    /// Returns the validated ledger key of this claim
    pub fn id(&self) -> Result<ClaimId, ClaimError> {
        Ok(ClaimId::new(self.claim_id.as_str())?)
    }

    /// Parses the owner field, `None` if it holds no recognized role
    pub fn owner_role(&self) -> Option<Role> {
        Role::from_wire(&self.owner)
    }

    /// Hands custody to `role`
    pub fn transfer_to(&mut self, role: Role) {
        self.owner = role.to_string();
    }

    /// Host adjudication: approved amount and plan codes
    pub fn record_host_review(
        &mut self,
        approved_amount: impl Into<String>,
        local_plan_code: impl Into<String>,
        remote_plan_code: impl Into<String>,
    ) {
        self.approved_amount = approved_amount.into();
        self.local_plan_code = local_plan_code.into();
        self.remote_plan_code = remote_plan_code.into();
    }

    /// Home adjustment: member cost share and adjustment flag
    pub fn record_home_adjustment(
        &mut self,
        cost_share: impl Into<String>,
        adjustment_flag: impl Into<String>,
    ) {
        self.cost_share = cost_share.into();
        self.adjustment_flag = adjustment_flag.into();
    }

    /// Settlement instructions forwarded to the CFA
    pub fn record_settlement(
        &mut self,
        final_approved_amount: impl Into<String>,
        payment_method: impl Into<String>,
    ) {
        self.final_approved_amount = final_approved_amount.into();
        self.payment_method = payment_method.into();
    }

    /// Serializes the claim for ledger storage
    pub fn encode(&self) -> Result<Vec<u8>, ClaimError> {
        serde_json::to_vec(self).map_err(|e| ClaimError::Encode {
            claim_id: self.claim_id.clone(),
            message: e.to_string(),
        })
    }

    /// Parses ledger bytes stored under `key`
    ///
    /// Missing fields default to empty strings; unknown fields are ignored.
    /// Anything that is not a JSON object of string values is rejected.
    pub fn decode(key: &str, bytes: &[u8]) -> Result<Self, ClaimError> {
        let value: serde_json::Value =
            serde_json::from_slice(bytes).map_err(|e| ClaimError::decode(key, e))?;
        // serde also accepts a positional array for structs
        if !value.is_object() {
            return Err(ClaimError::decode(key, "claim record is not a JSON object"));
        }
        serde_json::from_value(value).map_err(|e| ClaimError::decode(key, e))
    }
}
