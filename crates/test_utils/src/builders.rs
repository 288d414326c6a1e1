//! Test Data Builders
//!
//! Builds positional `create` argument lists with sensible defaults, so
//! tests only spell out the fields they care about.

use domain_claims::{Claim, Role, SchemaVersion};

/// Builder for the positional arguments of a `create` command
#[derive(Debug, Clone)]
pub struct CreateArgsBuilder {
    claim: Claim,
}

impl CreateArgsBuilder {
    /// Starts from a plausible outpatient claim with id `claim_id`
    pub fn new(claim_id: impl Into<String>) -> Self {
        let claim = Claim {
            claim_id: claim_id.into(),
            provider_id: "PRV-1001".to_string(),
            member_id: "MBR-2002".to_string(),
            subscriber_id: "SUB-3003".to_string(),
            service_date: "2017-01-05".to_string(),
            admission_date: "2017-01-04".to_string(),
            diag_code: "J45.909".to_string(),
            procedure_code: "99213".to_string(),
            procedure_date: "2017-01-05".to_string(),
            bill_code: "0131".to_string(),
            service_unit_count: "1".to_string(),
            revenue_code: "0450".to_string(),
            revenue_desc: "Emergency room".to_string(),
            admission_hour_code: "07".to_string(),
            admission_type_code: "1".to_string(),
            admission_service_code: "2".to_string(),
            units_of_service: "1".to_string(),
            charged_amount: "150.00".to_string(),
            non_covered_amount: "0.00".to_string(),
            ..Claim::default()
        };
        Self { claim }
    }

    pub fn with_provider_id(mut self, value: impl Into<String>) -> Self {
        self.claim.provider_id = value.into();
        self
    }

    pub fn with_member_id(mut self, value: impl Into<String>) -> Self {
        self.claim.member_id = value.into();
        self
    }

    pub fn with_procedure_code(mut self, value: impl Into<String>) -> Self {
        self.claim.procedure_code = value.into();
        self
    }

    pub fn with_charged_amount(mut self, value: impl Into<String>) -> Self {
        self.claim.charged_amount = value.into();
        self
    }

    pub fn with_non_covered_amount(mut self, value: impl Into<String>) -> Self {
        self.claim.non_covered_amount = value.into();
        self
    }

    /// Seven fields in minimal-schema order
    pub fn minimal(&self) -> Vec<String> {
        let c = &self.claim;
        vec![
            c.claim_id.clone(),
            c.service_date.clone(),
            c.provider_id.clone(),
            c.member_id.clone(),
            c.subscriber_id.clone(),
            c.procedure_code.clone(),
            c.charged_amount.clone(),
        ]
    }

    /// Caller role followed by the nineteen full-schema fields
    pub fn full(&self, caller: &str) -> Vec<String> {
        let c = &self.claim;
        vec![
            caller.to_string(),
            c.claim_id.clone(),
            c.provider_id.clone(),
            c.member_id.clone(),
            c.subscriber_id.clone(),
            c.service_date.clone(),
            c.admission_date.clone(),
            c.diag_code.clone(),
            c.procedure_code.clone(),
            c.procedure_date.clone(),
            c.bill_code.clone(),
            c.service_unit_count.clone(),
            c.revenue_code.clone(),
            c.revenue_desc.clone(),
            c.admission_hour_code.clone(),
            c.admission_type_code.clone(),
            c.admission_service_code.clone(),
            c.units_of_service.clone(),
            c.charged_amount.clone(),
            c.non_covered_amount.clone(),
        ]
    }

    /// Arguments of a `create` command under `schema`
    pub fn args(&self, schema: SchemaVersion, caller: &str) -> Vec<String> {
        match schema {
            SchemaVersion::Minimal => self.minimal(),
            SchemaVersion::Full => self.full(caller),
        }
    }

    /// The claim a `create` under `schema` by `owner` is expected to store
    pub fn expected_claim(&self, schema: SchemaVersion, owner: Role) -> Claim {
        let fields = match schema {
            SchemaVersion::Minimal => self.minimal(),
            SchemaVersion::Full => self.full("")[1..].to_vec(),
        };
        Claim::from_fields(owner, schema, &fields).expect("builder fields are valid")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain_claims::UNDEFINED;

    #[test]
    fn test_overrides_land_in_both_layouts() {
        let builder = CreateArgsBuilder::new("K1").with_charged_amount("999.00");

        assert_eq!(builder.minimal()[6], "999.00");
        assert_eq!(builder.full("user_type1_0")[18], "999.00");
    }

    #[test]
    fn test_expected_claim() {
        let builder = CreateArgsBuilder::new("K1").with_provider_id("PRV-7");

        let minimal = builder.expected_claim(SchemaVersion::Minimal, Role::Initiator);
        assert_eq!(minimal.provider_id, "PRV-7");
        assert_eq!(minimal.admission_date, "");
        assert_eq!(minimal.approved_amount, UNDEFINED);

        let full = builder.expected_claim(SchemaVersion::Full, Role::Initiator);
        assert_eq!(full.admission_date, "2017-01-04");
        assert_eq!(full.owner, "user_type1_0");
    }
}
