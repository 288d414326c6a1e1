//! Property-Based Test Generators
//!
//! Proptest strategies producing claim data that satisfies the record
//! model's invariants.

use proptest::prelude::*;

use domain_claims::{Claim, Role, SchemaVersion, Stage};

/// Strategy for custodian roles
pub fn role_strategy() -> impl Strategy<Value = Role> {
    prop::sample::select(Role::ALL.to_vec())
}

/// Strategy for lifecycle stages
pub fn stage_strategy() -> impl Strategy<Value = Stage> {
    prop::sample::select(Stage::ALL.to_vec())
}

/// Strategy for usable claim ids
pub fn claim_id_strategy() -> impl Strategy<Value = String> {
    "[A-Z]{3}-[0-9]{1,8}"
}

/// Strategy for free-text field values, including quotes and non-ASCII
pub fn field_value_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        "[0-9]{1,6}\\.[0-9]{2}",
        "[A-Za-z0-9 ]{0,20}",
        any::<String>(),
        Just("room \"A\", bed 2".to_string()),
    ]
}

/// Strategy for the data fields of a `create` under `schema`
pub fn create_fields_strategy(schema: SchemaVersion) -> impl Strategy<Value = Vec<String>> {
    (
        claim_id_strategy(),
        prop::collection::vec(field_value_strategy(), schema.field_count() - 1),
    )
        .prop_map(|(id, rest)| {
            let mut fields = Vec::with_capacity(rest.len() + 1);
            fields.push(id);
            fields.extend(rest);
            fields
        })
}

/// Strategy for freshly created claims
pub fn claim_strategy(schema: SchemaVersion) -> impl Strategy<Value = Claim> {
    (role_strategy(), create_fields_strategy(schema)).prop_map(move |(owner, fields)| {
        Claim::from_fields(owner, schema, &fields).expect("generated fields are valid")
    })
}
