//! Custom Test Assertions
//!
//! Assertion helpers for ledger contents and lifecycle outcomes that give
//! more useful failure messages than bare `assert_eq!`.

use std::collections::{BTreeSet, HashMap};

use core_kernel::ClaimId;
use domain_claims::{Claim, ClaimError, LifecycleService, Stage};

/// Asserts that two ledger snapshots hold the same keys and bytes
///
/// # Panics
///
/// Lists every key that was added, removed, or changed.
pub fn assert_ledger_unchanged(before: &HashMap<String, Vec<u8>>, after: &HashMap<String, Vec<u8>>) {
    let keys: BTreeSet<&String> = before.keys().chain(after.keys()).collect();
    let changed: Vec<String> = keys
        .into_iter()
        .filter(|k| before.get(*k) != after.get(*k))
        .map(|k| format!("{:?}", k))
        .collect();

    assert!(changed.is_empty(), "Ledger keys changed: {}", changed.join(", "));
}

/// Asserts that `result` is an authorization failure
pub fn assert_unauthorized<T: std::fmt::Debug>(result: Result<T, ClaimError>) {
    match result {
        Err(ClaimError::Unauthorized { .. }) => {}
        other => panic!("Expected authorization failure, got {:?}", other),
    }
}

/// Asserts that `result` is an exact-arity failure expecting `expected`
pub fn assert_arity<T: std::fmt::Debug>(result: Result<T, ClaimError>, expected: usize) {
    match result {
        Err(ClaimError::Arity { expected: e, .. }) if e == expected => {}
        other => panic!("Expected arity failure ({} arguments), got {:?}", expected, other),
    }
}

/// Asserts that the stage register governing `id` holds `expected`
pub async fn assert_stage(service: &LifecycleService, id: &ClaimId, expected: Stage) {
    let actual = service.stage(id).await.expect("stage register readable");
    assert_eq!(actual, expected, "Stage mismatch for claim {}", id);
}

/// Asserts that the stored claim owner is the wire name `expected`
pub async fn assert_owner(service: &LifecycleService, id: &ClaimId, expected: &str) {
    let claim: Claim = service
        .get_claim_details("", id)
        .await
        .expect("claim readable");
    assert_eq!(claim.owner, expected, "Owner mismatch for claim {}", id);
}
