//! Comprehensive tests for the claim lifecycle state machine

use std::sync::Arc;

use core_kernel::ClaimId;

use domain_claims::ports::mock::MockLedger;
use domain_claims::{
    Claim, ClaimError, Command, DetailsAccess, LedgerPort, LifecyclePolicy, Role, SchemaVersion,
    Stage, StageScope, UpdateByHomeGate, STAGE_KEY,
};
use test_utils::{
    assert_arity, assert_ledger_unchanged, assert_unauthorized, ClaimFixtures, CreateArgsBuilder,
    LifecycleFixture, RoleFixtures,
};

const INITIATOR: &str = RoleFixtures::INITIATOR;
const HOST: &str = RoleFixtures::HOST;
const HOME: &str = RoleFixtures::HOME;
const CFA: &str = RoleFixtures::CFA;

fn id(raw: &str) -> ClaimId {
    ClaimId::new(raw).unwrap()
}

/// Legacy fixture holding one Initiator-owned claim `K1`
async fn seeded() -> LifecycleFixture {
    let fixture = LifecycleFixture::legacy();
    fixture.seed("K1").await;
    fixture
}

// ============================================================================
// Creation
// ============================================================================

mod create_tests {
    use super::*;

    #[tokio::test]
    async fn test_create_initializes_claim_index_and_stage() {
        let fixture = seeded().await;
        let svc = &fixture.service;

        let claim = svc.get_claim_details(INITIATOR, &id("K1")).await.unwrap();
        assert_eq!(claim.owner, INITIATOR);
        assert_eq!(svc.stage(&id("K1")).await.unwrap(), Stage::Initiate);
        assert_eq!(svc.list_claim_ids().await.unwrap(), vec!["K1".to_string()]);
    }

    #[tokio::test]
    async fn test_duplicate_create_keeps_first_record() {
        let fixture = seeded().await;
        let before = fixture.ledger.snapshot().await;

        let fields = CreateArgsBuilder::new("K1")
            .with_charged_amount("999.99")
            .minimal();
        let err = fixture.service.create(INITIATOR, &fields).await.unwrap_err();

        assert!(matches!(err, ClaimError::AlreadyExists(ref k) if k == "K1"));
        assert_ledger_unchanged(&before, &fixture.ledger.snapshot().await);
    }

    #[tokio::test]
    async fn test_create_with_six_arguments_writes_nothing() {
        let fixture = LifecycleFixture::legacy();

        let mut fields = ClaimFixtures::minimal_args("K1");
        fields.pop();
        assert_arity(Command::parse("create", &fields, SchemaVersion::Minimal), 7);
        assert_arity(fixture.service.create(INITIATOR, &fields).await, 7);
        assert_eq!(fixture.ledger.write_count(), 0);
    }

    #[tokio::test]
    async fn test_minimal_create_owner_comes_from_identity() {
        let fixture = LifecycleFixture::with_policy(LifecyclePolicy::default());

        let claim = fixture
            .service
            .create("", &ClaimFixtures::minimal_args("K1"))
            .await
            .unwrap();
        assert_eq!(claim.owner_role(), Some(Role::Initiator));
    }

    #[tokio::test]
    async fn test_full_schema_create_through_command() {
        let fixture = LifecycleFixture::legacy();
        let svc = fixture.anonymous(LifecyclePolicy::legacy().with_schema(SchemaVersion::Full));
        let builder = CreateArgsBuilder::new("K20")
            .with_provider_id("PRV-20")
            .with_member_id("MBR-20")
            .with_procedure_code("99214")
            .with_non_covered_amount("12.50");

        let command = Command::parse("init", &builder.full(INITIATOR), SchemaVersion::Full).unwrap();
        assert_eq!(command.execute(&svc).await.unwrap(), None);

        let claim = svc.get_claim_details("", &id("K20")).await.unwrap();
        assert_eq!(claim, builder.expected_claim(SchemaVersion::Full, Role::Initiator));
        assert_eq!(claim.non_covered_amount, "12.50");
    }

    #[tokio::test]
    async fn test_full_fixture_args_need_full_schema() {
        let fixture = LifecycleFixture::legacy();
        let args = ClaimFixtures::full_args(INITIATOR, "K21");

        assert_arity(Command::parse("create", &args, SchemaVersion::Minimal), 7);
        assert!(Command::parse("create", &args, SchemaVersion::Full).is_ok());
        assert!(fixture.ledger.snapshot().await.is_empty());
    }
}

// ============================================================================
// Transfers and Updates
// ============================================================================

mod transition_tests {
    use super::*;

    #[tokio::test]
    async fn test_transfer_to_host_sets_owner_and_stage() {
        let fixture = seeded().await;
        let svc = &fixture.service;

        svc.transfer_to_host(HOST, &id("K1")).await.unwrap();

        let claim = svc.get_claim_details(HOST, &id("K1")).await.unwrap();
        assert_eq!(claim.owner, HOST);
        assert_eq!(svc.stage(&id("K1")).await.unwrap(), Stage::Host);
    }

    #[tokio::test]
    async fn test_update_by_host_changes_only_its_fields() {
        let fixture = seeded().await;
        let svc = &fixture.service;
        let created = svc.get_claim_details(INITIATOR, &id("K1")).await.unwrap();

        svc.update_by_host(HOST, &id("K1"), "500", "LP1", "RP1").await.unwrap();

        let claim = svc.get_claim_details(HOST, &id("K1")).await.unwrap();
        assert_eq!(
            claim,
            Claim {
                approved_amount: "500".to_string(),
                local_plan_code: "LP1".to_string(),
                remote_plan_code: "RP1".to_string(),
                ..created
            }
        );
    }

    #[tokio::test]
    async fn test_full_custody_chain() {
        let fixture = seeded().await;
        let svc = &fixture.service;
        let k1 = id("K1");

        svc.transfer_to_host(HOST, &k1).await.unwrap();
        svc.update_by_host(HOST, &k1, "500", "LP1", "RP1").await.unwrap();
        svc.transfer_to_home(HOME, &k1).await.unwrap();
        assert_eq!(svc.stage(&k1).await.unwrap(), Stage::Home);
        svc.update_by_home(HOST, &k1, "25", "N").await.unwrap();
        svc.transfer_to_host_by_home(HOST, &k1).await.unwrap();
        assert_eq!(svc.stage(&k1).await.unwrap(), Stage::HomeAndHost);
        svc.update_by_host_for_cfa(HOST, &k1, "475", "EFT").await.unwrap();
        svc.transfer_to_cfa(CFA, &k1).await.unwrap();

        let claim = svc.get_claim_details(CFA, &k1).await.unwrap();
        assert_eq!(claim.owner, CFA);
        assert_eq!(claim.cost_share, "25");
        assert_eq!(claim.final_approved_amount, "475");
        assert_eq!(claim.payment_method, "EFT");
        assert_eq!(svc.stage(&k1).await.unwrap(), Stage::Cfa);
    }

    #[tokio::test]
    async fn test_source_stage_is_not_checked() {
        let fixture = seeded().await;
        let svc = &fixture.service;

        svc.transfer_to_cfa(CFA, &id("K1")).await.unwrap();
        assert_eq!(svc.stage(&id("K1")).await.unwrap(), Stage::Cfa);
    }

    #[tokio::test]
    async fn test_update_by_home_gate_is_configurable() {
        let fixture = seeded().await;
        let svc = fixture.anonymous(
            LifecyclePolicy::legacy().with_update_by_home(UpdateByHomeGate::Home),
        );

        assert_unauthorized(svc.update_by_home(HOST, &id("K1"), "25", "N").await);
        svc.update_by_home(HOME, &id("K1"), "25", "N").await.unwrap();
    }

    #[tokio::test]
    async fn test_missing_and_corrupt_claims() {
        let fixture = LifecycleFixture::legacy();
        let svc = &fixture.service;

        let err = svc.transfer_to_host(HOST, &id("NOPE")).await.unwrap_err();
        assert!(matches!(err, ClaimError::NotFound(ref k) if k == "NOPE"));

        fixture.ledger.seed("BAD", "{not json").await;
        let err = svc.transfer_to_host(HOST, &id("BAD")).await.unwrap_err();
        assert!(matches!(err, ClaimError::Decode { ref key, .. } if key == "BAD"));
    }
}

// ============================================================================
// Ledger Key Addressing
// ============================================================================

mod addressing_tests {
    use super::*;

    #[tokio::test]
    async fn test_transfer_of_record_without_claim_id_field() {
        let fixture = LifecycleFixture::legacy();
        fixture
            .ledger
            .seed("K1", r#"{"owner":"user_type1_0","chargedAmount":"10"}"#)
            .await;

        let claim = fixture.service.transfer_to_host(HOST, &id("K1")).await.unwrap();

        assert_eq!(claim.owner, HOST);
        assert_eq!(claim.claim_id, "K1");
        let stored = Claim::decode("K1", &fixture.ledger.raw("K1").await.unwrap()).unwrap();
        assert_eq!(stored.owner, HOST);
        assert_eq!(stored.charged_amount, "10");
    }

    #[tokio::test]
    async fn test_update_writes_under_loaded_key_not_stored_claim_id() {
        let fixture = LifecycleFixture::legacy();
        fixture
            .ledger
            .seed("K1", r#"{"claimId":"K2","owner":"user_type1_0","chargedAmount":"1"}"#)
            .await;
        fixture
            .ledger
            .seed("K2", r#"{"claimId":"K2","owner":"user_type1_0","chargedAmount":"900"}"#)
            .await;
        let k2_before = fixture.ledger.raw("K2").await;

        fixture
            .service
            .update_by_host(HOST, &id("K1"), "500", "LP1", "RP1")
            .await
            .unwrap();

        assert_eq!(fixture.ledger.raw("K2").await, k2_before);
        let k1 = Claim::decode("K1", &fixture.ledger.raw("K1").await.unwrap()).unwrap();
        assert_eq!(k1.claim_id, "K1");
        assert_eq!(k1.charged_amount, "1");
        assert_eq!(k1.approved_amount, "500");
    }
}

// ============================================================================
// Authorization
// ============================================================================

mod authorization_tests {
    use super::*;

    #[tokio::test]
    async fn test_wrong_role_leaves_ledger_untouched() {
        let fixture = seeded().await;
        let svc = &fixture.service;
        let k1 = id("K1");
        let before = fixture.ledger.snapshot().await;

        assert_unauthorized(svc.transfer_to_host(HOME, &k1).await);
        assert_unauthorized(svc.transfer_to_home(HOST, &k1).await);
        assert_unauthorized(svc.transfer_to_host_by_home(HOME, &k1).await);
        assert_unauthorized(svc.transfer_to_cfa(HOST, &k1).await);
        assert_unauthorized(svc.update_by_host(CFA, &k1, "1", "2", "3").await);
        assert_unauthorized(svc.update_by_home(HOME, &k1, "1", "2").await);
        assert_unauthorized(svc.update_by_host_for_cfa(INITIATOR, &k1, "1", "2").await);
        assert_unauthorized(svc.transfer_to_host(RoleFixtures::STRANGER, &k1).await);

        assert_ledger_unchanged(&before, &fixture.ledger.snapshot().await);
    }

    #[tokio::test]
    async fn test_resolved_policy_rejects_impersonation() {
        let fixture = LifecycleFixture::with_policy(LifecyclePolicy::default());
        fixture.seed("K1").await;
        let before = fixture.ledger.snapshot().await;
        let home = fixture.acting_as(Role::Home);

        assert_unauthorized(home.transfer_to_host(HOST, &id("K1")).await);
        assert_ledger_unchanged(&before, &fixture.ledger.snapshot().await);

        home.transfer_to_home("", &id("K1")).await.unwrap();
        home.transfer_to_home(HOME, &id("K1")).await.unwrap();
    }

    #[tokio::test]
    async fn test_missing_identity_attribute() {
        let fixture = seeded().await;
        let svc = fixture.anonymous(LifecyclePolicy::default());

        let err = svc.transfer_to_host("", &id("K1")).await.unwrap_err();
        assert!(matches!(err, ClaimError::Identity(_)));
    }

    #[tokio::test]
    async fn test_owner_only_details() {
        let fixture = seeded().await;
        let svc = fixture.anonymous(
            LifecyclePolicy::legacy().with_details_access(DetailsAccess::OwnerOnly),
        );

        svc.get_claim_details(INITIATOR, &id("K1")).await.unwrap();
        assert_unauthorized(svc.get_claim_details(HOST, &id("K1")).await);
    }
}

// ============================================================================
// allowToUpdate
// ============================================================================

mod allow_to_update_tests {
    use super::*;

    #[tokio::test]
    async fn test_home_sees_claim_only_at_home_stage() {
        let fixture = seeded().await;
        let svc = &fixture.service;
        let k1 = id("K1");

        for stage in Stage::ALL {
            svc.store().set_stage(&k1, stage).await.unwrap();
            let result = svc.allow_to_update(HOME, &k1).await.unwrap();
            assert_eq!(result.is_some(), stage == Stage::Home, "stage {}", stage);
        }
    }

    #[tokio::test]
    async fn test_empty_payload_when_not_open() {
        let fixture = seeded().await;
        let svc = &fixture.service;

        let args = vec![HOST.to_string(), "K1".to_string()];
        let payload = Command::parse("allowToUpdate", &args, SchemaVersion::Minimal)
            .unwrap()
            .execute(svc)
            .await
            .unwrap();
        assert_eq!(payload, None);

        let args = vec![INITIATOR.to_string(), "K1".to_string()];
        let payload = Command::parse("allowToUpdate", &args, SchemaVersion::Minimal)
            .unwrap()
            .execute(svc)
            .await
            .unwrap()
            .unwrap();
        let claim = Claim::decode("K1", &payload).unwrap();
        assert_eq!(claim.claim_id, "K1");
    }

    #[tokio::test]
    async fn test_global_stage_couples_claims() {
        let fixture = seeded().await;
        let svc = &fixture.service;
        fixture.seed("K2").await;

        svc.transfer_to_host(HOST, &id("K1")).await.unwrap();

        assert_eq!(svc.allow_to_update(INITIATOR, &id("K2")).await.unwrap(), None);
        assert!(svc.allow_to_update(HOST, &id("K2")).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_per_claim_stage_isolates_claims() {
        let fixture =
            LifecycleFixture::with_policy(LifecyclePolicy::legacy().with_stage_scope(StageScope::PerClaim));
        let svc = &fixture.service;
        fixture.seed("K1").await;
        fixture.seed("K2").await;

        svc.transfer_to_host(HOST, &id("K1")).await.unwrap();

        assert!(svc.allow_to_update(INITIATOR, &id("K2")).await.unwrap().is_some());
        assert!(svc.allow_to_update(HOST, &id("K1")).await.unwrap().is_some());
        assert_eq!(fixture.ledger.raw(STAGE_KEY).await, None);
    }
}

// ============================================================================
// Store Faults
// ============================================================================

mod fault_tests {
    use super::*;

    #[tokio::test]
    async fn test_atomic_ledger_discards_failed_transfer() {
        let fixture = seeded().await;
        let before = fixture.ledger.snapshot().await;
        fixture.ledger.fail_writes_to("K1").await;

        let err = fixture.service.transfer_to_host(HOST, &id("K1")).await.unwrap_err();

        assert!(matches!(err, ClaimError::Store { .. }));
        assert!(fixture.ledger.atomic_batches());
        assert_ledger_unchanged(&before, &fixture.ledger.snapshot().await);
    }

    #[tokio::test]
    async fn test_sequential_ledger_replay_converges() {
        let fixture = LifecycleFixture::over(Arc::new(MockLedger::new()), LifecyclePolicy::legacy());
        let svc = &fixture.service;
        fixture.seed("K1").await;
        fixture.ledger.fail_writes_to("K1").await;

        svc.transfer_to_host(HOST, &id("K1")).await.unwrap_err();
        // stage was written first; the claim still belongs to the initiator
        assert_eq!(svc.stage(&id("K1")).await.unwrap(), Stage::Host);
        let claim = svc.get_claim_details("", &id("K1")).await.unwrap();
        assert_eq!(claim.owner, INITIATOR);

        fixture.ledger.heal().await;
        svc.transfer_to_host(HOST, &id("K1")).await.unwrap();
        let claim = svc.get_claim_details("", &id("K1")).await.unwrap();
        assert_eq!(claim.owner, HOST);
        assert_eq!(svc.stage(&id("K1")).await.unwrap(), Stage::Host);
    }

    #[tokio::test]
    async fn test_delete_keeps_index_entry() {
        let fixture = seeded().await;
        let svc = &fixture.service;

        svc.delete(&id("K1")).await.unwrap();
        svc.delete(&id("K1")).await.unwrap();

        let err = svc.get_claim_details("", &id("K1")).await.unwrap_err();
        assert!(matches!(err, ClaimError::NotFound(_)));
        assert_eq!(svc.list_claim_ids().await.unwrap(), vec!["K1".to_string()]);
    }

    #[tokio::test]
    async fn test_claim_id_payload_is_json_array() {
        let fixture = seeded().await;
        fixture.seed("K2").await;

        let payload = Command::GetClaimIds
            .execute(&fixture.service)
            .await
            .unwrap()
            .unwrap();
        let ids: Vec<String> = serde_json::from_slice(&payload).unwrap();
        assert_eq!(ids, vec!["K1".to_string(), "K2".to_string()]);
    }
}
