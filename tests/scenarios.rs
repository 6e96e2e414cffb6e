//! End-to-end scenarios exercising the ledger's public API: admission,
//! contradiction resolution, tamper detection, and staged recovery.

use std::collections::BTreeMap;
use std::sync::Arc;

use evidence_ledger::concurrency::CancelToken;
use evidence_ledger::hash::digest_bytes;
use evidence_ledger::metrics::MetricsRegistry;
use evidence_ledger::types::artifact::ContentHash;
use evidence_ledger::{
    Artifact, AuthenticationMethod, ConfigBuilder, Digest, Ledger, RecoveryStrategy, Tier,
};

fn artifact(id: &str, tier: Tier, weight: f64, auth: AuthenticationMethod, case_id: &str, statement: &str) -> Artifact {
    let mut a = Artifact {
        id: id.into(),
        content_hash: ContentHash([0u8; 32]),
        tier,
        weight,
        authentication_method: auth,
        statement: statement.into(),
        case_id: case_id.into(),
        artifact_type: "document".into(),
        timestamp: 1_700_000_000,
        corroborating_ids: vec![],
        metadata: BTreeMap::new(),
        block_index: None,
        minted_at: None,
        miner_id: None,
    };
    let digest = digest_bytes(Digest::Sha3_256, &a.canonical_content_bytes());
    a.content_hash = ContentHash(*digest.as_bytes());
    a
}

fn fast_ledger() -> Ledger {
    Ledger::new(ConfigBuilder::new().difficulty(1).build())
}

#[test]
fn government_artifact_with_digital_seal_auto_mints() {
    let mut ledger = fast_ledger();
    let cancel = CancelToken::new();

    let outcome = ledger
        .mint_batch(
            vec![artifact(
                "GOV-1",
                Tier::Government,
                0.95,
                AuthenticationMethod::DigitalSeal,
                "CASE-1",
                "the deed was signed",
            )],
            "miner-1".into(),
            1_700_000_100,
            &cancel,
        )
        .expect("mint should succeed");

    assert_eq!(outcome.minted, vec!["GOV-1".to_string()]);
    assert_eq!(outcome.block_index, Some(1));
}

#[test]
fn personal_artifact_mints_once_corroborated() {
    let mut ledger = fast_ledger();
    let cancel = CancelToken::new();

    for i in 0..3i64 {
        let id = format!("CORR-{i}");
        ledger
            .mint_batch(
                vec![artifact(&id, Tier::Government, 0.95, AuthenticationMethod::DigitalSeal, "CASE-2", "filed")],
                "miner-1".into(),
                1_700_000_100 + i,
                &cancel,
            )
            .unwrap();
    }

    let mut lone = artifact("PER-1", Tier::Personal, 0.7, AuthenticationMethod::Witness, "CASE-2", "witnessed it");
    let first_attempt = ledger
        .mint_batch(vec![lone.clone()], "miner-1".into(), 1_700_000_200, &cancel)
        .unwrap();
    assert_eq!(first_attempt.needs_corroboration.len(), 1);
    assert!(first_attempt.minted.is_empty());

    lone.corroborating_ids = vec!["CORR-0".into(), "CORR-1".into(), "CORR-2".into()];
    let second_attempt = ledger
        .mint_batch(vec![lone], "miner-1".into(), 1_700_000_300, &cancel)
        .unwrap();
    assert_eq!(second_attempt.minted, vec!["PER-1".to_string()]);
}

#[test]
fn hierarchy_rule_resolves_a_direct_contradiction_in_favor_of_government() {
    let mut ledger = fast_ledger();
    let cancel = CancelToken::new();

    let gov = artifact("GOV-2", Tier::Government, 0.95, AuthenticationMethod::DigitalSeal, "CASE-3", "invoice paid");
    let financial = artifact("FIN-3", Tier::Financial, 0.97, AuthenticationMethod::Notarization, "CASE-3", "invoice unpaid");

    let outcome = ledger
        .mint_batch(vec![gov, financial], "miner-1".into(), 1_700_000_100, &cancel)
        .unwrap();

    assert_eq!(outcome.minted, vec!["GOV-2".to_string()]);
    assert_eq!(outcome.contradictions.len(), 1);
    assert_eq!(outcome.contradictions[0].winner_id, "GOV-2");
}

#[test]
fn tampering_with_a_committed_artifact_is_caught_by_full_validation() {
    let mut ledger = fast_ledger();
    let cancel = CancelToken::new();

    ledger
        .mint_batch(
            vec![artifact("GOV-3", Tier::Government, 0.95, AuthenticationMethod::DigitalSeal, "CASE-4", "filed")],
            "miner-1".into(),
            1_700_000_100,
            &cancel,
        )
        .unwrap();

    let mut snapshot = ledger.chain().snapshot();
    snapshot.blocks[1].artifacts[0].statement = "tampered".into();
    let tampered_chain = evidence_ledger::Chain::from_snapshot(snapshot);

    let report = evidence_ledger::audit::ChainAuditor::new(ledger.config())
        .run(&tampered_chain, 1_700_000_200, &cancel);
    assert!(!report.ok);
    assert!(report.errors.iter().any(|e| e.message.contains("content hash mismatch")));
}

#[test]
fn safe_recovery_declines_then_aggressive_recovery_truncates() {
    let dir = tempfile::tempdir().unwrap();
    let config = ConfigBuilder::new()
        .difficulty(1)
        .backup(evidence_ledger::BackupStoreConfig {
            directory: dir.path().to_path_buf(),
            retention_count: 10,
        })
        .build();
    let mut ledger = Ledger::new(config.clone());
    let cancel = CancelToken::new();

    ledger
        .mint_batch(
            vec![artifact("GOV-4", Tier::Government, 0.95, AuthenticationMethod::DigitalSeal, "CASE-5", "filed")],
            "miner-1".into(),
            1_700_000_100,
            &cancel,
        )
        .unwrap();
    ledger
        .mint_batch(
            vec![artifact("GOV-5", Tier::Government, 0.95, AuthenticationMethod::DigitalSeal, "CASE-5", "filed")],
            "miner-1".into(),
            1_700_000_200,
            &cancel,
        )
        .unwrap();

    // Tamper the first committed block by rebuilding the chain from a
    // mutated snapshot, bypassing append.
    let mut snapshot = ledger.chain().snapshot();
    snapshot.blocks[1].artifacts[0].statement = "tampered".into();
    let mut chain = evidence_ledger::Chain::from_snapshot(snapshot);

    let events = evidence_ledger::EventBus::new();
    let recovery = evidence_ledger::RecoveryService::new(&config);

    let safe_outcome = recovery
        .auto_recover(&mut chain, RecoveryStrategy::Safe, 1_700_000_300, &cancel, &events)
        .unwrap();
    assert!(!safe_outcome.applied);

    let aggressive_outcome = recovery
        .auto_recover(&mut chain, RecoveryStrategy::Aggressive, 1_700_000_400, &cancel, &events)
        .unwrap();
    assert!(aggressive_outcome.applied);
    assert!(aggressive_outcome.post_validation_ok);
    assert_eq!(chain.height(), 0);
}

#[test]
fn mixed_batch_separates_minted_rejected_and_pending() {
    let mut ledger = fast_ledger();
    let cancel = CancelToken::new();

    let seal = artifact("GOV-6", Tier::Government, 0.95, AuthenticationMethod::DigitalSeal, "CASE-6", "invoice paid");
    let auto_mint = artifact("FIN-1", Tier::Financial, 0.97, AuthenticationMethod::Notarization, "CASE-7", "filed");
    let needs_corroboration = artifact("PER-3", Tier::Personal, 0.5, AuthenticationMethod::Witness, "CASE-8", "saw it happen");
    let contradicts_peer = artifact("FIN-2", Tier::Financial, 0.97, AuthenticationMethod::Notarization, "CASE-6", "invoice unpaid");

    let outcome = ledger
        .mint_batch(
            vec![seal, auto_mint, needs_corroboration, contradicts_peer],
            "miner-1".into(),
            1_700_000_100,
            &cancel,
        )
        .unwrap();

    assert_eq!(outcome.minted, vec!["GOV-6".to_string(), "FIN-1".to_string()]);
    assert_eq!(outcome.block_index, Some(1));
    assert_eq!(outcome.needs_corroboration.len(), 1);
    assert_eq!(outcome.needs_corroboration[0].id, "PER-3");
    assert!(outcome.rejected.iter().any(|r| r.id == "FIN-2"));
}

#[test]
fn minting_and_validation_observe_metrics_when_wired() {
    let registry = MetricsRegistry::new().expect("create metrics registry");
    let mut ledger = Ledger::with_metrics(ConfigBuilder::new().difficulty(1).build(), Arc::new(registry.ledger.clone()));
    let cancel = CancelToken::new();

    ledger
        .mint_batch(
            vec![artifact("GOV-7", Tier::Government, 0.95, AuthenticationMethod::DigitalSeal, "CASE-9", "filed")],
            "miner-1".into(),
            1_700_000_100,
            &cancel,
        )
        .unwrap();
    ledger.validate(1_700_000_200, &cancel);

    let text = registry.gather_text();
    assert!(text.contains("ledger_artifacts_minted_total"));
    assert!(text.contains("ledger_block_seal_seconds"));
    assert!(text.contains("ledger_validation_run_seconds"));
}
