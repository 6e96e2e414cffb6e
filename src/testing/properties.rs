//! Property-based checks for the universal invariants this crate
//! depends on: round-trip hashing, Merkle soundness, proof-of-work,
//! admission totality, contradiction determinism, and append
//! monotonicity.
//!
//! Strategies are edge-case weighted the way the pack's staking-contract
//! generators are: a handful of boundary `Just` values mixed with a wide
//! uniform range, so most runs still explore typical inputs but
//! zero/one/max show up often enough to catch off-by-one bugs.

use proptest::prelude::*;

use crate::chain::Chain;
use crate::concurrency::CancelToken;
use crate::hash::{digest_bytes, MerkleTree};
use crate::types::artifact::ContentHash;
use crate::types::{Artifact, AuthenticationMethod, Block, Digest, Tier};
use crate::validation::contradiction::{detect_kind, resolve};
use std::collections::BTreeMap;

fn weight_strategy() -> impl Strategy<Value = f64> {
    prop_oneof![
        1 => Just(0.0f64),
        1 => Just(1.0f64),
        8 => (0.0f64..=1.0f64),
    ]
}

fn tier_strategy() -> impl Strategy<Value = Tier> {
    prop_oneof![
        Just(Tier::Government),
        Just(Tier::Financial),
        Just(Tier::ThirdParty),
        Just(Tier::Personal),
    ]
}

fn auth_strategy() -> impl Strategy<Value = AuthenticationMethod> {
    prop_oneof![
        Just(AuthenticationMethod::DigitalSeal),
        Just(AuthenticationMethod::Notarization),
        Just(AuthenticationMethod::DigitalSignature),
        Just(AuthenticationMethod::Certification),
        Just(AuthenticationMethod::Stamp),
        Just(AuthenticationMethod::Metadata),
        Just(AuthenticationMethod::Witness),
        Just(AuthenticationMethod::None),
    ]
}

fn timestamp_strategy() -> impl Strategy<Value = i64> {
    prop_oneof![
        1 => Just(0i64),
        1 => Just(1_700_000_000i64),
        8 => (1_600_000_000i64..=1_800_000_000i64),
    ]
}

fn difficulty_strategy() -> impl Strategy<Value = u32> {
    prop_oneof![
        3 => Just(0u32),
        5 => Just(1u32),
        2 => Just(2u32),
    ]
}

fn artifact_strategy() -> impl Strategy<Value = Artifact> {
    (
        "[A-Z]{3,8}",
        tier_strategy(),
        weight_strategy(),
        auth_strategy(),
        "[a-z ]{1,20}",
        timestamp_strategy(),
    )
        .prop_map(|(id, tier, weight, auth, statement, timestamp)| {
            build_artifact(&id, tier, weight, auth, &statement, timestamp)
        })
}

fn build_artifact(
    id: &str,
    tier: Tier,
    weight: f64,
    auth: AuthenticationMethod,
    statement: &str,
    timestamp: i64,
) -> Artifact {
    let mut a = Artifact {
        id: id.to_string(),
        content_hash: ContentHash([0u8; 32]),
        tier,
        weight,
        authentication_method: auth,
        statement: statement.to_string(),
        case_id: "C1".to_string(),
        artifact_type: "document".to_string(),
        timestamp,
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

proptest! {
    /// An artifact's content hash matches its content immediately after
    /// construction, and any mutation to a content field invalidates
    /// the match.
    #[test]
    fn round_trip_hashing_holds_and_breaks_under_mutation(artifact in artifact_strategy()) {
        prop_assert!(artifact.content_hash_matches(Digest::Sha3_256));

        let mut mutated = artifact.clone();
        mutated.statement.push('!');
        prop_assert!(!mutated.content_hash_matches(Digest::Sha3_256));
    }

    /// Every leaf of a Merkle tree built over a random artifact batch
    /// produces a verifiable inclusion proof against the tree's own
    /// root.
    #[test]
    fn merkle_inclusion_proofs_verify(artifacts in prop::collection::vec(artifact_strategy(), 1..8)) {
        let leaves: Vec<_> = artifacts.iter().map(|a| a.merkle_leaf(Digest::Sha3_256)).collect();
        let tree = MerkleTree::build(Digest::Sha3_256, &leaves);
        for i in 0..leaves.len() {
            let proof = tree.proof(i).expect("proof should exist for every leaf");
            prop_assert!(proof.verify(Digest::Sha3_256));
        }
    }

    /// A sealed block's hash always meets the difficulty it was sealed
    /// at.
    #[test]
    fn sealed_block_always_meets_its_difficulty(
        difficulty in difficulty_strategy(),
        timestamp in timestamp_strategy(),
    ) {
        let block = Block::new_unsealed(1, "0".into(), vec![], difficulty, "m1".into(), Digest::Sha3_256, timestamp);
        let sealed = block.seal(&CancelToken::new(), |_| {}).expect("sealing never cancelled here");
        prop_assert!(crate::types::block::hash_meets_difficulty(&sealed.compute_hash(), difficulty));
    }

    /// Property: effective weight is always clamped into `[0, 1]`
    /// regardless of raw weight and authentication bonus.
    #[test]
    fn effective_weight_always_in_unit_range(weight in weight_strategy(), auth in auth_strategy()) {
        let artifact = build_artifact("A", Tier::Government, weight, auth, "x", 1_700_000_000);
        let effective = artifact.effective_weight();
        prop_assert!((0.0..=1.0).contains(&effective));
    }

    /// Resolving the same contradiction twice always yields the same
    /// winner and resolution rule, independent of call order.
    #[test]
    fn contradiction_resolution_is_deterministic(
        tier_a in tier_strategy(), auth_a in auth_strategy(), weight_a in weight_strategy(),
        tier_b in tier_strategy(), auth_b in auth_strategy(), weight_b in weight_strategy(),
    ) {
        let a = build_artifact("A", tier_a, weight_a, auth_a, "claim one", 1_700_000_000);
        let b = build_artifact("B", tier_b, weight_b, auth_b, "claim two", 1_700_000_100);
        let kind = detect_kind(&a, &b).unwrap_or(crate::types::ContradictionKind::Direct);

        let first = resolve(kind, &a, &b, 1_700_000_200, "ct-1".to_string());
        let second = resolve(kind, &a, &b, 1_700_000_200, "ct-1".to_string());

        prop_assert_eq!(first.winner_id, second.winner_id);
        prop_assert_eq!(first.resolution, second.resolution);
    }

    /// `Chain::append` never accepts a block whose index is not exactly
    /// one past the current tip.
    #[test]
    fn append_rejects_any_non_successor_index(skip in 2u64..10u64) {
        let mut chain = Chain::new(Digest::Sha3_256);
        let tip = chain.tip().unwrap();
        let mut block = Block::new_unsealed(
            tip.header.index + skip,
            tip.compute_hash().0.to_hex(),
            vec![],
            0,
            "m1".into(),
            Digest::Sha3_256,
            1_700_000_000,
        );
        block = block.seal(&CancelToken::new(), |_| {}).unwrap();
        prop_assert!(chain.append(block).is_err());
    }
}
