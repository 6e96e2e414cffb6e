//! Evidence artifact types.
//!
//! An [`Artifact`] is a candidate piece of evidence before it is minted and
//! a committed record afterward; the extra fields committed artifacts
//! carry (`block_index`, `minted_at`, `miner_id`) are `Option` and only
//! populated once [`crate::minting::MintingPipeline`] seals a block
//! containing it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::hash::{canonical_bytes, digest_bytes, HASH_LEN};
use crate::types::{AuthenticationMethod, Digest, Tier};

/// Globally unique artifact identifier. Immutable once committed.
pub type ArtifactId = String;

/// 32-byte digest of an artifact's canonical serialized content.
#[derive(Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct ContentHash(pub [u8; HASH_LEN]);

impl ContentHash {
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// `true` if this looks like a well-formed 32-byte digest.
    /// Serialization guarantees the length already; this additionally
    /// rejects the all-zero sentinel, which never arises from a real
    /// digest computation.
    pub fn is_well_formed(&self) -> bool {
        self.0 != [0u8; HASH_LEN]
    }
}

impl std::fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ContentHash({})", self.to_hex())
    }
}

/// The free-form content bag an artifact's `content_hash` commits to.
/// Canonicalized via `BTreeMap` key ordering before hashing, so keys are
/// sorted, numeric precision is fixed, and the encoding is UTF-8.
pub type MetadataBag = BTreeMap<String, String>;

/// A piece of evidence offered for inclusion in the ledger.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Artifact {
    pub id: ArtifactId,
    pub content_hash: ContentHash,
    pub tier: Tier,
    /// Raw trust score in `[0.0, 1.0]`, before the authentication bonus.
    pub weight: f64,
    pub authentication_method: AuthenticationMethod,
    pub statement: String,
    pub case_id: String,
    pub artifact_type: String,
    pub timestamp: i64,
    pub corroborating_ids: Vec<ArtifactId>,
    pub metadata: MetadataBag,

    /// Populated once this artifact is sealed into a block.
    pub block_index: Option<u64>,
    pub minted_at: Option<i64>,
    pub miner_id: Option<String>,
}

impl Artifact {
    /// Effective weight = `weight + authentication_bonus`, clamped to 1.0.
    pub fn effective_weight(&self) -> f64 {
        (self.weight + self.authentication_method.bonus()).min(1.0)
    }

    /// Canonical bytes of the content bag this artifact's `content_hash`
    /// should commit to: statement, case, type, timestamp, and metadata,
    /// with `BTreeMap` giving deterministic key order.
    pub fn canonical_content_bytes(&self) -> Vec<u8> {
        #[derive(Serialize)]
        struct ContentBag<'a> {
            statement: &'a str,
            case_id: &'a str,
            artifact_type: &'a str,
            timestamp: i64,
            metadata: &'a MetadataBag,
        }
        canonical_bytes(&ContentBag {
            statement: &self.statement,
            case_id: &self.case_id,
            artifact_type: &self.artifact_type,
            timestamp: self.timestamp,
            metadata: &self.metadata,
        })
    }

    /// Recomputes `content_hash` from the current content fields under
    /// `algo` and compares it with the stored value.
    pub fn content_hash_matches(&self, algo: Digest) -> bool {
        let recomputed = digest_bytes(algo, &self.canonical_content_bytes());
        recomputed.0 == self.content_hash.0
    }

    /// Leaf digest used by the Merkle tree for this artifact: the digest
    /// of its full canonical (including id/tier/weight) serialized form,
    /// so that tampering with any field — not just the content bag —
    /// changes the leaf and therefore the Merkle root.
    pub fn merkle_leaf(&self, algo: Digest) -> crate::hash::Hash256 {
        digest_bytes(algo, &canonical_bytes(self))
    }

    /// `true` once this artifact has been sealed into a block.
    pub fn is_committed(&self) -> bool {
        self.block_index.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Artifact {
        Artifact {
            id: "DOC_001".into(),
            content_hash: ContentHash([0u8; HASH_LEN]),
            tier: Tier::Government,
            weight: 0.95,
            authentication_method: AuthenticationMethod::DigitalSeal,
            statement: "signed".into(),
            case_id: "C1".into(),
            artifact_type: "document".into(),
            timestamp: 1_700_000_000,
            corroborating_ids: vec![],
            metadata: MetadataBag::new(),
            block_index: None,
            minted_at: None,
            miner_id: None,
        }
    }

    #[test]
    fn effective_weight_is_clamped_to_one() {
        let mut a = sample();
        a.weight = 0.98;
        a.authentication_method = AuthenticationMethod::DigitalSeal;
        assert_eq!(a.effective_weight(), 1.0);
    }

    #[test]
    fn content_hash_round_trips() {
        let mut a = sample();
        let bytes = a.canonical_content_bytes();
        a.content_hash = ContentHash(*digest_bytes(Digest::Sha3_256, &bytes).as_bytes());
        assert!(a.content_hash_matches(Digest::Sha3_256));
    }

    #[test]
    fn tampering_with_statement_breaks_content_hash() {
        let mut a = sample();
        let bytes = a.canonical_content_bytes();
        a.content_hash = ContentHash(*digest_bytes(Digest::Sha3_256, &bytes).as_bytes());
        a.statement = "unsigned".into();
        assert!(!a.content_hash_matches(Digest::Sha3_256));
    }

    #[test]
    fn is_committed_tracks_block_index() {
        let mut a = sample();
        assert!(!a.is_committed());
        a.block_index = Some(1);
        assert!(a.is_committed());
    }
}
