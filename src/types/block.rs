//! Block types, hashing, and proof-of-work sealing.
//!
//! Serialization is bincode over the derived `Serialize` impl: a single
//! canonical encoding used for header hashing, Merkle leaves, and
//! persistence.

use serde::{Deserialize, Serialize};

use crate::hash::{canonical_bytes, digest_bytes, Hash256, MerkleTree};
use crate::types::artifact::Artifact;
use crate::types::Digest;

/// Strongly-typed block hash: the digest of a block's canonical header
/// bytes, computed with the algorithm recorded on that same header.
#[derive(Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct BlockHash(pub Hash256);

impl std::fmt::Debug for BlockHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "BlockHash({})", self.0.to_hex())
    }
}

/// `previous_hash` recorded by the genesis block: index 0, previous
/// hash `"0"`.
pub const GENESIS_PREVIOUS_HASH: &str = "0";

/// Block header: the portion of the block that is hashed and sealed.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Header {
    pub index: u64,
    pub timestamp: i64,
    pub previous_hash: String,
    pub merkle_root: Hash256,
    pub nonce: u64,
    pub difficulty: u32,
    pub miner_id: String,
    pub digest_algorithm: Digest,
}

/// An immutable, sealed record: header plus the ordered list of committed
/// artifacts.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Block {
    pub header: Header,
    pub artifacts: Vec<Artifact>,
}

/// Why [`Block::seal`] failed to produce a sealed block.
#[derive(Debug)]
pub enum SealError {
    /// The supplied cancellation token fired before a valid nonce was found.
    Cancelled,
}

impl std::fmt::Display for SealError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SealError::Cancelled => write!(f, "block sealing was cancelled"),
        }
    }
}
impl std::error::Error for SealError {}

impl Block {
    /// Computes the Merkle root over `artifacts` under `algo`: leaves are
    /// artifact digests, internal nodes hash the concatenation of
    /// children, odd levels duplicate the final node.
    pub fn compute_merkle_root(artifacts: &[Artifact], algo: Digest) -> Hash256 {
        let leaves: Vec<Hash256> = artifacts.iter().map(|a| a.merkle_leaf(algo)).collect();
        MerkleTree::build(algo, &leaves).root()
    }

    /// Returns the canonical byte representation of this block's header,
    /// which is what gets hashed for PoW and chain linkage. Artifact
    /// bytes are *not* included here directly; they are committed to only
    /// via `header.merkle_root`, keeping structural and payload data
    /// separate.
    pub fn header_bytes(header: &Header) -> Vec<u8> {
        canonical_bytes(header)
    }

    /// Computes this block's hash from its current header.
    pub fn compute_hash(&self) -> BlockHash {
        BlockHash(digest_bytes(
            self.header.digest_algorithm,
            &Self::header_bytes(&self.header),
        ))
    }

    /// Builds an unsealed block (nonce = 0, header hash not yet
    /// satisfying `difficulty`) on top of `previous_hash` at `index`.
    pub fn new_unsealed(
        index: u64,
        previous_hash: String,
        artifacts: Vec<Artifact>,
        difficulty: u32,
        miner_id: String,
        digest_algorithm: Digest,
        timestamp: i64,
    ) -> Self {
        let merkle_root = Self::compute_merkle_root(&artifacts, digest_algorithm);
        Block {
            header: Header {
                index,
                timestamp,
                previous_hash,
                merkle_root,
                nonce: 0,
                difficulty,
                miner_id,
                digest_algorithm,
            },
            artifacts,
        }
    }

    /// Proof-of-work sealing: increments `nonce` from its current value
    /// until `compute_hash()` begins with `difficulty` leading zero-hex
    /// characters. Calls `on_progress` every 4096 attempts
    /// and checks `cancel` every 256 attempts so a caller can interrupt a
    /// long mining loop without waiting for a full progress tick.
    pub fn seal(
        mut self,
        cancel: &crate::concurrency::CancelToken,
        mut on_progress: impl FnMut(u64),
    ) -> Result<Self, SealError> {
        loop {
            for _ in 0..256 {
                if hash_meets_difficulty(&self.compute_hash(), self.header.difficulty) {
                    return Ok(self);
                }
                self.header.nonce = self.header.nonce.wrapping_add(1);
                if self.header.nonce % 4096 == 0 {
                    on_progress(self.header.nonce);
                }
            }
            if cancel.is_cancelled() {
                return Err(SealError::Cancelled);
            }
        }
    }

    /// Re-derives this block's own structural invariants and reports
    /// problems without consulting chain state (that is
    /// [`crate::audit::ChainAuditor`]'s job for cross-block checks).
    pub fn validate(&self, max_future_skew_seconds: i64, now: i64) -> (Vec<String>, Vec<String>) {
        let mut errors = Vec::new();
        let warnings = Vec::new();

        let recomputed_root = Self::compute_merkle_root(&self.artifacts, self.header.digest_algorithm);
        if recomputed_root != self.header.merkle_root {
            errors.push(format!(
                "Merkle root mismatch at block {}",
                self.header.index
            ));
        }

        let recomputed_hash = self.compute_hash();
        if !hash_meets_difficulty(&recomputed_hash, self.header.difficulty) {
            errors.push(format!(
                "proof-of-work invalid at block {}: hash does not meet difficulty {}",
                self.header.index, self.header.difficulty
            ));
        }

        if self.header.timestamp > now + max_future_skew_seconds {
            errors.push(format!(
                "block {} timestamp is in the future beyond allowed skew",
                self.header.index
            ));
        }

        for artifact in &self.artifacts {
            if artifact.id.is_empty() {
                errors.push(format!(
                    "block {} contains an artifact with an empty id",
                    self.header.index
                ));
            }
            if !(0.0..=1.0).contains(&artifact.weight) {
                errors.push(format!(
                    "block {} artifact {} has out-of-range weight {}",
                    self.header.index, artifact.id, artifact.weight
                ));
            }
        }

        (errors, warnings)
    }

    pub fn is_genesis(&self) -> bool {
        self.header.index == 0 && self.header.previous_hash == GENESIS_PREVIOUS_HASH
    }
}

/// Returns `true` if `hash`'s hex representation begins with `difficulty`
/// leading zero hex characters.
pub fn hash_meets_difficulty(hash: &BlockHash, difficulty: u32) -> bool {
    let hex = hash.0.to_hex();
    hex.bytes().take(difficulty as usize).all(|b| b == b'0')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::concurrency::CancelToken;
    use crate::types::{AuthenticationMethod, Tier};
    use std::collections::BTreeMap;

    fn sample_artifact(id: &str) -> Artifact {
        Artifact {
            id: id.into(),
            content_hash: crate::types::artifact::ContentHash([1u8; 32]),
            tier: Tier::Government,
            weight: 0.9,
            authentication_method: AuthenticationMethod::DigitalSeal,
            statement: "signed".into(),
            case_id: "C1".into(),
            artifact_type: "document".into(),
            timestamp: 1_700_000_000,
            corroborating_ids: vec![],
            metadata: BTreeMap::new(),
            block_index: None,
            minted_at: None,
            miner_id: None,
        }
    }

    #[test]
    fn seal_finds_a_nonce_satisfying_difficulty() {
        let block = Block::new_unsealed(
            1,
            "0".into(),
            vec![sample_artifact("A")],
            1,
            "miner-1".into(),
            Digest::Sha3_256,
            1_700_000_000,
        );
        let cancel = CancelToken::new();
        let sealed = block.seal(&cancel, |_| {}).expect("sealing should succeed");
        assert!(hash_meets_difficulty(&sealed.compute_hash(), 1));
    }

    #[test]
    fn seal_is_cancellable() {
        let block = Block::new_unsealed(
            1,
            "0".into(),
            vec![],
            64, // unreasonably high difficulty, won't be found quickly
            "miner-1".into(),
            Digest::Sha3_256,
            1_700_000_000,
        );
        let cancel = CancelToken::new();
        cancel.cancel();
        let result = block.seal(&cancel, |_| {});
        assert!(matches!(result, Err(SealError::Cancelled)));
    }

    #[test]
    fn validate_detects_merkle_tampering() {
        let mut block = Block::new_unsealed(
            1,
            "0".into(),
            vec![sample_artifact("A")],
            0,
            "miner-1".into(),
            Digest::Sha3_256,
            1_700_000_000,
        );
        block.artifacts[0].statement = "tampered".into();
        let (errors, _) = block.validate(60, 1_700_000_100);
        assert!(errors.iter().any(|e| e.contains("Merkle root mismatch")));
    }

    #[test]
    fn validate_rejects_future_timestamp() {
        let block = Block::new_unsealed(
            1,
            "0".into(),
            vec![],
            0,
            "miner-1".into(),
            Digest::Sha3_256,
            10_000,
        );
        let (errors, _) = block.validate(60, 0);
        assert!(errors.iter().any(|e| e.contains("future")));
    }
}
