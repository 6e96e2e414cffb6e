//! The chain store: an ordered sequence of blocks, owned exclusively by
//! a single writer, plus the pending-artifact queue and secondary
//! indices maintained alongside it.
//!
//! There is exactly one writer and no fork choice — `append` simply
//! rejects any block that does not extend the current tip.

pub mod index;

pub use index::{QueryFilter, QueryIndex};

use std::collections::{HashMap, HashSet};

use crate::error::ChainError;
use crate::types::block::GENESIS_PREVIOUS_HASH;
use crate::types::{Artifact, ArtifactId, Block, BlockHash, Digest, Tier};

/// Height, artifact count, and tier histogram snapshot.
#[derive(Clone, Debug, Default)]
pub struct ChainStats {
    pub height: u64,
    pub total_artifacts: u64,
    pub tier_histogram: HashMap<Tier, u64>,
}

/// The append-only block sequence plus the state that travels with it.
pub struct Chain {
    blocks: Vec<Block>,
    by_hash: HashMap<BlockHash, usize>,
    pending_artifacts: Vec<Artifact>,
    index: QueryIndex,
    committed_ids: HashSet<ArtifactId>,
    digest_algorithm: Digest,
}

impl Chain {
    /// Creates an empty chain and immediately bootstraps genesis.
    pub fn new(digest_algorithm: Digest) -> Self {
        let mut chain = Chain {
            blocks: Vec::new(),
            by_hash: HashMap::new(),
            pending_artifacts: Vec::new(),
            index: QueryIndex::new(),
            committed_ids: HashSet::new(),
            digest_algorithm,
        };
        chain.init();
        chain
    }

    /// Idempotently ensures a genesis block exists. A no-op once any
    /// block has been appended.
    pub fn init(&mut self) {
        if !self.blocks.is_empty() {
            return;
        }
        let genesis = Block::new_unsealed(
            0,
            GENESIS_PREVIOUS_HASH.to_string(),
            Vec::new(),
            0,
            "genesis".to_string(),
            self.digest_algorithm,
            0,
        );
        self.push_unchecked(genesis);
    }

    /// Queues a candidate that has already cleared admission and
    /// contradiction checks, awaiting the next seal.
    pub fn enqueue_pending(&mut self, artifact: Artifact) {
        self.pending_artifacts.push(artifact);
    }

    pub fn pending_artifacts(&self) -> &[Artifact] {
        &self.pending_artifacts
    }

    pub fn clear_pending(&mut self) {
        self.pending_artifacts.clear();
    }

    /// Validates `block` against the current tip and, if it passes,
    /// commits it and updates all indices.
    pub fn append(&mut self, block: Block) -> Result<(), ChainError> {
        let tip = self.tip().expect("chain always has at least genesis");

        if block.header.index != tip.header.index + 1 {
            return Err(ChainError::NotTipSuccessor {
                expected_index: tip.header.index + 1,
                got_index: block.header.index,
            });
        }
        let tip_hash = tip.compute_hash();
        if block.header.previous_hash != tip_hash.0.to_hex() {
            return Err(ChainError::LinkageMismatch {
                expected_previous_hash: tip_hash.0.to_hex(),
                got_previous_hash: block.header.previous_hash.clone(),
            });
        }
        if block.header.timestamp < tip.header.timestamp {
            return Err(ChainError::TimestampRegression);
        }
        for artifact in &block.artifacts {
            if self.committed_ids.contains(&artifact.id) {
                return Err(ChainError::DuplicateArtifactId(artifact.id.clone()));
            }
        }

        self.push_unchecked(block);
        Ok(())
    }

    /// Commits `block` without re-validating linkage, used by both
    /// `append` (after validation) and `init` (genesis needs no
    /// predecessor check).
    fn push_unchecked(&mut self, block: Block) {
        let index = block.header.index;
        let hash = block.compute_hash();

        for artifact in &block.artifacts {
            self.committed_ids.insert(artifact.id.clone());
            self.index.record(
                &artifact.id,
                &artifact.case_id,
                artifact.tier,
                artifact.timestamp,
                index,
            );
        }

        self.blocks.push(block);
        self.by_hash.insert(hash, self.blocks.len() - 1);
    }

    pub fn tip(&self) -> Option<&Block> {
        self.blocks.last()
    }

    pub fn block_at(&self, index: u64) -> Option<&Block> {
        self.blocks.get(index as usize)
    }

    pub fn block_by_hash(&self, hash: &BlockHash) -> Option<&Block> {
        self.by_hash.get(hash).map(|&i| &self.blocks[i])
    }

    /// Resolves a committed artifact by id, scanning only the block its
    /// index points to.
    pub fn artifact_by_id(&self, id: &str) -> Option<&Artifact> {
        let block_index = self.index.block_index_of(id)?;
        self.block_at(block_index)?
            .artifacts
            .iter()
            .find(|a| a.id == id)
    }

    pub fn is_committed(&self, id: &str) -> bool {
        self.committed_ids.contains(id)
    }

    pub fn iter_blocks(&self) -> impl Iterator<Item = &Block> {
        self.blocks.iter()
    }

    pub fn height(&self) -> u64 {
        self.blocks.last().map(|b| b.header.index).unwrap_or(0)
    }

    pub fn digest_algorithm(&self) -> Digest {
        self.digest_algorithm
    }

    pub fn stats(&self) -> ChainStats {
        let mut tier_histogram = HashMap::new();
        let mut total_artifacts = 0u64;
        for block in &self.blocks {
            for artifact in &block.artifacts {
                total_artifacts += 1;
                *tier_histogram.entry(artifact.tier).or_insert(0) += 1;
            }
        }
        ChainStats {
            height: self.height(),
            total_artifacts,
            tier_histogram,
        }
    }

    /// Runs `filter` against the secondary indices and resolves matches
    /// back to full committed artifacts, presenting a consistent
    /// snapshot since no writer runs concurrently with this read.
    pub fn query(&self, filter: &QueryFilter) -> Vec<&Artifact> {
        let ids = self.index.matching_ids(filter);
        ids.iter()
            .filter_map(|id| self.artifact_by_id(id))
            .filter(|a| filter.min_weight.is_none_or(|w| a.weight >= w))
            .filter(|a| {
                filter
                    .artifact_type
                    .as_deref()
                    .is_none_or(|t| a.artifact_type == t)
            })
            .collect()
    }

    /// Replaces the entire chain state, used only by the Recovery
    /// Service's atomic swap after validating a candidate chain.
    pub fn replace_with(&mut self, other: Chain) {
        *self = other;
    }

    /// Hex-encoded hash of the current tip, used as the `chain_hash`
    /// field of checkpoints and backups.
    pub fn chain_hash(&self) -> String {
        self.tip()
            .expect("chain always has at least genesis")
            .compute_hash()
            .0
            .to_hex()
    }

    /// The self-describing, versioned serialized form of this chain:
    /// just the ordered blocks plus the digest algorithm, everything
    /// else is derived on load.
    pub fn snapshot(&self) -> ChainSnapshot {
        ChainSnapshot {
            digest_algorithm: self.digest_algorithm,
            blocks: self.blocks.clone(),
        }
    }

    /// Rebuilds a chain (including all secondary indices) by replaying
    /// `snapshot`'s blocks in order.
    pub fn from_snapshot(snapshot: ChainSnapshot) -> Self {
        let mut chain = Chain {
            blocks: Vec::new(),
            by_hash: HashMap::new(),
            pending_artifacts: Vec::new(),
            index: QueryIndex::new(),
            committed_ids: HashSet::new(),
            digest_algorithm: snapshot.digest_algorithm,
        };
        for block in snapshot.blocks {
            chain.push_unchecked(block);
        }
        chain
    }
}

/// Serializable form of a [`Chain`]: ordered blocks plus the digest
/// algorithm they were sealed with. Secondary indices and the
/// committed-id set are rebuilt on load rather than persisted.
#[derive(Clone, serde::Serialize, serde::Deserialize)]
pub struct ChainSnapshot {
    pub digest_algorithm: Digest,
    pub blocks: Vec<Block>,
}
