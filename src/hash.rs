//! Canonical hashing and Merkle tree construction.
//!
//! A single digest algorithm is selected per chain (see
//! [`crate::types::Digest`]) and used uniformly for artifact content
//! hashes, block header hashes, and Merkle tree nodes. Canonical
//! serialization (stable key order, fixed numeric precision, UTF-8) is
//! required before hashing; this crate uses `bincode`'s deterministic
//! field-order encoding over `serde`-derived structs for that purpose.

use serde::Serialize;
use sha2::Sha256;
use sha3::{Digest as _, Sha3_256};

use crate::types::Digest;

/// Length in bytes of all digests used in this crate.
pub const HASH_LEN: usize = 32;

/// A 32-byte digest, tagged with the algorithm that produced it only by
/// convention of the chain it is embedded in (the algorithm itself is
/// recorded once on the block header, not per hash).
#[derive(Clone, Copy, Eq, PartialEq, Hash, Serialize, serde::Deserialize)]
pub struct Hash256(pub [u8; HASH_LEN]);

impl Hash256 {
    pub fn as_bytes(&self) -> &[u8; HASH_LEN] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Sentinel digest for an empty artifact list: the digest of an
    /// empty byte string.
    pub fn of_empty(algo: Digest) -> Self {
        digest_bytes(algo, b"")
    }
}

impl std::fmt::Debug for Hash256 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Hash256({})", self.to_hex())
    }
}

/// Computes the canonical digest of `data` under `algo`.
pub fn digest_bytes(algo: Digest, data: &[u8]) -> Hash256 {
    let mut out = [0u8; HASH_LEN];
    match algo {
        Digest::Sha256 => {
            let mut hasher = Sha256::new();
            hasher.update(data);
            out.copy_from_slice(&hasher.finalize());
        }
        Digest::Sha3_256 => {
            let mut hasher = Sha3_256::new();
            hasher.update(data);
            out.copy_from_slice(&hasher.finalize());
        }
    }
    Hash256(out)
}

/// Serializes `value` into its canonical byte form.
///
/// # Panics
///
/// Panics if encoding fails, which is considered a programming error: all
/// types passed here are required to be serializable with bincode.
pub fn canonical_bytes<T: Serialize>(value: &T) -> Vec<u8> {
    bincode::serialize(value).expect("value should always be serializable with bincode")
}

/// Computes the canonical digest of a serializable value.
pub fn digest_value<T: Serialize>(algo: Digest, value: &T) -> Hash256 {
    digest_bytes(algo, &canonical_bytes(value))
}

/// Which side of a pairing a sibling digest sits on, needed to reconstruct
/// the root in the same order it was built.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, serde::Deserialize)]
pub enum Side {
    Left,
    Right,
}

/// One step of an inclusion proof: a sibling digest and which side it sits
/// on relative to the node being proven at that level.
#[derive(Clone, Debug, Serialize, serde::Deserialize)]
pub struct ProofStep {
    pub sibling: Hash256,
    pub side: Side,
}

/// A Merkle inclusion proof for a single leaf, verifiable offline against
/// only the claimed root.
#[derive(Clone, Debug, Serialize, serde::Deserialize)]
pub struct InclusionProof {
    pub leaf_index: usize,
    pub leaf: Hash256,
    pub siblings: Vec<ProofStep>,
    pub claimed_root: Hash256,
}

impl InclusionProof {
    /// Recomputes the root from `self.leaf` and `self.siblings` and
    /// compares it with `self.claimed_root`. Any single-byte change to
    /// the leaf's underlying content (and hence `self.leaf`) is always
    /// caught by this check.
    pub fn verify(&self, algo: Digest) -> bool {
        let mut acc = self.leaf;
        for step in &self.siblings {
            let mut buf = Vec::with_capacity(HASH_LEN * 2);
            match step.side {
                Side::Left => {
                    buf.extend_from_slice(&step.sibling.0);
                    buf.extend_from_slice(&acc.0);
                }
                Side::Right => {
                    buf.extend_from_slice(&acc.0);
                    buf.extend_from_slice(&step.sibling.0);
                }
            }
            acc = digest_bytes(algo, &buf);
        }
        acc == self.claimed_root
    }
}

/// A full binary Merkle tree over an ordered list of leaf digests, with
/// odd levels duplicating the final node.
pub struct MerkleTree {
    algo: Digest,
    /// `levels[0]` is the leaf level, `levels.last()` is `[root]`.
    levels: Vec<Vec<Hash256>>,
}

impl MerkleTree {
    /// Builds a tree from `leaves`. An empty slice produces a tree whose
    /// root is [`Hash256::of_empty`].
    pub fn build(algo: Digest, leaves: &[Hash256]) -> Self {
        if leaves.is_empty() {
            let root = Hash256::of_empty(algo);
            return MerkleTree {
                algo,
                levels: vec![vec![root]],
            };
        }

        let mut levels = vec![leaves.to_vec()];
        while levels.last().unwrap().len() > 1 {
            let current = levels.last().unwrap();
            let mut next = Vec::with_capacity(current.len().div_ceil(2));
            let mut i = 0;
            while i < current.len() {
                let left = current[i];
                let right = if i + 1 < current.len() {
                    current[i + 1]
                } else {
                    current[i]
                };
                let mut buf = Vec::with_capacity(HASH_LEN * 2);
                buf.extend_from_slice(&left.0);
                buf.extend_from_slice(&right.0);
                next.push(digest_bytes(algo, &buf));
                i += 2;
            }
            levels.push(next);
        }

        MerkleTree { algo, levels }
    }

    pub fn root(&self) -> Hash256 {
        *self.levels.last().unwrap().last().unwrap()
    }

    /// Builds an inclusion proof for the leaf at `index`.
    ///
    /// Returns `None` if `index` is out of range for the leaf level (or if
    /// the tree was built from an empty leaf set, which has no provable
    /// leaves).
    pub fn proof(&self, index: usize) -> Option<InclusionProof> {
        let leaves = self.levels.first()?;
        if leaves.len() <= 1 && self.levels.len() == 1 && leaves.len() != 1 {
            return None;
        }
        let leaf = *leaves.get(index)?;

        let mut siblings = Vec::new();
        let mut idx = index;
        for level in &self.levels[..self.levels.len() - 1] {
            let is_right = idx % 2 == 1;
            let sibling_idx = if is_right { idx - 1 } else { idx + 1 };
            let sibling = if sibling_idx < level.len() {
                level[sibling_idx]
            } else {
                level[idx]
            };
            let side = if is_right { Side::Left } else { Side::Right };
            siblings.push(ProofStep { sibling, side });
            idx /= 2;
        }

        Some(InclusionProof {
            leaf_index: index,
            leaf,
            siblings,
            claimed_root: self.root(),
        })
    }

    pub fn algo(&self) -> Digest {
        self.algo
    }
}
