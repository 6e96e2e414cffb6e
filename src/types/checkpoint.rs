//! Checkpoint and backup manifest types.

use serde::{Deserialize, Serialize};

/// A validated, recoverable snapshot of the chain at a given height.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Checkpoint {
    pub id: String,
    pub created_at: i64,
    pub chain_height: u64,
    pub chain_hash: String,
    /// Label supplied by the caller, or a default derived from the
    /// triggering operation (e.g. `"pre-recovery"`).
    pub label: String,
}

/// Metadata recorded alongside a backup's serialized chain blob.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BackupManifest {
    pub version: u32,
    pub created_at: i64,
    pub chain_hash: String,
    pub block_count: u64,
}

pub const BACKUP_FORMAT_VERSION: u32 = 1;
