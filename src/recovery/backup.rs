//! Backup and checkpoint file I/O.
//!
//! Backups and checkpoints share one on-disk format: a `bincode`-encoded
//! [`BackupFile`] containing a manifest plus the chain's
//! [`crate::chain::ChainSnapshot`]. The Chain Store itself is purely
//! in-memory; these are the only points persistence happens.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::chain::{Chain, ChainSnapshot};
use crate::config::BackupStoreConfig;
use crate::error::StorageError;
use crate::types::{BackupManifest, BACKUP_FORMAT_VERSION};

#[derive(Serialize, Deserialize)]
struct BackupFile {
    manifest: BackupManifest,
    snapshot: ChainSnapshot,
}

/// Manages backup files on disk: writing new ones, reading them back,
/// and pruning old ones past the retention window.
pub struct BackupStore {
    config: BackupStoreConfig,
}

impl BackupStore {
    pub fn new(config: BackupStoreConfig) -> Self {
        BackupStore { config }
    }

    fn ensure_directory(&self) -> Result<(), StorageError> {
        fs::create_dir_all(&self.config.directory)?;
        Ok(())
    }

    /// Writes a backup of `chain` to disk and prunes old backups beyond
    /// `retention_count`. Returns the path written.
    pub fn create_backup(&self, chain: &Chain, created_at: i64) -> Result<PathBuf, StorageError> {
        self.ensure_directory()?;
        let manifest = BackupManifest {
            version: BACKUP_FORMAT_VERSION,
            created_at,
            chain_hash: chain.chain_hash(),
            block_count: chain.height() + 1,
        };
        let file = BackupFile {
            manifest,
            snapshot: chain.snapshot(),
        };
        let bytes = bincode::serialize(&file).map_err(|e| StorageError::Encode(e.to_string()))?;

        let path = self
            .config
            .directory
            .join(format!("backup-{created_at}-{}.bin", chain.chain_hash()));
        fs::write(&path, bytes)?;

        self.prune_old_backups()?;
        Ok(path)
    }

    /// Reads a backup file and rebuilds a [`Chain`] from it.
    pub fn restore_backup(&self, path: &Path) -> Result<Chain, StorageError> {
        let bytes = fs::read(path)?;
        let file: BackupFile = bincode::deserialize(&bytes)?;
        Ok(Chain::from_snapshot(file.snapshot))
    }

    /// Lists backup files under the configured directory, oldest first
    /// (by filename, which embeds `created_at`).
    pub fn list_backups(&self) -> Result<Vec<PathBuf>, StorageError> {
        if !self.config.directory.exists() {
            return Ok(Vec::new());
        }
        let mut paths: Vec<PathBuf> = fs::read_dir(&self.config.directory)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|p| p.extension().is_some_and(|ext| ext == "bin"))
            .collect();
        paths.sort();
        Ok(paths)
    }

    /// Returns the most recent backup whose stored chain hash validates
    /// (i.e. whose recovered chain's recomputed tip hash matches the
    /// manifest), or `None` if no backup qualifies.
    pub fn most_recent_valid_backup(&self) -> Result<Option<Chain>, StorageError> {
        for path in self.list_backups()?.into_iter().rev() {
            let bytes = fs::read(&path)?;
            let file: BackupFile = match bincode::deserialize(&bytes) {
                Ok(f) => f,
                Err(_) => continue,
            };
            let chain = Chain::from_snapshot(file.snapshot);
            if chain.chain_hash() == file.manifest.chain_hash {
                return Ok(Some(chain));
            }
        }
        Ok(None)
    }

    fn prune_old_backups(&self) -> Result<(), StorageError> {
        let paths = self.list_backups()?;
        if paths.len() <= self.config.retention_count {
            return Ok(());
        }
        for stale in &paths[..paths.len() - self.config.retention_count] {
            fs::remove_file(stale)?;
        }
        Ok(())
    }
}
