//! The recovery service: backups, checkpoints, and the staged SAFE /
//! AGGRESSIVE / REBUILD repair strategies.
//!
//! Every strategy follows the same transactional shape: build a
//! candidate chain off to the side, audit it, and only swap it in if it
//! is at least as valid as the original. The caller's live [`Chain`] is
//! never mutated otherwise.

pub mod backup;

use std::path::PathBuf;
use std::sync::Arc;

use crate::audit::ChainAuditor;
use crate::chain::Chain;
use crate::concurrency::CancelToken;
use crate::config::LedgerConfig;
use crate::error::StorageError;
use crate::events::{EventBus, LedgerEvent};
use crate::metrics::LedgerMetrics;
use crate::types::{Checkpoint, ValidationReport};

use backup::BackupStore;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RecoveryStrategy {
    Safe,
    Aggressive,
    Rebuild,
}

impl std::fmt::Display for RecoveryStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            RecoveryStrategy::Safe => "SAFE",
            RecoveryStrategy::Aggressive => "AGGRESSIVE",
            RecoveryStrategy::Rebuild => "REBUILD",
        };
        write!(f, "{label}")
    }
}

/// Summary of what a recovery run actually changed.
#[derive(Clone, Debug)]
pub struct RecoveryOutcome {
    pub strategy: RecoveryStrategy,
    pub applied: bool,
    pub dropped_blocks: Vec<u64>,
    pub notes: Vec<String>,
    pub checkpoint_id: String,
    pub post_validation_ok: bool,
}

pub struct RecoveryService<'a> {
    config: &'a LedgerConfig,
    backups: BackupStore,
    checkpoints: BackupStore,
    metrics: Option<Arc<LedgerMetrics>>,
}

impl<'a> RecoveryService<'a> {
    pub fn new(config: &'a LedgerConfig) -> Self {
        let checkpoints_dir = config.backup.directory.join("checkpoints");
        RecoveryService {
            config,
            backups: BackupStore::new(config.backup.clone()),
            checkpoints: BackupStore::new(crate::config::BackupStoreConfig {
                directory: checkpoints_dir,
                retention_count: usize::MAX,
            }),
            metrics: None,
        }
    }

    /// Same as [`Self::new`], but records applied/no-op recovery counts
    /// against `metrics`.
    pub fn with_metrics(config: &'a LedgerConfig, metrics: Arc<LedgerMetrics>) -> Self {
        RecoveryService {
            metrics: Some(metrics),
            ..Self::new(config)
        }
    }

    pub fn create_backup(&self, chain: &Chain, now: i64) -> Result<PathBuf, StorageError> {
        self.backups.create_backup(chain, now)
    }

    pub fn restore_backup(&self, path: &std::path::Path) -> Result<Chain, StorageError> {
        self.backups.restore_backup(path)
    }

    pub fn create_checkpoint(&self, chain: &Chain, label: &str, now: i64) -> Result<Checkpoint, StorageError> {
        let path = self.checkpoints.create_backup(chain, now)?;
        let id = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("checkpoint")
            .to_string();
        Ok(Checkpoint {
            id,
            created_at: now,
            chain_height: chain.height(),
            chain_hash: chain.chain_hash(),
            label: label.to_string(),
        })
    }

    /// Runs the requested strategy and, on success, swaps `chain` for the
    /// repaired candidate. Always produces a new checkpoint, whether or
    /// not a fix was applied, so the attempt itself is recorded.
    pub fn auto_recover(
        &self,
        chain: &mut Chain,
        strategy: RecoveryStrategy,
        now: i64,
        cancel: &CancelToken,
        events: &EventBus,
    ) -> Result<RecoveryOutcome, StorageError> {
        let auditor = match &self.metrics {
            Some(m) => ChainAuditor::with_metrics(self.config, m.clone()),
            None => ChainAuditor::new(self.config),
        };
        let before_report = auditor.run(chain, now, cancel);

        let (candidate, dropped_blocks, notes) = match strategy {
            RecoveryStrategy::Safe => self.build_safe_candidate(chain),
            RecoveryStrategy::Aggressive => self.build_aggressive_candidate(chain, &before_report, now, cancel),
            RecoveryStrategy::Rebuild => self.build_rebuild_candidate(chain, now)?,
        };

        let after_report = auditor.run(&candidate, now, cancel);
        let applied = at_least_as_valid(&before_report, &after_report);

        let mut notes = notes;
        if !applied {
            notes.push("no safe fix".to_string());
        }
        if applied {
            chain.replace_with(candidate);
        }

        let checkpoint = self.create_checkpoint(chain, &format!("post-recovery-{strategy}"), now)?;

        tracing::info!(%strategy, applied, checkpoint = %checkpoint.id, "recovery strategy chosen and applied");
        if let Some(m) = &self.metrics {
            if applied {
                m.recoveries_applied.inc();
            } else {
                m.recoveries_no_op.inc();
            }
        }

        events.publish(LedgerEvent::CheckpointCreated {
            id: checkpoint.id.clone(),
        });
        events.publish(LedgerEvent::RecoveryPerformed {
            strategy: strategy.to_string(),
            outcome: if applied { "applied".to_string() } else { "no-op".to_string() },
        });

        Ok(RecoveryOutcome {
            strategy,
            applied,
            dropped_blocks,
            notes,
            checkpoint_id: checkpoint.id,
            post_validation_ok: if applied { after_report.ok } else { before_report.ok },
        })
    }

    /// SAFE: recompute stored Merkle roots for blocks whose artifacts
    /// still hash-verify but whose recorded root is stale. Never drops
    /// blocks.
    fn build_safe_candidate(&self, chain: &Chain) -> (Chain, Vec<u64>, Vec<String>) {
        let mut snapshot = chain.snapshot();
        let mut notes = Vec::new();

        for block in &mut snapshot.blocks {
            let artifacts_intact = block
                .artifacts
                .iter()
                .all(|a| a.content_hash_matches(snapshot.digest_algorithm));
            if !artifacts_intact {
                continue;
            }
            let recomputed = crate::types::Block::compute_merkle_root(&block.artifacts, snapshot.digest_algorithm);
            if recomputed != block.header.merkle_root {
                block.header.merkle_root = recomputed;
                notes.push(format!("recomputed Merkle root for block {}", block.header.index));
            }
        }

        (Chain::from_snapshot(snapshot), Vec::new(), notes)
    }

    /// AGGRESSIVE: apply SAFE fixes, then truncate at the earliest block
    /// with a remaining CRITICAL error, keeping the longest valid prefix.
    fn build_aggressive_candidate(
        &self,
        chain: &Chain,
        before_report: &ValidationReport,
        now: i64,
        cancel: &CancelToken,
    ) -> (Chain, Vec<u64>, Vec<String>) {
        let (safe_candidate, _, mut notes) = self.build_safe_candidate(chain);

        let auditor = ChainAuditor::new(self.config);
        let safe_report = auditor.run(&safe_candidate, now, cancel);
        let report = if safe_report.errors.len() < before_report.errors.len() {
            &safe_report
        } else {
            before_report
        };

        let first_critical_index = report
            .errors
            .iter()
            .filter(|e| e.severity == crate::types::ValidationIssueSeverity::Critical)
            .filter_map(|e| e.block_index)
            .filter(|idx| *idx > 0)
            .min();

        let Some(truncate_at) = first_critical_index else {
            notes.push("no CRITICAL errors to truncate".to_string());
            return (safe_candidate, Vec::new(), notes);
        };

        let mut snapshot = safe_candidate.snapshot();
        let dropped: Vec<u64> = snapshot
            .blocks
            .iter()
            .filter(|b| b.header.index >= truncate_at)
            .map(|b| b.header.index)
            .collect();
        snapshot.blocks.retain(|b| b.header.index < truncate_at);
        notes.push(format!(
            "truncated chain at block {truncate_at}, dropping {} block(s)",
            dropped.len()
        ));

        (Chain::from_snapshot(snapshot), dropped, notes)
    }

    /// REBUILD: restore from the most recent checkpoint that validates,
    /// falling back to the most recent backup, falling back to genesis.
    fn build_rebuild_candidate(&self, chain: &Chain, _now: i64) -> Result<(Chain, Vec<u64>, Vec<String>), StorageError> {
        if let Some(checkpoint_chain) = self.checkpoints.most_recent_valid_backup()? {
            return Ok((
                checkpoint_chain,
                Vec::new(),
                vec!["restored from most recent valid checkpoint".to_string()],
            ));
        }
        if let Some(backup_chain) = self.backups.most_recent_valid_backup()? {
            return Ok((
                backup_chain,
                Vec::new(),
                vec!["restored from most recent valid backup".to_string()],
            ));
        }
        let genesis_only = Chain::new(chain.digest_algorithm());
        Ok((
            genesis_only,
            (1..=chain.height()).collect(),
            vec!["no valid checkpoint or backup found; reinitialized to genesis".to_string()],
        ))
    }
}

fn at_least_as_valid(before: &ValidationReport, after: &ValidationReport) -> bool {
    if after.ok {
        return true;
    }
    let before_critical = before.errors.iter().filter(|e| e.severity == crate::types::ValidationIssueSeverity::Critical).count();
    let after_critical = after.errors.iter().filter(|e| e.severity == crate::types::ValidationIssueSeverity::Critical).count();
    after_critical < before_critical || (after_critical == before_critical && after.errors.len() < before.errors.len())
}
