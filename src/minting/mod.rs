//! The minting pipeline: orchestrates admission, contradiction
//! resolution, sealing, and append for a single batch of candidate
//! artifacts.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use crate::chain::Chain;
use crate::config::LedgerConfig;
use crate::concurrency::CancelToken;
use crate::error::LedgerError;
use crate::events::{EventBus, LedgerEvent};
use crate::metrics::LedgerMetrics;
use crate::types::{Artifact, ArtifactId, Block, Contradiction};
use crate::validation::contradiction::{detect_kind, find_chain_conflict, resolve};
use crate::validation::{ArtifactValidator, Decision};

#[derive(Clone, Debug)]
pub struct RejectedArtifact {
    pub id: ArtifactId,
    pub reason: String,
}

#[derive(Clone, Debug)]
pub struct PendingCorroboration {
    pub id: ArtifactId,
    pub required: usize,
    pub have: usize,
}

/// Result of running one batch through the pipeline.
#[derive(Clone, Debug, Default)]
pub struct MintOutcome {
    pub minted: Vec<ArtifactId>,
    pub rejected: Vec<RejectedArtifact>,
    pub needs_corroboration: Vec<PendingCorroboration>,
    pub contradictions: Vec<Contradiction>,
    pub block_index: Option<u64>,
}

/// Carries the partial [`MintOutcome`] alongside the cause when a batch
/// fails after survivors were already determined: sealing never
/// partially commits, but the rejected/needs-corroboration outputs
/// computed so far are still returned for caller handling.
#[derive(Debug)]
pub struct MintFailure {
    pub outcome: MintOutcome,
    pub cause: LedgerError,
}

pub struct MintingPipeline<'a> {
    config: &'a LedgerConfig,
    metrics: Option<Arc<LedgerMetrics>>,
}

impl<'a> MintingPipeline<'a> {
    pub fn new(config: &'a LedgerConfig) -> Self {
        MintingPipeline { config, metrics: None }
    }

    /// Same as [`Self::new`], but observes block-seal latency and
    /// minted/rejected/contradiction counts against `metrics`.
    pub fn with_metrics(config: &'a LedgerConfig, metrics: Arc<LedgerMetrics>) -> Self {
        MintingPipeline {
            config,
            metrics: Some(metrics),
        }
    }

    /// Runs `candidates` through admission, contradiction resolution,
    /// sealing, and append, in the original batch order.
    pub fn mint_batch(
        &self,
        chain: &mut Chain,
        events: &EventBus,
        cancel: &CancelToken,
        candidates: Vec<Artifact>,
        miner_id: String,
        now: i64,
    ) -> Result<MintOutcome, MintFailure> {
        let mut outcome = MintOutcome::default();

        // Step 1: de-duplicate within the batch by id and content_hash.
        let mut seen_ids = HashSet::new();
        let mut seen_hashes = HashSet::new();
        let mut deduped = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            if !seen_ids.insert(candidate.id.clone()) || !seen_hashes.insert(candidate.content_hash.0) {
                outcome.rejected.push(RejectedArtifact {
                    id: candidate.id.clone(),
                    reason: "duplicate within batch".to_string(),
                });
                continue;
            }
            deduped.push(candidate);
        }

        // Step 2: per-candidate admission decision.
        let validator = ArtifactValidator::new(self.config);
        let mut survivors: Vec<Artifact> = Vec::new();
        for candidate in deduped {
            match validator.validate(&candidate, chain) {
                Decision::Mintable { .. } => survivors.push(candidate),
                Decision::NeedsCorroboration { required, have } => {
                    tracing::debug!(id = %candidate.id, required, have, "artifact needs corroboration");
                    outcome.needs_corroboration.push(PendingCorroboration {
                        id: candidate.id,
                        required,
                        have,
                    });
                }
                Decision::Rejected { reason } => {
                    tracing::warn!(id = %candidate.id, reason = %reason, "artifact rejected at admission");
                    if let Some(m) = &self.metrics {
                        m.artifacts_rejected.inc();
                    }
                    outcome.rejected.push(RejectedArtifact {
                        id: candidate.id,
                        reason,
                    });
                }
            }
        }

        // Step 3a: survivors vs. already-committed chain state.
        let mut after_chain_check = Vec::with_capacity(survivors.len());
        for candidate in survivors {
            match find_chain_conflict(&candidate, chain) {
                Some((existing, kind)) => {
                    let contradiction = resolve(
                        kind,
                        &candidate,
                        existing,
                        now,
                        format!("ct-{}-{}", candidate.id, existing.id),
                    );
                    let candidate_lost = contradiction.winner_id == existing.id;
                    tracing::info!(
                        winner = %contradiction.winner_id,
                        kind = ?contradiction.kind,
                        resolution = ?contradiction.resolution,
                        "contradiction resolved against committed chain state"
                    );
                    if let Some(m) = &self.metrics {
                        m.contradictions_resolved.inc();
                    }
                    outcome.contradictions.push(contradiction.clone());
                    if candidate_lost {
                        if let Some(m) = &self.metrics {
                            m.artifacts_rejected.inc();
                        }
                        outcome.rejected.push(RejectedArtifact {
                            id: candidate.id,
                            reason: format!(
                                "contradicts {} via {:?}",
                                existing.id, contradiction.resolution
                            ),
                        });
                    } else {
                        after_chain_check.push(candidate);
                    }
                }
                None => after_chain_check.push(candidate),
            }
        }

        // Step 3b: pairwise conflicts among remaining batch peers.
        let final_survivors = self.resolve_batch_conflicts(after_chain_check, now, &mut outcome);

        if final_survivors.is_empty() {
            return Ok(outcome);
        }

        // Step 4: queue survivors, then seal and append them as one block.
        for survivor in final_survivors {
            chain.enqueue_pending(survivor);
        }

        let tip = chain.tip().expect("chain always has at least genesis");
        let previous_hash = tip.compute_hash().0.to_hex();
        let pending = chain.pending_artifacts().to_vec();

        let unsealed = Block::new_unsealed(
            tip.header.index + 1,
            previous_hash,
            pending,
            self.config.difficulty,
            miner_id,
            chain.digest_algorithm(),
            now,
        );

        let seal_started = Instant::now();
        let sealed = match unsealed.seal(cancel, |_| {}) {
            Ok(block) => block,
            Err(e) => {
                chain.clear_pending();
                return Err(MintFailure {
                    outcome,
                    cause: LedgerError::from(crate::error::BlockError::from(e)),
                });
            }
        };
        if let Some(m) = &self.metrics {
            m.block_seal_seconds.observe(seal_started.elapsed().as_secs_f64());
        }
        chain.clear_pending();

        let block_index = sealed.header.index;
        let artifact_ids: Vec<ArtifactId> = sealed.artifacts.iter().map(|a| a.id.clone()).collect();
        let block_hash = sealed.compute_hash().0.to_hex();

        if let Err(e) = chain.append(sealed) {
            return Err(MintFailure {
                outcome,
                cause: LedgerError::from(e),
            });
        }
        tracing::info!(block_index, hash = %block_hash, artifacts = artifact_ids.len(), "block sealed");
        if let Some(m) = &self.metrics {
            m.artifacts_minted.inc_by(artifact_ids.len() as u64);
        }

        // Step 5: events, only after commit.
        events.publish(LedgerEvent::BlockCommitted {
            index: block_index,
            hash: block_hash,
        });
        for id in &artifact_ids {
            events.publish(LedgerEvent::ArtifactMinted {
                id: id.clone(),
                block_index,
            });
        }
        for rejected in &outcome.rejected {
            events.publish(LedgerEvent::ArtifactRejected {
                id: rejected.id.clone(),
                reason: rejected.reason.clone(),
            });
        }
        for contradiction in &outcome.contradictions {
            events.publish(LedgerEvent::ContradictionRecorded {
                record: contradiction.clone(),
            });
        }

        outcome.minted = artifact_ids;
        outcome.block_index = Some(block_index);
        Ok(outcome)
    }

    /// Detects and resolves conflicts among the Mintable survivors of the
    /// same batch, restricted to pairs sharing a case id, keeping only
    /// winners.
    fn resolve_batch_conflicts(
        &self,
        candidates: Vec<Artifact>,
        now: i64,
        outcome: &mut MintOutcome,
    ) -> Vec<Artifact> {
        let mut alive: Vec<Artifact> = candidates;
        let mut losers = HashSet::new();

        for i in 0..alive.len() {
            if losers.contains(&alive[i].id) {
                continue;
            }
            for j in (i + 1)..alive.len() {
                if losers.contains(&alive[j].id) {
                    continue;
                }
                if alive[i].case_id != alive[j].case_id {
                    continue;
                }
                if let Some(kind) = detect_kind(&alive[i], &alive[j]) {
                    let contradiction = resolve(
                        kind,
                        &alive[i],
                        &alive[j],
                        now,
                        format!("ct-{}-{}", alive[i].id, alive[j].id),
                    );
                    let loser_id = contradiction.loser_id().clone();
                    tracing::info!(
                        winner = %contradiction.winner_id,
                        loser = %loser_id,
                        resolution = ?contradiction.resolution,
                        "contradiction resolved between batch peers"
                    );
                    if let Some(m) = &self.metrics {
                        m.contradictions_resolved.inc();
                        m.artifacts_rejected.inc();
                    }
                    outcome.contradictions.push(contradiction.clone());
                    outcome.rejected.push(RejectedArtifact {
                        id: loser_id.clone(),
                        reason: format!("contradicts batch peer via {:?}", contradiction.resolution),
                    });
                    losers.insert(loser_id);
                }
            }
        }

        alive.retain(|a| !losers.contains(&a.id));
        alive
    }
}
