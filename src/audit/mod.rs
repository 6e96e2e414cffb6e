//! Full-chain integrity auditing.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;

use crate::chain::Chain;
use crate::concurrency::CancelToken;
use crate::config::LedgerConfig;
use crate::metrics::LedgerMetrics;
use crate::types::block::{hash_meets_difficulty, GENESIS_PREVIOUS_HASH};
use crate::types::{ValidationError, ValidationReport, ValidationSummary};

/// Runs the full set of integrity checks against a whole chain and
/// produces a typed report.
pub struct ChainAuditor<'a> {
    config: &'a LedgerConfig,
    metrics: Option<Arc<LedgerMetrics>>,
}

impl<'a> ChainAuditor<'a> {
    pub fn new(config: &'a LedgerConfig) -> Self {
        ChainAuditor { config, metrics: None }
    }

    /// Same as [`Self::new`], but observes validation-run latency against
    /// `metrics`.
    pub fn with_metrics(config: &'a LedgerConfig, metrics: Arc<LedgerMetrics>) -> Self {
        ChainAuditor {
            config,
            metrics: Some(metrics),
        }
    }

    /// Runs the full audit. `cancel` is checked between per-block checks
    /// so a caller can abort an audit of a very large chain; a
    /// cancelled run still returns whatever was accumulated so far.
    pub fn run(&self, chain: &Chain, now: i64, cancel: &CancelToken) -> ValidationReport {
        let started = now;
        let wall_clock_start = Instant::now();
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        self.check_genesis(chain, &mut errors);

        let blocks: Vec<_> = chain.iter_blocks().collect();
        self.check_linkage(&blocks, &mut errors);

        let mut seen_artifact_ids: HashSet<&str> = HashSet::new();
        let mut content_hash_counts: HashMap<String, u32> = HashMap::new();
        let mut prev_timestamp: Option<i64> = None;

        for block in &blocks {
            if cancel.is_cancelled() {
                break;
            }
            self.check_block_self_validation(block, now, &mut errors);
            self.check_merkle_root(block, &mut errors);
            self.check_pow(block, &mut errors);
            self.check_artifact_invariants(block, chain, &mut seen_artifact_ids, &mut errors);
            self.check_cross_references(block, chain, &mut errors);
            self.check_timestamps(block, prev_timestamp, now, &mut errors, &mut warnings);
            prev_timestamp = Some(block.header.timestamp);

            for artifact in &block.artifacts {
                *content_hash_counts
                    .entry(artifact.content_hash.to_hex())
                    .or_insert(0) += 1;
            }
        }

        self.check_duplicate_content_hashes(&content_hash_counts, &mut warnings);

        let recommendations = recommendations_for(&errors);
        let summary = ValidationSummary {
            blocks: blocks.len() as u64,
            artifacts: blocks.iter().map(|b| b.artifacts.len() as u64).sum(),
            duration_ms: (now - started).unsigned_abs() as u64,
            recommendations,
        };

        if let Some(m) = &self.metrics {
            m.validation_run_seconds.observe(wall_clock_start.elapsed().as_secs_f64());
        }

        let report = ValidationReport {
            ok: false,
            errors,
            warnings,
            summary,
        }
        .finalize();

        tracing::info!(
            blocks = report.summary.blocks,
            errors = report.errors.len(),
            warnings = report.warnings.len(),
            ok = report.ok,
            "chain validation run complete"
        );
        report
    }

    fn check_genesis(&self, chain: &Chain, errors: &mut Vec<ValidationError>) {
        match chain.block_at(0) {
            Some(genesis) if genesis.header.index == 0 && genesis.header.previous_hash == GENESIS_PREVIOUS_HASH => {}
            Some(_) => errors.push(ValidationError::critical(
                "genesis block is malformed",
                Some(0),
            )),
            None => errors.push(ValidationError::critical("chain has no genesis block", None)),
        }
    }

    fn check_linkage(&self, blocks: &[&crate::types::Block], errors: &mut Vec<ValidationError>) {
        for i in 1..blocks.len() {
            let prev = blocks[i - 1];
            let curr = blocks[i];
            if curr.header.index != prev.header.index + 1 {
                errors.push(ValidationError::critical(
                    format!(
                        "block {} index does not follow block {}",
                        curr.header.index, prev.header.index
                    ),
                    Some(curr.header.index),
                ));
            }
            if curr.header.previous_hash != prev.compute_hash().0.to_hex() {
                errors.push(ValidationError::critical(
                    format!("block {} previous_hash does not match block {}'s hash", curr.header.index, prev.header.index),
                    Some(curr.header.index),
                ));
            }
        }
    }

    fn check_block_self_validation(
        &self,
        block: &crate::types::Block,
        now: i64,
        errors: &mut Vec<ValidationError>,
    ) {
        let (block_errors, _) = block.validate(self.config.max_future_skew_seconds, now);
        for message in block_errors {
            // Merkle/PoW/timestamp issues are re-derived by the dedicated
            // checks below with their own canonical wording; this check
            // only surfaces the structural field-level problems.
            if message.contains("out-of-range weight") || message.contains("empty id") {
                errors.push(ValidationError::error(message, Some(block.header.index)));
            }
        }
    }

    fn check_merkle_root(&self, block: &crate::types::Block, errors: &mut Vec<ValidationError>) {
        let recomputed = crate::types::Block::compute_merkle_root(&block.artifacts, block.header.digest_algorithm);
        if recomputed != block.header.merkle_root {
            errors.push(ValidationError::error(
                format!("Merkle root mismatch at block {}", block.header.index),
                Some(block.header.index),
            ));
        }
    }

    fn check_pow(&self, block: &crate::types::Block, errors: &mut Vec<ValidationError>) {
        if !hash_meets_difficulty(&block.compute_hash(), block.header.difficulty) {
            errors.push(ValidationError::error(
                format!("proof-of-work invalid at block {}", block.header.index),
                Some(block.header.index),
            ));
        }
    }

    fn check_artifact_invariants<'b>(
        &self,
        block: &'b crate::types::Block,
        chain: &Chain,
        seen_artifact_ids: &mut HashSet<&'b str>,
        errors: &mut Vec<ValidationError>,
    ) {
        for artifact in &block.artifacts {
            if !seen_artifact_ids.insert(artifact.id.as_str()) {
                errors.push(ValidationError::critical(
                    format!("artifact id {} is duplicated across the chain", artifact.id),
                    Some(block.header.index),
                ));
            }
            if !artifact.content_hash.is_well_formed() {
                errors.push(ValidationError::error(
                    format!("content_hash for artifact {} is not well-formed", artifact.id),
                    Some(block.header.index),
                ));
            } else if !artifact.content_hash_matches(chain.digest_algorithm()) {
                errors.push(ValidationError::critical(
                    format!("content hash mismatch for artifact {}", artifact.id),
                    Some(block.header.index),
                ));
            }
            if !(0.0..=1.0).contains(&artifact.weight) {
                errors.push(ValidationError::error(
                    format!("artifact {} has out-of-range weight {}", artifact.id, artifact.weight),
                    Some(block.header.index),
                ));
            }
        }
    }

    fn check_cross_references(
        &self,
        block: &crate::types::Block,
        chain: &Chain,
        errors: &mut Vec<ValidationError>,
    ) {
        for artifact in &block.artifacts {
            for corroborating_id in &artifact.corroborating_ids {
                let resolves_earlier = chain
                    .artifact_by_id(corroborating_id)
                    .and_then(|_| chain_block_index(chain, corroborating_id))
                    .is_some_and(|idx| idx < block.header.index);
                if !resolves_earlier {
                    errors.push(ValidationError::error(
                        format!(
                            "artifact {} corroborating_id {} does not resolve to an earlier block",
                            artifact.id, corroborating_id
                        ),
                        Some(block.header.index),
                    ));
                }
            }
        }
    }

    fn check_timestamps(
        &self,
        block: &crate::types::Block,
        prev_timestamp: Option<i64>,
        now: i64,
        errors: &mut Vec<ValidationError>,
        warnings: &mut Vec<String>,
    ) {
        if block.header.timestamp > now + self.config.max_future_skew_seconds {
            errors.push(ValidationError::error(
                format!("block {} timestamp is in the future", block.header.index),
                Some(block.header.index),
            ));
        }
        if let Some(prev) = prev_timestamp {
            if block.header.timestamp < prev {
                errors.push(ValidationError::critical(
                    format!("block {} timestamp regresses versus its predecessor", block.header.index),
                    Some(block.header.index),
                ));
            } else if block.header.timestamp - prev < 1 {
                warnings.push(format!(
                    "block {} is less than 1 second after its predecessor",
                    block.header.index
                ));
            }
        }
    }

    fn check_duplicate_content_hashes(&self, counts: &HashMap<String, u32>, warnings: &mut Vec<String>) {
        for (hash, count) in counts {
            if *count > 1 {
                warnings.push(format!("content hash {hash} appears in {count} committed artifacts"));
            }
        }
    }
}

fn chain_block_index(chain: &Chain, artifact_id: &str) -> Option<u64> {
    chain.iter_blocks().find_map(|b| {
        b.artifacts
            .iter()
            .any(|a| a.id == artifact_id)
            .then_some(b.header.index)
    })
}

fn recommendations_for(errors: &[ValidationError]) -> Vec<String> {
    let mut recommendations = Vec::new();
    let hash_mismatches = errors
        .iter()
        .filter(|e| e.message.contains("Merkle root mismatch") || e.message.contains("content hash mismatch"))
        .count();
    if hash_mismatches >= 2 {
        recommendations.push("possible tampering; restore from checkpoint".to_string());
    }
    if errors.iter().any(|e| e.message.contains("proof-of-work invalid")) {
        recommendations.push("re-seal affected blocks or run AGGRESSIVE recovery".to_string());
    }
    if errors
        .iter()
        .any(|e| e.message.contains("does not follow") || e.message.contains("does not match"))
    {
        recommendations.push("chain linkage is broken; run REBUILD recovery from the last good checkpoint".to_string());
    }
    recommendations
}
