//! Evidence ledger library crate.
//!
//! This crate provides the building blocks for an append-only,
//! tamper-evident ledger of legal evidence artifacts:
//!
//! - strongly-typed domain types (`types`),
//! - canonical hashing and Merkle proofs (`hash`),
//! - the append-only chain store and its secondary indices (`chain`),
//! - tiered admission and contradiction resolution (`validation`),
//! - the minting pipeline that ties admission, resolution, and sealing
//!   together (`minting`),
//! - exhaustive integrity auditing (`audit`),
//! - staged backup/checkpoint/recovery (`recovery`),
//! - an in-process event bus (`events`),
//! - and Prometheus metrics plus tracing setup (`metrics`, `telemetry`).
//!
//! [`Ledger`] composes all of the above into the single lifecycle-scoped
//! handle a caller actually holds.

pub mod audit;
pub mod chain;
pub mod concurrency;
pub mod config;
pub mod error;
pub mod events;
pub mod hash;
pub mod metrics;
pub mod minting;
pub mod recovery;
pub mod telemetry;
pub mod types;
pub mod validation;

#[cfg(test)]
pub mod testing;

pub use chain::{Chain, ChainStats, QueryFilter};
pub use config::{BackupStoreConfig, ConfigBuilder, LedgerConfig, MetricsConfig};
pub use error::{BlockError, ChainError, LedgerError, StorageError};
pub use events::{EventBus, LedgerEvent};
pub use metrics::LedgerMetrics;
pub use minting::{MintFailure, MintOutcome, MintingPipeline};
pub use recovery::{RecoveryOutcome, RecoveryService, RecoveryStrategy};
pub use types::*;
pub use validation::{ArtifactValidator, Decision};

use std::sync::Arc;

use concurrency::CancelToken;

/// The single lifecycle-scoped handle a caller holds: one chain, one
/// event bus, one configuration, composed behind a single struct the
/// way a store/validator pair would be — except there is no fork
/// choice here (a single writer), so the composition is just
/// chain + events + config.
pub struct Ledger {
    config: LedgerConfig,
    chain: Chain,
    events: EventBus,
    metrics: Option<Arc<LedgerMetrics>>,
}

/// The default ledger stack: [`ArtifactValidator`]'s tier-threshold
/// admission, the append-only [`Chain`] (no fork choice — a single
/// writer never needs one), and on-disk [`RecoveryService`] backups.
/// `Ledger` is not generic over these the way a parameterized
/// store/validator/fork-choice engine would be, so this alias is just
/// `Ledger` itself under another name for callers that want to spell
/// out "the default stack" explicitly.
pub type DefaultLedger = Ledger;

impl Ledger {
    pub fn new(config: LedgerConfig) -> Self {
        telemetry::init_tracing();
        let chain = Chain::new(config.digest_algorithm);
        Ledger {
            config,
            chain,
            events: EventBus::new(),
            metrics: None,
        }
    }

    /// Same as [`Self::new`], but observes the ledger's Prometheus
    /// metrics (block seal latency, mint/rejection/contradiction counts,
    /// validation run latency, recovery outcomes) at each operation's
    /// boundary.
    pub fn with_metrics(config: LedgerConfig, metrics: Arc<LedgerMetrics>) -> Self {
        let mut ledger = Self::new(config);
        ledger.metrics = Some(metrics);
        ledger
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn chain(&self) -> &Chain {
        &self.chain
    }

    pub fn events_mut(&mut self) -> &mut EventBus {
        &mut self.events
    }

    /// Runs a batch of candidates through admission, contradiction
    /// resolution, sealing, and append.
    pub fn mint_batch(
        &mut self,
        candidates: Vec<Artifact>,
        miner_id: String,
        now: i64,
        cancel: &CancelToken,
    ) -> Result<MintOutcome, MintFailure> {
        let pipeline = match &self.metrics {
            Some(m) => MintingPipeline::with_metrics(&self.config, m.clone()),
            None => MintingPipeline::new(&self.config),
        };
        pipeline.mint_batch(&mut self.chain, &self.events, cancel, candidates, miner_id, now)
    }

    /// Runs a full-chain integrity audit.
    pub fn validate(&self, now: i64, cancel: &CancelToken) -> ValidationReport {
        let auditor = match &self.metrics {
            Some(m) => audit::ChainAuditor::with_metrics(&self.config, m.clone()),
            None => audit::ChainAuditor::new(&self.config),
        };
        auditor.run(&self.chain, now, cancel)
    }

    /// Writes a backup of the current chain to disk.
    pub fn create_backup(&self, now: i64) -> Result<std::path::PathBuf, StorageError> {
        RecoveryService::new(&self.config).create_backup(&self.chain, now)
    }

    /// Labels and persists a checkpoint of the current chain.
    pub fn create_checkpoint(&self, label: &str, now: i64) -> Result<Checkpoint, StorageError> {
        RecoveryService::new(&self.config).create_checkpoint(&self.chain, label, now)
    }

    /// Runs the requested recovery strategy, swapping in a repaired chain
    /// when one is found.
    pub fn auto_recover(
        &mut self,
        strategy: RecoveryStrategy,
        now: i64,
        cancel: &CancelToken,
    ) -> Result<RecoveryOutcome, StorageError> {
        let recovery = match &self.metrics {
            Some(m) => RecoveryService::with_metrics(&self.config, m.clone()),
            None => RecoveryService::new(&self.config),
        };
        recovery.auto_recover(&mut self.chain, strategy, now, cancel, &self.events)
    }

    /// Runs a query against the chain's secondary indices.
    pub fn query(&self, filter: &QueryFilter) -> Vec<&Artifact> {
        self.chain.query(filter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn artifact(id: &str) -> Artifact {
        let mut a = Artifact {
            id: id.into(),
            content_hash: types::artifact::ContentHash([0u8; 32]),
            tier: Tier::Government,
            weight: 0.95,
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
        };
        let digest = hash::digest_bytes(Digest::Sha3_256, &a.canonical_content_bytes());
        a.content_hash = types::artifact::ContentHash(*digest.as_bytes());
        a
    }

    #[test]
    fn ledger_mints_and_validates_end_to_end() {
        let mut ledger = Ledger::new(LedgerConfig::default());
        let cancel = CancelToken::new();

        let outcome = ledger
            .mint_batch(vec![artifact("A")], "m1".into(), 1_700_000_100, &cancel)
            .unwrap();
        assert_eq!(outcome.minted, vec!["A".to_string()]);

        let report = ledger.validate(1_700_000_200, &cancel);
        assert!(report.ok, "errors: {:?}", report.errors);
    }
}
