//! Top-level configuration for a ledger instance.
//!
//! This module aggregates configuration for:
//!
//! - admission/minting parameters (`LedgerConfig` top-level fields),
//! - backup/checkpoint storage (`BackupStoreConfig`),
//! - the Prometheus metrics exporter (`MetricsConfig`).
//!
//! `ConfigBuilder` lets a caller override only the fields it cares about
//! while falling back to documented defaults.

use std::net::SocketAddr;

use crate::types::Digest;

/// Configuration for the Prometheus metrics exporter.
#[derive(Clone, Debug)]
pub struct MetricsConfig {
    /// Whether to run a `/metrics` HTTP exporter.
    pub enabled: bool,
    /// Address to bind the metrics HTTP server to.
    pub listen_addr: SocketAddr,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        let addr: SocketAddr = "127.0.0.1:9899"
            .parse()
            .expect("hard-coded metrics listen address should parse");
        Self {
            enabled: false,
            listen_addr: addr,
        }
    }
}

/// Configuration for backup/checkpoint storage on disk.
#[derive(Clone, Debug)]
pub struct BackupStoreConfig {
    /// Directory backups and checkpoints are written under.
    pub directory: std::path::PathBuf,
    /// Number of backups retained before the oldest is pruned
    /// Default 10.
    pub retention_count: usize,
}

impl Default for BackupStoreConfig {
    fn default() -> Self {
        Self {
            directory: std::path::PathBuf::from("./ledger-backups"),
            retention_count: 10,
        }
    }
}

/// Top-level ledger configuration, aggregating every admission/minting
/// option plus the ambient sub-configs above.
#[derive(Clone, Debug)]
pub struct LedgerConfig {
    /// PoW leading-zero hex digits required of a sealed block's hash.
    pub difficulty: u32,
    /// Digest algorithm used for content, header, and Merkle hashing.
    /// Fixed for the lifetime of a chain.
    pub digest_algorithm: Digest,
    /// Clock-skew tolerance applied when checking block timestamps.
    pub max_future_skew_seconds: i64,
    /// Relative tolerance applied by the PARTIAL contradiction check.
    pub partial_amount_tolerance: f64,
    /// Minimum distinct corroborating artifacts required to mint a
    /// PERSONAL-tier artifact.
    pub min_personal_corroborations: usize,
    pub backup: BackupStoreConfig,
    pub metrics: MetricsConfig,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            difficulty: 4,
            digest_algorithm: Digest::default(),
            max_future_skew_seconds: 60,
            partial_amount_tolerance: 0.05,
            min_personal_corroborations: 3,
            backup: BackupStoreConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

/// Fluent builder over [`LedgerConfig`] for callers who want to override a
/// handful of fields without spelling out the whole struct.
#[derive(Default)]
pub struct ConfigBuilder {
    config: LedgerConfig,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        ConfigBuilder {
            config: LedgerConfig::default(),
        }
    }

    pub fn difficulty(mut self, difficulty: u32) -> Self {
        self.config.difficulty = difficulty;
        self
    }

    pub fn digest_algorithm(mut self, algo: Digest) -> Self {
        self.config.digest_algorithm = algo;
        self
    }

    pub fn max_future_skew_seconds(mut self, seconds: i64) -> Self {
        self.config.max_future_skew_seconds = seconds;
        self
    }

    pub fn partial_amount_tolerance(mut self, tolerance: f64) -> Self {
        self.config.partial_amount_tolerance = tolerance;
        self
    }

    pub fn min_personal_corroborations(mut self, count: usize) -> Self {
        self.config.min_personal_corroborations = count;
        self
    }

    pub fn backup(mut self, backup: BackupStoreConfig) -> Self {
        self.config.backup = backup;
        self
    }

    pub fn metrics(mut self, metrics: MetricsConfig) -> Self {
        self.config.metrics = metrics;
        self
    }

    pub fn build(self) -> LedgerConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_overrides_only_requested_fields() {
        let cfg = ConfigBuilder::new().difficulty(2).build();
        assert_eq!(cfg.difficulty, 2);
        assert_eq!(cfg.min_personal_corroborations, 3);
    }
}
