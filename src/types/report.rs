//! Validation report types produced by [`crate::audit::ChainAuditor`].

use serde::{Deserialize, Serialize};

/// How serious a validation finding is. `Critical` and `Error` both force
/// `ValidationReport::ok = false`; only warnings leave a report `ok`.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum ValidationIssueSeverity {
    Critical,
    Error,
}

/// A single integrity finding produced by a full-chain audit.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ValidationError {
    pub severity: ValidationIssueSeverity,
    pub message: String,
    pub block_index: Option<u64>,
}

impl ValidationError {
    pub fn critical(message: impl Into<String>, block_index: Option<u64>) -> Self {
        ValidationError {
            severity: ValidationIssueSeverity::Critical,
            message: message.into(),
            block_index,
        }
    }

    pub fn error(message: impl Into<String>, block_index: Option<u64>) -> Self {
        ValidationError {
            severity: ValidationIssueSeverity::Error,
            message: message.into(),
            block_index,
        }
    }
}

/// Aggregate counters and derived guidance attached to a report.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ValidationSummary {
    pub blocks: u64,
    pub artifacts: u64,
    pub duration_ms: u64,
    pub recommendations: Vec<String>,
}

/// The complete output of a full-chain audit.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ValidationReport {
    pub ok: bool,
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<String>,
    pub summary: ValidationSummary,
}

impl ValidationReport {
    /// Finalizes `ok` from the accumulated errors: any Critical or Error
    /// finding forces `ok=false`; warnings alone do not.
    pub fn finalize(mut self) -> Self {
        self.ok = self.errors.is_empty();
        self
    }

    pub fn has_critical(&self) -> bool {
        self.errors
            .iter()
            .any(|e| e.severity == ValidationIssueSeverity::Critical)
    }
}
