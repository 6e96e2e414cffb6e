//! Contradiction records produced by [`crate::validation::contradiction`].

use serde::{Deserialize, Serialize};

use crate::types::ArtifactId;

/// The shape of conflict detected between two artifacts in the same case.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum ContradictionKind {
    /// Opposing predicates over the same subject (e.g. signed/unsigned).
    Direct,
    /// One artifact asserts an event ordered before a prerequisite the
    /// other asserts (e.g. sign before draft).
    Temporal,
    /// Same subject, overlapping time interval, mutually exclusive
    /// attribute (e.g. two locations).
    Logical,
    /// Same context, numeric amounts differ beyond tolerance.
    Partial,
}

/// Severity of a detected contradiction, derived from kind and the
/// effective weights involved.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Severity {
    Critical,
    Major,
    Moderate,
    Minor,
}

/// Which rule in the resolution ladder decided the winner.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Resolution {
    Hierarchy,
    Authentication,
    AdverseAdmission,
    Contemporaneous,
    TemporalPriority,
    Weight,
}

/// A decided conflict between two artifacts: which rule broke the tie,
/// who won, and how confident the engine is in that call.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Contradiction {
    pub id: String,
    pub artifact_a: ArtifactId,
    pub artifact_b: ArtifactId,
    pub kind: ContradictionKind,
    pub severity: Severity,
    pub resolution: Resolution,
    pub winner_id: ArtifactId,
    pub decided_at: i64,
    /// Always in `[0.5, 0.95]`.
    pub confidence: f64,
}

impl Contradiction {
    pub fn loser_id(&self) -> &ArtifactId {
        if self.winner_id == self.artifact_a {
            &self.artifact_b
        } else {
            &self.artifact_a
        }
    }
}
