//! Core domain types shared across the ledger.
//!
//! This module defines strongly-typed tiers, authentication methods, and
//! the artifact/block/contradiction/report data carried through the rest
//! of the crate. The goal is to avoid "naked" strings and floats in
//! public APIs where a domain-specific newtype or enum documents the
//! intent instead.

pub mod artifact;
pub mod block;
pub mod checkpoint;
pub mod contradiction;
pub mod report;

pub use artifact::{Artifact, ArtifactId, ContentHash};
pub use block::{Block, BlockHash, Header};
pub use checkpoint::{BackupManifest, Checkpoint, BACKUP_FORMAT_VERSION};
pub use contradiction::{Contradiction, ContradictionKind, Resolution, Severity};
pub use report::{ValidationError, ValidationIssueSeverity, ValidationReport, ValidationSummary};

use serde::{Deserialize, Serialize};

/// Authority class of an artifact. Governs which admission threshold in
/// [`crate::validation::validator::ArtifactValidator`] applies.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Tier {
    Government,
    Financial,
    ThirdParty,
    Personal,
}

impl Tier {
    /// Relative authority rank used by the HIERARCHY resolution rule.
    /// Higher is more authoritative: Government > Financial > ThirdParty > Personal.
    pub fn rank(self) -> u8 {
        match self {
            Tier::Government => 3,
            Tier::Financial => 2,
            Tier::ThirdParty => 1,
            Tier::Personal => 0,
        }
    }
}

/// How an artifact's authenticity was attested. Contributes a fixed,
/// non-negative bonus to effective weight and ranks the AUTHENTICATION
/// resolution rule.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum AuthenticationMethod {
    DigitalSeal,
    Notarization,
    DigitalSignature,
    Certification,
    Stamp,
    Metadata,
    Witness,
    None,
}

impl AuthenticationMethod {
    /// Additive bonus applied to raw weight before clamping to 1.0.
    pub fn bonus(self) -> f64 {
        match self {
            AuthenticationMethod::DigitalSeal | AuthenticationMethod::Notarization => 0.10,
            AuthenticationMethod::DigitalSignature | AuthenticationMethod::Certification => 0.08,
            AuthenticationMethod::Stamp => 0.05,
            AuthenticationMethod::Metadata | AuthenticationMethod::Witness => 0.03,
            AuthenticationMethod::None => 0.0,
        }
    }

    /// Strength rank used by the AUTHENTICATION resolution rule: higher
    /// wins. Ranked `DigitalSeal > Notarization > DigitalSignature >
    /// Certification > Stamp > None`; `Metadata`/`Witness` sit below
    /// `Stamp` and above `None`.
    pub fn strength_rank(self) -> u8 {
        match self {
            AuthenticationMethod::DigitalSeal => 6,
            AuthenticationMethod::Notarization => 5,
            AuthenticationMethod::DigitalSignature => 4,
            AuthenticationMethod::Certification => 3,
            AuthenticationMethod::Stamp => 2,
            AuthenticationMethod::Metadata | AuthenticationMethod::Witness => 1,
            AuthenticationMethod::None => 0,
        }
    }
}

/// Digest algorithm recorded on a chain header. Made explicit per-chain
/// rather than a compile-time constant so an auditor can validate either
/// choice; a given chain must use one algorithm consistently throughout
/// its lifetime.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Digest {
    Sha256,
    Sha3_256,
}

impl Default for Digest {
    fn default() -> Self {
        Digest::Sha3_256
    }
}
