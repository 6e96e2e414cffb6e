//! Per-artifact admission decisions.
//!
//! A small struct configured from [`LedgerConfig`] whose `validate`
//! method runs a fixed sequence of checks. The decision is a value
//! (`Decision`) rather than a `Result` — admission is a policy outcome,
//! not success or failure of the call itself.

use crate::chain::Chain;
use crate::config::LedgerConfig;
use crate::types::{Artifact, AuthenticationMethod, Tier};

/// Outcome of running an artifact through admission policy. Exactly one
/// variant is returned per candidate.
#[derive(Clone, Debug, PartialEq)]
pub enum Decision {
    Mintable {
        effective_weight: f64,
        threshold: f64,
    },
    NeedsCorroboration {
        required: usize,
        have: usize,
    },
    Rejected {
        reason: String,
    },
}

impl Decision {
    pub fn is_mintable(&self) -> bool {
        matches!(self, Decision::Mintable { .. })
    }
}

/// Evaluates candidate artifacts against the tier-threshold matrix.
pub struct ArtifactValidator<'a> {
    config: &'a LedgerConfig,
}

impl<'a> ArtifactValidator<'a> {
    pub fn new(config: &'a LedgerConfig) -> Self {
        ArtifactValidator { config }
    }

    /// Runs field-level checks, then the tier-threshold matrix, against
    /// `candidate` and the already-committed state in `chain`.
    pub fn validate(&self, candidate: &Artifact, chain: &Chain) -> Decision {
        if let Some(reason) = self.check_required_fields(candidate, chain) {
            return Decision::Rejected { reason };
        }

        let effective_weight = candidate.effective_weight();

        match candidate.tier {
            Tier::Government => self.evaluate_government(candidate, effective_weight),
            Tier::Financial => self.evaluate_financial(candidate, effective_weight),
            Tier::ThirdParty => self.evaluate_third_party(candidate, effective_weight),
            Tier::Personal => self.evaluate_personal(candidate, chain),
        }
    }

    fn check_required_fields(&self, candidate: &Artifact, chain: &Chain) -> Option<String> {
        if candidate.id.is_empty() {
            return Some("artifact id is empty".into());
        }
        if !(0.0..=1.0).contains(&candidate.weight) {
            return Some(format!("weight {} is out of range [0,1]", candidate.weight));
        }
        if !candidate.content_hash.is_well_formed() {
            return Some("content_hash is not well-formed".into());
        }
        if chain.is_committed(&candidate.id) {
            return Some(format!("artifact id {} already committed", candidate.id));
        }
        for corroborating_id in &candidate.corroborating_ids {
            if !chain.is_committed(corroborating_id) {
                return Some(format!(
                    "corroborating_id {corroborating_id} does not resolve to a committed artifact"
                ));
            }
        }
        None
    }

    fn evaluate_government(&self, candidate: &Artifact, effective_weight: f64) -> Decision {
        let threshold = 0.90;
        if effective_weight >= threshold {
            if candidate.authentication_method == AuthenticationMethod::DigitalSeal {
                return Decision::Mintable {
                    effective_weight,
                    threshold,
                };
            }
            return Decision::NeedsCorroboration { required: 1, have: 0 };
        }
        Decision::Rejected {
            reason: format!(
                "effective weight {effective_weight:.2} below GOVERNMENT threshold {threshold:.2}"
            ),
        }
    }

    fn evaluate_financial(&self, candidate: &Artifact, effective_weight: f64) -> Decision {
        let threshold = 0.95;
        if effective_weight >= threshold {
            if candidate.authentication_method != AuthenticationMethod::None {
                return Decision::Mintable {
                    effective_weight,
                    threshold,
                };
            }
            return Decision::NeedsCorroboration { required: 1, have: 0 };
        }
        Decision::Rejected {
            reason: format!(
                "effective weight {effective_weight:.2} below FINANCIAL threshold {threshold:.2}"
            ),
        }
    }

    fn evaluate_third_party(&self, candidate: &Artifact, effective_weight: f64) -> Decision {
        let threshold = 0.90;
        if effective_weight >= threshold {
            if candidate.authentication_method != AuthenticationMethod::None {
                return Decision::Mintable {
                    effective_weight,
                    threshold,
                };
            }
            return Decision::NeedsCorroboration { required: 1, have: 0 };
        }
        Decision::Rejected {
            reason: format!(
                "effective weight {effective_weight:.2} below THIRD_PARTY threshold {threshold:.2}"
            ),
        }
    }

    /// PERSONAL artifacts never auto-mint; they require a minimum number
    /// of distinct, already-committed corroborating artifacts.
    fn evaluate_personal(&self, candidate: &Artifact, chain: &Chain) -> Decision {
        let required = self.config.min_personal_corroborations;
        let distinct: std::collections::HashSet<_> = candidate
            .corroborating_ids
            .iter()
            .filter(|id| chain.is_committed(id))
            .collect();
        if distinct.len() >= required {
            return Decision::Mintable {
                effective_weight: candidate.effective_weight(),
                threshold: 0.0,
            };
        }
        Decision::NeedsCorroboration {
            required,
            have: distinct.len(),
        }
    }
}
