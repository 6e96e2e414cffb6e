//! The contradiction engine.
//!
//! Conflict *detection* uses small closed lexicons. Conflict
//! *resolution* is a ranked ladder of strategies applied in declared
//! order: a small strategy interface iterated in a fixed sequence
//! rather than dispatched through duck-typed polymorphism.

use crate::chain::Chain;
use crate::types::{Artifact, ArtifactId, Contradiction, ContradictionKind, Resolution, Severity};

/// Opposing predicate pairs recognized by the DIRECT check.
const ANTONYM_PAIRS: &[(&str, &str)] = &[
    ("signed", "unsigned"),
    ("paid", "unpaid"),
    ("present", "absent"),
];

/// `(earlier, later)` action pairs recognized by the TEMPORAL check: the
/// first must have happened no later than the second.
const SEQUENTIAL_PAIRS: &[(&str, &str)] = &[
    ("draft", "sign"),
    ("order", "deliver"),
    ("invoice", "pay"),
];

fn mentions(statement: &str, word: &str) -> bool {
    statement.to_ascii_lowercase().contains(word)
}

fn metadata_f64(artifact: &Artifact, key: &str) -> Option<f64> {
    artifact.metadata.get(key)?.parse().ok()
}

fn is_true(artifact: &Artifact, key: &str) -> bool {
    artifact
        .metadata
        .get(key)
        .is_some_and(|v| v.eq_ignore_ascii_case("true"))
}

/// Detects a conflict between `candidate` and `existing`, both already
/// known to belong to the same case. Returns the kind of conflict found,
/// if any; severity and resolution are computed separately.
pub fn detect_kind(candidate: &Artifact, existing: &Artifact) -> Option<ContradictionKind> {
    debug_assert_eq!(candidate.case_id, existing.case_id);

    if candidate.artifact_type == existing.artifact_type {
        for (x, y) in ANTONYM_PAIRS {
            let direct = (mentions(&candidate.statement, x) && mentions(&existing.statement, y))
                || (mentions(&candidate.statement, y) && mentions(&existing.statement, x));
            if direct {
                return Some(ContradictionKind::Direct);
            }
        }
    }

    for (earlier, later) in SEQUENTIAL_PAIRS {
        let violates = (mentions(&candidate.statement, earlier)
            && mentions(&existing.statement, later)
            && existing.timestamp < candidate.timestamp)
            || (mentions(&candidate.statement, later)
                && mentions(&existing.statement, earlier)
                && candidate.timestamp < existing.timestamp);
        if violates {
            return Some(ContradictionKind::Temporal);
        }
    }

    if let (Some(a_loc), Some(b_loc)) = (
        candidate.metadata.get("location"),
        existing.metadata.get("location"),
    ) {
        let overlapping = (candidate.timestamp - existing.timestamp).abs() <= 3600;
        if a_loc != b_loc && overlapping {
            return Some(ContradictionKind::Logical);
        }
    }

    if let (Some(a_amount), Some(b_amount)) = (
        metadata_f64(candidate, "amount"),
        metadata_f64(existing, "amount"),
    ) {
        let denom = a_amount.abs().max(b_amount.abs()).max(f64::EPSILON);
        if (a_amount - b_amount).abs() / denom > 0.05 {
            return Some(ContradictionKind::Partial);
        }
    }

    None
}

fn severity_of(kind: ContradictionKind, a: &Artifact, b: &Artifact) -> Severity {
    let ew_a = a.effective_weight();
    let ew_b = b.effective_weight();
    let avg = (ew_a + ew_b) / 2.0;

    if kind == ContradictionKind::Direct && ew_a > 0.8 && ew_b > 0.8 {
        return Severity::Critical;
    }
    let supports_theory = is_true(a, "supports_case_theory") || is_true(b, "supports_case_theory");
    if supports_theory && avg > 0.6 {
        return Severity::Major;
    }
    if avg > 0.4 {
        return Severity::Moderate;
    }
    Severity::Minor
}

/// One rule in the resolution ladder. `decide` returns the winner's id
/// if this rule distinguishes the pair, `None` if it's a tie and the
/// next rule should be tried.
trait ResolutionRule {
    fn kind(&self) -> Resolution;
    fn confidence(&self) -> f64;
    fn decide(&self, a: &Artifact, b: &Artifact) -> Option<ArtifactId>;
}

struct HierarchyRule;
impl ResolutionRule for HierarchyRule {
    fn kind(&self) -> Resolution {
        Resolution::Hierarchy
    }
    fn confidence(&self) -> f64 {
        0.95
    }
    fn decide(&self, a: &Artifact, b: &Artifact) -> Option<ArtifactId> {
        winner_by(a, b, |x| x.tier.rank())
    }
}

struct AuthenticationRule;
impl ResolutionRule for AuthenticationRule {
    fn kind(&self) -> Resolution {
        Resolution::Authentication
    }
    fn confidence(&self) -> f64 {
        0.85
    }
    fn decide(&self, a: &Artifact, b: &Artifact) -> Option<ArtifactId> {
        winner_by(a, b, |x| x.authentication_method.strength_rank())
    }
}

struct AdverseAdmissionRule;
impl ResolutionRule for AdverseAdmissionRule {
    fn kind(&self) -> Resolution {
        Resolution::AdverseAdmission
    }
    fn confidence(&self) -> f64 {
        0.75
    }
    fn decide(&self, a: &Artifact, b: &Artifact) -> Option<ArtifactId> {
        winner_by(a, b, |x| is_true(x, "against_interest") as u8)
    }
}

struct ContemporaneousRule;
impl ResolutionRule for ContemporaneousRule {
    fn kind(&self) -> Resolution {
        Resolution::Contemporaneous
    }
    fn confidence(&self) -> f64 {
        0.70
    }
    fn decide(&self, a: &Artifact, b: &Artifact) -> Option<ArtifactId> {
        winner_by(a, b, |x| is_true(x, "contemporaneous") as u8)
    }
}

struct TemporalPriorityRule;
impl ResolutionRule for TemporalPriorityRule {
    fn kind(&self) -> Resolution {
        Resolution::TemporalPriority
    }
    fn confidence(&self) -> f64 {
        0.60
    }
    fn decide(&self, a: &Artifact, b: &Artifact) -> Option<ArtifactId> {
        if !is_true(a, "contemporaneous") || !is_true(b, "contemporaneous") {
            return None;
        }
        // Earlier wins, so invert timestamp for the "higher wins" comparator.
        winner_by(a, b, |x| std::cmp::Reverse(x.timestamp))
    }
}

struct WeightRule;
impl ResolutionRule for WeightRule {
    fn kind(&self) -> Resolution {
        Resolution::Weight
    }
    fn confidence(&self) -> f64 {
        0.50
    }
    fn decide(&self, a: &Artifact, b: &Artifact) -> Option<ArtifactId> {
        if a.effective_weight() == b.effective_weight() {
            return None;
        }
        if a.effective_weight() > b.effective_weight() {
            Some(a.id.clone())
        } else {
            Some(b.id.clone())
        }
    }
}

fn winner_by<T: PartialOrd + PartialEq>(a: &Artifact, b: &Artifact, key: impl Fn(&Artifact) -> T) -> Option<ArtifactId> {
    let ka = key(a);
    let kb = key(b);
    if ka == kb {
        None
    } else if ka > kb {
        Some(a.id.clone())
    } else {
        Some(b.id.clone())
    }
}

fn rules() -> Vec<Box<dyn ResolutionRule>> {
    vec![
        Box::new(HierarchyRule),
        Box::new(AuthenticationRule),
        Box::new(AdverseAdmissionRule),
        Box::new(ContemporaneousRule),
        Box::new(TemporalPriorityRule),
        Box::new(WeightRule),
    ]
}

/// Resolves a detected conflict: applies each rule in declared order,
/// taking the first that distinguishes the pair.
pub fn resolve(
    kind: ContradictionKind,
    a: &Artifact,
    b: &Artifact,
    decided_at: i64,
    contradiction_id: String,
) -> Contradiction {
    let severity = severity_of(kind, a, b);
    for rule in rules() {
        if let Some(winner_id) = rule.decide(a, b) {
            return Contradiction {
                id: contradiction_id,
                artifact_a: a.id.clone(),
                artifact_b: b.id.clone(),
                kind,
                severity,
                resolution: rule.kind(),
                winner_id,
                decided_at,
                confidence: rule.confidence(),
            };
        }
    }
    // Every rule tied: fall back to id ordering so the result remains
    // deterministic regardless of call order.
    let winner_id = if a.id <= b.id { a.id.clone() } else { b.id.clone() };
    Contradiction {
        id: contradiction_id,
        artifact_a: a.id.clone(),
        artifact_b: b.id.clone(),
        kind,
        severity,
        resolution: Resolution::Weight,
        winner_id,
        decided_at,
        confidence: 0.5,
    }
}

/// Finds the first committed artifact in `chain`, restricted to
/// `candidate`'s case, that conflicts with `candidate`.
pub fn find_chain_conflict<'a>(candidate: &Artifact, chain: &'a Chain) -> Option<(&'a Artifact, ContradictionKind)> {
    chain
        .query(&crate::chain::QueryFilter {
            case_id: Some(candidate.case_id.clone()),
            ..Default::default()
        })
        .into_iter()
        .find_map(|existing| detect_kind(candidate, existing).map(|kind| (existing, kind)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AuthenticationMethod, Tier};
    use std::collections::BTreeMap;

    fn artifact(id: &str, tier: Tier, auth: AuthenticationMethod, weight: f64, statement: &str) -> Artifact {
        Artifact {
            id: id.into(),
            content_hash: crate::types::artifact::ContentHash([3u8; 32]),
            tier,
            weight,
            authentication_method: auth,
            statement: statement.into(),
            case_id: "C2".into(),
            artifact_type: "testimony".into(),
            timestamp: 1_700_000_000,
            corroborating_ids: vec![],
            metadata: BTreeMap::new(),
            block_index: None,
            minted_at: None,
            miner_id: None,
        }
    }

    #[test]
    fn detects_direct_antonym_conflict() {
        let a = artifact("A", Tier::Government, AuthenticationMethod::DigitalSeal, 0.95, "invoice was paid");
        let b = artifact("B", Tier::Personal, AuthenticationMethod::None, 0.9, "invoice remains unpaid");
        assert_eq!(detect_kind(&a, &b), Some(ContradictionKind::Direct));
    }

    #[test]
    fn hierarchy_rule_decides_government_over_personal() {
        let a = artifact("A", Tier::Government, AuthenticationMethod::DigitalSeal, 0.95, "paid");
        let b = artifact("B", Tier::Personal, AuthenticationMethod::None, 0.9, "unpaid");
        let contradiction = resolve(ContradictionKind::Direct, &a, &b, 1_700_000_000, "ct1".into());
        assert_eq!(contradiction.resolution, Resolution::Hierarchy);
        assert_eq!(contradiction.winner_id, "A");
    }

    #[test]
    fn no_conflict_between_unrelated_statements() {
        let a = artifact("A", Tier::Government, AuthenticationMethod::DigitalSeal, 0.95, "delivered the goods");
        let b = artifact("B", Tier::Personal, AuthenticationMethod::None, 0.9, "ordered the goods");
        // Same sequential pair but in valid order (order before deliver).
        assert_eq!(detect_kind(&a, &b), None);
    }
}
