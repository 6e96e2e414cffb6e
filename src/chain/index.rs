//! Secondary indices maintained alongside the chain store.
//!
//! Indices hold only ids and block positions, never artifact clones or
//! references, so there is a single owner of artifact data (the chain
//! store itself) and no aliasing through shared references to committed
//! artifacts.

use std::collections::HashMap;

use crate::types::{ArtifactId, Tier};

/// Filter accepted by [`super::Chain::query`]. All fields are optional;
/// an unset field matches everything.
#[derive(Clone, Debug, Default)]
pub struct QueryFilter {
    pub case_id: Option<String>,
    pub tier: Option<Tier>,
    pub date_range: Option<(i64, i64)>,
    pub min_weight: Option<f64>,
    pub artifact_type: Option<String>,
}

/// Secondary maps updated inside the same critical section as
/// `Chain::append`.
#[derive(Default)]
pub struct QueryIndex {
    by_artifact_id: HashMap<ArtifactId, u64>,
    by_case_id: HashMap<String, Vec<ArtifactId>>,
    by_tier: HashMap<Tier, Vec<ArtifactId>>,
    /// Kept sorted by timestamp ascending.
    by_date: Vec<(i64, ArtifactId)>,
}

impl QueryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a newly committed artifact. Must be called exactly once
    /// per artifact, at append time, in commit order.
    pub fn record(&mut self, artifact_id: &ArtifactId, case_id: &str, tier: Tier, timestamp: i64, block_index: u64) {
        self.by_artifact_id.insert(artifact_id.clone(), block_index);
        self.by_case_id
            .entry(case_id.to_string())
            .or_default()
            .push(artifact_id.clone());
        self.by_tier.entry(tier).or_default().push(artifact_id.clone());

        let pos = self
            .by_date
            .partition_point(|(ts, _)| *ts <= timestamp);
        self.by_date.insert(pos, (timestamp, artifact_id.clone()));
    }

    pub fn block_index_of(&self, artifact_id: &str) -> Option<u64> {
        self.by_artifact_id.get(artifact_id).copied()
    }

    pub fn contains_artifact(&self, artifact_id: &str) -> bool {
        self.by_artifact_id.contains_key(artifact_id)
    }

    /// Returns the set of artifact ids that satisfy every clause present
    /// in `filter`, intersecting per-clause candidate sets.
    pub fn matching_ids(&self, filter: &QueryFilter) -> Vec<ArtifactId> {
        let mut candidates: Option<Vec<ArtifactId>> = None;

        if let Some(case_id) = &filter.case_id {
            let ids = self.by_case_id.get(case_id).cloned().unwrap_or_default();
            candidates = Some(intersect(candidates, ids));
        }
        if let Some(tier) = filter.tier {
            let ids = self.by_tier.get(&tier).cloned().unwrap_or_default();
            candidates = Some(intersect(candidates, ids));
        }
        if let Some((start, end)) = filter.date_range {
            let ids: Vec<ArtifactId> = self
                .by_date
                .iter()
                .filter(|(ts, _)| *ts >= start && *ts <= end)
                .map(|(_, id)| id.clone())
                .collect();
            candidates = Some(intersect(candidates, ids));
        }

        candidates.unwrap_or_else(|| self.by_artifact_id.keys().cloned().collect())
    }
}

fn intersect(existing: Option<Vec<ArtifactId>>, next: Vec<ArtifactId>) -> Vec<ArtifactId> {
    match existing {
        None => next,
        Some(existing) => {
            let set: std::collections::HashSet<_> = next.into_iter().collect();
            existing.into_iter().filter(|id| set.contains(id)).collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_and_lookup_by_case_and_tier() {
        let mut idx = QueryIndex::new();
        idx.record(&"A".to_string(), "C1", Tier::Government, 100, 1);
        idx.record(&"B".to_string(), "C1", Tier::Personal, 200, 1);
        idx.record(&"C".to_string(), "C2", Tier::Government, 150, 2);

        let filter = QueryFilter {
            case_id: Some("C1".into()),
            tier: Some(Tier::Government),
            ..Default::default()
        };
        assert_eq!(idx.matching_ids(&filter), vec!["A".to_string()]);
    }

    #[test]
    fn by_date_stays_sorted_on_out_of_order_inserts() {
        let mut idx = QueryIndex::new();
        idx.record(&"late".to_string(), "C1", Tier::Personal, 300, 1);
        idx.record(&"early".to_string(), "C1", Tier::Personal, 100, 1);
        let filter = QueryFilter {
            date_range: Some((0, 1000)),
            ..Default::default()
        };
        assert_eq!(idx.matching_ids(&filter), vec!["early".to_string(), "late".to_string()]);
    }
}
