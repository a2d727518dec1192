//! Candidate Merger.
//!
//! Folds the per-strategy candidate lists into one candidate per store and
//! computes each candidate's composite score:
//!
//! ```text
//! composite = Σ weight[strategy] * source_scores[strategy]
//! ```
//!
//! A strategy missing from a candidate's source scores contributes 0. The
//! strategy with the largest weighted contribution becomes the candidate's
//! recommend reason.

use crate::weights::StrategyWeights;
use rayon::prelude::*;
use sources::{RecommendCandidate, StrategyKind};
use std::collections::HashMap;
use store_data::geo::distance_meters;
use store_data::{Coordinates, StoreId};
use tracing::debug;

/// A merged candidate with its composite score.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCandidate {
    pub candidate: RecommendCandidate,
    pub composite: f64,
    /// Strategy with the largest weighted contribution
    pub reason: StrategyKind,
}

impl ScoredCandidate {
    pub fn store_id(&self) -> StoreId {
        self.candidate.store_id
    }

    /// Human-readable recommend reason
    pub fn reason_text(&self) -> &'static str {
        recommend_reason(self.reason)
    }
}

pub fn recommend_reason(kind: StrategyKind) -> &'static str {
    match kind {
        StrategyKind::Ai => "Matches your taste profile",
        StrategyKind::Location => "Close to where you are",
        StrategyKind::Popularity => "Highly rated by other diners",
        StrategyKind::Collaborative => "Loved by people with similar taste",
    }
}

#[derive(Debug, Clone)]
pub struct CandidateMerger {
    weights: StrategyWeights,
}

impl CandidateMerger {
    pub fn new(weights: StrategyWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &StrategyWeights {
        &self.weights
    }

    /// Union candidates by store id.
    ///
    /// Source scores are unioned. Static attributes come from the first list
    /// that supplied them; later lists only fill gaps.
    pub fn merge(lists: Vec<Vec<RecommendCandidate>>) -> HashMap<StoreId, RecommendCandidate> {
        let mut merged: HashMap<StoreId, RecommendCandidate> = HashMap::new();
        for candidate in lists.into_iter().flatten() {
            match merged.get_mut(&candidate.store_id) {
                Some(existing) => existing.absorb(candidate),
                None => {
                    merged.insert(candidate.store_id, candidate);
                }
            }
        }
        debug!("Merged into {} unique stores", merged.len());
        merged
    }

    /// Set the distance from `origin` on every candidate that lacks one but
    /// knows its coordinates.
    pub fn fill_distances(merged: &mut HashMap<StoreId, RecommendCandidate>, origin: Coordinates) {
        for candidate in merged.values_mut() {
            if candidate.distance_meters.is_some() {
                continue;
            }
            if let Some(coordinates) = candidate.attributes.coordinates {
                candidate.distance_meters = Some(distance_meters(origin, coordinates));
            }
        }
    }

    /// Composite score, summed in a fixed strategy order so the result does
    /// not depend on how the candidate was assembled.
    pub fn composite(&self, candidate: &RecommendCandidate) -> f64 {
        StrategyKind::ALL
            .iter()
            .map(|&kind| self.weights.weight_for(kind) * candidate.score_for(kind).unwrap_or(0.0))
            .sum()
    }

    /// Strategy with the largest weighted contribution. Ties go to the
    /// earlier strategy in [`StrategyKind::ALL`].
    pub fn primary_source(&self, candidate: &RecommendCandidate) -> StrategyKind {
        let mut best: Option<(StrategyKind, f64)> = None;
        for (&kind, &score) in candidate.source_scores() {
            let contribution = self.weights.weight_for(kind) * score;
            if best.is_none_or(|(_, top)| contribution > top) {
                best = Some((kind, contribution));
            }
        }
        best.map_or(StrategyKind::Popularity, |(kind, _)| kind)
    }

    /// Score every merged candidate. Output is ordered by store id.
    pub fn score(&self, merged: HashMap<StoreId, RecommendCandidate>) -> Vec<ScoredCandidate> {
        let mut scored: Vec<ScoredCandidate> = merged
            .into_par_iter()
            .map(|(_, candidate)| ScoredCandidate {
                composite: self.composite(&candidate),
                reason: self.primary_source(&candidate),
                candidate,
            })
            .collect();
        scored.sort_unstable_by_key(|c| c.store_id());
        scored
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sources::StoreAttributes;
    use store_data::FoodCategory;

    fn candidate(store_id: StoreId, kind: StrategyKind, score: f64) -> RecommendCandidate {
        RecommendCandidate::new(store_id, kind, score, StoreAttributes::default())
    }

    fn weights() -> StrategyWeights {
        StrategyWeights::new(0.6, 0.4, 0.0, 0.0).unwrap()
    }

    #[test]
    fn test_merge_unions_source_scores() {
        let merged = CandidateMerger::merge(vec![
            vec![candidate(1, StrategyKind::Ai, 0.9), candidate(2, StrategyKind::Ai, 0.7)],
            vec![candidate(2, StrategyKind::Location, 0.8)],
        ]);

        assert_eq!(merged.len(), 2);
        assert_eq!(merged[&1].source_scores().len(), 1);
        assert_eq!(merged[&2].score_for(StrategyKind::Ai), Some(0.7));
        assert_eq!(merged[&2].score_for(StrategyKind::Location), Some(0.8));
    }

    #[test]
    fn test_merge_is_order_independent() {
        let ai = vec![candidate(1, StrategyKind::Ai, 0.9), candidate(2, StrategyKind::Ai, 0.3)];
        let location = vec![candidate(2, StrategyKind::Location, 0.8), candidate(3, StrategyKind::Location, 0.6)];
        let merger = CandidateMerger::new(weights());

        let forward = merger.score(CandidateMerger::merge(vec![ai.clone(), location.clone()]));
        let backward = merger.score(CandidateMerger::merge(vec![location, ai]));

        let composites = |scored: &[ScoredCandidate]| -> Vec<(StoreId, f64)> {
            scored.iter().map(|c| (c.store_id(), c.composite)).collect()
        };
        assert_eq!(composites(&forward), composites(&backward));
    }

    #[test]
    fn test_no_phantom_candidates() {
        let merged = CandidateMerger::merge(vec![
            vec![candidate(1, StrategyKind::Ai, 0.5)],
            vec![],
            vec![candidate(4, StrategyKind::Popularity, 0.2)],
        ]);
        let mut ids: Vec<_> = merged.keys().copied().collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![1, 4]);
        assert!(merged.values().all(|c| !c.source_scores().is_empty()));
    }

    #[test]
    fn test_first_supplier_keeps_attributes() {
        let first = RecommendCandidate::new(
            1,
            StrategyKind::Ai,
            0.5,
            StoreAttributes {
                name: Some("Gangnam BBQ".to_string()),
                ..Default::default()
            },
        );
        let second = RecommendCandidate::new(
            1,
            StrategyKind::Location,
            0.5,
            StoreAttributes {
                name: Some("Other Name".to_string()),
                category: Some(FoodCategory::Korean),
                ..Default::default()
            },
        )
        .with_distance(250.0);

        let merged = CandidateMerger::merge(vec![vec![first], vec![second]]);
        let store = &merged[&1];
        assert_eq!(store.attributes.name.as_deref(), Some("Gangnam BBQ"));
        assert_eq!(store.attributes.category, Some(FoodCategory::Korean));
        assert_eq!(store.distance_meters, Some(250.0));
    }

    #[test]
    fn test_composite_and_reason() {
        let merger = CandidateMerger::new(weights());
        let mut store = candidate(2, StrategyKind::Ai, 0.7);
        store.absorb(candidate(2, StrategyKind::Location, 0.8));

        // 0.6 * 0.7 + 0.4 * 0.8
        assert!((merger.composite(&store) - 0.74).abs() < 1e-12);
        assert_eq!(merger.primary_source(&store), StrategyKind::Ai);

        let popular_only = candidate(3, StrategyKind::Popularity, 0.9);
        assert_eq!(merger.composite(&popular_only), 0.0);
        assert_eq!(merger.primary_source(&popular_only), StrategyKind::Popularity);
    }

    #[test]
    fn test_fill_distances_only_where_missing() {
        let origin = Coordinates::new(37.5, 127.0);
        let with_coordinates = RecommendCandidate::new(
            1,
            StrategyKind::Popularity,
            0.5,
            StoreAttributes {
                coordinates: Some(Coordinates::new(37.501, 127.0)),
                ..Default::default()
            },
        );
        let known = candidate(2, StrategyKind::Location, 0.5).with_distance(42.0);
        let unknown = candidate(3, StrategyKind::Ai, 0.5);

        let mut merged = CandidateMerger::merge(vec![vec![with_coordinates, known, unknown]]);
        CandidateMerger::fill_distances(&mut merged, origin);

        assert!((merged[&1].distance_meters.unwrap() - 111.0).abs() < 2.0);
        assert_eq!(merged[&2].distance_meters, Some(42.0));
        assert_eq!(merged[&3].distance_meters, None);
    }
}
