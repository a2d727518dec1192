//! Local preference oracle.
//!
//! Stands in for the remote AI oracle when running offline: a store's score
//! blends the profile's affinity for its category with the Jaccard overlap
//! between its tags and the profile's preferred tags. Stores the user has
//! already reviewed are skipped.

use crate::backends::run_blocking;
use crate::collaborators::{CollaboratorError, PreferenceOracle, ScoredStore};
use crate::types::StoreAttributes;
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use store_data::{Store, StoreIndex, TasteProfile};
use tracing::{debug, instrument};

#[derive(Clone)]
pub struct AffinityOracle {
    index: Arc<StoreIndex>,
    category_weight: f64,
    min_score: f64,
}

impl AffinityOracle {
    pub fn new(index: Arc<StoreIndex>) -> Self {
        Self {
            index,
            category_weight: 0.7,
            min_score: 0.05,
        }
    }

    /// Share of the score taken by category affinity; the rest is tag overlap
    pub fn with_category_weight(mut self, weight: f64) -> Self {
        self.category_weight = weight.clamp(0.0, 1.0);
        self
    }

    fn score(&self, store: &Store, profile: &TasteProfile, preferred_tags: &HashSet<String>) -> f64 {
        let category = profile.category_score(store.category);
        let store_tags: HashSet<String> = store.tags.iter().map(|t| t.to_lowercase()).collect();
        let union = store_tags.union(preferred_tags).count();
        let overlap = if union == 0 {
            0.0
        } else {
            store_tags.intersection(preferred_tags).count() as f64 / union as f64
        };
        self.category_weight * category + (1.0 - self.category_weight) * overlap
    }

    #[instrument(skip(self, profile), fields(user_id = profile.user_id))]
    pub fn compute(&self, profile: &TasteProfile) -> Vec<ScoredStore> {
        let preferred_tags: HashSet<String> =
            profile.preferred_tags.iter().map(|t| t.to_lowercase()).collect();
        let reviewed: HashSet<_> = self
            .index
            .get_user_reviews(profile.user_id)
            .iter()
            .map(|r| r.store_id)
            .collect();

        let mut scored: Vec<ScoredStore> = self
            .index
            .stores()
            .filter(|store| !reviewed.contains(&store.id))
            .filter_map(|store| {
                let score = self.score(store, profile, &preferred_tags);
                (score >= self.min_score).then(|| ScoredStore {
                    store_id: store.id,
                    score,
                    attributes: StoreAttributes::from_store(store, self.index.get_store_stats(store.id)),
                })
            })
            .collect();
        scored.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.store_id.cmp(&b.store_id)));
        debug!("Affinity oracle matched {} stores", scored.len());
        scored
    }
}

#[async_trait]
impl PreferenceOracle for AffinityOracle {
    async fn score_stores_for_profile(
        &self,
        profile: &TasteProfile,
    ) -> Result<Vec<ScoredStore>, CollaboratorError> {
        let oracle = self.clone();
        let profile = profile.clone();
        run_blocking(move || oracle.compute(&profile)).await
    }
}
