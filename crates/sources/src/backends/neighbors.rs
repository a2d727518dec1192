//! Neighbour-based collaborative source over the store index.
//!
//! "People who liked what you liked also liked these stores":
//! 1. Find stores the user rated highly (>= 4.0)
//! 2. Users who also rated at least `min_shared_stores` of them highly are
//!    neighbours
//! 3. Count, per store the user hasn't reviewed, how many neighbours rated
//!    it highly
//! 4. Overlap strength = count / highest count, so the strongest store is 1.0

use crate::backends::run_blocking;
use crate::collaborators::{CollaborativeSource, CollaboratorError, ScoredStore};
use crate::types::StoreAttributes;
use async_trait::async_trait;
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use store_data::{StoreId, StoreIndex, UserId};
use tracing::{debug, instrument};

/// Collaborative source backed by a shared, read-only [`StoreIndex`]
#[derive(Clone)]
pub struct NeighborStores {
    index: Arc<StoreIndex>,

    /// Minimum rating to consider a store "highly rated"
    high_rating_threshold: f32,

    /// Minimum number of shared highly-rated stores to consider users similar
    min_shared_stores: u32,

    /// Cap on the neighbourhood size
    max_neighbors: usize,
}

impl NeighborStores {
    pub fn new(index: Arc<StoreIndex>) -> Self {
        Self {
            index,
            high_rating_threshold: 4.0,
            min_shared_stores: 2,
            max_neighbors: 500,
        }
    }

    /// Configure the high rating threshold (default: 4.0)
    pub fn with_high_rating_threshold(mut self, threshold: f32) -> Self {
        self.high_rating_threshold = threshold;
        self
    }

    /// Configure minimum shared stores to consider users similar (default: 2)
    pub fn with_min_shared_stores(mut self, min: u32) -> Self {
        self.min_shared_stores = min;
        self
    }

    fn liked_stores(&self, user_id: UserId) -> HashSet<StoreId> {
        self.index
            .get_user_reviews(user_id)
            .iter()
            .filter(|r| r.rating >= self.high_rating_threshold)
            .map(|r| r.store_id)
            .collect()
    }

    /// Find users similar to the target user
    fn find_neighbors(&self, user_id: UserId, liked: &HashSet<StoreId>) -> HashSet<UserId> {
        let shared_counts = liked
            .par_iter()
            .fold(HashMap::new, |mut local: HashMap<UserId, u32>, &store_id| {
                for review in self.index.get_store_reviews(store_id) {
                    if review.user_id != user_id && review.rating >= self.high_rating_threshold {
                        *local.entry(review.user_id).or_insert(0) += 1;
                    }
                }
                local
            })
            .reduce(HashMap::new, |mut acc, local| {
                for (uid, count) in local {
                    *acc.entry(uid).or_insert(0) += count;
                }
                acc
            });

        let mut ranked: Vec<(UserId, u32)> = shared_counts
            .into_iter()
            .filter(|(_, count)| *count >= self.min_shared_stores)
            .collect();
        ranked.sort_unstable_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(self.max_neighbors);
        ranked.into_iter().map(|(uid, _)| uid).collect()
    }

    /// Count neighbour endorsements for stores the user hasn't reviewed
    fn endorsement_counts(&self, user_id: UserId, neighbors: &HashSet<UserId>) -> HashMap<StoreId, u32> {
        let reviewed: HashSet<StoreId> = self
            .index
            .get_user_reviews(user_id)
            .iter()
            .map(|r| r.store_id)
            .collect();

        neighbors
            .par_iter()
            .fold(HashMap::new, |mut local: HashMap<StoreId, u32>, &neighbor| {
                for review in self.index.get_user_reviews(neighbor) {
                    if review.rating >= self.high_rating_threshold && !reviewed.contains(&review.store_id) {
                        *local.entry(review.store_id).or_insert(0) += 1;
                    }
                }
                local
            })
            .reduce(HashMap::new, |mut acc, local| {
                for (store_id, count) in local {
                    *acc.entry(store_id).or_insert(0) += count;
                }
                acc
            })
    }

    #[instrument(skip(self))]
    pub fn compute(&self, user_id: UserId) -> Vec<ScoredStore> {
        let liked = self.liked_stores(user_id);
        let neighbors = self.find_neighbors(user_id, &liked);
        debug!("Found {} neighbours from {} liked stores", neighbors.len(), liked.len());

        let counts = self.endorsement_counts(user_id, &neighbors);
        let max = counts.values().copied().max().unwrap_or(0);
        if max == 0 {
            return Vec::new();
        }

        let mut stores: Vec<ScoredStore> = counts
            .into_iter()
            .filter_map(|(store_id, count)| {
                let store = self.index.get_store(store_id)?;
                Some(ScoredStore {
                    store_id,
                    score: count as f64 / max as f64,
                    attributes: StoreAttributes::from_store(store, self.index.get_store_stats(store_id)),
                })
            })
            .collect();
        stores.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.store_id.cmp(&b.store_id)));
        stores
    }
}

#[async_trait]
impl CollaborativeSource for NeighborStores {
    async fn similar_user_stores(&self, user_id: UserId) -> Result<Vec<ScoredStore>, CollaboratorError> {
        let source = self.clone();
        run_blocking(move || source.compute(user_id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::test_support::{review, store};
    use store_data::FoodCategory;

    fn create_test_index() -> StoreIndex {
        let mut index = StoreIndex::new();
        for id in 1..=6 {
            index.insert_store(store(id, FoodCategory::Korean, 37.5, 127.0));
        }

        // User 1 likes 1, 2, 3
        for store_id in 1..=3 {
            index.insert_review(review(1, store_id, 5.0));
        }
        // User 2 shares 1, 2 and also likes 4, 5
        for store_id in [1, 2, 4, 5] {
            index.insert_review(review(2, store_id, 5.0));
        }
        // User 3 shares 1, 2, 3 and likes 4
        for store_id in [1, 2, 3, 4] {
            index.insert_review(review(3, store_id, 4.5));
        }
        // User 4 shares only store 1 and likes 6
        index.insert_review(review(4, 1, 5.0));
        index.insert_review(review(4, 6, 5.0));

        index.build_secondary_indices();
        index.compute_store_stats();
        index
    }

    #[test]
    fn test_find_neighbors() {
        let source = NeighborStores::new(Arc::new(create_test_index()));
        let liked = source.liked_stores(1);
        let neighbors = source.find_neighbors(1, &liked);

        assert!(neighbors.contains(&2));
        assert!(neighbors.contains(&3));
        assert!(!neighbors.contains(&4));
        assert_eq!(neighbors.len(), 2);
    }

    #[test]
    fn test_overlap_strength_normalized() {
        let source = NeighborStores::new(Arc::new(create_test_index()));
        let stores = source.compute(1);

        // Store 4 endorsed by both neighbours, store 5 by one, store 6 by none
        assert_eq!(stores.len(), 2);
        assert_eq!(stores[0].store_id, 4);
        assert_eq!(stores[0].score, 1.0);
        assert_eq!(stores[1].store_id, 5);
        assert_eq!(stores[1].score, 0.5);
        assert!(stores.iter().all(|s| s.attributes.name.is_some()));
    }

    #[tokio::test]
    async fn test_user_without_history() {
        let source = NeighborStores::new(Arc::new(create_test_index()));
        let stores = source.similar_user_stores(99).await.unwrap();
        assert!(stores.is_empty());
    }
}
