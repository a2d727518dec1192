//! Popularity table over the store index.
//!
//! Lists stores that pass a quality gate (minimum average rating and review
//! count), optionally restricted to one category, ordered by
//! `avg_rating * ln(1 + review_count)`.

use crate::backends::run_blocking;
use crate::collaborators::{CollaboratorError, PopularStore, PopularitySource};
use crate::types::StoreAttributes;
use async_trait::async_trait;
use std::sync::Arc;
use store_data::{FoodCategory, StoreId, StoreIndex};
use tracing::{debug, instrument};

/// Popularity source backed by a shared [`StoreIndex`]
#[derive(Clone)]
pub struct PopularStores {
    index: Arc<StoreIndex>,

    /// Minimum average rating for the quality gate
    min_avg_rating: f32,

    /// Minimum review count for the quality gate
    min_review_count: u32,

    /// How many stores to return
    limit: usize,
}

impl PopularStores {
    pub fn new(index: Arc<StoreIndex>) -> Self {
        Self {
            index,
            min_avg_rating: 3.5,
            min_review_count: 3,
            limit: 100,
        }
    }

    /// Configure minimum average rating threshold (default: 3.5)
    pub fn with_min_avg_rating(mut self, rating: f32) -> Self {
        self.min_avg_rating = rating;
        self
    }

    /// Configure minimum review count threshold (default: 3)
    pub fn with_min_review_count(mut self, count: u32) -> Self {
        self.min_review_count = count;
        self
    }

    /// Configure how many stores are listed (default: 100)
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    #[instrument(skip(self))]
    pub fn compute(&self, category: Option<FoodCategory>) -> Vec<PopularStore> {
        let store_ids: Vec<StoreId> = match category {
            Some(category) => self.index.get_stores_by_category(category).to_vec(),
            None => self.index.all_store_ids(),
        };

        let mut stores: Vec<PopularStore> = store_ids
            .into_iter()
            .filter_map(|store_id| {
                let store = self.index.get_store(store_id)?;
                let stats = self.index.get_store_stats(store_id)?;
                if stats.avg_rating < self.min_avg_rating || stats.review_count < self.min_review_count {
                    return None;
                }
                Some(PopularStore {
                    store_id,
                    rating: stats.avg_rating,
                    review_count: stats.review_count,
                    attributes: StoreAttributes::from_store(store, Some(stats)),
                })
            })
            .collect();

        stores.sort_by(|a, b| {
            weight(b)
                .total_cmp(&weight(a))
                .then_with(|| a.store_id.cmp(&b.store_id))
        });
        stores.truncate(self.limit);
        debug!("Listed {} popular stores", stores.len());
        stores
    }
}

fn weight(store: &PopularStore) -> f64 {
    store.rating as f64 * (store.review_count as f64).ln_1p()
}

#[async_trait]
impl PopularitySource for PopularStores {
    async fn top_stores(
        &self,
        category: Option<FoodCategory>,
    ) -> Result<Vec<PopularStore>, CollaboratorError> {
        let source = self.clone();
        run_blocking(move || source.compute(category)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::test_support::{review, store};

    fn create_test_index() -> StoreIndex {
        let mut index = StoreIndex::new();
        index.insert_store(store(1, FoodCategory::Korean, 37.5, 127.0));
        index.insert_store(store(2, FoodCategory::Korean, 37.5, 127.0));
        index.insert_store(store(3, FoodCategory::Cafe, 37.5, 127.0));
        index.insert_store(store(4, FoodCategory::Korean, 37.5, 127.0));

        // Store 1: many good reviews
        for user in 0..20 {
            index.insert_review(review(user, 1, 4.5));
        }
        // Store 2: good but few reviews
        for user in 0..5 {
            index.insert_review(review(user, 2, 4.8));
        }
        // Store 3: cafe, decent
        for user in 0..10 {
            index.insert_review(review(user, 3, 4.0));
        }
        // Store 4: poorly rated
        for user in 0..30 {
            index.insert_review(review(user, 4, 2.0));
        }
        index.build_secondary_indices();
        index.compute_store_stats();
        index
    }

    #[test]
    fn test_quality_gate_and_order() {
        let source = PopularStores::new(Arc::new(create_test_index()));
        let stores = source.compute(None);
        let ids: Vec<_> = stores.iter().map(|s| s.store_id).collect();
        assert_eq!(ids, vec![1, 3, 2]);
    }

    #[test]
    fn test_category_restriction() {
        let source = PopularStores::new(Arc::new(create_test_index()));
        let stores = source.compute(Some(FoodCategory::Cafe));
        assert_eq!(stores.len(), 1);
        assert_eq!(stores[0].store_id, 3);
        assert_eq!(stores[0].review_count, 10);
    }

    #[test]
    fn test_min_review_count() {
        let source = PopularStores::new(Arc::new(create_test_index())).with_min_review_count(6);
        let ids: Vec<_> = source.compute(None).iter().map(|s| s.store_id).collect();
        assert_eq!(ids, vec![1, 3]);
    }
}
