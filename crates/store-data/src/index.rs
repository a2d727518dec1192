//! In-memory store index.
//!
//! `StoreIndex` owns every store and review and keeps the lookups the
//! index-backed collaborators need:
//! - primary maps (stores, reviews by user, reviews by store)
//! - a category index
//! - precomputed per-store review statistics

use crate::error::{DataError, Result};
use crate::parser;
use crate::types::*;
use rayon::prelude::*;
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

/// Main data structure that holds all stores, reviews and indices.
#[derive(Debug, Default)]
pub struct StoreIndex {
    stores: HashMap<StoreId, Store>,
    user_reviews: HashMap<UserId, Vec<Review>>,
    store_reviews: HashMap<StoreId, Vec<Review>>,
    category_index: HashMap<FoodCategory, Vec<StoreId>>,
    store_stats: HashMap<StoreId, StoreStats>,
}

impl StoreIndex {
    /// Creates a new, empty StoreIndex
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a dataset directory containing stores.json and reviews.json.
    ///
    /// Steps:
    /// 1. Parse both files in parallel
    /// 2. Build primary indices
    /// 3. Build the category index
    /// 4. Compute store statistics
    /// 5. Validate referential integrity
    pub fn load_from_files(data_dir: &Path) -> Result<Self> {
        info!("Loading store dataset from {:?}", data_dir);

        let stores_path = data_dir.join("stores.json");
        let reviews_path = data_dir.join("reviews.json");

        let (stores, reviews) = rayon::join(
            || parser::parse_stores(&stores_path),
            || parser::parse_reviews(&reviews_path),
        );
        let stores = stores?;
        let reviews = reviews?;

        info!("Parsed {} stores, {} reviews", stores.len(), reviews.len());

        let mut index = StoreIndex::new();
        for store in stores {
            index.insert_store(store);
        }
        for review in reviews {
            index.insert_review(review);
        }

        index.build_secondary_indices();
        index.compute_store_stats();
        index.validate()?;

        Ok(index)
    }

    /// Get a store by ID
    pub fn get_store(&self, id: StoreId) -> Option<&Store> {
        self.stores.get(&id)
    }

    /// All store ids, unordered
    pub fn all_store_ids(&self) -> Vec<StoreId> {
        self.stores.keys().copied().collect()
    }

    /// Iterate over every store
    pub fn stores(&self) -> impl Iterator<Item = &Store> {
        self.stores.values()
    }

    /// Get all reviews written by a user
    pub fn get_user_reviews(&self, user_id: UserId) -> &[Review] {
        self.user_reviews
            .get(&user_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Get all reviews a store received
    pub fn get_store_reviews(&self, store_id: StoreId) -> &[Review] {
        self.store_reviews
            .get(&store_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Get all stores in a category
    pub fn get_stores_by_category(&self, category: FoodCategory) -> &[StoreId] {
        self.category_index
            .get(&category)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Get precomputed statistics for a store
    pub fn get_store_stats(&self, store_id: StoreId) -> Option<&StoreStats> {
        self.store_stats.get(&store_id)
    }

    /// Every user that wrote at least one review
    pub fn reviewer_ids(&self) -> Vec<UserId> {
        self.user_reviews.keys().copied().collect()
    }

    /// Join a user's reviews with their stores into analyzer interactions.
    ///
    /// Reviews pointing at unknown stores are skipped.
    pub fn interactions_for_user(&self, user_id: UserId) -> Vec<Interaction> {
        self.get_user_reviews(user_id)
            .iter()
            .filter_map(|review| {
                let store = self.stores.get(&review.store_id)?;
                Some(Interaction {
                    category: store.category,
                    rating: review.rating,
                    tags: review.tags.iter().chain(store.tags.iter()).cloned().collect(),
                    price_level: store.price_level,
                    distance_meters: review.distance_meters,
                    timestamp: review.created_at,
                })
            })
            .collect()
    }

    /// Insert a store into the index
    pub fn insert_store(&mut self, store: Store) {
        self.stores.insert(store.id, store);
    }

    /// Insert a review into the per-user and per-store indices
    pub fn insert_review(&mut self, review: Review) {
        self.store_reviews
            .entry(review.store_id)
            .or_default()
            .push(review.clone());
        self.user_reviews
            .entry(review.user_id)
            .or_default()
            .push(review);
    }

    /// Rebuild the category index from the primary store map
    pub fn build_secondary_indices(&mut self) {
        self.category_index.clear();
        for (store_id, store) in &self.stores {
            self.category_index
                .entry(store.category)
                .or_default()
                .push(*store_id);
        }
        for ids in self.category_index.values_mut() {
            ids.sort_unstable();
        }
    }

    /// Compute average rating and review count for every reviewed store
    pub fn compute_store_stats(&mut self) {
        self.store_stats = self
            .store_reviews
            .par_iter()
            .map(|(&store_id, reviews)| {
                let review_count = reviews.len() as u32;
                let avg_rating = if review_count > 0 {
                    reviews.iter().map(|r| r.rating).sum::<f32>() / review_count as f32
                } else {
                    0.0
                };
                (
                    store_id,
                    StoreStats {
                        avg_rating,
                        review_count,
                    },
                )
            })
            .collect();
    }

    /// Check that every review references a known store and has a rating in
    /// the 1.0 - 5.0 range.
    pub fn validate(&self) -> Result<()> {
        for reviews in self.user_reviews.values() {
            for review in reviews {
                if !self.stores.contains_key(&review.store_id) {
                    return Err(DataError::MissingReference {
                        entity: "Store".to_string(),
                        id: review.store_id,
                    });
                }
                if !(1.0..=5.0).contains(&review.rating) {
                    return Err(DataError::InvalidValue {
                        field: "rating".to_string(),
                        value: review.rating.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Get counts for debugging/validation: (stores, reviewers, reviews)
    pub fn counts(&self) -> (usize, usize, usize) {
        let total_reviews = self.user_reviews.values().map(|v| v.len()).sum();
        (self.stores.len(), self.user_reviews.len(), total_reviews)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn store(id: StoreId, category: FoodCategory) -> Store {
        Store {
            id,
            name: format!("Store {id}"),
            category,
            coordinates: Coordinates::new(37.5, 127.0),
            tags: vec!["cozy".to_string()],
            price_level: Some(2),
        }
    }

    fn review(user_id: UserId, store_id: StoreId, rating: f32) -> Review {
        Review {
            user_id,
            store_id,
            rating,
            content: String::new(),
            tags: vec!["spicy".to_string()],
            distance_meters: None,
            created_at: Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_empty_queries() {
        let index = StoreIndex::new();
        assert!(index.get_store(999).is_none());
        assert!(index.get_user_reviews(999).is_empty());
        assert!(index.get_store_reviews(999).is_empty());
        assert!(index.get_stores_by_category(FoodCategory::Cafe).is_empty());
        assert_eq!(index.counts(), (0, 0, 0));
    }

    #[test]
    fn test_stats_and_category_index() {
        let mut index = StoreIndex::new();
        index.insert_store(store(1, FoodCategory::Korean));
        index.insert_store(store(2, FoodCategory::Cafe));
        index.insert_review(review(10, 1, 5.0));
        index.insert_review(review(11, 1, 3.0));
        index.build_secondary_indices();
        index.compute_store_stats();

        let stats = index.get_store_stats(1).unwrap();
        assert_eq!(stats.review_count, 2);
        assert!((stats.avg_rating - 4.0).abs() < 1e-6);
        assert!(index.get_store_stats(2).is_none());
        assert_eq!(index.get_stores_by_category(FoodCategory::Korean), &[1]);
    }

    #[test]
    fn test_interactions_join_store_attributes() {
        let mut index = StoreIndex::new();
        index.insert_store(store(1, FoodCategory::Korean));
        index.insert_review(review(10, 1, 4.5));
        index.insert_review(review(10, 42, 4.0)); // unknown store

        let interactions = index.interactions_for_user(10);
        assert_eq!(interactions.len(), 1);
        assert_eq!(interactions[0].category, FoodCategory::Korean);
        assert_eq!(interactions[0].price_level, Some(2));
        assert!(interactions[0].tags.contains(&"spicy".to_string()));
        assert!(interactions[0].tags.contains(&"cozy".to_string()));
    }

    #[test]
    fn test_validate_missing_store() {
        let mut index = StoreIndex::new();
        index.insert_review(review(10, 42, 4.0));
        assert!(matches!(
            index.validate(),
            Err(DataError::MissingReference { id: 42, .. })
        ));
    }

    #[test]
    fn test_validate_rating_range() {
        let mut index = StoreIndex::new();
        index.insert_store(store(1, FoodCategory::Korean));
        index.insert_review(review(10, 1, 7.0));
        assert!(matches!(index.validate(), Err(DataError::InvalidValue { .. })));
    }
}
