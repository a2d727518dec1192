//! Popularity strategy.
//!
//! Turns the popularity source's (rating, review count) pairs into a score:
//!
//! `rating / 5 * ln(1 + reviews) / ln(1 + max_reviews_seen)`
//!
//! where `max_reviews_seen` is taken over the response itself.

use crate::collaborators::PopularitySource;
use crate::strategy::{truncate_by_score, CandidateStrategy, StrategyError};
use crate::types::{RecommendCandidate, StrategyKind, StrategyQuery};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, instrument};

pub struct PopularityStrategy {
    source: Arc<dyn PopularitySource>,
}

impl PopularityStrategy {
    pub fn new(source: Arc<dyn PopularitySource>) -> Self {
        Self { source }
    }
}

/// Normalized popularity in [0,1].
pub fn popularity_score(rating: f32, review_count: u32, max_review_count: u32) -> f64 {
    if max_review_count == 0 {
        return 0.0;
    }
    let rating_part = (rating as f64 / 5.0).clamp(0.0, 1.0);
    let volume_part = (review_count as f64).ln_1p() / (max_review_count as f64).ln_1p();
    (rating_part * volume_part).clamp(0.0, 1.0)
}

#[async_trait]
impl CandidateStrategy for PopularityStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Popularity
    }

    #[instrument(skip(self, query), fields(user_id = query.user_id))]
    async fn fetch_candidates(
        &self,
        query: &StrategyQuery,
    ) -> Result<Vec<RecommendCandidate>, StrategyError> {
        let top = self.source.top_stores(query.category).await?;
        let max_reviews = top.iter().map(|s| s.review_count).max().unwrap_or(0);
        debug!("Popularity source returned {} stores (max reviews {})", top.len(), max_reviews);

        let candidates = top
            .into_iter()
            .map(|s| {
                let score = popularity_score(s.rating, s.review_count, max_reviews);
                let mut attributes = s.attributes;
                attributes.rating.get_or_insert(s.rating);
                attributes.review_count.get_or_insert(s.review_count);
                RecommendCandidate::new(s.store_id, StrategyKind::Popularity, score, attributes)
            })
            .collect();
        Ok(truncate_by_score(candidates, StrategyKind::Popularity, query.candidate_limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::{CollaboratorError, PopularStore};
    use crate::types::StoreAttributes;
    use store_data::FoodCategory;
    use std::sync::Mutex;

    struct FixedTop {
        stores: Vec<(u64, f32, u32)>,
        seen_category: Mutex<Option<Option<FoodCategory>>>,
    }

    #[async_trait]
    impl PopularitySource for FixedTop {
        async fn top_stores(
            &self,
            category: Option<FoodCategory>,
        ) -> Result<Vec<PopularStore>, CollaboratorError> {
            *self.seen_category.lock().unwrap() = Some(category);
            Ok(self
                .stores
                .iter()
                .map(|&(store_id, rating, review_count)| PopularStore {
                    store_id,
                    rating,
                    review_count,
                    attributes: StoreAttributes::default(),
                })
                .collect())
        }
    }

    #[test]
    fn test_popularity_score() {
        // The most-reviewed store with a perfect rating scores 1.0
        assert!((popularity_score(5.0, 100, 100) - 1.0).abs() < 1e-12);
        // Same volume, lower rating
        assert!((popularity_score(4.0, 100, 100) - 0.8).abs() < 1e-12);
        // No reviews at all
        assert_eq!(popularity_score(4.0, 0, 100), 0.0);
        assert_eq!(popularity_score(4.0, 0, 0), 0.0);
    }

    #[tokio::test]
    async fn test_scores_and_attributes() {
        let source = Arc::new(FixedTop {
            stores: vec![(1, 4.0, 10), (2, 5.0, 100), (3, 3.0, 1)],
            seen_category: Mutex::new(None),
        });
        let strategy = PopularityStrategy::new(source.clone());
        let query = StrategyQuery::new(1).with_category(Some(FoodCategory::Cafe));

        let candidates = strategy.fetch_candidates(&query).await.unwrap();

        assert_eq!(*source.seen_category.lock().unwrap(), Some(Some(FoodCategory::Cafe)));
        assert_eq!(candidates[0].store_id, 2);
        assert_eq!(candidates[0].attributes.review_count, Some(100));
        assert_eq!(candidates[0].attributes.rating, Some(5.0));
        assert!(candidates.iter().all(|c| {
            let s = c.score_for(StrategyKind::Popularity).unwrap();
            (0.0..=1.0).contains(&s)
        }));
    }
}
