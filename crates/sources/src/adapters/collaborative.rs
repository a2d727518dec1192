//! Collaborative strategy.
//!
//! Stores favoured by the user's similarity neighbours. The neighbour
//! overlap strength reported by the source becomes the `collaborative`
//! score.

use crate::collaborators::CollaborativeSource;
use crate::strategy::{truncate_by_score, CandidateStrategy, StrategyError};
use crate::types::{RecommendCandidate, StrategyKind, StrategyQuery};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, instrument};

pub struct CollaborativeStrategy {
    source: Arc<dyn CollaborativeSource>,
}

impl CollaborativeStrategy {
    pub fn new(source: Arc<dyn CollaborativeSource>) -> Self {
        Self { source }
    }
}

#[async_trait]
impl CandidateStrategy for CollaborativeStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Collaborative
    }

    /// Neighbours only exist for users with history, which is what a
    /// profile stands for.
    fn requires_profile(&self) -> bool {
        true
    }

    #[instrument(skip(self, query), fields(user_id = query.user_id))]
    async fn fetch_candidates(
        &self,
        query: &StrategyQuery,
    ) -> Result<Vec<RecommendCandidate>, StrategyError> {
        let stores = self.source.similar_user_stores(query.user_id).await?;
        debug!("Collaborative source returned {} stores", stores.len());

        let candidates = stores
            .into_iter()
            .map(|s| RecommendCandidate::new(s.store_id, StrategyKind::Collaborative, s.score, s.attributes))
            .collect();
        Ok(truncate_by_score(candidates, StrategyKind::Collaborative, query.candidate_limit))
    }
}
