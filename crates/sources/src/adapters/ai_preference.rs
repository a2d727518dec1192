//! AI-preference strategy.
//!
//! Asks the preference oracle which stores match the user's taste profile.
//! The oracle score is used as-is (clamped to [0,1]) as the `ai` source
//! score.

use crate::collaborators::PreferenceOracle;
use crate::strategy::{truncate_by_score, CandidateStrategy, StrategyError};
use crate::types::{RecommendCandidate, StrategyKind, StrategyQuery};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, instrument};

pub struct AiPreferenceStrategy {
    oracle: Arc<dyn PreferenceOracle>,
}

impl AiPreferenceStrategy {
    pub fn new(oracle: Arc<dyn PreferenceOracle>) -> Self {
        Self { oracle }
    }
}

#[async_trait]
impl CandidateStrategy for AiPreferenceStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Ai
    }

    fn requires_profile(&self) -> bool {
        true
    }

    fn is_applicable(&self, query: &StrategyQuery) -> bool {
        query.profile.is_some()
    }

    #[instrument(skip(self, query), fields(user_id = query.user_id))]
    async fn fetch_candidates(
        &self,
        query: &StrategyQuery,
    ) -> Result<Vec<RecommendCandidate>, StrategyError> {
        let profile = query
            .profile
            .as_deref()
            .ok_or(StrategyError::MissingInput("taste profile"))?;

        let scored = self.oracle.score_stores_for_profile(profile).await?;
        debug!("Oracle scored {} stores", scored.len());

        let candidates = scored
            .into_iter()
            .map(|s| RecommendCandidate::new(s.store_id, StrategyKind::Ai, s.score, s.attributes))
            .collect();
        Ok(truncate_by_score(candidates, StrategyKind::Ai, query.candidate_limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::{CollaboratorError, ScoredStore};
    use crate::types::StoreAttributes;
    use chrono::Utc;
    use store_data::TasteProfile;

    struct FixedOracle(Vec<(u64, f64)>);

    #[async_trait]
    impl PreferenceOracle for FixedOracle {
        async fn score_stores_for_profile(
            &self,
            _profile: &TasteProfile,
        ) -> Result<Vec<ScoredStore>, CollaboratorError> {
            Ok(self
                .0
                .iter()
                .map(|&(store_id, score)| ScoredStore {
                    store_id,
                    score,
                    attributes: StoreAttributes::default(),
                })
                .collect())
        }
    }

    struct DownOracle;

    #[async_trait]
    impl PreferenceOracle for DownOracle {
        async fn score_stores_for_profile(
            &self,
            _profile: &TasteProfile,
        ) -> Result<Vec<ScoredStore>, CollaboratorError> {
            Err(CollaboratorError::Unavailable("oracle offline".to_string()))
        }
    }

    fn query_with_profile() -> StrategyQuery {
        StrategyQuery::new(1).with_profile(Arc::new(TasteProfile::cold_start(1, Utc::now())))
    }

    #[tokio::test]
    async fn test_oracle_scores_map_to_ai_scores() {
        let strategy = AiPreferenceStrategy::new(Arc::new(FixedOracle(vec![(1, 0.5), (2, 0.9), (3, 1.3)])));
        let candidates = strategy.fetch_candidates(&query_with_profile()).await.unwrap();

        assert_eq!(candidates.len(), 3);
        // 1.3 is clamped to 1.0 and sorts first
        assert_eq!(candidates[0].store_id, 3);
        assert_eq!(candidates[0].score_for(StrategyKind::Ai), Some(1.0));
        assert_eq!(candidates[1].store_id, 2);
        assert_eq!(candidates[2].score_for(StrategyKind::Ai), Some(0.5));
    }

    #[tokio::test]
    async fn test_requires_profile() {
        let strategy = AiPreferenceStrategy::new(Arc::new(FixedOracle(vec![(1, 0.5)])));
        let query = StrategyQuery::new(1);
        assert!(strategy.requires_profile());
        assert!(!strategy.is_applicable(&query));
        assert!(matches!(
            strategy.fetch_candidates(&query).await,
            Err(StrategyError::MissingInput(_))
        ));
    }

    #[tokio::test]
    async fn test_oracle_failure_is_an_error() {
        let strategy = AiPreferenceStrategy::new(Arc::new(DownOracle));
        let result = strategy.fetch_candidates(&query_with_profile()).await;
        assert!(matches!(result, Err(StrategyError::Collaborator(_))));
    }

    #[tokio::test]
    async fn test_candidate_limit() {
        let strategy = AiPreferenceStrategy::new(Arc::new(FixedOracle(vec![(1, 0.1), (2, 0.2), (3, 0.3)])));
        let query = query_with_profile().with_candidate_limit(2);
        let candidates = strategy.fetch_candidates(&query).await.unwrap();
        let ids: Vec<_> = candidates.iter().map(|c| c.store_id).collect();
        assert_eq!(ids, vec![3, 2]);
    }
}
