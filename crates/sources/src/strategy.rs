//! The strategy trait every candidate adapter implements.

use crate::collaborators::CollaboratorError;
use crate::types::{RecommendCandidate, StrategyKind, StrategyQuery};
use async_trait::async_trait;
use thiserror::Error;

/// Why a strategy could not produce candidates
#[derive(Error, Debug)]
pub enum StrategyError {
    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),

    #[error("Missing input for strategy: {0}")]
    MissingInput(&'static str),
}

/// One independent candidate generator.
///
/// ## Design Note
/// - `Send + Sync` so a strategy can be shared across spawned tasks
/// - Adapters translate a single collaborator's response; merging and
///   filtering across strategies happens later in the pipeline
#[async_trait]
pub trait CandidateStrategy: Send + Sync {
    /// Which strategy this is (used as the source-score key)
    fn kind(&self) -> StrategyKind;

    /// Whether the strategy needs a taste profile to run
    fn requires_profile(&self) -> bool {
        false
    }

    /// Whether the query carries what this strategy needs
    fn is_applicable(&self, _query: &StrategyQuery) -> bool {
        true
    }

    /// Produce candidates for the query.
    async fn fetch_candidates(
        &self,
        query: &StrategyQuery,
    ) -> Result<Vec<RecommendCandidate>, StrategyError>;
}

/// Sort candidates by this strategy's score, highest first, and cap them.
pub(crate) fn truncate_by_score(
    mut candidates: Vec<RecommendCandidate>,
    kind: StrategyKind,
    limit: usize,
) -> Vec<RecommendCandidate> {
    candidates.sort_by(|a, b| {
        let a_score = a.score_for(kind).unwrap_or(0.0);
        let b_score = b.score_for(kind).unwrap_or(0.0);
        b_score
            .total_cmp(&a_score)
            .then_with(|| a.store_id.cmp(&b.store_id))
    });
    candidates.truncate(limit);
    candidates
}
