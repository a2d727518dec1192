//! What a recommendation call returns.

use pipeline::ScoredCandidate;
use sources::StrategyKind;
use std::collections::BTreeMap;
use std::fmt;
use store_data::{FoodCategory, HistoryId, StoreId};

/// Why a strategy contributed nothing to a request
#[derive(Debug, Clone, PartialEq)]
pub enum ExclusionReason {
    /// The collaborator returned an error
    Failed(String),
    /// The strategy's own timeout elapsed
    TimedOut,
    /// Still running when the shared request deadline passed
    DeadlineExceeded,
    /// The strategy task panicked
    Panicked,
    /// The strategy needs a taste profile and none was available
    ProfileUnavailable,
}

impl fmt::Display for ExclusionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExclusionReason::Failed(message) => write!(f, "failed: {message}"),
            ExclusionReason::TimedOut => f.write_str("timed out"),
            ExclusionReason::DeadlineExceeded => f.write_str("request deadline exceeded"),
            ExclusionReason::Panicked => f.write_str("panicked"),
            ExclusionReason::ProfileUnavailable => f.write_str("taste profile unavailable"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExcludedStrategy {
    pub strategy: StrategyKind,
    pub reason: ExclusionReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultStatus {
    /// At least one store was recommended
    Ranked,
    /// Strategies ran but nothing survived
    Empty,
    /// Every attempted strategy was excluded
    NoRecommendationsAvailable,
}

/// One ranked store
#[derive(Debug, Clone, PartialEq)]
pub struct StoreRecommendation {
    pub store_id: StoreId,
    pub name: Option<String>,
    pub category: Option<FoodCategory>,
    pub tags: Vec<String>,
    pub score: f64,
    pub source_scores: BTreeMap<StrategyKind, f64>,
    pub distance_meters: Option<f64>,
    pub rating: Option<f32>,
    pub review_count: Option<u32>,
    pub reason: StrategyKind,
    pub explanation: String,
}

impl From<ScoredCandidate> for StoreRecommendation {
    fn from(scored: ScoredCandidate) -> Self {
        let explanation = scored.reason_text().to_string();
        let candidate = scored.candidate;
        let source_scores = candidate.source_scores().clone();
        let attributes = candidate.attributes;
        Self {
            store_id: candidate.store_id,
            name: attributes.name,
            category: attributes.category,
            tags: attributes.tags.unwrap_or_default(),
            score: scored.composite,
            source_scores,
            distance_meters: candidate.distance_meters,
            rating: attributes.rating,
            review_count: attributes.review_count,
            reason: scored.reason,
            explanation,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecommendationResult {
    pub items: Vec<StoreRecommendation>,
    /// Strategies that ran to completion, including those that found nothing
    pub strategies_used: Vec<StrategyKind>,
    pub strategies_excluded: Vec<ExcludedStrategy>,
    pub status: ResultStatus,
    /// Id of the history record, when one was written
    pub history_id: Option<HistoryId>,
    /// Non-fatal problems, such as a failed history write
    pub warnings: Vec<String>,
}

impl RecommendationResult {
    pub fn store_ids(&self) -> Vec<StoreId> {
        self.items.iter().map(|item| item.store_id).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn no_recommendations_available(&self) -> bool {
        self.status == ResultStatus::NoRecommendationsAvailable
    }

    pub fn excluded(&self, strategy: StrategyKind) -> Option<&ExclusionReason> {
        self.strategies_excluded
            .iter()
            .find(|e| e.strategy == strategy)
            .map(|e| &e.reason)
    }
}
