//! # Recommendation Orchestrator
//!
//! This module coordinates the entire recommendation pipeline:
//! 1. Validate the request
//! 2. Resolve the taste profile (lazily analyzing it when missing)
//! 3. Fan out: one task per applicable strategy, each with its own timeout
//! 4. Fan in under a shared request deadline
//! 5. Merge, score, filter and rank
//! 6. Append a history record
//!
//! A strategy that fails, times out or panics is excluded and reported on the
//! result; it never fails the request.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use chrono::Utc;
use tokio::task::{AbortHandle, JoinSet};
use tokio::time::{timeout, timeout_at, Instant};
use tracing::{debug, info, instrument, warn};

use pipeline::{rank, CandidateMerger, FilterContext, FilterPipeline, ScoredCandidate};
use sources::backends::{AffinityOracle, NearbyStores, NeighborStores, PopularStores};
use sources::{
    AiPreferenceStrategy, AnalyzeError, CandidateStrategy, CollaborativeStrategy, LocationStrategy,
    PopularityStrategy, RecommendCandidate, StrategyKind, StrategyQuery, TasteProfileAnalyzer,
};
use store_data::{
    HistoryCriteria, HistoryId, HistoryStore, InMemoryHistoryStore, InMemoryProfileStore,
    IndexInteractionSource, InteractionSource, RecommendHistory, RecommendType, StoreIndex,
    TasteProfile, TasteProfileStore, UserId,
};

use crate::config::{ConfigError, EngineConfig};
use crate::error::RecommendError;
use crate::request::{RecommendRequest, ValidatedRequest};
use crate::result::{
    ExcludedStrategy, ExclusionReason, RecommendationResult, ResultStatus, StoreRecommendation,
};

enum StrategyOutcome {
    Candidates(Vec<RecommendCandidate>),
    Excluded(ExclusionReason),
}

/// Everything the fan-in collected
#[derive(Default)]
struct FanIn {
    lists: Vec<(StrategyKind, Vec<RecommendCandidate>)>,
    used: Vec<StrategyKind>,
    excluded: Vec<ExcludedStrategy>,
}

/// Aborts the wrapped task when dropped
struct AbortOnDrop(AbortHandle);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Main orchestrator that coordinates the recommendation pipeline
#[derive(Clone)]
pub struct RecommendationOrchestrator {
    strategies: BTreeMap<StrategyKind, Arc<dyn CandidateStrategy>>,
    merger: CandidateMerger,
    filters: Arc<FilterPipeline>,
    analyzer: TasteProfileAnalyzer,
    profiles: Arc<dyn TasteProfileStore>,
    history: Arc<dyn HistoryStore>,
    config: Arc<EngineConfig>,
}

impl RecommendationOrchestrator {
    /// Create an orchestrator with no strategies registered.
    ///
    /// Register strategies with [`Self::with_strategy`] or
    /// [`Self::with_index_backends`].
    pub fn new(
        config: EngineConfig,
        profiles: Arc<dyn TasteProfileStore>,
        history: Arc<dyn HistoryStore>,
        interactions: Arc<dyn InteractionSource>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let analyzer = TasteProfileAnalyzer::new(interactions, profiles.clone())
            .with_settings(config.analyzer.clone());
        Ok(Self {
            strategies: BTreeMap::new(),
            merger: CandidateMerger::new(config.weights),
            filters: Arc::new(FilterPipeline::standard()),
            analyzer,
            profiles,
            history,
            config: Arc::new(config),
        })
    }

    /// A self-contained engine over a loaded dataset: in-memory profile and
    /// history stores plus all four index-backed strategies.
    pub fn from_index(config: EngineConfig, index: Arc<StoreIndex>) -> Result<Self, ConfigError> {
        let orchestrator = Self::new(
            config,
            Arc::new(InMemoryProfileStore::new()),
            Arc::new(InMemoryHistoryStore::new()),
            Arc::new(IndexInteractionSource::new(index.clone())),
        )?;
        Ok(orchestrator.with_index_backends(index))
    }

    /// Register a strategy, replacing any earlier one of the same kind.
    pub fn with_strategy(mut self, strategy: impl CandidateStrategy + 'static) -> Self {
        self.strategies.insert(strategy.kind(), Arc::new(strategy));
        self
    }

    pub fn with_filter_pipeline(mut self, filters: FilterPipeline) -> Self {
        self.filters = Arc::new(filters);
        self
    }

    /// Register all four strategies over collaborators backed by `index`.
    pub fn with_index_backends(self, index: Arc<StoreIndex>) -> Self {
        self.with_strategy(AiPreferenceStrategy::new(Arc::new(AffinityOracle::new(index.clone()))))
            .with_strategy(LocationStrategy::new(Arc::new(NearbyStores::new(index.clone()))))
            .with_strategy(PopularityStrategy::new(Arc::new(PopularStores::new(index.clone()))))
            .with_strategy(CollaborativeStrategy::new(Arc::new(NeighborStores::new(index))))
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registered_strategies(&self) -> Vec<StrategyKind> {
        self.strategies.keys().copied().collect()
    }

    /// Main entry point: recommend stores for a user.
    ///
    /// Only an invalid request is an error. When every strategy is excluded
    /// the result is empty with status
    /// [`ResultStatus::NoRecommendationsAvailable`].
    #[instrument(skip(self, request))]
    pub async fn recommend(
        &self,
        user_id: UserId,
        request: &RecommendRequest,
    ) -> Result<RecommendationResult, RecommendError> {
        let start_time = std::time::Instant::now();
        let request = request.validate(&self.config)?;

        let selected: Vec<Arc<dyn CandidateStrategy>> = request
            .strategies
            .iter()
            .filter_map(|kind| self.strategies.get(kind).cloned())
            .collect();

        let profile = if selected.iter().any(|s| s.requires_profile()) {
            self.resolve_profile(user_id).await
        } else {
            None
        };

        let mut query = StrategyQuery::new(user_id)
            .with_category(request.category)
            .with_candidate_limit(self.config.candidates_per_strategy);
        if let Some(profile) = &profile {
            query = query.with_profile(profile.clone());
        }
        if let Some(location) = request.location {
            query = query.with_location(location, request.radius_meters);
        }
        let query = Arc::new(query);

        let mut excluded = Vec::new();
        let mut runnable = Vec::new();
        for strategy in selected {
            let kind = strategy.kind();
            if strategy.requires_profile() && profile.is_none() {
                warn!("Excluding strategy {}: no taste profile for user {}", kind, user_id);
                excluded.push(ExcludedStrategy {
                    strategy: kind,
                    reason: ExclusionReason::ProfileUnavailable,
                });
            } else if strategy.is_applicable(&query) {
                runnable.push(strategy);
            } else {
                debug!("Skipping strategy {}: request lacks its input", kind);
            }
        }

        let fan_in = self.fan_out(runnable, query).await;
        info!(
            "Strategies finished: {} used, {} excluded",
            fan_in.used.len(),
            fan_in.excluded.len() + excluded.len()
        );
        excluded.extend(fan_in.excluded);
        excluded.sort_by_key(|e| e.strategy);

        let ranked = self.rank_candidates(fan_in.lists, &request, profile).await?;
        let items: Vec<StoreRecommendation> = ranked.into_iter().map(Into::into).collect();

        let status = if fan_in.used.is_empty() {
            ResultStatus::NoRecommendationsAvailable
        } else if items.is_empty() {
            ResultStatus::Empty
        } else {
            ResultStatus::Ranked
        };

        let mut result = RecommendationResult {
            items,
            strategies_used: fan_in.used,
            strategies_excluded: excluded,
            status,
            history_id: None,
            warnings: Vec::new(),
        };

        self.persist_history(user_id, &request, &mut result).await;

        info!(
            "Recommended {} stores for user {} in {:.2?} ({:?})",
            result.items.len(),
            user_id,
            start_time.elapsed(),
            result.status
        );
        Ok(result)
    }

    /// [`Self::recommend`] bounded by a caller-supplied timeout. Strategy
    /// tasks still pending when it elapses are cancelled.
    pub async fn recommend_within(
        &self,
        user_id: UserId,
        request: &RecommendRequest,
        limit: Duration,
    ) -> Result<RecommendationResult, RecommendError> {
        match timeout(limit, self.recommend(user_id, request)).await {
            Ok(result) => result,
            Err(_) => {
                warn!("Recommendation for user {} cancelled after {:?}", user_id, limit);
                Err(RecommendError::TimedOut(limit))
            }
        }
    }

    /// Recompute and store a user's taste profile.
    pub async fn analyze_taste_profile(&self, user_id: UserId) -> Result<TasteProfile, AnalyzeError> {
        self.analyzer.analyze(user_id).await
    }

    /// Feedback hook: the user clicked a recommendation.
    pub async fn record_click(&self, history_id: HistoryId) -> store_data::Result<()> {
        self.history.mark_clicked(history_id).await
    }

    /// Feedback hook: the user visited a recommended store.
    pub async fn record_visit(&self, history_id: HistoryId) -> store_data::Result<()> {
        self.history.mark_visited(history_id).await
    }

    /// Stored profile, or a freshly analyzed one when allowed. Any failure
    /// means "no profile" so profile-free strategies can still run.
    async fn resolve_profile(&self, user_id: UserId) -> Option<Arc<TasteProfile>> {
        match self.profiles.get(user_id).await {
            Ok(Some(profile)) => return Some(Arc::new(profile)),
            Ok(None) => {}
            Err(e) => {
                warn!("Failed to read taste profile for user {}: {}", user_id, e);
                return None;
            }
        }

        if !self.config.lazy_profile_analysis {
            debug!("No taste profile for user {} and lazy analysis is off", user_id);
            return None;
        }

        match self.analyzer.analyze(user_id).await {
            Ok(profile) => Some(Arc::new(profile)),
            Err(e) => {
                warn!("Lazy taste profile analysis failed: {}", e);
                None
            }
        }
    }

    /// Run every strategy concurrently and collect what finishes before the
    /// request deadline.
    async fn fan_out(&self, strategies: Vec<Arc<dyn CandidateStrategy>>, query: Arc<StrategyQuery>) -> FanIn {
        let strategy_timeout = self.config.strategy_timeout();
        let deadline = Instant::now() + self.config.request_deadline();

        let mut pending: BTreeSet<StrategyKind> = strategies.iter().map(|s| s.kind()).collect();
        let mut join_set = JoinSet::new();
        for strategy in strategies {
            let query = query.clone();
            join_set.spawn(async move {
                let kind = strategy.kind();
                let started = Instant::now();
                // Inner task so a panicking adapter surfaces as a JoinError
                let call = tokio::spawn(async move { strategy.fetch_candidates(&query).await });
                let _abort = AbortOnDrop(call.abort_handle());

                let outcome = match timeout(strategy_timeout, call).await {
                    Ok(Ok(Ok(candidates))) => StrategyOutcome::Candidates(candidates),
                    Ok(Ok(Err(e))) => StrategyOutcome::Excluded(ExclusionReason::Failed(e.to_string())),
                    Ok(Err(e)) if e.is_panic() => StrategyOutcome::Excluded(ExclusionReason::Panicked),
                    Ok(Err(e)) => StrategyOutcome::Excluded(ExclusionReason::Failed(e.to_string())),
                    Err(_) => StrategyOutcome::Excluded(ExclusionReason::TimedOut),
                };
                debug!("Strategy {} settled in {:.2?}", kind, started.elapsed());
                (kind, outcome)
            });
        }

        let mut fan_in = FanIn::default();
        let mut deadline_hit = false;
        loop {
            match timeout_at(deadline, join_set.join_next()).await {
                Ok(Some(Ok((kind, outcome)))) => {
                    pending.remove(&kind);
                    match outcome {
                        StrategyOutcome::Candidates(candidates) => {
                            debug!("Strategy {} returned {} candidates", kind, candidates.len());
                            fan_in.used.push(kind);
                            fan_in.lists.push((kind, candidates));
                        }
                        StrategyOutcome::Excluded(reason) => {
                            warn!("Excluding strategy {}: {}", kind, reason);
                            fan_in.excluded.push(ExcludedStrategy { strategy: kind, reason });
                        }
                    }
                }
                Ok(Some(Err(e))) => warn!("Strategy task could not be joined: {}", e),
                Ok(None) => break,
                Err(_) => {
                    deadline_hit = true;
                    // Late tasks finish on their own; their results are dropped
                    join_set.detach_all();
                    break;
                }
            }
        }

        for kind in pending {
            let reason = if deadline_hit {
                ExclusionReason::DeadlineExceeded
            } else {
                ExclusionReason::Panicked
            };
            warn!("Excluding strategy {}: {}", kind, reason);
            fan_in.excluded.push(ExcludedStrategy { strategy: kind, reason });
        }

        fan_in.used.sort_unstable();
        // Merge in fixed strategy order so attribute precedence is stable
        fan_in.lists.sort_by_key(|(kind, _)| *kind);
        fan_in
    }

    /// Merge, score, filter and rank on the blocking pool
    async fn rank_candidates(
        &self,
        lists: Vec<(StrategyKind, Vec<RecommendCandidate>)>,
        request: &ValidatedRequest,
        profile: Option<Arc<TasteProfile>>,
    ) -> Result<Vec<ScoredCandidate>, RecommendError> {
        let merger = self.merger.clone();
        let filters = self.filters.clone();
        let context = FilterContext::new(request.category, request.tags.clone()).with_profile(profile);
        let origin = request.location;
        let limit = request.limit;

        let ranked = tokio::task::spawn_blocking(move || -> anyhow::Result<Vec<ScoredCandidate>> {
            let mut merged = CandidateMerger::merge(lists.into_iter().map(|(_, list)| list).collect());
            if let Some(origin) = origin {
                CandidateMerger::fill_distances(&mut merged, origin);
            }
            let scored = merger.score(merged);
            let total = scored.len();

            let filtered = filters.apply(scored, &context).context("Failed to apply filters")?;
            info!("Filters kept {} of {} merged candidates", filtered.len(), total);

            Ok(rank(filtered, limit))
        })
        .await
        .context("Ranking task panicked")??;
        Ok(ranked)
    }

    /// Append the history record; a failure becomes a warning on the result.
    async fn persist_history(&self, user_id: UserId, request: &ValidatedRequest, result: &mut RecommendationResult) {
        let recommend_type = match result.strategies_used.as_slice() {
            [only] => recommend_type_for(*only),
            _ => RecommendType::Hybrid,
        };
        let criteria = HistoryCriteria {
            strategies_used: result.strategies_used.iter().map(|k| k.to_string()).collect(),
            strategies_excluded: result
                .strategies_excluded
                .iter()
                .map(|e| e.strategy.to_string())
                .collect(),
            category: request.category,
            tags: request.tags.clone(),
        };
        let record = RecommendHistory::new(user_id, result.store_ids(), recommend_type, criteria, Utc::now());

        match self.history.append(record).await {
            Ok(id) => result.history_id = Some(id),
            Err(e) => {
                warn!("Failed to persist recommendation history for user {}: {}", user_id, e);
                result
                    .warnings
                    .push(format!("recommendation history was not saved: {e}"));
            }
        }
    }
}

fn recommend_type_for(kind: StrategyKind) -> RecommendType {
    match kind {
        StrategyKind::Ai => RecommendType::Ai,
        StrategyKind::Location => RecommendType::Location,
        StrategyKind::Popularity => RecommendType::Popularity,
        StrategyKind::Collaborative => RecommendType::Collaborative,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use store_data::{Coordinates, FoodCategory, Review, Store};

    fn build_test_index() -> Arc<StoreIndex> {
        let mut index = StoreIndex::new();
        let stores = [
            (1, "Gangnam Gukbap", FoodCategory::Korean, 37.5005, 127.0, vec!["soup", "solo-dining"]),
            (2, "Seolleung Tteokbokki", FoodCategory::Korean, 37.503, 127.0, vec!["spicy"]),
            (3, "Yeoksam Roasters", FoodCategory::Cafe, 37.501, 127.001, vec!["quiet"]),
            (4, "Far Away Pub", FoodCategory::Bar, 37.6, 127.2, vec!["late-night"]),
        ];
        for (id, name, category, lat, lon, tags) in stores {
            index.insert_store(Store {
                id,
                name: name.to_string(),
                category,
                coordinates: Coordinates::new(lat, lon),
                tags: tags.into_iter().map(String::from).collect(),
                price_level: Some(2),
            });
        }

        let created_at = Utc.with_ymd_and_hms(2026, 5, 1, 19, 0, 0).unwrap();
        let reviews = [
            (1, 1, 5.0),
            (1, 3, 4.0),
            (2, 1, 5.0),
            (2, 3, 4.5),
            (2, 2, 5.0),
            (3, 2, 4.0),
            (3, 4, 3.0),
        ];
        for (user_id, store_id, rating) in reviews {
            index.insert_review(Review {
                user_id,
                store_id,
                rating,
                content: String::new(),
                tags: vec!["friendly".to_string()],
                distance_meters: Some(400.0),
                created_at,
            });
        }
        index.build_secondary_indices();
        index.compute_store_stats();
        Arc::new(index)
    }

    fn orchestrator() -> RecommendationOrchestrator {
        let mut config = EngineConfig::default();
        config.analyzer.min_data_points = 1;
        RecommendationOrchestrator::from_index(config, build_test_index()).unwrap()
    }

    #[test]
    fn test_recommend_type_mapping() {
        assert_eq!(recommend_type_for(StrategyKind::Ai), RecommendType::Ai);
        assert_eq!(recommend_type_for(StrategyKind::Collaborative), RecommendType::Collaborative);
    }

    #[test]
    fn test_index_backends_register_all_strategies() {
        assert_eq!(orchestrator().registered_strategies(), StrategyKind::ALL.to_vec());
    }

    #[tokio::test]
    async fn test_recommend_over_index() {
        let orchestrator = orchestrator();
        let request = RecommendRequest::new()
            .with_location(Coordinates::new(37.5, 127.0))
            .with_limit(3);

        let result = orchestrator.recommend(1, &request).await.unwrap();

        assert_eq!(result.status, ResultStatus::Ranked);
        assert!(result.strategies_excluded.is_empty());
        assert!(result.strategies_used.contains(&StrategyKind::Location));
        assert!(result.items.len() <= 3);
        // The pub is outside the 3km radius and nobody recommends it otherwise
        assert!(!result.store_ids().contains(&4));
        assert!(result.history_id.is_some());
    }

    #[tokio::test]
    async fn test_lazy_analysis_persists_profile() {
        let orchestrator = orchestrator();
        assert!(orchestrator.profiles.get(1).await.unwrap().is_none());

        orchestrator.recommend(1, &RecommendRequest::new()).await.unwrap();

        let profile = orchestrator.profiles.get(1).await.unwrap().unwrap();
        assert_eq!(profile.top_category(), Some(FoodCategory::Korean));
    }

    #[tokio::test]
    async fn test_profile_strategies_excluded_without_lazy_analysis() {
        let mut config = EngineConfig::default();
        config.lazy_profile_analysis = false;
        let orchestrator = RecommendationOrchestrator::from_index(config, build_test_index()).unwrap();

        let result = orchestrator.recommend(1, &RecommendRequest::new()).await.unwrap();

        assert_eq!(result.excluded(StrategyKind::Ai), Some(&ExclusionReason::ProfileUnavailable));
        assert_eq!(
            result.excluded(StrategyKind::Collaborative),
            Some(&ExclusionReason::ProfileUnavailable)
        );
        // No location given, so popularity is the only strategy that ran
        assert_eq!(result.strategies_used, vec![StrategyKind::Popularity]);
    }
}
