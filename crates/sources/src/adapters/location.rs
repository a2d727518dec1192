//! Location strategy.
//!
//! Queries the location service for stores around the request coordinate.
//! Score is `1 - distance / radius`, so a store at the origin scores 1.0
//! and one on the radius boundary scores 0.0.

use crate::collaborators::LocationService;
use crate::strategy::{truncate_by_score, CandidateStrategy, StrategyError};
use crate::types::{RecommendCandidate, StrategyKind, StrategyQuery};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, instrument};

pub struct LocationStrategy {
    service: Arc<dyn LocationService>,
}

impl LocationStrategy {
    pub fn new(service: Arc<dyn LocationService>) -> Self {
        Self { service }
    }
}

/// Inverse-distance score normalized to [0,1] within `radius_meters`.
pub fn proximity_score(distance_meters: f64, radius_meters: f64) -> f64 {
    if radius_meters <= 0.0 || !distance_meters.is_finite() {
        return 0.0;
    }
    (1.0 - distance_meters / radius_meters).clamp(0.0, 1.0)
}

#[async_trait]
impl CandidateStrategy for LocationStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Location
    }

    fn is_applicable(&self, query: &StrategyQuery) -> bool {
        query.location.is_some()
    }

    #[instrument(skip(self, query), fields(user_id = query.user_id))]
    async fn fetch_candidates(
        &self,
        query: &StrategyQuery,
    ) -> Result<Vec<RecommendCandidate>, StrategyError> {
        let at = query
            .location
            .ok_or(StrategyError::MissingInput("location"))?;
        let radius = query.radius_meters;

        let nearby = self.service.nearby(at, radius).await?;
        let returned = nearby.len();

        let candidates: Vec<RecommendCandidate> = nearby
            .into_iter()
            .filter(|s| s.distance_meters.is_finite() && s.distance_meters <= radius)
            .map(|s| {
                RecommendCandidate::new(
                    s.store_id,
                    StrategyKind::Location,
                    proximity_score(s.distance_meters, radius),
                    s.attributes,
                )
                .with_distance(s.distance_meters)
            })
            .collect();

        debug!(
            "Location service returned {} stores, {} within {}m",
            returned,
            candidates.len(),
            radius
        );
        Ok(truncate_by_score(candidates, StrategyKind::Location, query.candidate_limit))
    }
}
