//! Recommendation requests and their validation.

use crate::config::EngineConfig;
use crate::error::RecommendError;
use sources::StrategyKind;
use store_data::{Coordinates, FoodCategory};

/// What the caller asks for. Every field is optional; omitted fields take
/// the engine defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecommendRequest {
    pub category: Option<FoodCategory>,
    pub tags: Vec<String>,
    pub location: Option<Coordinates>,
    pub radius_meters: Option<f64>,
    pub limit: Option<usize>,
    /// Strategies to run; `None` runs all of them
    pub strategies: Option<Vec<StrategyKind>>,
}

impl RecommendRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_category(mut self, category: FoodCategory) -> Self {
        self.category = Some(category);
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_location(mut self, location: Coordinates) -> Self {
        self.location = Some(location);
        self
    }

    pub fn with_radius(mut self, radius_meters: f64) -> Self {
        self.radius_meters = Some(radius_meters);
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_strategies(mut self, strategies: Vec<StrategyKind>) -> Self {
        self.strategies = Some(strategies);
        self
    }

    /// Check the request against the engine limits and fill in defaults.
    pub fn validate(&self, config: &EngineConfig) -> Result<ValidatedRequest, RecommendError> {
        let limit = self.limit.unwrap_or(config.default_limit);
        if limit == 0 || limit > config.max_limit {
            return Err(RecommendError::invalid(format!(
                "limit must be within 1..={}, got {limit}",
                config.max_limit
            )));
        }

        let radius_meters = self.radius_meters.unwrap_or(config.default_radius_meters);
        if !(radius_meters > 0.0 && radius_meters <= config.max_radius_meters) {
            return Err(RecommendError::invalid(format!(
                "radius must be within (0, {}] meters, got {radius_meters}",
                config.max_radius_meters
            )));
        }

        if let Some(location) = self.location
            && !location.is_valid()
        {
            return Err(RecommendError::invalid(format!(
                "coordinates out of range: lat {}, lon {}",
                location.lat, location.lon
            )));
        }

        let mut tags = Vec::with_capacity(self.tags.len());
        for tag in &self.tags {
            let normalized = tag.trim().to_lowercase();
            if normalized.is_empty() {
                return Err(RecommendError::invalid("tags must not be blank"));
            }
            if !tags.contains(&normalized) {
                tags.push(normalized);
            }
        }

        let mut strategies = self
            .strategies
            .clone()
            .unwrap_or_else(|| StrategyKind::ALL.to_vec());
        strategies.sort_unstable();
        strategies.dedup();
        if strategies.is_empty() {
            return Err(RecommendError::invalid("at least one strategy must be requested"));
        }
        if strategies == [StrategyKind::Location] && self.location.is_none() {
            return Err(RecommendError::invalid(
                "a location-only request needs coordinates",
            ));
        }

        Ok(ValidatedRequest {
            category: self.category,
            tags,
            location: self.location,
            radius_meters,
            limit,
            strategies,
        })
    }
}

/// A request that passed validation, defaults applied.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedRequest {
    pub category: Option<FoodCategory>,
    /// Trimmed, lowercased, deduplicated
    pub tags: Vec<String>,
    pub location: Option<Coordinates>,
    pub radius_meters: f64,
    pub limit: usize,
    /// Sorted, deduplicated
    pub strategies: Vec<StrategyKind>,
}
