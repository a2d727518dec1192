//! The FilterPipeline chains filters over the merged candidates.

use crate::filters::{CategoryFilter, TagFilter};
use crate::merger::ScoredCandidate;
use crate::traits::{Filter, FilterContext};
use anyhow::Result;
use tracing;

/// Chains multiple filters together into a processing pipeline.
///
/// ## Usage
/// ```ignore
/// let pipeline = FilterPipeline::new()
///     .add_filter(CategoryFilter)
///     .add_filter(TagFilter);
///
/// let filtered = pipeline.apply(candidates, &context)?;
/// ```
pub struct FilterPipeline {
    filters: Vec<Box<dyn Filter>>,
}

impl FilterPipeline {
    /// Create a new empty FilterPipeline.
    pub fn new() -> Self {
        Self {
            filters: Vec::new(),
        }
    }

    /// The request filters every recommendation runs: category, then tags.
    pub fn standard() -> Self {
        Self::new().add_filter(CategoryFilter).add_filter(TagFilter)
    }

    /// Add a filter to the pipeline (builder pattern).
    pub fn add_filter(mut self, filter: impl Filter + 'static) -> Self {
        self.filters.push(Box::new(filter));
        self
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Apply all filters in sequence to the candidates.
    pub fn apply(
        &self,
        candidates: Vec<ScoredCandidate>,
        context: &FilterContext,
    ) -> Result<Vec<ScoredCandidate>> {
        let mut current = candidates;
        for filter in &self.filters {
            tracing::debug!(
                "Applying filter: {} (input count: {})",
                filter.name(),
                current.len()
            );
            current = filter.apply(current, context)?;
            tracing::debug!(
                "Filter applied: {} (output count: {})",
                filter.name(),
                current.len()
            );
        }
        Ok(current)
    }
}

impl Default for FilterPipeline {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sources::{RecommendCandidate, StoreAttributes, StrategyKind};
    use store_data::FoodCategory;

    fn scored(store_id: u64, category: FoodCategory, tags: &[&str]) -> ScoredCandidate {
        let attributes = StoreAttributes {
            category: Some(category),
            tags: Some(tags.iter().map(|t| t.to_string()).collect()),
            ..Default::default()
        };
        ScoredCandidate {
            candidate: RecommendCandidate::new(store_id, StrategyKind::Location, 0.5, attributes),
            composite: 0.125,
            reason: StrategyKind::Location,
        }
    }

    fn candidates() -> Vec<ScoredCandidate> {
        vec![
            scored(1, FoodCategory::Korean, &["spicy"]),
            scored(2, FoodCategory::Korean, &["quiet"]),
            scored(3, FoodCategory::Cafe, &["spicy"]),
        ]
    }

    #[test]
    fn test_empty_pipeline() {
        let pipeline = FilterPipeline::new();
        let filtered = pipeline.apply(candidates(), &FilterContext::default()).unwrap();
        assert_eq!(filtered.len(), 3);
    }

    #[test]
    fn test_standard_pipeline() {
        let context = FilterContext::new(Some(FoodCategory::Korean), vec!["spicy".to_string()]);
        let filtered = FilterPipeline::standard().apply(candidates(), &context).unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].store_id(), 1);
    }

    #[test]
    fn test_filter_is_idempotent() {
        let pipeline = FilterPipeline::standard();
        let context = FilterContext::new(Some(FoodCategory::Korean), vec!["quiet".to_string()]);

        let once = pipeline.apply(candidates(), &context).unwrap();
        let twice = pipeline.apply(once.clone(), &context).unwrap();
        assert_eq!(once, twice);
    }
}
