//! Filter to keep only stores sharing a tag with the request.

use crate::merger::ScoredCandidate;
use crate::traits::{Filter, FilterContext};
use anyhow::Result;

/// Removes candidates that share zero tags with the request.
///
/// ## Algorithm
/// 1. No requested tags: keep everything
/// 2. Otherwise keep a candidate when any of its tags equals any requested
///    tag, ignoring ASCII case
pub struct TagFilter;

impl Filter for TagFilter {
    fn name(&self) -> &str {
        "TagFilter"
    }

    fn apply(
        &self,
        candidates: Vec<ScoredCandidate>,
        context: &FilterContext,
    ) -> Result<Vec<ScoredCandidate>> {
        if context.tags.is_empty() {
            return Ok(candidates);
        }
        Ok(candidates
            .into_iter()
            .filter(|c| context.tags.iter().any(|tag| c.candidate.attributes.has_tag(tag)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sources::{RecommendCandidate, StoreAttributes, StrategyKind};

    fn scored(store_id: u64, tags: Option<&[&str]>) -> ScoredCandidate {
        let attributes = StoreAttributes {
            tags: tags.map(|t| t.iter().map(|s| s.to_string()).collect()),
            ..Default::default()
        };
        ScoredCandidate {
            candidate: RecommendCandidate::new(store_id, StrategyKind::Ai, 0.5, attributes),
            composite: 0.2,
            reason: StrategyKind::Ai,
        }
    }

    #[test]
    fn test_tag_overlap() {
        let candidates = vec![
            scored(1, Some(&["Spicy", "late-night"])),
            scored(2, Some(&["quiet"])),
            scored(3, None),
            scored(4, Some(&["solo-dining"])),
        ];
        let context = FilterContext::new(None, vec!["spicy".to_string(), "solo-dining".to_string()]);

        let ids: Vec<_> = TagFilter
            .apply(candidates, &context)
            .unwrap()
            .iter()
            .map(|c| c.store_id())
            .collect();
        assert_eq!(ids, vec![1, 4]);
    }

    #[test]
    fn test_scores_untouched() {
        let candidates = vec![scored(1, Some(&["spicy"]))];
        let context = FilterContext::new(None, vec!["spicy".to_string()]);
        let filtered = TagFilter.apply(candidates.clone(), &context).unwrap();
        assert_eq!(filtered, candidates);
    }
}
