//! Filter to keep only stores of the requested category.

use crate::merger::ScoredCandidate;
use crate::traits::{Filter, FilterContext};
use anyhow::Result;

/// Removes candidates whose category differs from the request's.
///
/// A candidate whose category no collaborator reported cannot be shown to
/// match and is removed. Without a requested category this is a no-op.
pub struct CategoryFilter;

impl Filter for CategoryFilter {
    fn name(&self) -> &str {
        "CategoryFilter"
    }

    fn apply(
        &self,
        candidates: Vec<ScoredCandidate>,
        context: &FilterContext,
    ) -> Result<Vec<ScoredCandidate>> {
        let Some(category) = context.category else {
            return Ok(candidates);
        };
        Ok(candidates
            .into_iter()
            .filter(|c| c.candidate.attributes.category == Some(category))
            .collect())
    }
}
