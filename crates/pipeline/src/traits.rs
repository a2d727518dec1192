//! Core traits for the filtering pipeline.
//!
//! This module defines the Filter trait that allows composable,
//! extensible filters to be applied to merged candidates.

use crate::merger::ScoredCandidate;
use anyhow::Result;
use std::sync::Arc;
use store_data::{FoodCategory, TasteProfile};

/// The request-level narrowing inputs filters evaluate against.
#[derive(Debug, Clone, Default)]
pub struct FilterContext {
    /// Keep only stores of this category
    pub category: Option<FoodCategory>,
    /// Keep only stores sharing at least one of these tags
    pub tags: Vec<String>,
    /// Profile snapshot the request ran with, if any
    pub profile: Option<Arc<TasteProfile>>,
}

impl FilterContext {
    pub fn new(category: Option<FoodCategory>, tags: Vec<String>) -> Self {
        Self {
            category,
            tags,
            profile: None,
        }
    }

    pub fn with_profile(mut self, profile: Option<Arc<TasteProfile>>) -> Self {
        self.profile = profile;
        self
    }
}

/// Core trait for filtering candidates.
///
/// ## Design Note
/// - `Send + Sync` allows filters to be shared by concurrent requests
/// - Filters take ownership of the Vec and return the survivors
/// - A filter only removes candidates; it never adds or rescores one
pub trait Filter: Send + Sync {
    /// Returns the name of this filter (for logging/debugging)
    fn name(&self) -> &str;

    /// Apply this filter to a set of candidates.
    fn apply(
        &self,
        candidates: Vec<ScoredCandidate>,
        context: &FilterContext,
    ) -> Result<Vec<ScoredCandidate>>;
}
