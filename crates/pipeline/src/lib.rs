//! Pipeline for merging, filtering and ranking store candidates.
//!
//! This crate provides:
//! - StrategyWeights for the composite score
//! - CandidateMerger to fold per-strategy lists into scored candidates
//! - Filter trait, the category/tag filters and FilterPipeline
//! - The ranker
//!
//! ## Architecture
//! The pipeline processes candidates in stages, strictly after every
//! strategy has returned:
//! 1. Merge candidate lists by store id and fill distances
//! 2. Score each candidate (composite + recommend reason)
//! 3. Filters narrow the set to the request's category and tags
//! 4. Rank and truncate
//!
//! ## Example Usage
//! ```ignore
//! use pipeline::{rank, CandidateMerger, FilterContext, FilterPipeline, StrategyWeights};
//!
//! let merger = CandidateMerger::new(StrategyWeights::default());
//! let merged = CandidateMerger::merge(vec![ai_candidates, location_candidates]);
//! let scored = merger.score(merged);
//!
//! let context = FilterContext::new(Some(FoodCategory::Korean), vec![]);
//! let filtered = FilterPipeline::standard().apply(scored, &context)?;
//! let ranked = rank(filtered, 10);
//! ```

pub mod filter_pipeline;
pub mod filters;
pub mod merger;
pub mod ranker;
pub mod traits;
pub mod weights;

// Re-export main types
pub use filter_pipeline::FilterPipeline;
pub use merger::{recommend_reason, CandidateMerger, ScoredCandidate};
pub use ranker::{rank, ranking_order};
pub use traits::{Filter, FilterContext};
pub use weights::{StrategyWeights, WeightsError};
