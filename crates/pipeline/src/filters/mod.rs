//! Filter implementations for the candidate pipeline.
//!
//! Filters run once over the merged candidate set, never inside a strategy.

pub mod category;
pub mod tags;

pub use category::CategoryFilter;
pub use tags::TagFilter;
