//! Errors surfaced to callers of the orchestrator.
//!
//! Strategy failures never appear here: they are recovered by excluding the
//! strategy and reported on the result instead.

use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RecommendError {
    /// Malformed request, rejected before any strategy runs
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The caller's whole-call timeout elapsed
    #[error("Recommendation timed out after {0:?}")]
    TimedOut(Duration),

    #[error(transparent)]
    Pipeline(#[from] anyhow::Error),
}

impl RecommendError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        RecommendError::InvalidRequest(reason.into())
    }
}
