//! Server crate for the store recommendation engine.
//!
//! This crate contains the orchestrator that coordinates all components
//! of the recommendation pipeline, plus the request, result and
//! configuration types its callers work with.

pub mod config;
pub mod error;
pub mod orchestrator;
pub mod request;
pub mod result;

pub use config::{ConfigError, EngineConfig};
pub use error::RecommendError;
pub use orchestrator::RecommendationOrchestrator;
pub use request::{RecommendRequest, ValidatedRequest};
pub use result::{
    ExcludedStrategy, ExclusionReason, RecommendationResult, ResultStatus, StoreRecommendation,
};
pub use sources::AnalyzeError;
