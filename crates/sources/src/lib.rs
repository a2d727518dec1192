//! # Sources Crate
//!
//! Candidate generation for store recommendations.
//!
//! ## Components
//!
//! ### Strategies
//! One [`CandidateStrategy`] per signal, each translating a single external
//! collaborator into [`RecommendCandidate`]s:
//! - **AI preference**: an oracle scores stores against the taste profile
//! - **Location**: stores near a coordinate, closer scores higher
//! - **Popularity**: highest-rated, most-reviewed stores
//! - **Collaborative**: stores favoured by similar users
//!
//! ### Index-backed collaborators
//! [`backends`] implements every collaborator over the in-memory
//! [`store_data::StoreIndex`] so the engine runs on a local dataset.
//!
//! ### Taste Profile Analyzer
//! [`TasteProfileAnalyzer`] derives a user's taste profile from their
//! interaction history and persists it.
//!
//! ## Example Usage
//!
//! ```ignore
//! use sources::backends::NearbyStores;
//! use sources::{CandidateStrategy, LocationStrategy, StrategyQuery};
//! use store_data::{Coordinates, StoreIndex};
//! use std::sync::Arc;
//!
//! let index = Arc::new(StoreIndex::load_from_files("data/seoul".as_ref())?);
//! let location = LocationStrategy::new(Arc::new(NearbyStores::new(index)));
//!
//! let query = StrategyQuery::new(1).with_location(Coordinates::new(37.5, 127.0), 3_000.0);
//! let candidates = location.fetch_candidates(&query).await?;
//! ```

pub mod adapters;
pub mod analyzer;
pub mod backends;
pub mod collaborators;
pub mod strategy;
pub mod types;

pub use adapters::{AiPreferenceStrategy, CollaborativeStrategy, LocationStrategy, PopularityStrategy};
pub use analyzer::{build_taste_profile, AnalyzeError, AnalyzerSettings, TasteProfileAnalyzer};
pub use collaborators::{
    CollaborativeSource, CollaboratorError, LocationService, NearbyStore, PopularStore,
    PopularitySource, PreferenceOracle, ScoredStore,
};
pub use strategy::{CandidateStrategy, StrategyError};
pub use types::{RecommendCandidate, StoreAttributes, StrategyKind, StrategyQuery};
