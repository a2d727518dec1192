//! Contracts of the external collaborators the strategies translate from.
//!
//! Each collaborator may fail or stall; none of them has side effects. The
//! strategy adapters in [`crate::adapters`] turn their responses into
//! [`crate::RecommendCandidate`]s.

use crate::types::StoreAttributes;
use async_trait::async_trait;
use store_data::{Coordinates, DataError, FoodCategory, StoreId, TasteProfile, UserId};
use thiserror::Error;

/// Errors reported by an external collaborator
#[derive(Error, Debug)]
pub enum CollaboratorError {
    #[error("Collaborator unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid response from collaborator: {0}")]
    InvalidResponse(String),

    #[error(transparent)]
    Data(#[from] DataError),
}

/// A store with a collaborator-assigned score
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredStore {
    pub store_id: StoreId,
    pub score: f64,
    pub attributes: StoreAttributes,
}

/// A store found near a coordinate
#[derive(Debug, Clone, PartialEq)]
pub struct NearbyStore {
    pub store_id: StoreId,
    pub distance_meters: f64,
    pub attributes: StoreAttributes,
}

/// A store with its aggregate review statistics
#[derive(Debug, Clone, PartialEq)]
pub struct PopularStore {
    pub store_id: StoreId,
    pub rating: f32,
    pub review_count: u32,
    pub attributes: StoreAttributes,
}

/// Scores stores against an inferred taste profile.
#[async_trait]
pub trait PreferenceOracle: Send + Sync {
    async fn score_stores_for_profile(
        &self,
        profile: &TasteProfile,
    ) -> Result<Vec<ScoredStore>, CollaboratorError>;
}

/// Finds stores within a radius of a coordinate.
#[async_trait]
pub trait LocationService: Send + Sync {
    async fn nearby(
        &self,
        at: Coordinates,
        radius_meters: f64,
    ) -> Result<Vec<NearbyStore>, CollaboratorError>;
}

/// Lists the highest-rated, most-reviewed stores.
#[async_trait]
pub trait PopularitySource: Send + Sync {
    async fn top_stores(
        &self,
        category: Option<FoodCategory>,
    ) -> Result<Vec<PopularStore>, CollaboratorError>;
}

/// Lists stores favoured by users similar to the given one.
#[async_trait]
pub trait CollaborativeSource: Send + Sync {
    async fn similar_user_stores(&self, user_id: UserId) -> Result<Vec<ScoredStore>, CollaboratorError>;
}
