//! Repository interfaces for taste profiles, recommendation history and the
//! interaction stream, plus in-memory implementations.
//!
//! The in-memory stores keep rows the way a relational table would: opaque
//! columns (behaviour patterns, store-id lists) hold versioned blobs from
//! [`crate::codec`] and are decoded back into typed values on read.

use crate::codec;
use crate::error::{DataError, Result};
use crate::index::StoreIndex;
use crate::types::*;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

/// Holds one taste profile per user. Writes replace the whole profile.
#[async_trait]
pub trait TasteProfileStore: Send + Sync {
    async fn get(&self, user_id: UserId) -> Result<Option<TasteProfile>>;

    async fn put(&self, profile: TasteProfile) -> Result<()>;

    /// Explicit deletion; nothing in the engine deletes implicitly.
    async fn delete(&self, user_id: UserId) -> Result<bool>;
}

/// Append-only history of recommendation results.
///
/// The only mutation after append is setting the two feedback flags.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    async fn append(&self, history: RecommendHistory) -> Result<HistoryId>;

    async fn get(&self, id: HistoryId) -> Result<Option<RecommendHistory>>;

    async fn mark_clicked(&self, id: HistoryId) -> Result<()>;

    async fn mark_visited(&self, id: HistoryId) -> Result<()>;
}

/// Supplies a user's historical interactions to the taste profile analyzer.
#[async_trait]
pub trait InteractionSource: Send + Sync {
    async fn stream_interactions(&self, user_id: UserId) -> Result<Vec<Interaction>>;
}

// =============================================================================
// Taste profiles
// =============================================================================

#[derive(Debug, Clone)]
struct ProfileRow {
    preferred_categories: Vec<FoodCategory>,
    category_scores: HashMap<FoodCategory, f64>,
    preferred_tags: Vec<String>,
    behavior_patterns_blob: String,
    price_preference: Preference,
    distance_preference: Preference,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Taste profile store backed by a map guarded by an async RwLock.
#[derive(Debug, Default, Clone)]
pub struct InMemoryProfileStore {
    rows: Arc<RwLock<HashMap<UserId, ProfileRow>>>,
}

impl InMemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }
}

#[async_trait]
impl TasteProfileStore for InMemoryProfileStore {
    async fn get(&self, user_id: UserId) -> Result<Option<TasteProfile>> {
        let rows = self.rows.read().await;
        let Some(row) = rows.get(&user_id) else {
            return Ok(None);
        };
        Ok(Some(TasteProfile {
            user_id,
            preferred_categories: row.preferred_categories.clone(),
            category_scores: row.category_scores.clone(),
            preferred_tags: row.preferred_tags.clone(),
            behavior_patterns: codec::decode_behavior_patterns(&row.behavior_patterns_blob)?,
            price_preference: row.price_preference,
            distance_preference: row.distance_preference,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }))
    }

    async fn put(&self, profile: TasteProfile) -> Result<()> {
        let row = ProfileRow {
            behavior_patterns_blob: codec::encode_behavior_patterns(&profile.behavior_patterns)?,
            preferred_categories: profile.preferred_categories,
            category_scores: profile.category_scores,
            preferred_tags: profile.preferred_tags,
            price_preference: profile.price_preference,
            distance_preference: profile.distance_preference,
            created_at: profile.created_at,
            updated_at: profile.updated_at,
        };
        self.rows.write().await.insert(profile.user_id, row);
        Ok(())
    }

    async fn delete(&self, user_id: UserId) -> Result<bool> {
        Ok(self.rows.write().await.remove(&user_id).is_some())
    }
}

// =============================================================================
// Recommendation history
// =============================================================================

#[derive(Debug, Clone)]
struct HistoryRow {
    member_id: UserId,
    store_ids_blob: String,
    recommend_type: RecommendType,
    criteria_blob: String,
    clicked: bool,
    visited: bool,
    created_at: DateTime<Utc>,
}

/// History store backed by a map with a monotonically increasing id.
#[derive(Debug, Clone)]
pub struct InMemoryHistoryStore {
    rows: Arc<RwLock<HashMap<HistoryId, HistoryRow>>>,
    next_id: Arc<AtomicU64>,
}

impl Default for InMemoryHistoryStore {
    fn default() -> Self {
        Self {
            rows: Arc::default(),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }
}

impl InMemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }

    /// All records written for a member, oldest first
    pub async fn for_member(&self, member_id: UserId) -> Result<Vec<RecommendHistory>> {
        let rows = self.rows.read().await;
        let mut ids: Vec<HistoryId> = rows
            .iter()
            .filter(|(_, row)| row.member_id == member_id)
            .map(|(id, _)| *id)
            .collect();
        ids.sort_unstable();
        ids.into_iter().map(|id| decode_history(&rows[&id])).collect()
    }

    async fn update_flags(&self, id: HistoryId, apply: impl FnOnce(&mut HistoryRow)) -> Result<()> {
        let mut rows = self.rows.write().await;
        let row = rows.get_mut(&id).ok_or_else(|| DataError::MissingReference {
            entity: "RecommendHistory".to_string(),
            id,
        })?;
        apply(row);
        Ok(())
    }
}

fn decode_history(row: &HistoryRow) -> Result<RecommendHistory> {
    Ok(RecommendHistory {
        member_id: row.member_id,
        recommended_store_ids: codec::decode_store_ids(&row.store_ids_blob)?,
        recommend_type: row.recommend_type,
        criteria: serde_json::from_str(&row.criteria_blob)?,
        clicked: row.clicked,
        visited: row.visited,
        created_at: row.created_at,
    })
}

#[async_trait]
impl HistoryStore for InMemoryHistoryStore {
    async fn append(&self, history: RecommendHistory) -> Result<HistoryId> {
        let row = HistoryRow {
            member_id: history.member_id,
            store_ids_blob: codec::encode_store_ids(&history.recommended_store_ids)?,
            recommend_type: history.recommend_type,
            criteria_blob: serde_json::to_string(&history.criteria)?,
            clicked: history.clicked,
            visited: history.visited,
            created_at: history.created_at,
        };
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.rows.write().await.insert(id, row);
        Ok(id)
    }

    async fn get(&self, id: HistoryId) -> Result<Option<RecommendHistory>> {
        let rows = self.rows.read().await;
        rows.get(&id).map(decode_history).transpose()
    }

    async fn mark_clicked(&self, id: HistoryId) -> Result<()> {
        self.update_flags(id, |row| row.clicked = true).await
    }

    async fn mark_visited(&self, id: HistoryId) -> Result<()> {
        self.update_flags(id, |row| row.visited = true).await
    }
}

// =============================================================================
// Interactions
// =============================================================================

/// Interaction source reading reviews out of a shared [`StoreIndex`].
#[derive(Debug, Clone)]
pub struct IndexInteractionSource {
    index: Arc<StoreIndex>,
}

impl IndexInteractionSource {
    pub fn new(index: Arc<StoreIndex>) -> Self {
        Self { index }
    }
}

#[async_trait]
impl InteractionSource for IndexInteractionSource {
    async fn stream_interactions(&self, user_id: UserId) -> Result<Vec<Interaction>> {
        Ok(self.index.interactions_for_user(user_id))
    }
}
