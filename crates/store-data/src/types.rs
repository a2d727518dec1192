//! Core domain types for stores, reviews and taste profiles.
//!
//! This module defines the data structures shared by every stage of the
//! recommendation engine:
//! - Type aliases for identities (UserId, StoreId)
//! - Stores and the reviews users leave on them
//! - Interactions (a review joined with its store) consumed by the analyzer
//! - Taste profiles and recommendation history records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

// =============================================================================
// Type Aliases
// =============================================================================

/// Unique identifier for a member
pub type UserId = u64;

/// Unique identifier for a store
pub type StoreId = u64;

/// Identifier assigned to a persisted recommendation history record
pub type HistoryId = u64;

// =============================================================================
// Categories and Coordinates
// =============================================================================

/// Cuisine / venue category of a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FoodCategory {
    Korean,
    Chinese,
    Japanese,
    Western,
    Asian,
    Cafe,
    Dessert,
    Bar,
    FastFood,
    Snack,
    Other,
}

impl FoodCategory {
    pub const ALL: [FoodCategory; 11] = [
        FoodCategory::Korean,
        FoodCategory::Chinese,
        FoodCategory::Japanese,
        FoodCategory::Western,
        FoodCategory::Asian,
        FoodCategory::Cafe,
        FoodCategory::Dessert,
        FoodCategory::Bar,
        FoodCategory::FastFood,
        FoodCategory::Snack,
        FoodCategory::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FoodCategory::Korean => "korean",
            FoodCategory::Chinese => "chinese",
            FoodCategory::Japanese => "japanese",
            FoodCategory::Western => "western",
            FoodCategory::Asian => "asian",
            FoodCategory::Cafe => "cafe",
            FoodCategory::Dessert => "dessert",
            FoodCategory::Bar => "bar",
            FoodCategory::FastFood => "fast_food",
            FoodCategory::Snack => "snack",
            FoodCategory::Other => "other",
        }
    }
}

impl fmt::Display for FoodCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for FoodCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['-', ' '], "_");
        FoodCategory::ALL
            .into_iter()
            .find(|category| category.as_str() == normalized)
            .ok_or_else(|| format!("unknown food category: {s}"))
    }
}

/// A WGS84 coordinate pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// True when both components are finite and inside the WGS84 ranges.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }
}

// =============================================================================
// Stores and Reviews
// =============================================================================

/// A food-service venue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Store {
    pub id: StoreId,
    pub name: String,
    pub category: FoodCategory,
    pub coordinates: Coordinates,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Price level from 1 (cheap) to 4 (expensive)
    #[serde(default)]
    pub price_level: Option<u8>,
}

/// A single review a member left on a store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub user_id: UserId,
    pub store_id: StoreId,
    /// Rating value from 1.0 to 5.0
    pub rating: f32,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Distance travelled to the store, when the client reported it
    #[serde(default)]
    pub distance_meters: Option<f64>,
    pub created_at: DateTime<Utc>,
}

/// Aggregate review statistics for a store.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StoreStats {
    pub avg_rating: f32,
    pub review_count: u32,
}

/// One historical interaction as seen by the taste profile analyzer: a
/// review joined with the category and price of the reviewed store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    pub category: FoodCategory,
    pub rating: f32,
    pub tags: Vec<String>,
    pub price_level: Option<u8>,
    pub distance_meters: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

// =============================================================================
// Taste Profile
// =============================================================================

/// A normalized scalar preference, or the sentinel meaning "no strong
/// preference" when there is too little history to derive one.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Preference {
    #[default]
    Disabled,
    Score(f64),
}

impl Preference {
    /// Build a score, clamped into [0,1]. Non-finite input yields `Disabled`.
    pub fn score(value: f64) -> Self {
        if value.is_finite() {
            Preference::Score(value.clamp(0.0, 1.0))
        } else {
            Preference::Disabled
        }
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            Preference::Disabled => None,
            Preference::Score(v) => Some(*v),
        }
    }

    pub fn is_disabled(&self) -> bool {
        matches!(self, Preference::Disabled)
    }
}

/// Derived behaviour signals keyed by name.
///
/// Held strongly typed in memory; only the persistence boundary turns it into
/// a versioned blob (see [`crate::codec`]).
pub type BehaviorPatterns = BTreeMap<String, serde_json::Value>;

/// Per-user summary of category/tag affinities and scalar preferences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TasteProfile {
    pub user_id: UserId,
    /// Ordered by score descending, most recently reinforced first on ties
    pub preferred_categories: Vec<FoodCategory>,
    /// Affinity per category in [0,1], max-normalized per user
    pub category_scores: HashMap<FoodCategory, f64>,
    /// Ranked by frequency among positive interactions
    pub preferred_tags: Vec<String>,
    pub behavior_patterns: BehaviorPatterns,
    pub price_preference: Preference,
    pub distance_preference: Preference,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TasteProfile {
    /// A cold-start profile: no preferences, sentinel scalars.
    pub fn cold_start(user_id: UserId, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            preferred_categories: Vec::new(),
            category_scores: HashMap::new(),
            preferred_tags: Vec::new(),
            behavior_patterns: BehaviorPatterns::new(),
            price_preference: Preference::Disabled,
            distance_preference: Preference::Disabled,
            created_at: now,
            updated_at: now,
        }
    }

    /// The category with the highest score.
    pub fn top_category(&self) -> Option<FoodCategory> {
        self.preferred_categories.first().copied()
    }

    /// Affinity for a category, 0.0 when never observed.
    pub fn category_score(&self, category: FoodCategory) -> f64 {
        self.category_scores.get(&category).copied().unwrap_or(0.0)
    }

    /// True when the profile carries no category or tag preference.
    pub fn is_cold_start(&self) -> bool {
        self.preferred_categories.is_empty() && self.preferred_tags.is_empty()
    }
}

// =============================================================================
// Recommendation History
// =============================================================================

/// Which kind of recommendation produced a history record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendType {
    Ai,
    Location,
    Popularity,
    Collaborative,
    /// More than one strategy contributed
    Hybrid,
}

/// Request shape and strategy outcome captured alongside a history record.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HistoryCriteria {
    pub strategies_used: Vec<String>,
    pub strategies_excluded: Vec<String>,
    pub category: Option<FoodCategory>,
    pub tags: Vec<String>,
}

/// Audit/feedback record, one per completed recommendation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendHistory {
    pub member_id: UserId,
    pub recommended_store_ids: Vec<StoreId>,
    pub recommend_type: RecommendType,
    pub criteria: HistoryCriteria,
    pub clicked: bool,
    pub visited: bool,
    pub created_at: DateTime<Utc>,
}

impl RecommendHistory {
    pub fn new(
        member_id: UserId,
        recommended_store_ids: Vec<StoreId>,
        recommend_type: RecommendType,
        criteria: HistoryCriteria,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            member_id,
            recommended_store_ids,
            recommend_type,
            criteria,
            clicked: false,
            visited: false,
            created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_parsing() {
        assert_eq!("Korean".parse::<FoodCategory>().unwrap(), FoodCategory::Korean);
        assert_eq!("fast-food".parse::<FoodCategory>().unwrap(), FoodCategory::FastFood);
        assert!("pizza-planet".parse::<FoodCategory>().is_err());
        assert_eq!(FoodCategory::FastFood.to_string(), "fast_food");
    }

    #[test]
    fn test_preference_clamps() {
        assert_eq!(Preference::score(1.7), Preference::Score(1.0));
        assert_eq!(Preference::score(-0.2), Preference::Score(0.0));
        assert!(Preference::score(f64::NAN).is_disabled());
        assert_eq!(Preference::Disabled.value(), None);
    }

    #[test]
    fn test_coordinates_validity() {
        assert!(Coordinates::new(37.5, 127.0).is_valid());
        assert!(!Coordinates::new(91.0, 0.0).is_valid());
        assert!(!Coordinates::new(0.0, f64::INFINITY).is_valid());
    }

    #[test]
    fn test_cold_start_profile() {
        let profile = TasteProfile::cold_start(7, Utc::now());
        assert!(profile.is_cold_start());
        assert_eq!(profile.top_category(), None);
        assert_eq!(profile.category_score(FoodCategory::Cafe), 0.0);
    }
}
