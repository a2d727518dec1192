//! Candidate types shared by all strategies.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use store_data::{Coordinates, FoodCategory, Store, StoreId, StoreStats, TasteProfile, UserId};

/// One independent signal source contributing candidate stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    Ai,
    Location,
    Popularity,
    Collaborative,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 4] = [
        StrategyKind::Ai,
        StrategyKind::Location,
        StrategyKind::Popularity,
        StrategyKind::Collaborative,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::Ai => "ai",
            StrategyKind::Location => "location",
            StrategyKind::Popularity => "popularity",
            StrategyKind::Collaborative => "collaborative",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        StrategyKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| format!("unknown strategy: {s}"))
    }
}

/// Static store attributes as reported by whichever collaborator returned
/// the store. Every field is optional because collaborators differ in how
/// much they know.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreAttributes {
    pub name: Option<String>,
    pub category: Option<FoodCategory>,
    pub coordinates: Option<Coordinates>,
    pub tags: Option<Vec<String>>,
    pub rating: Option<f32>,
    pub review_count: Option<u32>,
}

impl StoreAttributes {
    /// Attributes of an indexed store, with review statistics when known.
    pub fn from_store(store: &Store, stats: Option<&StoreStats>) -> Self {
        Self {
            name: Some(store.name.clone()),
            category: Some(store.category),
            coordinates: Some(store.coordinates),
            tags: Some(store.tags.clone()),
            rating: stats.map(|s| s.avg_rating),
            review_count: stats.map(|s| s.review_count),
        }
    }

    /// Fill every absent field from `other`. Present fields are never
    /// overwritten.
    pub fn fill_missing(&mut self, other: StoreAttributes) {
        if self.name.is_none() {
            self.name = other.name;
        }
        if self.category.is_none() {
            self.category = other.category;
        }
        if self.coordinates.is_none() {
            self.coordinates = other.coordinates;
        }
        if self.tags.is_none() {
            self.tags = other.tags;
        }
        if self.rating.is_none() {
            self.rating = other.rating;
        }
        if self.review_count.is_none() {
            self.review_count = other.review_count;
        }
    }

    /// True when the store carries `tag` (case-insensitive).
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags
            .as_deref()
            .unwrap_or_default()
            .iter()
            .any(|t| t.eq_ignore_ascii_case(tag))
    }
}

/// One store under consideration for a single recommendation request.
///
/// A candidate always carries at least one source score: the only
/// constructor takes the originating strategy and its score.
#[derive(Debug, Clone, PartialEq)]
pub struct RecommendCandidate {
    pub store_id: StoreId,
    pub attributes: StoreAttributes,
    source_scores: BTreeMap<StrategyKind, f64>,
    pub distance_meters: Option<f64>,
}

impl RecommendCandidate {
    pub fn new(store_id: StoreId, source: StrategyKind, score: f64, attributes: StoreAttributes) -> Self {
        let mut source_scores = BTreeMap::new();
        source_scores.insert(source, sanitize_score(score));
        Self {
            store_id,
            attributes,
            source_scores,
            distance_meters: None,
        }
    }

    pub fn with_distance(mut self, distance_meters: f64) -> Self {
        self.distance_meters = Some(distance_meters);
        self
    }

    pub fn source_scores(&self) -> &BTreeMap<StrategyKind, f64> {
        &self.source_scores
    }

    pub fn score_for(&self, kind: StrategyKind) -> Option<f64> {
        self.source_scores.get(&kind).copied()
    }

    /// Union another candidate for the same store into this one.
    ///
    /// Source scores are unioned (a repeated strategy keeps the later
    /// value); static attributes and distance only fill gaps.
    pub fn absorb(&mut self, other: RecommendCandidate) {
        debug_assert_eq!(self.store_id, other.store_id);
        self.source_scores.extend(other.source_scores);
        self.attributes.fill_missing(other.attributes);
        if self.distance_meters.is_none() {
            self.distance_meters = other.distance_meters;
        }
    }
}

/// Clamp a raw strategy score into [0,1]; non-finite scores count as 0.
pub fn sanitize_score(score: f64) -> f64 {
    if score.is_finite() {
        score.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Everything a strategy may need to produce candidates for one request.
#[derive(Debug, Clone)]
pub struct StrategyQuery {
    pub user_id: UserId,
    pub profile: Option<Arc<TasteProfile>>,
    pub location: Option<Coordinates>,
    pub radius_meters: f64,
    pub category: Option<FoodCategory>,
    /// Cap on how many candidates a single strategy contributes
    pub candidate_limit: usize,
}

impl StrategyQuery {
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            profile: None,
            location: None,
            radius_meters: 3_000.0,
            category: None,
            candidate_limit: 100,
        }
    }

    pub fn with_profile(mut self, profile: Arc<TasteProfile>) -> Self {
        self.profile = Some(profile);
        self
    }

    pub fn with_location(mut self, location: Coordinates, radius_meters: f64) -> Self {
        self.location = Some(location);
        self.radius_meters = radius_meters;
        self
    }

    pub fn with_category(mut self, category: Option<FoodCategory>) -> Self {
        self.category = category;
        self
    }

    pub fn with_candidate_limit(mut self, limit: usize) -> Self {
        self.candidate_limit = limit;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(name: &str) -> StoreAttributes {
        StoreAttributes {
            name: Some(name.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_candidate_creation() {
        let candidate = RecommendCandidate::new(1, StrategyKind::Ai, 0.85, named("Gogi House"));
        assert_eq!(candidate.store_id, 1);
        assert_eq!(candidate.score_for(StrategyKind::Ai), Some(0.85));
        assert_eq!(candidate.source_scores().len(), 1);
    }

    #[test]
    fn test_scores_are_clamped() {
        let candidate = RecommendCandidate::new(1, StrategyKind::Ai, 1.4, StoreAttributes::default());
        assert_eq!(candidate.score_for(StrategyKind::Ai), Some(1.0));
        let candidate = RecommendCandidate::new(1, StrategyKind::Ai, f64::NAN, StoreAttributes::default());
        assert_eq!(candidate.score_for(StrategyKind::Ai), Some(0.0));
    }

    #[test]
    fn test_absorb_keeps_present_attributes() {
        let mut first = RecommendCandidate::new(1, StrategyKind::Ai, 0.9, named("First"));
        let mut later_attrs = StoreAttributes {
            name: Some("Later".to_string()),
            category: Some(FoodCategory::Korean),
            ..Default::default()
        };
        later_attrs.rating = Some(4.5);
        let later = RecommendCandidate::new(1, StrategyKind::Location, 0.5, later_attrs).with_distance(420.0);

        first.absorb(later);

        assert_eq!(first.attributes.name.as_deref(), Some("First"));
        assert_eq!(first.attributes.category, Some(FoodCategory::Korean));
        assert_eq!(first.attributes.rating, Some(4.5));
        assert_eq!(first.distance_meters, Some(420.0));
        assert_eq!(first.source_scores().len(), 2);
    }

    #[test]
    fn test_absorb_never_nulls_attributes() {
        let mut first = RecommendCandidate::new(1, StrategyKind::Ai, 0.9, named("First"));
        first.absorb(RecommendCandidate::new(1, StrategyKind::Popularity, 0.2, StoreAttributes::default()));
        assert_eq!(first.attributes.name.as_deref(), Some("First"));
    }

    #[test]
    fn test_strategy_kind_parsing() {
        assert_eq!("AI".parse::<StrategyKind>().unwrap(), StrategyKind::Ai);
        assert_eq!("collaborative".parse::<StrategyKind>().unwrap(), StrategyKind::Collaborative);
        assert!("random".parse::<StrategyKind>().is_err());
    }

    #[test]
    fn test_has_tag_case_insensitive() {
        let attrs = StoreAttributes {
            tags: Some(vec!["Spicy".to_string()]),
            ..Default::default()
        };
        assert!(attrs.has_tag("spicy"));
        assert!(!StoreAttributes::default().has_tag("spicy"));
    }
}
