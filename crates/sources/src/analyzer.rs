//! Taste Profile Analyzer.
//!
//! Turns a user's interaction history into a [`TasteProfile`] and writes it
//! back through the [`TasteProfileStore`] as a full replace.
//!
//! ## Derivation
//! - **Categories**: each interaction adds `decay(age) * rating / 5` to its
//!   category, where `decay` halves every `half_life_days`. Scores are then
//!   max-normalized per user, so the strongest category is always 1.0.
//! - **Tags**: tags of positive interactions (`rating >= positive_rating`),
//!   counted once per interaction, ranked by frequency then alphabetically.
//! - **Price / distance**: mean over the interactions that report them,
//!   normalized into [0,1]; `Disabled` below `min_data_points`.
//!
//! An empty history yields a cold-start profile, not an error.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use store_data::{
    BehaviorPatterns, DataError, FoodCategory, Interaction, InteractionSource, Preference,
    TasteProfile, TasteProfileStore, UserId,
};
use thiserror::Error;
use tracing::{debug, info, instrument};

#[derive(Error, Debug)]
pub enum AnalyzeError {
    #[error("Failed to read interactions for user {user_id}: {source}")]
    Interactions { user_id: UserId, source: DataError },

    #[error("Failed to read stored profile for user {user_id}: {source}")]
    ProfileRead { user_id: UserId, source: DataError },

    #[error("Failed to persist profile for user {user_id}: {source}")]
    Persist { user_id: UserId, source: DataError },
}

/// Analyzer constants
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AnalyzerSettings {
    /// Ratings at or above this count as positive
    pub positive_rating: f32,
    /// How many preferred tags a profile keeps
    pub top_tags: usize,
    /// Fewer price/distance observations than this disables the preference
    pub min_data_points: usize,
    /// Age at which an interaction counts half. Non-positive disables decay.
    pub half_life_days: f64,
    /// Highest store price level
    pub price_ceiling: u8,
    /// Distance that maps to a distance preference of 1.0
    pub distance_ceiling_meters: f64,
}

impl Default for AnalyzerSettings {
    fn default() -> Self {
        Self {
            positive_rating: 4.0,
            top_tags: 10,
            min_data_points: 3,
            half_life_days: 90.0,
            price_ceiling: 4,
            distance_ceiling_meters: 5_000.0,
        }
    }
}

impl AnalyzerSettings {
    fn decay(&self, timestamp: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
        if !(self.half_life_days.is_finite() && self.half_life_days > 0.0) {
            return 1.0;
        }
        // Future timestamps count as fresh
        let age_days = (now - timestamp).num_seconds().max(0) as f64 / 86_400.0;
        0.5_f64.powf(age_days / self.half_life_days)
    }
}

/// Computes and persists taste profiles
#[derive(Clone)]
pub struct TasteProfileAnalyzer {
    interactions: Arc<dyn InteractionSource>,
    profiles: Arc<dyn TasteProfileStore>,
    settings: AnalyzerSettings,
}

impl TasteProfileAnalyzer {
    pub fn new(interactions: Arc<dyn InteractionSource>, profiles: Arc<dyn TasteProfileStore>) -> Self {
        Self {
            interactions,
            profiles,
            settings: AnalyzerSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: AnalyzerSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn settings(&self) -> &AnalyzerSettings {
        &self.settings
    }

    pub async fn analyze(&self, user_id: UserId) -> Result<TasteProfile, AnalyzeError> {
        self.analyze_at(user_id, Utc::now()).await
    }

    /// Analyze as of `now`, replacing whatever profile the user had.
    #[instrument(skip(self))]
    pub async fn analyze_at(&self, user_id: UserId, now: DateTime<Utc>) -> Result<TasteProfile, AnalyzeError> {
        let interactions = self
            .interactions
            .stream_interactions(user_id)
            .await
            .map_err(|source| AnalyzeError::Interactions { user_id, source })?;

        let created_at = self
            .profiles
            .get(user_id)
            .await
            .map_err(|source| AnalyzeError::ProfileRead { user_id, source })?
            .map_or(now, |existing| existing.created_at);

        let profile = build_taste_profile(user_id, &interactions, &self.settings, now, created_at);

        self.profiles
            .put(profile.clone())
            .await
            .map_err(|source| AnalyzeError::Persist { user_id, source })?;

        info!(
            "Analyzed {} interactions: {} categories, {} tags",
            interactions.len(),
            profile.preferred_categories.len(),
            profile.preferred_tags.len()
        );
        Ok(profile)
    }
}

/// Build a profile from interactions without touching any store.
pub fn build_taste_profile(
    user_id: UserId,
    interactions: &[Interaction],
    settings: &AnalyzerSettings,
    now: DateTime<Utc>,
    created_at: DateTime<Utc>,
) -> TasteProfile {
    let mut profile = TasteProfile::cold_start(user_id, now);
    profile.created_at = created_at;
    if interactions.is_empty() {
        debug!("No interactions, cold start profile");
        return profile;
    }

    let (preferred_categories, category_scores) = category_scores(interactions, settings, now);
    profile.preferred_categories = preferred_categories;
    profile.category_scores = category_scores;
    profile.preferred_tags = preferred_tags(interactions, settings);

    let prices: Vec<f64> = interactions
        .iter()
        .filter_map(|i| i.price_level)
        .map(f64::from)
        .collect();
    let price_span = f64::from(settings.price_ceiling.max(2) - 1);
    profile.price_preference =
        mean_preference(&prices, settings.min_data_points, |mean| (mean - 1.0) / price_span);

    let distances: Vec<f64> = interactions
        .iter()
        .filter_map(|i| i.distance_meters)
        .filter(|d| d.is_finite() && *d >= 0.0)
        .collect();
    profile.distance_preference = mean_preference(&distances, settings.min_data_points, |mean| {
        mean / settings.distance_ceiling_meters
    });

    profile.behavior_patterns = behavior_patterns(interactions, settings);
    profile
}

fn category_scores(
    interactions: &[Interaction],
    settings: &AnalyzerSettings,
    now: DateTime<Utc>,
) -> (Vec<FoodCategory>, HashMap<FoodCategory, f64>) {
    // category -> (raw score, last reinforced)
    let mut raw: HashMap<FoodCategory, (f64, DateTime<Utc>)> = HashMap::new();
    for interaction in interactions {
        let contribution =
            settings.decay(interaction.timestamp, now) * (f64::from(interaction.rating) / 5.0).max(0.0);
        let entry = raw
            .entry(interaction.category)
            .or_insert((0.0, interaction.timestamp));
        entry.0 += contribution;
        entry.1 = entry.1.max(interaction.timestamp);
    }

    let max = raw.values().map(|(score, _)| *score).fold(0.0_f64, f64::max);
    let scores: HashMap<FoodCategory, f64> = raw
        .iter()
        .map(|(&category, &(score, _))| {
            let normalized = if max > 0.0 { score / max } else { 0.0 };
            (category, normalized)
        })
        .collect();

    let mut ordered: Vec<FoodCategory> = raw.keys().copied().collect();
    ordered.sort_by(|a, b| {
        scores[b]
            .total_cmp(&scores[a])
            .then_with(|| raw[b].1.cmp(&raw[a].1))
            .then_with(|| a.cmp(b))
    });
    (ordered, scores)
}

fn preferred_tags(interactions: &[Interaction], settings: &AnalyzerSettings) -> Vec<String> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for interaction in interactions
        .iter()
        .filter(|i| i.rating >= settings.positive_rating)
    {
        let tags: BTreeSet<String> = interaction
            .tags
            .iter()
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect();
        for tag in tags {
            *counts.entry(tag).or_insert(0) += 1;
        }
    }

    let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.truncate(settings.top_tags);
    ranked.into_iter().map(|(tag, _)| tag).collect()
}

fn mean_preference(values: &[f64], min_points: usize, normalize: impl Fn(f64) -> f64) -> Preference {
    if values.is_empty() || values.len() < min_points {
        return Preference::Disabled;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    Preference::score(normalize(mean))
}

fn behavior_patterns(interactions: &[Interaction], settings: &AnalyzerSettings) -> BehaviorPatterns {
    let count = interactions.len();
    let rating_sum: f64 = interactions.iter().map(|i| f64::from(i.rating)).sum();
    let positive = interactions
        .iter()
        .filter(|i| i.rating >= settings.positive_rating)
        .count();
    let categories: HashSet<FoodCategory> = interactions.iter().map(|i| i.category).collect();

    let mut patterns = BehaviorPatterns::new();
    patterns.insert("interaction_count".to_string(), json!(count));
    patterns.insert("average_rating".to_string(), json!(rating_sum / count as f64));
    patterns.insert("positive_ratio".to_string(), json!(positive as f64 / count as f64));
    patterns.insert("distinct_categories".to_string(), json!(categories.len()));
    patterns
}
