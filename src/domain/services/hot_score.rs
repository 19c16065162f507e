// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use std::collections::HashMap;

use crate::domain::models::article::Article;

/// Quality level weights, ordinal 1-5. Levels outside the table fall
/// back to 0.8; an unset level (0) is treated as level 1.
static LEVEL_WEIGHTS: Lazy<HashMap<i32, f64>> = Lazy::new(|| {
    HashMap::from([
        (1, 0.6), // low quality
        (2, 0.8), // ordinary
        (3, 1.0), // medium
        (4, 1.3), // high quality
        (5, 1.6), // premium
    ])
});

/// Per-category multipliers for categories that historically draw
/// more engagement. Categories not listed get no boost.
static DEFAULT_CATEGORY_BOOSTS: Lazy<HashMap<String, f64>> = Lazy::new(|| {
    HashMap::from([
        ("技术".to_string(), 1.1),
        ("热点".to_string(), 1.2),
        ("深度".to_string(), 1.15),
    ])
});

/// Decayed-popularity scorer.
///
/// `hot_score = interaction_score * time_decay * quality_factor * category_boost`
///
/// - `interaction_score = view * 1 + like * 3 + share * 5`, floored at a
///   baseline so freshly ingested articles are rankable;
/// - `time_decay = 0.5 ^ (age_hours / half_life)`, with a freshness
///   multiplier for articles younger than 24 hours;
/// - `quality_factor = level_weight * sentiment_boost`.
///
/// The computation is pure given `(article, now)`; persistence and cache
/// invalidation live in the ranking service, not here.
pub struct HotScoreEngine {
    category_boosts: HashMap<String, f64>,
}

impl HotScoreEngine {
    const VIEW_WEIGHT: f64 = 1.0;
    const LIKE_WEIGHT: f64 = 3.0;
    const SHARE_WEIGHT: f64 = 5.0;
    const BASE_SCORE: f64 = 10.0;
    const HALF_LIFE_HOURS: f64 = 72.0;
    const FRESHNESS_WINDOW_HOURS: f64 = 24.0;
    const FRESHNESS_MULTIPLIER: f64 = 1.2;

    pub fn new(category_boosts: HashMap<String, f64>) -> Self {
        Self { category_boosts }
    }

    /// Compute the hot score for an article at the given instant.
    ///
    /// Rounded to two decimal places; never zero, because the interaction
    /// score is floored at the baseline before decay is applied.
    pub fn compute(&self, article: &Article, now: DateTime<Utc>) -> f64 {
        let interaction_score = (article.view_count as f64) * Self::VIEW_WEIGHT
            + (article.like_count as f64) * Self::LIKE_WEIGHT
            + (article.share_count as f64) * Self::SHARE_WEIGHT;
        let interaction_score = interaction_score.max(Self::BASE_SCORE);

        let hours_passed = article.age_hours(now);
        let mut time_decay = 0.5_f64.powf(hours_passed / Self::HALF_LIFE_HOURS);
        if hours_passed < Self::FRESHNESS_WINDOW_HOURS {
            time_decay *= Self::FRESHNESS_MULTIPLIER;
        }

        let quality_factor = Self::level_weight(article.quality_level)
            * Self::sentiment_boost(article.sentiment);

        let mut hot_score = interaction_score * time_decay * quality_factor;

        if let Some(category) = &article.category {
            if let Some(boost) = self.category_boosts.get(category) {
                hot_score *= boost;
            }
        }

        (hot_score * 100.0).round() / 100.0
    }

    /// Interaction velocity used by the trending ranking: raw interaction
    /// score divided by hours since ingestion, floored at one hour so very
    /// recent articles are not divided by a near-zero age.
    pub fn velocity(&self, article: &Article, now: DateTime<Utc>) -> f64 {
        let interaction_score = (article.view_count as f64) * Self::VIEW_WEIGHT
            + (article.like_count as f64) * Self::LIKE_WEIGHT
            + (article.share_count as f64) * Self::SHARE_WEIGHT;
        interaction_score / article.age_hours(now).max(1.0)
    }

    fn level_weight(level: i32) -> f64 {
        let level = if level == 0 { 1 } else { level };
        LEVEL_WEIGHTS.get(&level).copied().unwrap_or(0.8)
    }

    fn sentiment_boost(sentiment: Option<f64>) -> f64 {
        match sentiment {
            Some(s) if s > 0.5 => 1.2,
            Some(s) if s < -0.5 => 0.9,
            _ => 1.0,
        }
    }
}

impl Default for HotScoreEngine {
    fn default() -> Self {
        Self::new(DEFAULT_CATEGORY_BOOSTS.clone())
    }
}
