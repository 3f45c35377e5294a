//! Composite relevance scoring.
//!
//! Scoring is a pure function over [`PostFeatures`]: the database fetches
//! raw features, this module turns them into a `feed_score` and a total
//! order. Every saturating term has the form `x / (x + K)`.

use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use uuid::Uuid;

use crate::models::PostFeatures;
use crate::services::interest::WeightVector;

/// Blend weights and saturation constants for the relevance score
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringWeights {
    pub relevance: f64,
    pub popularity: f64,
    pub recency: f64,
    pub engagement: f64,
    /// Subtracted when the viewer wrote the post
    pub self_penalty: f64,
    pub k_relevance: f64,
    pub k_comments: f64,
    pub k_likes: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            relevance: 0.2,
            popularity: 0.05,
            recency: 0.7,
            engagement: 0.05,
            self_penalty: 0.1,
            k_relevance: 10.0,
            k_comments: 10.0,
            k_likes: 20.0,
        }
    }
}

/// Per-term values behind a `feed_score`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreBreakdown {
    pub relevance_raw: f64,
    pub relevance_norm: f64,
    pub popularity_norm: f64,
    pub engagement_norm: f64,
    pub recency_norm: f64,
    pub self_penalty: f64,
    pub feed_score: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredPost {
    pub post_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub score: f64,
}

/// `x / (x + k)`, with a zero raw value always mapping to zero
pub fn saturate(x: f64, k: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    let denom = x + k;
    if denom <= 0.0 {
        return 0.0;
    }
    x / denom
}

/// Sum of classification score times viewer weight over the post's categories
pub fn relevance_raw(features: &PostFeatures, weights: &WeightVector) -> f64 {
    features
        .category_scores
        .iter()
        .map(|(category, score)| score * weights.weight(category))
        .sum()
}

/// Hours between `created_at` and `now`, never negative
pub fn age_hours(created_at: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let millis = (now - created_at).num_milliseconds();
    (millis as f64 / 3_600_000.0).max(0.0)
}

pub fn score_post(
    features: &PostFeatures,
    viewer_id: Uuid,
    vector: &WeightVector,
    weights: &ScoringWeights,
    now: DateTime<Utc>,
) -> ScoreBreakdown {
    let relevance_raw = relevance_raw(features, vector);
    let relevance_norm = saturate(relevance_raw, weights.k_relevance);
    let popularity_norm = saturate(features.comment_count as f64, weights.k_comments);
    let engagement_norm = saturate(features.like_count as f64, weights.k_likes);
    let recency_norm = 1.0 / (1.0 + age_hours(features.created_at, now));
    let self_penalty = if features.author_id == viewer_id {
        weights.self_penalty
    } else {
        0.0
    };

    let feed_score = weights.relevance * relevance_norm
        + weights.popularity * popularity_norm
        + weights.recency * recency_norm
        + weights.engagement * engagement_norm
        - self_penalty;

    ScoreBreakdown {
        relevance_raw,
        relevance_norm,
        popularity_norm,
        engagement_norm,
        recency_norm,
        self_penalty,
        feed_score,
    }
}

/// Score desc, then timestamp desc, then id desc
pub fn compare_scored(a: &ScoredPost, b: &ScoredPost) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| b.created_at.cmp(&a.created_at))
        .then_with(|| b.post_id.cmp(&a.post_id))
}

/// Score every candidate against one `now` and return them in feed order
pub fn rank_by_relevance(
    candidates: &[PostFeatures],
    viewer_id: Uuid,
    vector: &WeightVector,
    weights: &ScoringWeights,
    now: DateTime<Utc>,
) -> Vec<ScoredPost> {
    let mut ranked: Vec<ScoredPost> = candidates
        .iter()
        .map(|features| ScoredPost {
            post_id: features.post_id,
            created_at: features.created_at,
            score: score_post(features, viewer_id, vector, weights, now).feed_score,
        })
        .collect();

    ranked.sort_by(compare_scored);
    ranked
}
