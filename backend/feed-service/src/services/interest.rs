//! Viewer interest weights.
//!
//! A viewer with recorded interests is ranked by their top categories only.
//! A viewer without any falls back to community-wide category totals. The
//! two sources are never blended.

use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

use crate::db::FeedReader;
use crate::error::Result;

/// Number of interest rows that make up a personalized vector
pub const TOP_INTEREST_LIMIT: i64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeightSource {
    Personalized,
    Global,
}

impl WeightSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            WeightSource::Personalized => "personalized",
            WeightSource::Global => "global",
        }
    }
}

/// Category -> weight used by the relevance term
#[derive(Debug, Clone, PartialEq)]
pub struct WeightVector {
    source: WeightSource,
    weights: HashMap<String, f64>,
}

impl WeightVector {
    pub fn personalized(weights: HashMap<String, f64>) -> Self {
        Self {
            source: WeightSource::Personalized,
            weights,
        }
    }

    pub fn global(weights: HashMap<String, f64>) -> Self {
        Self {
            source: WeightSource::Global,
            weights,
        }
    }

    /// Global vector with no weights (no interests recorded anywhere yet)
    pub fn empty_global() -> Self {
        Self::global(HashMap::new())
    }

    pub fn source(&self) -> WeightSource {
        self.source
    }

    /// Weight for `category`, zero when absent
    pub fn weight(&self, category: &str) -> f64 {
        self.weights.get(category).copied().unwrap_or(0.0)
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }
}

/// Pick the weight vector for `viewer_id` inside the current read snapshot.
pub async fn resolve_weight_vector(
    reader: &mut dyn FeedReader,
    viewer_id: Uuid,
) -> Result<WeightVector> {
    let top = reader.top_interests(viewer_id, TOP_INTEREST_LIMIT).await?;

    if !top.is_empty() {
        debug!(
            user_id = %viewer_id,
            categories = top.len(),
            "Using personalized interest weights"
        );
        return Ok(WeightVector::personalized(
            top.into_iter().map(|i| (i.category, i.score)).collect(),
        ));
    }

    let global = reader.global_category_weights().await?;
    debug!(
        user_id = %viewer_id,
        categories = global.len(),
        "No interests recorded, using global category weights"
    );
    Ok(WeightVector::global(global))
}
