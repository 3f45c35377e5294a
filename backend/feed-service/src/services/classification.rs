//! Classification recording, the write side of the interest store.
//!
//! Text and image classifier outputs are merged into per-post category
//! scores, and every raw classifier score is credited to the author's
//! interest in that category.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::db::FeedStore;
use crate::error::{AppError, Result};
use crate::metrics::feed::{CLASSIFICATIONS_RECORDED_TOTAL, INTEREST_INCREMENTS_TOTAL};

/// Everything written for one classified post, in a single transaction
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationRecord {
    pub post_id: Uuid,
    pub author_id: Uuid,
    /// Combined score per category, stored as post category scores
    pub post_scores: BTreeMap<String, f64>,
    /// Amount added to the author's interest per category
    pub interest_increments: BTreeMap<String, f64>,
}

fn validate_scores(label: &str, scores: &HashMap<String, f64>) -> Result<()> {
    for (category, score) in scores {
        if category.trim().is_empty() {
            return Err(AppError::Validation(format!(
                "{} classification contains an empty category name",
                label
            )));
        }
        if !score.is_finite() || !(0.0..=1.0).contains(score) {
            return Err(AppError::Validation(format!(
                "{} classification score for '{}' must be within [0, 1], got {}",
                label, category, score
            )));
        }
    }
    Ok(())
}

/// Merge classifier outputs for one post.
///
/// A category present in both maps gets the average of the two scores.
/// Interest increments are the plain sum of every classifier score.
pub fn combine_classifications(
    post_id: Uuid,
    author_id: Uuid,
    text: Option<&HashMap<String, f64>>,
    image: Option<&HashMap<String, f64>>,
) -> Result<ClassificationRecord> {
    if let Some(text) = text {
        validate_scores("text", text)?;
    }
    if let Some(image) = image {
        validate_scores("image", image)?;
    }

    let mut post_scores: BTreeMap<String, f64> = BTreeMap::new();
    let mut interest_increments: BTreeMap<String, f64> = BTreeMap::new();

    for (category, score) in text.into_iter().flatten() {
        post_scores.insert(category.clone(), *score);
        *interest_increments.entry(category.clone()).or_insert(0.0) += score;
    }

    for (category, score) in image.into_iter().flatten() {
        post_scores
            .entry(category.clone())
            .and_modify(|existing| *existing = (*existing + score) / 2.0)
            .or_insert(*score);
        *interest_increments.entry(category.clone()).or_insert(0.0) += score;
    }

    Ok(ClassificationRecord {
        post_id,
        author_id,
        post_scores,
        interest_increments,
    })
}

pub struct ClassificationService {
    store: Arc<dyn FeedStore>,
}

impl ClassificationService {
    pub fn new(store: Arc<dyn FeedStore>) -> Self {
        Self { store }
    }

    pub async fn record(
        &self,
        post_id: Uuid,
        author_id: Uuid,
        text: Option<&HashMap<String, f64>>,
        image: Option<&HashMap<String, f64>>,
    ) -> Result<ClassificationRecord> {
        let record = combine_classifications(post_id, author_id, text, image)?;

        if record.post_scores.is_empty() {
            return Err(AppError::Validation(
                "at least one classification score is required".to_string(),
            ));
        }

        self.store.record_classification(&record).await?;

        CLASSIFICATIONS_RECORDED_TOTAL.inc();
        INTEREST_INCREMENTS_TOTAL.inc_by(record.interest_increments.len() as u64);

        info!(
            post_id = %post_id,
            author_id = %author_id,
            categories = record.post_scores.len(),
            "Recorded post classification"
        );

        Ok(record)
    }
}
