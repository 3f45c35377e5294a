use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};
use uuid::Uuid;

use super::{category_score_repo, friendship_repo, interest_repo, post_repo, FeedReader, FeedStore};
use crate::error::{AppError, Result};
use crate::models::{AuthorSummary, PostFeatures, PostPrivacy, PostRecord, UserInterest};
use crate::services::classification::ClassificationRecord;
use crate::services::visibility::VisibilityFilter;

const SERVICE_NAME: &str = "feed-service";

/// PostgreSQL-backed feed storage
#[derive(Clone)]
pub struct PgFeedStore {
    pool: PgPool,
}

impl PgFeedStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FeedStore for PgFeedStore {
    async fn begin_read(&self) -> Result<Box<dyn FeedReader>> {
        let tx = db_pool::begin_read_snapshot(&self.pool, SERVICE_NAME).await?;
        Ok(Box::new(PgFeedReader { tx }))
    }

    async fn list_interests(&self, user_id: Uuid) -> Result<Vec<UserInterest>> {
        let mut conn = self.pool.acquire().await?;
        Ok(interest_repo::interests_for_user(&mut conn, user_id, None).await?)
    }

    async fn record_classification(&self, record: &ClassificationRecord) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        // Held until commit; classifications of one post run one at a time.
        match post_repo::lock_post_author(&mut tx, record.post_id).await? {
            Some(author) if author == record.author_id => {}
            Some(_) => {
                return Err(AppError::Validation(format!(
                    "post {} is not authored by {}",
                    record.post_id, record.author_id
                )))
            }
            None => return Err(AppError::NotFound(format!("post {}", record.post_id))),
        }

        if category_score_repo::has_scores(&mut tx, record.post_id).await? {
            return Err(AppError::Validation(format!(
                "post {} is already classified",
                record.post_id
            )));
        }

        for (category, score) in &record.post_scores {
            category_score_repo::insert_score(&mut tx, record.post_id, category, *score).await?;
        }

        for (category, amount) in &record.interest_increments {
            let total =
                interest_repo::increment(&mut tx, record.author_id, category, *amount).await?;
            debug!(
                user_id = %record.author_id,
                category = %category,
                increment = amount,
                total = total,
                "Accumulated user interest"
            );
        }

        tx.commit().await?;
        Ok(())
    }
}

/// One read snapshot; dropped without `finish` it rolls back
pub struct PgFeedReader {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl FeedReader for PgFeedReader {
    async fn friend_ids(&mut self, user_id: Uuid) -> Result<HashSet<Uuid>> {
        Ok(friendship_repo::friend_ids(&mut self.tx, user_id).await?)
    }

    async fn top_interests(&mut self, user_id: Uuid, limit: i64) -> Result<Vec<UserInterest>> {
        Ok(interest_repo::interests_for_user(&mut self.tx, user_id, Some(limit)).await?)
    }

    async fn global_category_weights(&mut self) -> Result<HashMap<String, f64>> {
        Ok(interest_repo::global_category_totals(&mut self.tx).await?)
    }

    async fn count_visible_posts(&mut self, filter: &VisibilityFilter) -> Result<i64> {
        Ok(post_repo::count_visible(&mut self.tx, filter).await?)
    }

    async fn scoring_candidates(&mut self, filter: &VisibilityFilter) -> Result<Vec<PostFeatures>> {
        let rows = post_repo::visible_features(&mut self.tx, filter).await?;
        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let mut scores = category_score_repo::scores_for_posts(&mut self.tx, &ids).await?;

        Ok(rows
            .into_iter()
            .map(|row| PostFeatures {
                post_id: row.id,
                author_id: row.user_id,
                created_at: row.created_at,
                comment_count: row.comment_count,
                like_count: row.like_count,
                category_scores: scores.remove(&row.id).unwrap_or_default(),
            })
            .collect())
    }

    async fn recent_post_ids(
        &mut self,
        filter: &VisibilityFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Uuid>> {
        Ok(post_repo::recent_ids(&mut self.tx, filter, limit, offset).await?)
    }

    async fn count_category_posts(
        &mut self,
        filter: &VisibilityFilter,
        category: &str,
        min_score: f64,
    ) -> Result<i64> {
        Ok(post_repo::count_in_category(&mut self.tx, filter, category, min_score).await?)
    }

    async fn category_post_ids(
        &mut self,
        filter: &VisibilityFilter,
        category: &str,
        min_score: f64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Uuid>> {
        Ok(
            post_repo::category_ids(&mut self.tx, filter, category, min_score, limit, offset)
                .await?,
        )
    }

    async fn posts_by_ids(&mut self, ids: &[Uuid]) -> Result<Vec<PostRecord>> {
        let rows = post_repo::posts_by_ids(&mut self.tx, ids).await?;
        let fetched: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let mut scores = category_score_repo::scores_for_posts(&mut self.tx, &fetched).await?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let privacy = match row.privacy.parse::<PostPrivacy>() {
                Ok(privacy) => privacy,
                Err(e) => {
                    warn!(post_id = %row.id, error = %e, "Skipping post with unknown privacy");
                    continue;
                }
            };

            records.push(PostRecord {
                id: row.id,
                author: AuthorSummary {
                    id: row.user_id,
                    username: row.username,
                    profile_picture: row.profile_picture,
                },
                content: row.content,
                image_url: row.image_url,
                created_at: row.created_at,
                privacy,
                comment_count: row.comment_count,
                like_count: row.like_count,
                category_scores: scores.remove(&row.id).unwrap_or_default(),
            });
        }

        Ok(records)
    }

    async fn finish(self: Box<Self>) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }
}
