//! Storage seams for the feed engine.
//!
//! [`FeedStore`] is the service-wide handle. Every feed request opens one
//! [`FeedReader`], a consistent read snapshot, and issues all of its queries
//! through it so the total count and the page contents agree.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use crate::error::Result;
use crate::models::{PostFeatures, PostRecord, UserInterest};
use crate::services::classification::ClassificationRecord;
use crate::services::visibility::VisibilityFilter;

pub mod category_score_repo;
pub mod friendship_repo;
pub mod interest_repo;
pub mod pg_store;
pub mod post_repo;

pub use pg_store::PgFeedStore;

#[async_trait]
pub trait FeedStore: Send + Sync {
    /// Open a read-only snapshot for one feed request
    async fn begin_read(&self) -> Result<Box<dyn FeedReader>>;

    /// All interests of `user_id`, highest score first
    async fn list_interests(&self, user_id: Uuid) -> Result<Vec<UserInterest>>;

    /// Store post category scores and accumulate author interests atomically
    async fn record_classification(&self, record: &ClassificationRecord) -> Result<()>;
}

#[async_trait]
pub trait FeedReader: Send {
    async fn friend_ids(&mut self, user_id: Uuid) -> Result<HashSet<Uuid>>;

    /// Up to `limit` interests by score desc, category asc
    async fn top_interests(&mut self, user_id: Uuid, limit: i64) -> Result<Vec<UserInterest>>;

    /// Per category, the sum of interest scores across all users
    async fn global_category_weights(&mut self) -> Result<HashMap<String, f64>>;

    async fn count_visible_posts(&mut self, filter: &VisibilityFilter) -> Result<i64>;

    /// Scoring features for every post the filter allows
    async fn scoring_candidates(&mut self, filter: &VisibilityFilter) -> Result<Vec<PostFeatures>>;

    /// Visible post ids by timestamp desc, id desc
    async fn recent_post_ids(
        &mut self,
        filter: &VisibilityFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Uuid>>;

    async fn count_category_posts(
        &mut self,
        filter: &VisibilityFilter,
        category: &str,
        min_score: f64,
    ) -> Result<i64>;

    /// Visible post ids classified into `category`, by timestamp desc, id desc
    async fn category_post_ids(
        &mut self,
        filter: &VisibilityFilter,
        category: &str,
        min_score: f64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Uuid>>;

    /// Full records for `ids`, in no particular order
    async fn posts_by_ids(&mut self, ids: &[Uuid]) -> Result<Vec<PostRecord>>;

    /// Release the snapshot
    async fn finish(self: Box<Self>) -> Result<()>;
}
