//! Feed assembly.
//!
//! One request runs inside one read snapshot: friend ids, the visibility
//! filter, the total count, the ordered window and the record fetch all see
//! the same data. The blocklist is applied last and never changes totals.

use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::db::{FeedReader, FeedStore};
use crate::error::{AppError, Result};
use crate::metrics::feed::{
    FEED_BLOCKED_POSTS_TOTAL, FEED_CANDIDATE_COUNT, FEED_REQUEST_DURATION_SECONDS,
    FEED_REQUEST_TOTAL,
};
use crate::models::{CategoryFeedResponse, FeedResponse, PostRecord, PostView, UserInterest};
use crate::services::blocklist::CategoryBlocklist;
use crate::services::catalog::CategoryCatalog;
use crate::services::interest::{resolve_weight_vector, WeightSource};
use crate::services::pagination::{reorder_by_ids, total_pages, PageRequest};
use crate::services::scoring::{rank_by_relevance, ScoringWeights};
use crate::services::visibility::VisibilityFilter;

pub const PERSONALIZED_MESSAGE: &str = "Showing personalized feed based on your interests.";
pub const GLOBAL_MESSAGE: &str =
    "Showing popular posts across the community. Explore more to personalize your feed!";
pub const RECENCY_MESSAGE: &str = "Showing most recent posts.";
pub const SPARSE_PAGE_NOTE: &str =
    " (Not many personalized posts found yet, showing most relevant.)";

/// First pages with fewer fetched posts than this (capped by per_page) get the sparse note
const SPARSE_PAGE_THRESHOLD: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortMode {
    #[default]
    Relevance,
    Recency,
}

impl SortMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortMode::Relevance => "relevance",
            SortMode::Recency => "recency",
        }
    }
}

impl fmt::Display for SortMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "relevance" => Ok(SortMode::Relevance),
            "recency" => Ok(SortMode::Recency),
            other => Err(AppError::Validation(format!(
                "sort_by must be 'relevance' or 'recency', got '{}'",
                other
            ))),
        }
    }
}

/// One assembled feed page, before response shaping
#[derive(Debug, Clone)]
pub struct FeedPage {
    pub posts: Vec<PostRecord>,
    pub page: u32,
    pub per_page: u32,
    pub total_items: u64,
    pub total_pages: u64,
    pub message: String,
    /// Weight source used in relevance mode
    pub weight_source: Option<WeightSource>,
    /// Posts removed by the blocklist from this page
    pub blocked: usize,
}

impl FeedPage {
    pub fn into_response(self) -> FeedResponse {
        FeedResponse {
            posts: self.posts.into_iter().map(PostView::from_record).collect(),
            page: self.page,
            per_page: self.per_page,
            total_items: self.total_items,
            total_pages: self.total_pages,
            message: self.message,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CategoryPage {
    pub category: String,
    pub posts: Vec<PostRecord>,
    pub page: u32,
    pub per_page: u32,
    pub total_items: u64,
    pub total_pages: u64,
}

impl CategoryPage {
    pub fn into_response(self) -> CategoryFeedResponse {
        CategoryFeedResponse {
            category_name: self.category,
            posts: self.posts.into_iter().map(PostView::from_record).collect(),
            page: self.page,
            per_page: self.per_page,
            total_items: self.total_items,
            total_pages: self.total_pages,
        }
    }
}

pub struct FeedService {
    store: Arc<dyn FeedStore>,
    blocklist: Arc<CategoryBlocklist>,
    catalog: Arc<CategoryCatalog>,
    weights: ScoringWeights,
    category_min_score: f64,
}

impl FeedService {
    pub fn new(
        store: Arc<dyn FeedStore>,
        blocklist: Arc<CategoryBlocklist>,
        catalog: Arc<CategoryCatalog>,
        weights: ScoringWeights,
        category_min_score: f64,
    ) -> Self {
        Self {
            store,
            blocklist,
            catalog,
            weights,
            category_min_score,
        }
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    pub async fn get_feed(
        &self,
        viewer_id: Uuid,
        request: PageRequest,
        sort: SortMode,
    ) -> Result<FeedPage> {
        self.get_feed_at(viewer_id, request, sort, Utc::now()).await
    }

    /// Build a feed page with recency measured against `now`
    pub async fn get_feed_at(
        &self,
        viewer_id: Uuid,
        request: PageRequest,
        sort: SortMode,
        now: DateTime<Utc>,
    ) -> Result<FeedPage> {
        let mode = sort.as_str();
        let timer = FEED_REQUEST_DURATION_SECONDS
            .with_label_values(&[mode])
            .start_timer();

        let result = self.assemble_feed(viewer_id, request, sort, now).await;
        timer.observe_duration();

        match &result {
            Ok(page) => {
                FEED_REQUEST_TOTAL.with_label_values(&[mode, "ok"]).inc();
                info!(
                    user_id = %viewer_id,
                    mode = mode,
                    page = page.page,
                    returned = page.posts.len(),
                    blocked = page.blocked,
                    total_items = page.total_items,
                    "Feed generated"
                );
            }
            Err(_) => {
                FEED_REQUEST_TOTAL.with_label_values(&[mode, "error"]).inc();
            }
        }

        result
    }

    async fn assemble_feed(
        &self,
        viewer_id: Uuid,
        request: PageRequest,
        sort: SortMode,
        now: DateTime<Utc>,
    ) -> Result<FeedPage> {
        let mut reader = self.store.begin_read().await?;
        let page = self
            .read_feed(reader.as_mut(), viewer_id, request, sort, now)
            .await?;
        reader.finish().await?;
        Ok(page)
    }

    /// One feed page inside an open snapshot.
    ///
    /// Recency mode windows in SQL. Relevance mode loads and scores every
    /// post the viewer can see before windowing, so each request is
    /// O(visible posts); `feed_candidate_count` tracks that size.
    async fn read_feed(
        &self,
        reader: &mut dyn FeedReader,
        viewer_id: Uuid,
        request: PageRequest,
        sort: SortMode,
        now: DateTime<Utc>,
    ) -> Result<FeedPage> {
        let friend_ids = reader.friend_ids(viewer_id).await?;
        let filter = VisibilityFilter::new(viewer_id, friend_ids);

        let total_items = reader.count_visible_posts(&filter).await?.max(0) as u64;

        let (ordered_ids, weight_source) = match sort {
            SortMode::Recency => {
                let ids = reader
                    .recent_post_ids(&filter, request.limit(), request.offset())
                    .await?;
                (ids, None)
            }
            SortMode::Relevance => {
                let vector = resolve_weight_vector(reader, viewer_id).await?;
                let candidates = reader.scoring_candidates(&filter).await?;
                FEED_CANDIDATE_COUNT
                    .with_label_values(&[vector.source().as_str()])
                    .observe(candidates.len() as f64);

                let ranked = rank_by_relevance(&candidates, viewer_id, &vector, &self.weights, now);
                let ids = request
                    .window(&ranked)
                    .iter()
                    .map(|p| p.post_id)
                    .collect::<Vec<_>>();

                debug!(
                    user_id = %viewer_id,
                    source = vector.source().as_str(),
                    candidates = candidates.len(),
                    window = ids.len(),
                    "Ranked feed candidates"
                );
                (ids, Some(vector.source()))
            }
        };

        let records = reader.posts_by_ids(&ordered_ids).await?;
        let records = reorder_by_ids(&ordered_ids, records, |r| r.id);
        let fetched = records.len();

        let (posts, blocked) = self.blocklist.apply(records);
        if blocked > 0 {
            FEED_BLOCKED_POSTS_TOTAL
                .with_label_values(&[sort.as_str()])
                .inc_by(blocked as u64);
        }

        let mut message = match weight_source {
            None => RECENCY_MESSAGE.to_string(),
            Some(WeightSource::Personalized) => PERSONALIZED_MESSAGE.to_string(),
            Some(WeightSource::Global) => GLOBAL_MESSAGE.to_string(),
        };
        let sparse_threshold = SPARSE_PAGE_THRESHOLD.min(request.per_page() as usize);
        if sort == SortMode::Relevance && request.page() == 1 && fetched < sparse_threshold {
            message.push_str(SPARSE_PAGE_NOTE);
        }

        Ok(FeedPage {
            posts,
            page: request.page(),
            per_page: request.per_page(),
            total_items,
            total_pages: total_pages(total_items, request.per_page()),
            message,
            weight_source,
            blocked,
        })
    }

    /// Posts classified into `category`, newest first.
    ///
    /// Unknown and blocked categories are reported as not found.
    pub async fn get_category_feed(
        &self,
        viewer_id: Uuid,
        category: &str,
        request: PageRequest,
    ) -> Result<CategoryPage> {
        if !self.catalog.contains(category) || self.blocklist.is_blocked(category) {
            return Err(AppError::NotFound(format!(
                "Category '{}' not found or is blocked",
                category
            )));
        }

        let timer = FEED_REQUEST_DURATION_SECONDS
            .with_label_values(&["category"])
            .start_timer();

        let mut reader = self.store.begin_read().await?;
        let result = self
            .read_category_feed(reader.as_mut(), viewer_id, category, request)
            .await;
        timer.observe_duration();

        let page = match result {
            Ok(page) => page,
            Err(e) => {
                FEED_REQUEST_TOTAL
                    .with_label_values(&["category", "error"])
                    .inc();
                return Err(e);
            }
        };
        reader.finish().await?;

        FEED_REQUEST_TOTAL
            .with_label_values(&["category", "ok"])
            .inc();
        Ok(page)
    }

    async fn read_category_feed(
        &self,
        reader: &mut dyn FeedReader,
        viewer_id: Uuid,
        category: &str,
        request: PageRequest,
    ) -> Result<CategoryPage> {
        let friend_ids = reader.friend_ids(viewer_id).await?;
        let filter = VisibilityFilter::new(viewer_id, friend_ids);

        let total_items = reader
            .count_category_posts(&filter, category, self.category_min_score)
            .await?
            .max(0) as u64;
        let ids = reader
            .category_post_ids(
                &filter,
                category,
                self.category_min_score,
                request.limit(),
                request.offset(),
            )
            .await?;

        let records = reader.posts_by_ids(&ids).await?;
        let records = reorder_by_ids(&ids, records, |r| r.id);
        let (posts, blocked) = self.blocklist.apply(records);
        if blocked > 0 {
            FEED_BLOCKED_POSTS_TOTAL
                .with_label_values(&["category"])
                .inc_by(blocked as u64);
        }

        Ok(CategoryPage {
            category: category.to_string(),
            posts,
            page: request.page(),
            per_page: request.per_page(),
            total_items,
            total_pages: total_pages(total_items, request.per_page()),
        })
    }

    /// The viewer's recorded interests, highest first
    pub async fn list_interests(&self, viewer_id: Uuid) -> Result<Vec<UserInterest>> {
        self.store.list_interests(viewer_id).await
    }
}
