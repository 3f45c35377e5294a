//! In-memory `FeedStore` for integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use feed_service::db::{FeedReader, FeedStore};
use feed_service::error::{AppError, Result};
use feed_service::models::{AuthorSummary, PostFeatures, PostPrivacy, PostRecord, UserInterest};
use feed_service::services::{ClassificationRecord, VisibilityFilter};

/// Fixed clock for ranking scenarios
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

#[derive(Debug, Clone)]
pub struct StoredPost {
    pub id: Uuid,
    pub author_id: Uuid,
    pub content: String,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub privacy: PostPrivacy,
    pub comment_count: i64,
    pub like_count: i64,
}

#[derive(Debug, Clone, Default)]
pub struct StoreState {
    pub users: HashMap<Uuid, String>,
    pub posts: Vec<StoredPost>,
    pub category_scores: HashMap<Uuid, BTreeMap<String, f64>>,
    pub interests: HashMap<(Uuid, String), f64>,
    pub friendships: HashSet<(Uuid, Uuid)>,
}

impl StoreState {
    fn visible<'a>(&'a self, filter: &'a VisibilityFilter) -> impl Iterator<Item = &'a StoredPost> {
        self.posts
            .iter()
            .filter(move |p| filter.allows(p.author_id, p.privacy))
    }

    fn in_category(&self, post_id: &Uuid, category: &str, min_score: f64) -> bool {
        self.category_scores
            .get(post_id)
            .and_then(|scores| scores.get(category))
            .map(|score| *score >= min_score)
            .unwrap_or(false)
    }

    fn record(&self, post: &StoredPost) -> PostRecord {
        PostRecord {
            id: post.id,
            author: AuthorSummary {
                id: post.author_id,
                username: self
                    .users
                    .get(&post.author_id)
                    .cloned()
                    .unwrap_or_default(),
                profile_picture: None,
            },
            content: post.content.clone(),
            image_url: post.image_url.clone(),
            created_at: post.created_at,
            privacy: post.privacy,
            comment_count: post.comment_count,
            like_count: post.like_count,
            category_scores: self
                .category_scores
                .get(&post.id)
                .cloned()
                .unwrap_or_default(),
        }
    }
}

/// Newest first, then id desc
fn sort_recent(posts: &mut Vec<&StoredPost>) {
    posts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
}

fn window(ids: Vec<Uuid>, limit: i64, offset: i64) -> Vec<Uuid> {
    ids.into_iter()
        .skip(offset.max(0) as usize)
        .take(limit.max(0) as usize)
        .collect()
}

#[derive(Clone, Default)]
pub struct InMemoryFeedStore {
    state: Arc<Mutex<StoreState>>,
    snapshots_opened: Arc<AtomicUsize>,
    snapshots_finished: Arc<AtomicUsize>,
}

/// Builder input for a post
pub struct NewPost {
    pub author_id: Uuid,
    pub privacy: PostPrivacy,
    pub created_at: DateTime<Utc>,
    pub comments: i64,
    pub likes: i64,
    pub scores: Vec<(&'static str, f64)>,
}

impl NewPost {
    pub fn public(author_id: Uuid, created_at: DateTime<Utc>) -> Self {
        Self {
            author_id,
            privacy: PostPrivacy::Public,
            created_at,
            comments: 0,
            likes: 0,
            scores: Vec::new(),
        }
    }

    pub fn friends_only(author_id: Uuid, created_at: DateTime<Utc>) -> Self {
        Self {
            privacy: PostPrivacy::Friends,
            ..Self::public(author_id, created_at)
        }
    }

    pub fn scores(mut self, scores: &[(&'static str, f64)]) -> Self {
        self.scores = scores.to_vec();
        self
    }

    pub fn engagement(mut self, comments: i64, likes: i64) -> Self {
        self.comments = comments;
        self.likes = likes;
        self
    }
}

impl InMemoryFeedStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_user(&self, username: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.state
            .lock()
            .unwrap()
            .users
            .insert(id, username.to_string());
        id
    }

    pub fn add_post(&self, post: NewPost) -> Uuid {
        let id = Uuid::new_v4();
        let mut state = self.state.lock().unwrap();
        state.posts.push(StoredPost {
            id,
            author_id: post.author_id,
            content: format!("  post {}  ", id),
            image_url: None,
            created_at: post.created_at,
            privacy: post.privacy,
            comment_count: post.comments,
            like_count: post.likes,
        });
        if !post.scores.is_empty() {
            state.category_scores.insert(
                id,
                post.scores
                    .iter()
                    .map(|(c, s)| (c.to_string(), *s))
                    .collect(),
            );
        }
        id
    }

    /// Public post by `author`, `hours` old relative to [`fixed_now`]
    pub fn add_public_post_aged(&self, author: Uuid, hours: f64) -> Uuid {
        let created_at = fixed_now() - Duration::milliseconds((hours * 3_600_000.0) as i64);
        self.add_post(NewPost::public(author, created_at))
    }

    pub fn set_scores(&self, post_id: Uuid, scores: &[(&str, f64)]) {
        self.state.lock().unwrap().category_scores.insert(
            post_id,
            scores.iter().map(|(c, s)| (c.to_string(), *s)).collect(),
        );
    }

    pub fn set_interest(&self, user_id: Uuid, category: &str, score: f64) {
        self.state
            .lock()
            .unwrap()
            .interests
            .insert((user_id, category.to_string()), score);
    }

    pub fn interest(&self, user_id: Uuid, category: &str) -> Option<f64> {
        self.state
            .lock()
            .unwrap()
            .interests
            .get(&(user_id, category.to_string()))
            .copied()
    }

    pub fn befriend(&self, a: Uuid, b: Uuid) {
        let mut state = self.state.lock().unwrap();
        state.friendships.insert((a, b));
    }

    pub fn snapshots_opened(&self) -> usize {
        self.snapshots_opened.load(Ordering::SeqCst)
    }

    pub fn snapshots_finished(&self) -> usize {
        self.snapshots_finished.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FeedStore for InMemoryFeedStore {
    async fn begin_read(&self) -> Result<Box<dyn FeedReader>> {
        self.snapshots_opened.fetch_add(1, Ordering::SeqCst);
        let snapshot = self.state.lock().unwrap().clone();
        Ok(Box::new(InMemoryReader {
            snapshot,
            finished: self.snapshots_finished.clone(),
        }))
    }

    async fn list_interests(&self, user_id: Uuid) -> Result<Vec<UserInterest>> {
        let state = self.state.lock().unwrap();
        let mut interests: Vec<UserInterest> = state
            .interests
            .iter()
            .filter(|((user, _), _)| *user == user_id)
            .map(|((user, category), score)| UserInterest {
                user_id: *user,
                category: category.clone(),
                score: *score,
            })
            .collect();
        interests.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.category.cmp(&b.category))
        });
        Ok(interests)
    }

    async fn record_classification(&self, record: &ClassificationRecord) -> Result<()> {
        let mut state = self.state.lock().unwrap();

        let author = state
            .posts
            .iter()
            .find(|p| p.id == record.post_id)
            .map(|p| p.author_id)
            .ok_or_else(|| AppError::NotFound(format!("post {}", record.post_id)))?;
        if author != record.author_id {
            return Err(AppError::Validation("author mismatch".into()));
        }
        if state.category_scores.contains_key(&record.post_id) {
            return Err(AppError::Validation("post already classified".into()));
        }

        state
            .category_scores
            .insert(record.post_id, record.post_scores.clone());
        for (category, amount) in &record.interest_increments {
            *state
                .interests
                .entry((record.author_id, category.clone()))
                .or_insert(0.0) += amount;
        }
        Ok(())
    }
}

pub struct InMemoryReader {
    snapshot: StoreState,
    finished: Arc<AtomicUsize>,
}

#[async_trait]
impl FeedReader for InMemoryReader {
    async fn friend_ids(&mut self, user_id: Uuid) -> Result<HashSet<Uuid>> {
        Ok(self
            .snapshot
            .friendships
            .iter()
            .filter_map(|(a, b)| {
                if *a == user_id {
                    Some(*b)
                } else if *b == user_id {
                    Some(*a)
                } else {
                    None
                }
            })
            .collect())
    }

    async fn top_interests(&mut self, user_id: Uuid, limit: i64) -> Result<Vec<UserInterest>> {
        let mut interests: Vec<UserInterest> = self
            .snapshot
            .interests
            .iter()
            .filter(|((user, _), _)| *user == user_id)
            .map(|((user, category), score)| UserInterest {
                user_id: *user,
                category: category.clone(),
                score: *score,
            })
            .collect();
        interests.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.category.cmp(&b.category))
        });
        interests.truncate(limit.max(0) as usize);
        Ok(interests)
    }

    async fn global_category_weights(&mut self) -> Result<HashMap<String, f64>> {
        let mut totals: HashMap<String, f64> = HashMap::new();
        for ((_, category), score) in &self.snapshot.interests {
            *totals.entry(category.clone()).or_insert(0.0) += score;
        }
        Ok(totals)
    }

    async fn count_visible_posts(&mut self, filter: &VisibilityFilter) -> Result<i64> {
        Ok(self.snapshot.visible(filter).count() as i64)
    }

    async fn scoring_candidates(&mut self, filter: &VisibilityFilter) -> Result<Vec<PostFeatures>> {
        Ok(self
            .snapshot
            .visible(filter)
            .map(|p| PostFeatures {
                post_id: p.id,
                author_id: p.author_id,
                created_at: p.created_at,
                comment_count: p.comment_count,
                like_count: p.like_count,
                category_scores: self
                    .snapshot
                    .category_scores
                    .get(&p.id)
                    .cloned()
                    .unwrap_or_default(),
            })
            .collect())
    }

    async fn recent_post_ids(
        &mut self,
        filter: &VisibilityFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Uuid>> {
        let mut posts: Vec<&StoredPost> = self.snapshot.visible(filter).collect();
        sort_recent(&mut posts);
        Ok(window(posts.iter().map(|p| p.id).collect(), limit, offset))
    }

    async fn count_category_posts(
        &mut self,
        filter: &VisibilityFilter,
        category: &str,
        min_score: f64,
    ) -> Result<i64> {
        Ok(self
            .snapshot
            .visible(filter)
            .filter(|p| self.snapshot.in_category(&p.id, category, min_score))
            .count() as i64)
    }

    async fn category_post_ids(
        &mut self,
        filter: &VisibilityFilter,
        category: &str,
        min_score: f64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Uuid>> {
        let mut posts: Vec<&StoredPost> = self
            .snapshot
            .visible(filter)
            .filter(|p| self.snapshot.in_category(&p.id, category, min_score))
            .collect();
        sort_recent(&mut posts);
        Ok(window(posts.iter().map(|p| p.id).collect(), limit, offset))
    }

    async fn posts_by_ids(&mut self, ids: &[Uuid]) -> Result<Vec<PostRecord>> {
        let wanted: HashSet<&Uuid> = ids.iter().collect();
        // reverse insertion order so callers must re-apply the id order
        Ok(self
            .snapshot
            .posts
            .iter()
            .rev()
            .filter(|p| wanted.contains(&p.id))
            .map(|p| self.snapshot.record(p))
            .collect())
    }

    async fn finish(self: Box<Self>) -> Result<()> {
        self.finished.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
