use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Who may see a post besides its author.
///
/// Stored as text (`'PUBLIC'` / `'FRIENDS'`) in `posts.privacy`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PostPrivacy {
    Public,
    Friends,
}

impl PostPrivacy {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostPrivacy::Public => "PUBLIC",
            PostPrivacy::Friends => "FRIENDS",
        }
    }
}

impl fmt::Display for PostPrivacy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PostPrivacy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PUBLIC" => Ok(PostPrivacy::Public),
            "FRIENDS" => Ok(PostPrivacy::Friends),
            other => Err(format!("unknown post privacy '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorSummary {
    pub id: Uuid,
    pub username: String,
    pub profile_picture: Option<String>,
}

/// A fully materialized post, as fetched for a feed window.
#[derive(Debug, Clone, PartialEq)]
pub struct PostRecord {
    pub id: Uuid,
    pub author: AuthorSummary,
    pub content: String,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub privacy: PostPrivacy,
    pub comment_count: i64,
    pub like_count: i64,
    /// Classifier output, category -> score in [0, 1]
    pub category_scores: BTreeMap<String, f64>,
}

/// The subset of a post the relevance scorer needs.
#[derive(Debug, Clone, PartialEq)]
pub struct PostFeatures {
    pub post_id: Uuid,
    pub author_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub comment_count: i64,
    pub like_count: i64,
    pub category_scores: BTreeMap<String, f64>,
}

/// Accumulated affinity of a user for a category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserInterest {
    pub user_id: Uuid,
    pub category: String,
    pub score: f64,
}

/// Post as returned to API clients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostView {
    pub id: Uuid,
    pub content: String,
    pub image_url: Option<String>,
    /// RFC 3339, UTC
    pub timestamp: String,
    pub privacy: PostPrivacy,
    pub author: AuthorSummary,
    pub classification_scores: BTreeMap<String, f64>,
    pub comment_count: i64,
    pub like_count: i64,
}

impl PostView {
    pub fn from_record(record: PostRecord) -> Self {
        Self {
            id: record.id,
            content: record.content.trim().to_string(),
            image_url: record.image_url,
            timestamp: record
                .created_at
                .to_rfc3339_opts(SecondsFormat::Millis, true),
            privacy: record.privacy,
            author: record.author,
            classification_scores: record.category_scores,
            comment_count: record.comment_count,
            like_count: record.like_count,
        }
    }
}

/// Paginated feed response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedResponse {
    pub posts: Vec<PostView>,
    pub page: u32,
    pub per_page: u32,
    pub total_items: u64,
    pub total_pages: u64,
    pub message: String,
}

/// Paginated category feed response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryFeedResponse {
    pub category_name: String,
    pub posts: Vec<PostView>,
    pub page: u32,
    pub per_page: u32,
    pub total_items: u64,
    pub total_pages: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterestView {
    pub category: String,
    pub score: f64,
}

impl From<UserInterest> for InterestView {
    fn from(interest: UserInterest) -> Self {
        Self {
            category: interest.category,
            score: interest.score,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterestsResponse {
    pub user_id: Uuid,
    pub interests: Vec<InterestView>,
}
