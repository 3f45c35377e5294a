use chrono::{DateTime, Utc};
use sqlx::PgConnection;
use uuid::Uuid;

use crate::services::visibility::VisibilityFilter;

/// Eligibility predicate over `posts p`; binds `$1` viewer id, `$2` friend ids.
pub const VISIBLE_TO_VIEWER: &str = "(p.user_id = $1 \
     OR p.privacy = 'PUBLIC' \
     OR (p.privacy = 'FRIENDS' AND p.user_id = ANY($2)))";

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PostFeatureRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub comment_count: i64,
    pub like_count: i64,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PostRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub username: String,
    pub profile_picture: Option<String>,
    pub content: String,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub privacy: String,
    pub comment_count: i64,
    pub like_count: i64,
}

pub async fn count_visible(
    conn: &mut PgConnection,
    filter: &VisibilityFilter,
) -> Result<i64, sqlx::Error> {
    let sql = format!("SELECT COUNT(*) FROM posts p WHERE {}", VISIBLE_TO_VIEWER);

    sqlx::query_scalar::<_, i64>(&sql)
        .bind(filter.viewer_id())
        .bind(filter.friend_id_list())
        .fetch_one(conn)
        .await
}

/// Raw scoring features of every visible post
pub async fn visible_features(
    conn: &mut PgConnection,
    filter: &VisibilityFilter,
) -> Result<Vec<PostFeatureRow>, sqlx::Error> {
    let sql = format!(
        r#"
        SELECT p.id, p.user_id, p.created_at,
               (SELECT COUNT(*) FROM comments c WHERE c.post_id = p.id) AS comment_count,
               (SELECT COUNT(*) FROM likes l WHERE l.post_id = p.id) AS like_count
        FROM posts p
        WHERE {}
        "#,
        VISIBLE_TO_VIEWER
    );

    sqlx::query_as::<_, PostFeatureRow>(&sql)
        .bind(filter.viewer_id())
        .bind(filter.friend_id_list())
        .fetch_all(conn)
        .await
}

pub async fn recent_ids(
    conn: &mut PgConnection,
    filter: &VisibilityFilter,
    limit: i64,
    offset: i64,
) -> Result<Vec<Uuid>, sqlx::Error> {
    let sql = format!(
        r#"
        SELECT p.id
        FROM posts p
        WHERE {}
        ORDER BY p.created_at DESC, p.id DESC
        LIMIT $3 OFFSET $4
        "#,
        VISIBLE_TO_VIEWER
    );

    sqlx::query_scalar::<_, Uuid>(&sql)
        .bind(filter.viewer_id())
        .bind(filter.friend_id_list())
        .bind(limit)
        .bind(offset)
        .fetch_all(conn)
        .await
}

pub async fn count_in_category(
    conn: &mut PgConnection,
    filter: &VisibilityFilter,
    category: &str,
    min_score: f64,
) -> Result<i64, sqlx::Error> {
    let sql = format!(
        r#"
        SELECT COUNT(*)
        FROM posts p
        WHERE {}
          AND EXISTS (
              SELECT 1 FROM post_category_scores s
              WHERE s.post_id = p.id AND s.category = $3 AND s.score >= $4
          )
        "#,
        VISIBLE_TO_VIEWER
    );

    sqlx::query_scalar::<_, i64>(&sql)
        .bind(filter.viewer_id())
        .bind(filter.friend_id_list())
        .bind(category)
        .bind(min_score)
        .fetch_one(conn)
        .await
}

pub async fn category_ids(
    conn: &mut PgConnection,
    filter: &VisibilityFilter,
    category: &str,
    min_score: f64,
    limit: i64,
    offset: i64,
) -> Result<Vec<Uuid>, sqlx::Error> {
    let sql = format!(
        r#"
        SELECT p.id
        FROM posts p
        WHERE {}
          AND EXISTS (
              SELECT 1 FROM post_category_scores s
              WHERE s.post_id = p.id AND s.category = $3 AND s.score >= $4
          )
        ORDER BY p.created_at DESC, p.id DESC
        LIMIT $5 OFFSET $6
        "#,
        VISIBLE_TO_VIEWER
    );

    sqlx::query_scalar::<_, Uuid>(&sql)
        .bind(filter.viewer_id())
        .bind(filter.friend_id_list())
        .bind(category)
        .bind(min_score)
        .bind(limit)
        .bind(offset)
        .fetch_all(conn)
        .await
}

/// Posts with author and live counts, in no particular order
pub async fn posts_by_ids(conn: &mut PgConnection, ids: &[Uuid]) -> Result<Vec<PostRow>, sqlx::Error> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    sqlx::query_as::<_, PostRow>(
        r#"
        SELECT p.id, p.user_id, u.username, u.profile_picture,
               p.content, p.image_url, p.created_at, p.privacy,
               (SELECT COUNT(*) FROM comments c WHERE c.post_id = p.id) AS comment_count,
               (SELECT COUNT(*) FROM likes l WHERE l.post_id = p.id) AS like_count
        FROM posts p
        JOIN users u ON u.id = p.user_id
        WHERE p.id = ANY($1)
        "#,
    )
    .bind(ids)
    .fetch_all(conn)
    .await
}

/// Row-locks the post until the transaction ends, so concurrent writers for
/// the same post run one after another.
pub const LOCK_POST_AUTHOR: &str = "SELECT user_id FROM posts WHERE id = $1 FOR UPDATE";

/// Author of `post_id`, if the post exists. Holds the row lock.
pub async fn lock_post_author(
    conn: &mut PgConnection,
    post_id: Uuid,
) -> Result<Option<Uuid>, sqlx::Error> {
    sqlx::query_scalar::<_, Uuid>(LOCK_POST_AUTHOR)
        .bind(post_id)
        .fetch_optional(conn)
        .await
}
