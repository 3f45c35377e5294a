use sqlx::PgConnection;
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

#[derive(Debug, Clone, sqlx::FromRow)]
struct CategoryScoreRow {
    post_id: Uuid,
    category: String,
    score: f64,
}

/// Category scores for `post_ids`, grouped by post
pub async fn scores_for_posts(
    conn: &mut PgConnection,
    post_ids: &[Uuid],
) -> Result<HashMap<Uuid, BTreeMap<String, f64>>, sqlx::Error> {
    if post_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows = sqlx::query_as::<_, CategoryScoreRow>(
        r#"
        SELECT post_id, category, score
        FROM post_category_scores
        WHERE post_id = ANY($1)
        "#,
    )
    .bind(post_ids)
    .fetch_all(conn)
    .await?;

    let mut grouped: HashMap<Uuid, BTreeMap<String, f64>> = HashMap::new();
    for row in rows {
        grouped
            .entry(row.post_id)
            .or_default()
            .insert(row.category, row.score);
    }
    Ok(grouped)
}

pub async fn has_scores(conn: &mut PgConnection, post_id: Uuid) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM post_category_scores WHERE post_id = $1)",
    )
    .bind(post_id)
    .fetch_one(conn)
    .await
}

pub async fn insert_score(
    conn: &mut PgConnection,
    post_id: Uuid,
    category: &str,
    score: f64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO post_category_scores (post_id, category, score)
        VALUES ($1, $2, $3)
        "#,
    )
    .bind(post_id)
    .bind(category)
    .bind(score)
    .execute(conn)
    .await?;

    Ok(())
}
