use sqlx::PgConnection;
use std::collections::HashMap;
use uuid::Uuid;

use crate::models::UserInterest;

#[derive(Debug, Clone, sqlx::FromRow)]
struct InterestRow {
    user_id: Uuid,
    category: String,
    score: f64,
}

impl From<InterestRow> for UserInterest {
    fn from(row: InterestRow) -> Self {
        Self {
            user_id: row.user_id,
            category: row.category,
            score: row.score,
        }
    }
}

/// Interests of `user_id` by score desc, category asc. `limit = None` returns all.
pub async fn interests_for_user(
    conn: &mut PgConnection,
    user_id: Uuid,
    limit: Option<i64>,
) -> Result<Vec<UserInterest>, sqlx::Error> {
    let rows = sqlx::query_as::<_, InterestRow>(
        r#"
        SELECT user_id, category, score
        FROM user_interests
        WHERE user_id = $1
        ORDER BY score DESC, category ASC
        LIMIT $2
        "#,
    )
    .bind(user_id)
    .bind(limit)
    .fetch_all(conn)
    .await?;

    Ok(rows.into_iter().map(UserInterest::from).collect())
}

/// Sum of interest scores per category across all users
pub async fn global_category_totals(
    conn: &mut PgConnection,
) -> Result<HashMap<String, f64>, sqlx::Error> {
    let rows = sqlx::query_as::<_, (String, f64)>(
        r#"
        SELECT category, SUM(score)::DOUBLE PRECISION AS total
        FROM user_interests
        GROUP BY category
        "#,
    )
    .fetch_all(conn)
    .await?;

    Ok(rows.into_iter().collect())
}

/// Add `amount` to the (user, category) interest, creating it when absent
pub async fn increment(
    conn: &mut PgConnection,
    user_id: Uuid,
    category: &str,
    amount: f64,
) -> Result<f64, sqlx::Error> {
    sqlx::query_scalar::<_, f64>(
        r#"
        INSERT INTO user_interests (user_id, category, score)
        VALUES ($1, $2, $3)
        ON CONFLICT (user_id, category)
        DO UPDATE SET score = user_interests.score + EXCLUDED.score
        RETURNING score
        "#,
    )
    .bind(user_id)
    .bind(category)
    .bind(amount)
    .fetch_one(conn)
    .await
}
