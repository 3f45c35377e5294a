use sqlx::PgConnection;
use std::collections::HashSet;
use uuid::Uuid;

/// Users with an accepted friend request to or from `user_id`
pub async fn friend_ids(
    conn: &mut PgConnection,
    user_id: Uuid,
) -> Result<HashSet<Uuid>, sqlx::Error> {
    let ids = sqlx::query_scalar::<_, Uuid>(
        r#"
        SELECT CASE WHEN sender_id = $1 THEN receiver_id ELSE sender_id END AS friend_id
        FROM friend_requests
        WHERE status = 'ACCEPTED'
          AND (sender_id = $1 OR receiver_id = $1)
        "#,
    )
    .bind(user_id)
    .fetch_all(conn)
    .await?;

    Ok(ids.into_iter().filter(|id| *id != user_id).collect())
}
