use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::chat::ChatHistoryEntry;

pub const CHAT_HISTORY_LIMIT: i64 = 50;

/// Append one question/answer pair. Generated and fallback replies are
/// stored the same way.
pub async fn insert_chat_entry(
    pool: &PgPool,
    user_id: Uuid,
    message: &str,
    response: &str,
    timestamp: DateTime<Utc>,
) -> Result<Uuid, sqlx::Error> {
    let id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO chat_history (id, user_id, message, response, timestamp)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(id)
    .bind(user_id)
    .bind(message)
    .bind(response)
    .bind(timestamp)
    .execute(pool)
    .await?;

    Ok(id)
}

/// Most recent entries first
pub async fn fetch_recent_history(
    pool: &PgPool,
    user_id: Uuid,
    limit: i64,
) -> Result<Vec<ChatHistoryEntry>, sqlx::Error> {
    sqlx::query_as::<_, ChatHistoryEntry>(
        r#"
        SELECT message, response, timestamp
        FROM chat_history
        WHERE user_id = $1
        ORDER BY timestamp DESC, id DESC
        LIMIT $2
        "#,
    )
    .bind(user_id)
    .bind(limit)
    .fetch_all(pool)
    .await
}
