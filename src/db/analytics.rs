use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::analytics::ActivityCounts;

/// App usage counts shown next to the health figures.
pub async fn fetch_activity_counts(
    pool: &PgPool,
    user_id: Uuid,
    since: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<ActivityCounts, sqlx::Error> {
    sqlx::query_as::<_, ActivityCounts>(
        r#"
        SELECT
            (SELECT COUNT(*) FROM chat_history
              WHERE user_id = $1 AND timestamp >= $2) AS chat_messages,
            (SELECT COUNT(*) FROM uploaded_files
              WHERE user_id = $1) AS documents,
            (SELECT COUNT(*) FROM followups
              WHERE user_id = $1 AND is_active = TRUE) AS active_followups,
            (SELECT COUNT(*) FROM followups
              WHERE user_id = $1 AND is_active = TRUE AND next_due < $3) AS overdue_followups
        "#,
    )
    .bind(user_id)
    .bind(since)
    .bind(now)
    .fetch_one(pool)
    .await
}
