use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::followup::{FollowUpFrequency, FollowUpHistoryEntry, FollowUpRecord};

const FOLLOWUP_COLUMNS: &str = r#"
    f.id, f.user_id, f.title, f.notes, f.frequency, f.next_due, f.is_active,
    f.last_completed_at, f.created_at,
    (SELECT COUNT(*) FROM followup_history h WHERE h.followup_id = f.id) AS completion_count
"#;

pub async fn fetch_active_followups(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Vec<FollowUpRecord>, sqlx::Error> {
    let sql = format!(
        "SELECT {} FROM followups f WHERE f.user_id = $1 AND f.is_active = TRUE ORDER BY f.next_due ASC",
        FOLLOWUP_COLUMNS
    );
    sqlx::query_as::<_, FollowUpRecord>(&sql)
        .bind(user_id)
        .fetch_all(pool)
        .await
}

/// Active follow-up owned by `user_id`
pub async fn fetch_followup(
    pool: &PgPool,
    user_id: Uuid,
    followup_id: Uuid,
) -> Result<Option<FollowUpRecord>, sqlx::Error> {
    let sql = format!(
        "SELECT {} FROM followups f WHERE f.id = $1 AND f.user_id = $2 AND f.is_active = TRUE",
        FOLLOWUP_COLUMNS
    );
    sqlx::query_as::<_, FollowUpRecord>(&sql)
        .bind(followup_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

pub async fn insert_followup(
    pool: &PgPool,
    user_id: Uuid,
    title: &str,
    notes: Option<&str>,
    frequency: FollowUpFrequency,
    next_due: DateTime<Utc>,
) -> Result<Uuid, sqlx::Error> {
    let id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO followups (id, user_id, title, notes, frequency, next_due, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(id)
    .bind(user_id)
    .bind(title)
    .bind(notes)
    .bind(frequency.as_str())
    .bind(next_due)
    .bind(Utc::now())
    .execute(pool)
    .await?;

    Ok(id)
}

/// Record a completion and move the due date in one transaction.
pub async fn record_completion(
    pool: &PgPool,
    user_id: Uuid,
    followup_id: Uuid,
    notes: Option<&str>,
    ai_response: &str,
    completed_at: DateTime<Utc>,
    next_due: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO followup_history (id, followup_id, user_id, notes, ai_response, completed_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(followup_id)
    .bind(user_id)
    .bind(notes)
    .bind(ai_response)
    .bind(completed_at)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        UPDATE followups
        SET next_due = $1, last_completed_at = $2
        WHERE id = $3 AND user_id = $4
        "#,
    )
    .bind(next_due)
    .bind(completed_at)
    .bind(followup_id)
    .bind(user_id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(())
}

pub async fn fetch_followup_history(
    pool: &PgPool,
    user_id: Uuid,
    followup_id: Uuid,
) -> Result<Vec<FollowUpHistoryEntry>, sqlx::Error> {
    sqlx::query_as::<_, FollowUpHistoryEntry>(
        r#"
        SELECT id, notes, ai_response, completed_at
        FROM followup_history
        WHERE followup_id = $1 AND user_id = $2
        ORDER BY completed_at DESC
        "#,
    )
    .bind(followup_id)
    .bind(user_id)
    .fetch_all(pool)
    .await
}

/// Soft delete. Returns false when nothing matched.
pub async fn deactivate_followup(
    pool: &PgPool,
    user_id: Uuid,
    followup_id: Uuid,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE followups SET is_active = FALSE WHERE id = $1 AND user_id = $2 AND is_active = TRUE",
    )
    .bind(followup_id)
    .bind(user_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}
