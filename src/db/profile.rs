use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::profile::UserProfile;

pub async fn fetch_profile(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Option<UserProfile>, sqlx::Error> {
    sqlx::query_as::<_, UserProfile>(
        r#"
        SELECT full_name, age, gender, medical_history, allergies,
               current_medications, health_goals
        FROM user_profiles
        WHERE user_id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

/// Replace every profile field. Recreates the row if it went missing.
pub async fn replace_profile(
    pool: &PgPool,
    user_id: Uuid,
    profile: &UserProfile,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO user_profiles (
            user_id, full_name, age, gender, medical_history, allergies,
            current_medications, health_goals, updated_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        ON CONFLICT (user_id) DO UPDATE SET
            full_name = EXCLUDED.full_name,
            age = EXCLUDED.age,
            gender = EXCLUDED.gender,
            medical_history = EXCLUDED.medical_history,
            allergies = EXCLUDED.allergies,
            current_medications = EXCLUDED.current_medications,
            health_goals = EXCLUDED.health_goals,
            updated_at = EXCLUDED.updated_at
        "#,
    )
    .bind(user_id)
    .bind(&profile.full_name)
    .bind(profile.age)
    .bind(&profile.gender)
    .bind(&profile.medical_history)
    .bind(&profile.allergies)
    .bind(&profile.current_medications)
    .bind(&profile.health_goals)
    .bind(Utc::now())
    .execute(pool)
    .await?;

    Ok(())
}
