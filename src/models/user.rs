use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Account row. Each user owns exactly one profile row created alongside.
#[derive(Debug, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}
