use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Months, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FollowUpFrequency {
    Daily,
    Weekly,
    Biweekly,
    Monthly,
}

impl FollowUpFrequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            FollowUpFrequency::Daily => "daily",
            FollowUpFrequency::Weekly => "weekly",
            FollowUpFrequency::Biweekly => "biweekly",
            FollowUpFrequency::Monthly => "monthly",
        }
    }

    /// Next due time counted from `from` (the creation or completion time).
    /// Monthly steps one calendar month and clamps to the month's last day.
    pub fn next_due_after(&self, from: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            FollowUpFrequency::Daily => from + Duration::days(1),
            FollowUpFrequency::Weekly => from + Duration::days(7),
            FollowUpFrequency::Biweekly => from + Duration::days(14),
            FollowUpFrequency::Monthly => from
                .checked_add_months(Months::new(1))
                .unwrap_or_else(|| from + Duration::days(30)),
        }
    }
}

impl fmt::Display for FollowUpFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for FollowUpFrequency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "daily" => Ok(FollowUpFrequency::Daily),
            "weekly" => Ok(FollowUpFrequency::Weekly),
            "biweekly" => Ok(FollowUpFrequency::Biweekly),
            "monthly" => Ok(FollowUpFrequency::Monthly),
            other => Err(format!(
                "Invalid frequency '{}'. Use daily, weekly, biweekly or monthly",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FollowUpRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub notes: Option<String>,
    pub frequency: String,
    pub next_due: DateTime<Utc>,
    pub is_active: bool,
    pub last_completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub completion_count: i64,
}

#[derive(Debug, Serialize)]
pub struct FollowUpResponse {
    pub id: Uuid,
    pub title: String,
    pub notes: Option<String>,
    pub frequency: String,
    pub next_date: DateTime<Utc>,
    pub last_completed: Option<DateTime<Utc>>,
    pub is_overdue: bool,
    pub completion_count: i64,
    pub created_at: DateTime<Utc>,
}

impl FollowUpResponse {
    pub fn from_record(record: FollowUpRecord, now: DateTime<Utc>) -> Self {
        Self {
            is_overdue: record.next_due < now,
            id: record.id,
            title: record.title,
            notes: record.notes,
            frequency: record.frequency,
            next_date: record.next_due,
            last_completed: record.last_completed_at,
            completion_count: record.completion_count,
            created_at: record.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateFollowUpRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub frequency: String,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct CompleteFollowUpRequest {
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct FollowUpHistoryEntry {
    pub id: Uuid,
    pub notes: Option<String>,
    pub ai_response: String,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct CompleteFollowUpResponse {
    pub message: String,
    pub next_due: DateTime<Utc>,
    pub ai_response: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback: Option<bool>,
}
