use serde::{Deserialize, Serialize};

use crate::models::wearable::SeriesPoint;

pub const DASHBOARD_PERIOD_DAYS: i64 = 30;

#[derive(Debug, Deserialize)]
pub struct TrendsQuery {
    pub period: Option<i64>,
}

/// Headline numbers for the dashboard; `None` where no samples exist
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub avg_steps: Option<f64>,
    pub avg_sleep_hours: Option<f64>,
    pub avg_sleep_efficiency: Option<f64>,
    pub avg_calories: Option<f64>,
    pub total_distance_km: Option<f64>,
    pub avg_heart_rate: Option<f64>,
    pub avg_resting_heart_rate: Option<f64>,
    pub avg_spo2: Option<f64>,
    pub total_active_minutes: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, sqlx::FromRow)]
pub struct ActivityCounts {
    pub chat_messages: i64,
    pub documents: i64,
    pub active_followups: i64,
    pub overdue_followups: i64,
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub period_days: i64,
    pub summary: DashboardSummary,
    pub activity: ActivityCounts,
    pub daily_steps: Vec<SeriesPoint>,
    pub daily_sleep_hours: Vec<SeriesPoint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Improving,
    Declining,
    Stable,
    InsufficientData,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricTrend {
    pub metric: String,
    pub direction: TrendDirection,
    pub first_half_average: Option<f64>,
    pub second_half_average: Option<f64>,
    pub series: Vec<SeriesPoint>,
}

#[derive(Debug, Default, Serialize)]
pub struct ActivityTrends {
    pub steps: Vec<f64>,
    pub calories: Vec<f64>,
    pub active_minutes: Vec<f64>,
}

#[derive(Debug, Default, Serialize)]
pub struct SleepTrends {
    pub sleep_hours: Vec<f64>,
    pub efficiency: Vec<f64>,
}

#[derive(Debug, Default, Serialize)]
pub struct HeartTrends {
    pub heart_rate: Vec<f64>,
    pub resting_heart_rate: Vec<f64>,
    pub spo2: Vec<f64>,
}

#[derive(Debug, Serialize)]
pub struct Trends {
    pub activity: ActivityTrends,
    pub sleep: SleepTrends,
    pub heart: HeartTrends,
    pub metrics: Vec<MetricTrend>,
}

#[derive(Debug, Serialize)]
pub struct TrendsResponse {
    pub period_days: i64,
    pub trends: Trends,
}

#[derive(Debug, Serialize)]
pub struct InsightsResponse {
    pub insights: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback: Option<bool>,
}
