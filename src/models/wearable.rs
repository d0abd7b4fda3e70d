use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use uuid::Uuid;

/// Metric families the aggregator knows about. Anything else is kept as
/// `Other` and reported, never silently dropped.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MetricKind {
    Steps,
    Sleep,
    HeartRate,
    RestingHeartRate,
    SpO2,
    ActiveMinutes,
    Other(String),
}

impl MetricKind {
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "steps" => MetricKind::Steps,
            "sleep" | "sleep_hours" | "sleep_duration" | "sleep_minutes" => MetricKind::Sleep,
            "heart_rate" | "heart_rate_avg" => MetricKind::HeartRate,
            "resting_heart_rate" => MetricKind::RestingHeartRate,
            "spo2" => MetricKind::SpO2,
            "active_minutes" => MetricKind::ActiveMinutes,
            other => MetricKind::Other(other.to_string()),
        }
    }

    /// Canonical name used when writing samples
    pub fn as_str(&self) -> &str {
        match self {
            MetricKind::Steps => "steps",
            MetricKind::Sleep => "sleep_hours",
            MetricKind::HeartRate => "heart_rate",
            MetricKind::RestingHeartRate => "resting_heart_rate",
            MetricKind::SpO2 => "spo2",
            MetricKind::ActiveMinutes => "active_minutes",
            MetricKind::Other(name) => name,
        }
    }

    /// Metrics whose daily value is a sum of the day's samples; the rest
    /// are averaged per day.
    pub fn is_daily_total(&self) -> bool {
        matches!(self, MetricKind::Steps | MetricKind::Sleep | MetricKind::ActiveMinutes)
    }

    /// Names accepted by the timeseries endpoint that map to this kind
    pub fn query_names(&self) -> Vec<String> {
        match self {
            MetricKind::Steps => vec!["steps".into()],
            MetricKind::Sleep => vec![
                "sleep".into(),
                "sleep_hours".into(),
                "sleep_duration".into(),
                "sleep_minutes".into(),
            ],
            MetricKind::HeartRate => vec!["heart_rate".into(), "heart_rate_avg".into()],
            MetricKind::RestingHeartRate => vec!["resting_heart_rate".into()],
            MetricKind::SpO2 => vec!["spo2".into()],
            MetricKind::ActiveMinutes => vec!["active_minutes".into()],
            MetricKind::Other(name) => vec![name.clone()],
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct WearableSample {
    pub id: Uuid,
    pub user_id: Uuid,
    pub metric: String,
    pub value: f64,
    pub unit: String,
    pub source: String,
    pub metadata: Option<Json<serde_json::Value>>,
    pub recorded_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl WearableSample {
    pub fn kind(&self) -> MetricKind {
        MetricKind::from_name(&self.metric)
    }
}

/// A sample about to be written
#[derive(Debug, Clone, PartialEq)]
pub struct NewWearableSample {
    pub metric: String,
    pub value: f64,
    pub unit: String,
    pub source: String,
    pub metadata: Option<serde_json::Value>,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct IngestMetricRequest {
    pub metric_type: String,
    pub value: f64,
    #[serde(default)]
    pub unit: Option<String>,
    /// Free-form timestamp as sent by the device
    #[serde(default)]
    pub recorded_at: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
pub struct IngestMetricResponse {
    pub sample_id: Uuid,
    pub recorded_at: DateTime<Utc>,
    pub timestamp_fallback: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WearableProvider {
    Demo,
    Fitbit,
}

impl WearableProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            WearableProvider::Demo => "demo",
            WearableProvider::Fitbit => "fitbit",
        }
    }
}

impl FromStr for WearableProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "demo" => Ok(WearableProvider::Demo),
            "fitbit" => Ok(WearableProvider::Fitbit),
            other => Err(format!("Unsupported wearable provider '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    Pending,
    Active,
    Disconnected,
}

impl ConnectionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionStatus::Pending => "pending",
            ConnectionStatus::Active => "active",
            ConnectionStatus::Disconnected => "disconnected",
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct WearableConnection {
    pub id: Uuid,
    pub user_id: Uuid,
    pub provider: String,
    pub status: String,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub token_expires_at: Option<DateTime<Utc>>,
    pub external_user_id: Option<String>,
    pub pkce_verifier: Option<String>,
    pub connected_at: Option<DateTime<Utc>>,
    pub last_synced_at: Option<DateTime<Utc>>,
}

impl WearableConnection {
    pub fn is_active(&self) -> bool {
        self.status == ConnectionStatus::Active.as_str()
    }
}

#[derive(Debug, Serialize)]
pub struct ConnectionView {
    pub provider: String,
    pub status: String,
    pub connected_at: Option<DateTime<Utc>>,
    pub last_synced_at: Option<DateTime<Utc>>,
}

impl From<&WearableConnection> for ConnectionView {
    fn from(c: &WearableConnection) -> Self {
        Self {
            provider: c.provider.clone(),
            status: c.status.clone(),
            connected_at: c.connected_at,
            last_synced_at: c.last_synced_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct WearableStatusResponse {
    pub connected: bool,
    /// First active provider, kept for the single-device dashboard
    pub provider: Option<String>,
    pub connections: Vec<ConnectionView>,
    pub sample_count: i64,
    pub last_sample_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct ConnectRequest {
    pub provider: String,
}

#[derive(Debug, Serialize)]
pub struct ConnectResponse {
    pub provider: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorization_url: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct DisconnectRequest {
    #[serde(default)]
    pub provider: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct DemoDataRequest {
    #[serde(default)]
    pub days: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct FitbitCallbackRequest {
    pub code: String,
    pub state: String,
}

#[derive(Debug, Deserialize)]
pub struct TimeseriesQuery {
    #[serde(default)]
    pub metric: Option<String>,
    pub days: Option<i64>,
}

// Aggregated views

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepsSummary {
    pub average_per_day: f64,
    pub total: f64,
    pub days_counted: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SleepSummary {
    pub average_hours_per_night: f64,
    pub nights_counted: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeartRateSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resting_average: Option<f64>,
    pub samples: usize,
    pub resting_samples: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Spo2Summary {
    pub average_percent: f64,
    pub samples: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivitySummary {
    pub active_minutes_total: f64,
    pub samples: usize,
}

/// Window-scoped summary; families without samples are `None`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WearableSummary {
    pub window_days: i64,
    pub steps: Option<StepsSummary>,
    pub sleep: Option<SleepSummary>,
    pub heart_rate: Option<HeartRateSummary>,
    pub spo2: Option<Spo2Summary>,
    pub activity: Option<ActivitySummary>,
    /// Sample counts for metric names outside the known families
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub other_metrics: BTreeMap<String, usize>,
}

impl WearableSummary {
    pub fn empty(window_days: i64) -> Self {
        Self {
            window_days,
            steps: None,
            sleep: None,
            heart_rate: None,
            spo2: None,
            activity: None,
            other_metrics: BTreeMap::new(),
        }
    }

    pub fn has_data(&self) -> bool {
        self.steps.is_some()
            || self.sleep.is_some()
            || self.heart_rate.is_some()
            || self.spo2.is_some()
            || self.activity.is_some()
    }
}

#[derive(Debug, Serialize)]
pub struct WearableSummaryResponse {
    pub summary: WearableSummary,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub value: f64,
}

#[derive(Debug, Serialize)]
pub struct TimeseriesResponse {
    pub metric: String,
    pub days: i64,
    pub series: Vec<SeriesPoint>,
}

#[derive(Debug, Serialize)]
pub struct RecommendationsResponse {
    pub recommendations: String,
    pub summary: WearableSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct SyncResponse {
    pub provider: String,
    pub samples_written: usize,
    pub synced_at: DateTime<Utc>,
}
