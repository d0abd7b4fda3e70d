use serde::{Deserialize, Serialize};

/// Generic API response wrapper used by the write endpoints
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
        }
    }
}

/// Lookback window accepted by the wearable and analytics endpoints.
///
/// Non-integer values are rejected by the query extractor; `validate`
/// rejects the rest before anything reaches the aggregator.
#[derive(Debug, Deserialize, Clone, Copy)]
pub struct WindowQuery {
    pub days: Option<i64>,
}

pub const DEFAULT_WINDOW_DAYS: i64 = 7;
pub const MAX_WINDOW_DAYS: i64 = 365;

impl WindowQuery {
    pub fn validate(&self, default_days: i64) -> Result<i64, String> {
        validate_window(self.days, default_days)
    }
}

pub fn validate_window(days: Option<i64>, default_days: i64) -> Result<i64, String> {
    match days {
        None => Ok(default_days),
        Some(d) if d < 1 => Err("days must be a positive integer".to_string()),
        Some(d) if d > MAX_WINDOW_DAYS => Err(format!("days must not exceed {}", MAX_WINDOW_DAYS)),
        Some(d) => Ok(d),
    }
}
