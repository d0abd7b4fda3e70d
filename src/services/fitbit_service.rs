use std::collections::BTreeMap;
use std::time::Duration as StdDuration;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Duration, Local, NaiveDate, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use thiserror::Error as ThisError;
use url::Url;
use uuid::Uuid;

use crate::config::fitbit::FitbitSettings;
use crate::context::wearable_metrics::{local_day_bounds, local_noon};
use crate::db::wearables::{
    delete_source_samples_tx, fetch_active_connections_for_provider, insert_sample_tx,
    mark_synced_tx, update_tokens,
};
use crate::models::wearable::{NewWearableSample, WearableConnection, WearableProvider};
use crate::utils::oauth_state::{OAuthState, OAuthStateError};

pub const FITBIT_SOURCE: &str = "fitbit";
pub const MAX_SYNC_DAYS: i64 = 30;
const PKCE_VERIFIER_LEN: usize = 64;

#[derive(Debug, ThisError)]
pub enum FitbitError {
    #[error("Fitbit integration is not configured")]
    NotConfigured,

    #[error("No active Fitbit connection")]
    NotConnected,

    #[error("Fitbit connection has no stored tokens")]
    MissingToken,

    #[error("Invalid OAuth state: {0}")]
    State(#[from] OAuthStateError),

    #[error("Fitbit API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Unexpected Fitbit response: {0}")]
    InvalidResponse(String),

    #[error("Invalid Fitbit URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
    #[serde(default)]
    pub user_id: Option<String>,
}

impl TokenResponse {
    pub fn expires_at(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now + Duration::seconds(self.expires_in)
    }
}

/// PKCE verifier (RFC 7636 unreserved characters)
pub fn generate_pkce_verifier() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(PKCE_VERIFIER_LEN)
        .map(char::from)
        .collect()
}

/// S256 challenge for a verifier
pub fn pkce_challenge(verifier: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
}

/// Days to request on a sync: from the last sync day (inclusive) up to
/// today, never fewer than 1 or more than `MAX_SYNC_DAYS`.
pub fn sync_range(last_synced_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> (NaiveDate, NaiveDate) {
    let today = now.with_timezone(&Local).date_naive();
    let days = match last_synced_at {
        Some(last) => {
            let last_day = last.with_timezone(&Local).date_naive();
            ((today - last_day).num_days() + 1).clamp(1, MAX_SYNC_DAYS)
        }
        None => MAX_SYNC_DAYS,
    };
    (today - Duration::days(days - 1), today)
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

/// Fitbit sends most numbers as strings
fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn day_sample(
    metric: &str,
    value: f64,
    unit: &str,
    date: NaiveDate,
    metadata: Option<Value>,
) -> Option<NewWearableSample> {
    Some(NewWearableSample {
        metric: metric.to_string(),
        value,
        unit: unit.to_string(),
        source: FITBIT_SOURCE.to_string(),
        metadata,
        recorded_at: local_noon(date)?,
    })
}

/// `{"activities-<resource>": [{"dateTime": "...", "value": "..."}]}`
pub fn parse_activity_series(body: &Value, resource: &str) -> BTreeMap<NaiveDate, f64> {
    let key = format!("activities-{}", resource);
    body.get(&key)
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .filter_map(|entry| {
                    let date = parse_date(entry.get("dateTime")?.as_str()?)?;
                    let value = number(entry.get("value")?)?;
                    Some((date, value))
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Resting heart rate per day from the heart activity series
pub fn parse_resting_heart_rate(body: &Value) -> BTreeMap<NaiveDate, f64> {
    body.get("activities-heart")
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .filter_map(|entry| {
                    let date = parse_date(entry.get("dateTime")?.as_str()?)?;
                    let resting = number(entry.get("value")?.get("restingHeartRate")?)?;
                    Some((date, resting))
                })
                .collect()
        })
        .unwrap_or_default()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SleepNight {
    pub minutes_asleep: f64,
    pub efficiency: Option<f64>,
}

/// Minutes asleep summed per night (naps included) and the main sleep's
/// efficiency.
pub fn parse_sleep(body: &Value) -> BTreeMap<NaiveDate, SleepNight> {
    let mut nights: BTreeMap<NaiveDate, SleepNight> = BTreeMap::new();

    let Some(entries) = body.get("sleep").and_then(Value::as_array) else {
        return nights;
    };

    for entry in entries {
        let Some(date) = entry
            .get("dateOfSleep")
            .and_then(Value::as_str)
            .and_then(parse_date)
        else {
            continue;
        };
        let minutes = entry.get("minutesAsleep").and_then(number).unwrap_or(0.0);
        let is_main = entry
            .get("isMainSleep")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let efficiency = entry.get("efficiency").and_then(number);

        let night = nights.entry(date).or_insert(SleepNight {
            minutes_asleep: 0.0,
            efficiency: None,
        });
        night.minutes_asleep += minutes;
        if is_main || night.efficiency.is_none() {
            night.efficiency = efficiency.or(night.efficiency);
        }
    }

    nights
}

/// Daily average SpO2: `[{"dateTime": "...", "value": {"avg": 96.1}}]`
pub fn parse_spo2(body: &Value) -> BTreeMap<NaiveDate, f64> {
    let entries = match body {
        Value::Array(entries) => entries.as_slice(),
        _ => return BTreeMap::new(),
    };

    entries
        .iter()
        .filter_map(|entry| {
            let date = parse_date(entry.get("dateTime")?.as_str()?)?;
            let avg = number(entry.get("value")?.get("avg")?)?;
            Some((date, avg))
        })
        .collect()
}

/// Raw API bodies collected by one sync
#[derive(Debug, Default)]
pub struct FitbitDailyData {
    pub steps: Value,
    pub calories: Value,
    pub distance: Value,
    pub minutes_very_active: Value,
    pub minutes_fairly_active: Value,
    pub heart: Value,
    pub sleep: Value,
    pub spo2: Value,
}

/// Turn the API bodies into one sample per metric per day.
pub fn samples_from_daily_data(data: &FitbitDailyData) -> Vec<NewWearableSample> {
    let mut samples = Vec::new();

    for (date, steps) in parse_activity_series(&data.steps, "steps") {
        samples.extend(day_sample("steps", steps, "count", date, None));
    }
    for (date, calories) in parse_activity_series(&data.calories, "calories") {
        samples.extend(day_sample("calories", calories, "kcal", date, None));
    }
    for (date, distance) in parse_activity_series(&data.distance, "distance") {
        samples.extend(day_sample("distance", distance, "km", date, None));
    }

    let very = parse_activity_series(&data.minutes_very_active, "minutesVeryActive");
    let fairly = parse_activity_series(&data.minutes_fairly_active, "minutesFairlyActive");
    let mut active_days: Vec<NaiveDate> = very.keys().chain(fairly.keys()).copied().collect();
    active_days.sort();
    active_days.dedup();
    for date in active_days {
        let very_minutes = very.get(&date).copied().unwrap_or(0.0);
        let fairly_minutes = fairly.get(&date).copied().unwrap_or(0.0);
        samples.extend(day_sample(
            "active_minutes",
            very_minutes + fairly_minutes,
            "minutes",
            date,
            Some(json!({ "very_active": very_minutes, "fairly_active": fairly_minutes })),
        ));
    }

    for (date, resting) in parse_resting_heart_rate(&data.heart) {
        samples.extend(day_sample("resting_heart_rate", resting, "bpm", date, None));
    }

    for (date, night) in parse_sleep(&data.sleep) {
        samples.extend(day_sample("sleep_minutes", night.minutes_asleep, "minutes", date, None));
        if let Some(efficiency) = night.efficiency {
            samples.extend(day_sample("sleep_efficiency", efficiency, "%", date, None));
        }
    }

    for (date, avg) in parse_spo2(&data.spo2) {
        samples.extend(day_sample("spo2", avg, "%", date, None));
    }

    samples
}

/// Fitbit OAuth 2.0 (authorization code + PKCE) and daily data sync.
#[derive(Clone)]
pub struct FitbitService {
    client: Client,
    settings: FitbitSettings,
    state_secret: SecretString,
}

impl FitbitService {
    pub fn new(settings: FitbitSettings, state_secret: SecretString) -> Result<Self, FitbitError> {
        let client = Client::builder().timeout(StdDuration::from_secs(30)).build()?;
        Ok(Self {
            client,
            settings,
            state_secret,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.settings.is_configured()
    }

    pub fn sync_cron(&self) -> &str {
        &self.settings.sync_cron
    }

    /// Authorization URL carrying the PKCE challenge and a signed state.
    pub fn authorization_url(&self, user_id: Uuid, pkce_verifier: &str) -> Result<String, FitbitError> {
        if !self.is_configured() {
            return Err(FitbitError::NotConfigured);
        }

        let state = OAuthState::new(user_id, WearableProvider::Fitbit, self.settings.state_ttl_minutes)
            .generate_token(&self.state_secret)?;
        let scope = self.settings.scopes.join(" ");
        let challenge = pkce_challenge(pkce_verifier);

        let url = Url::parse_with_params(
            &self.settings.authorize_url,
            &[
                ("response_type", "code"),
                ("client_id", self.settings.client_id.as_str()),
                ("redirect_uri", self.settings.redirect_uri.as_str()),
                ("scope", scope.as_str()),
                ("code_challenge", challenge.as_str()),
                ("code_challenge_method", "S256"),
                ("state", state.as_str()),
            ],
        )?;

        Ok(url.to_string())
    }

    pub fn verify_state(&self, state: &str, user_id: Uuid) -> Result<OAuthState, FitbitError> {
        Ok(OAuthState::validate_token(state, &self.state_secret, user_id)?)
    }

    #[tracing::instrument(name = "Exchange Fitbit authorization code", skip(self, code, pkce_verifier))]
    pub async fn exchange_code(&self, code: &str, pkce_verifier: &str) -> Result<TokenResponse, FitbitError> {
        self.token_request(&[
            ("grant_type", "authorization_code"),
            ("client_id", self.settings.client_id.as_str()),
            ("code", code),
            ("code_verifier", pkce_verifier),
            ("redirect_uri", self.settings.redirect_uri.as_str()),
        ])
        .await
    }

    #[tracing::instrument(name = "Refresh Fitbit token", skip(self, refresh_token))]
    pub async fn refresh_token(&self, refresh_token: &str) -> Result<TokenResponse, FitbitError> {
        self.token_request(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ])
        .await
    }

    async fn token_request(&self, form: &[(&str, &str)]) -> Result<TokenResponse, FitbitError> {
        if !self.is_configured() {
            return Err(FitbitError::NotConfigured);
        }

        let response = self
            .client
            .post(&self.settings.token_url)
            .basic_auth(
                &self.settings.client_id,
                Some(self.settings.client_secret.expose_secret()),
            )
            .form(form)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            tracing::error!("Fitbit token request failed with {}: {}", status, body);
            return Err(FitbitError::Api { status, body });
        }

        response
            .json::<TokenResponse>()
            .await
            .map_err(|e| FitbitError::InvalidResponse(e.to_string()))
    }

    async fn get_json(&self, access_token: &str, path: &str) -> Result<Value, FitbitError> {
        let url = format!("{}{}", self.settings.api_base_url.trim_end_matches('/'), path);
        let response = self
            .client
            .get(&url)
            .bearer_auth(access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(FitbitError::Api { status, body });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| FitbitError::InvalidResponse(e.to_string()))
    }

    /// Access token that is valid for at least another minute, refreshing
    /// and storing a new pair when needed.
    async fn ensure_access_token(
        &self,
        pool: &PgPool,
        connection: &WearableConnection,
        now: DateTime<Utc>,
    ) -> Result<String, FitbitError> {
        let access_token = connection.access_token.as_deref().ok_or(FitbitError::MissingToken)?;
        let still_valid = connection
            .token_expires_at
            .map(|expires| expires > now + Duration::seconds(60))
            .unwrap_or(false);
        if still_valid {
            return Ok(access_token.to_string());
        }

        let refresh = connection.refresh_token.as_deref().ok_or(FitbitError::MissingToken)?;
        let tokens = self.refresh_token(refresh).await?;
        update_tokens(
            pool,
            connection.id,
            &tokens.access_token,
            &tokens.refresh_token,
            tokens.expires_at(now),
        )
        .await?;
        tracing::info!("Refreshed Fitbit token for user {}", connection.user_id);
        Ok(tokens.access_token)
    }

    async fn fetch_daily_data(
        &self,
        access_token: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<FitbitDailyData, FitbitError> {
        let range = format!("{}/{}", start.format("%Y-%m-%d"), end.format("%Y-%m-%d"));
        let activity = |resource: &str| format!("/1/user/-/activities/{}/date/{}.json", resource, range);

        Ok(FitbitDailyData {
            steps: self.get_json(access_token, &activity("steps")).await?,
            calories: self.get_json(access_token, &activity("calories")).await?,
            distance: self.get_json(access_token, &activity("distance")).await?,
            minutes_very_active: self.get_json(access_token, &activity("minutesVeryActive")).await?,
            minutes_fairly_active: self
                .get_json(access_token, &activity("minutesFairlyActive"))
                .await?,
            heart: self.get_json(access_token, &activity("heart")).await?,
            sleep: self
                .get_json(access_token, &format!("/1.2/user/-/sleep/date/{}.json", range))
                .await?,
            // SpO2 needs a compatible device; a missing scope or device is not fatal
            spo2: match self
                .get_json(access_token, &format!("/1/user/-/spo2/date/{}.json", range))
                .await
            {
                Ok(body) => body,
                Err(e) => {
                    tracing::warn!("Skipping Fitbit SpO2 data: {}", e);
                    Value::Null
                }
            },
        })
    }

    /// Sync one connection. Returns the number of samples written.
    #[tracing::instrument(name = "Sync Fitbit connection", skip(self, pool, connection), fields(user_id = %connection.user_id))]
    pub async fn sync_connection(
        &self,
        pool: &PgPool,
        connection: &WearableConnection,
        now: DateTime<Utc>,
    ) -> Result<usize, FitbitError> {
        if !connection.is_active() {
            return Err(FitbitError::NotConnected);
        }

        let access_token = self.ensure_access_token(pool, connection, now).await?;
        let (start, end) = sync_range(connection.last_synced_at, now);
        let data = self.fetch_daily_data(&access_token, start, end).await?;
        let samples = samples_from_daily_data(&data);

        let mut tx = pool.begin().await?;
        for sample in &samples {
            let date = sample.recorded_at.with_timezone(&Local).date_naive();
            let (from, to) = local_day_bounds(date).unwrap_or((
                sample.recorded_at - Duration::hours(12),
                sample.recorded_at + Duration::hours(12),
            ));
            delete_source_samples_tx(&mut tx, connection.user_id, FITBIT_SOURCE, &sample.metric, from, to)
                .await?;
            insert_sample_tx(&mut tx, connection.user_id, sample).await?;
        }
        mark_synced_tx(&mut tx, connection.id, now).await?;
        tx.commit().await?;

        tracing::info!(
            "Fitbit sync wrote {} samples for {} to {}",
            samples.len(),
            start,
            end
        );
        Ok(samples.len())
    }

    /// Background job body: sync every active Fitbit connection.
    pub async fn sync_all(&self, pool: &PgPool) -> Result<usize, FitbitError> {
        if !self.is_configured() {
            return Ok(0);
        }

        let connections = fetch_active_connections_for_provider(pool, WearableProvider::Fitbit).await?;
        let mut synced = 0;
        for connection in &connections {
            match self.sync_connection(pool, connection, Utc::now()).await {
                Ok(_) => synced += 1,
                Err(e) => tracing::error!(
                    "Fitbit sync failed for user {}: {}",
                    connection.user_id,
                    e
                ),
            }
        }
        Ok(synced)
    }
}
