use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde_json::json;
use sqlx::PgPool;

use crate::context::prompt::RECOMMENDATIONS_QUESTION;
use crate::context::wearable_metrics::{
    daily_series, load_wearable_summary, parse_recorded_at, render_wearable_summary, window_start,
};
use crate::db::helpers::database_error;
use crate::db::wearables::{
    activate_demo_connection, activate_oauth_connection, disconnect, fetch_connection,
    fetch_connections, fetch_metric_samples_between, fetch_sample_stats, insert_sample,
    insert_samples, upsert_pending_connection,
};
use crate::handlers::{bad_request, user_id_from_claims};
use crate::middleware::auth::Claims;
use crate::models::common::{validate_window, WindowQuery, DEFAULT_WINDOW_DAYS};
use crate::models::wearable::{
    ConnectRequest, ConnectResponse, ConnectionStatus, ConnectionView, DemoDataRequest,
    DisconnectRequest, FitbitCallbackRequest, IngestMetricRequest, IngestMetricResponse,
    MetricKind, NewWearableSample, RecommendationsResponse, SyncResponse, TimeseriesQuery,
    TimeseriesResponse, WearableProvider, WearableStatusResponse, WearableSummaryResponse,
};
use crate::services::chat_service::{generate_reply, load_chat_context};
use crate::services::demo_data::{generate_demo_samples, DEFAULT_DEMO_DAYS, MAX_DEMO_DAYS};
use crate::services::fitbit_service::{generate_pkce_verifier, FitbitError};
use crate::services::{FitbitService, GeminiService};

fn fitbit_error_response(e: FitbitError) -> HttpResponse {
    match e {
        FitbitError::NotConfigured => HttpResponse::ServiceUnavailable().json(json!({
            "error": "Fitbit integration is not configured"
        })),
        FitbitError::NotConnected | FitbitError::MissingToken => {
            bad_request("No active Fitbit connection")
        }
        FitbitError::State(state_err) => bad_request(format!("Invalid OAuth state: {}", state_err)),
        FitbitError::Database(db_err) => database_error(db_err),
        other => {
            tracing::error!("Fitbit request failed: {}", other);
            HttpResponse::BadGateway().json(json!({
                "error": "Fitbit request failed"
            }))
        }
    }
}

#[tracing::instrument(
    name = "Wearable status",
    skip(pool, claims),
    fields(username = %claims.username)
)]
pub async fn wearable_status(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
) -> HttpResponse {
    let user_id = match user_id_from_claims(&claims) {
        Ok(id) => id,
        Err(response) => return response,
    };

    let connections = match fetch_connections(&pool, user_id).await {
        Ok(c) => c,
        Err(e) => return database_error(e),
    };
    let (sample_count, last_sample_at) = match fetch_sample_stats(&pool, user_id).await {
        Ok(stats) => stats,
        Err(e) => return database_error(e),
    };

    let active = connections.iter().find(|c| c.is_active());
    HttpResponse::Ok().json(WearableStatusResponse {
        connected: active.is_some(),
        provider: active.map(|c| c.provider.clone()),
        connections: connections.iter().map(ConnectionView::from).collect(),
        sample_count,
        last_sample_at,
    })
}

#[tracing::instrument(
    name = "Connect wearable",
    skip(pool, fitbit, claims, body),
    fields(username = %claims.username, provider = %body.provider)
)]
pub async fn connect_wearable(
    pool: web::Data<PgPool>,
    fitbit: web::Data<FitbitService>,
    claims: web::ReqData<Claims>,
    body: web::Json<ConnectRequest>,
) -> HttpResponse {
    let user_id = match user_id_from_claims(&claims) {
        Ok(id) => id,
        Err(response) => return response,
    };

    let provider: WearableProvider = match body.provider.parse() {
        Ok(p) => p,
        Err(message) => return bad_request(message),
    };

    match provider {
        WearableProvider::Demo => match activate_demo_connection(&pool, user_id).await {
            Ok(()) => HttpResponse::Ok().json(ConnectResponse {
                provider: provider.as_str().to_string(),
                status: ConnectionStatus::Active.as_str().to_string(),
                authorization_url: None,
            }),
            Err(e) => database_error(e),
        },
        WearableProvider::Fitbit => {
            if !fitbit.is_configured() {
                return fitbit_error_response(FitbitError::NotConfigured);
            }

            let verifier = generate_pkce_verifier();
            let authorization_url = match fitbit.authorization_url(user_id, &verifier) {
                Ok(url) => url,
                Err(e) => return fitbit_error_response(e),
            };
            if let Err(e) = upsert_pending_connection(&pool, user_id, provider, &verifier).await {
                return database_error(e);
            }

            HttpResponse::Ok().json(ConnectResponse {
                provider: provider.as_str().to_string(),
                status: ConnectionStatus::Pending.as_str().to_string(),
                authorization_url: Some(authorization_url),
            })
        }
    }
}

#[tracing::instrument(
    name = "Fitbit OAuth callback",
    skip(pool, fitbit, claims, body),
    fields(username = %claims.username)
)]
pub async fn fitbit_callback(
    pool: web::Data<PgPool>,
    fitbit: web::Data<FitbitService>,
    claims: web::ReqData<Claims>,
    body: web::Json<FitbitCallbackRequest>,
) -> HttpResponse {
    let user_id = match user_id_from_claims(&claims) {
        Ok(id) => id,
        Err(response) => return response,
    };

    if let Err(e) = fitbit.verify_state(&body.state, user_id) {
        tracing::warn!("Rejected Fitbit callback: {}", e);
        return fitbit_error_response(e);
    }

    let verifier = match fetch_connection(&pool, user_id, WearableProvider::Fitbit).await {
        Ok(Some(connection)) => match connection.pkce_verifier {
            Some(v) => v,
            None => return bad_request("No pending Fitbit authorization"),
        },
        Ok(None) => return bad_request("No pending Fitbit authorization"),
        Err(e) => return database_error(e),
    };

    let now = Utc::now();
    let tokens = match fitbit.exchange_code(&body.code, &verifier).await {
        Ok(tokens) => tokens,
        Err(e) => return fitbit_error_response(e),
    };

    if let Err(e) = activate_oauth_connection(
        &pool,
        user_id,
        WearableProvider::Fitbit,
        &tokens.access_token,
        &tokens.refresh_token,
        tokens.expires_at(now),
        tokens.user_id.as_deref(),
    )
    .await
    {
        return database_error(e);
    }

    // The connection is usable even if the first sync fails; the hourly job retries
    let samples_written = match fetch_connection(&pool, user_id, WearableProvider::Fitbit).await {
        Ok(Some(connection)) => match fitbit.sync_connection(&pool, &connection, now).await {
            Ok(count) => Some(count),
            Err(e) => {
                tracing::warn!("Initial Fitbit sync failed: {}", e);
                None
            }
        },
        Ok(None) => None,
        Err(e) => return database_error(e),
    };

    HttpResponse::Ok().json(json!({
        "message": "Fitbit connected successfully",
        "provider": WearableProvider::Fitbit.as_str(),
        "samples_written": samples_written
    }))
}

#[tracing::instrument(
    name = "Disconnect wearable",
    skip(pool, claims, body),
    fields(username = %claims.username)
)]
pub async fn disconnect_wearable(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
    body: Option<web::Json<DisconnectRequest>>,
) -> HttpResponse {
    let user_id = match user_id_from_claims(&claims) {
        Ok(id) => id,
        Err(response) => return response,
    };

    let provider = match body.and_then(|b| b.into_inner().provider) {
        Some(raw) => match raw.parse::<WearableProvider>() {
            Ok(p) => Some(p),
            Err(message) => return bad_request(message),
        },
        None => None,
    };

    match disconnect(&pool, user_id, provider).await {
        Ok(count) => HttpResponse::Ok().json(json!({
            "message": "Wearable disconnected",
            "disconnected": count
        })),
        Err(e) => database_error(e),
    }
}

#[tracing::instrument(
    name = "Generate demo wearable data",
    skip(pool, claims, body),
    fields(username = %claims.username)
)]
pub async fn generate_demo_data(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
    body: Option<web::Json<DemoDataRequest>>,
) -> HttpResponse {
    let user_id = match user_id_from_claims(&claims) {
        Ok(id) => id,
        Err(response) => return response,
    };

    let days = body.and_then(|b| b.days).unwrap_or(DEFAULT_DEMO_DAYS);
    if !(1..=MAX_DEMO_DAYS).contains(&days) {
        return bad_request(format!("days must be between 1 and {}", MAX_DEMO_DAYS));
    }

    let samples = generate_demo_samples(days, Utc::now(), &mut rand::thread_rng());

    if let Err(e) = activate_demo_connection(&pool, user_id).await {
        return database_error(e);
    }

    match insert_samples(&pool, user_id, &samples).await {
        Ok(count) => {
            tracing::info!("Generated {} demo samples over {} days", count, days);
            HttpResponse::Created().json(json!({
                "message": "Demo data generated",
                "days": days,
                "samples_created": count
            }))
        }
        Err(e) => database_error(e),
    }
}

#[tracing::instrument(
    name = "Ingest wearable metric",
    skip(pool, claims, body),
    fields(username = %claims.username, metric = %body.metric_type)
)]
pub async fn ingest_metric(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
    body: web::Json<IngestMetricRequest>,
) -> HttpResponse {
    let user_id = match user_id_from_claims(&claims) {
        Ok(id) => id,
        Err(response) => return response,
    };

    let request = body.into_inner();
    let metric = request.metric_type.trim().to_lowercase();
    if metric.is_empty() {
        return bad_request("metric_type is required");
    }
    if !request.value.is_finite() {
        return bad_request("value must be a finite number");
    }

    let now = Utc::now();
    let (recorded_at, timestamp_fallback) = parse_recorded_at(request.recorded_at.as_deref(), now);

    let mut metadata = request.metadata;
    if timestamp_fallback {
        let mut object = match metadata.take() {
            Some(serde_json::Value::Object(map)) => map,
            Some(other) => {
                let mut map = serde_json::Map::new();
                map.insert("original_metadata".to_string(), other);
                map
            }
            None => serde_json::Map::new(),
        };
        object.insert("timestamp_fallback".to_string(), json!(true));
        object.insert(
            "original_recorded_at".to_string(),
            json!(request.recorded_at.clone().unwrap_or_default()),
        );
        metadata = Some(serde_json::Value::Object(object));
    }

    if let MetricKind::Other(name) = MetricKind::from_name(&metric) {
        tracing::warn!("Storing sample for unrecognized metric '{}'", name);
    }

    let sample = NewWearableSample {
        metric,
        value: request.value,
        unit: request.unit.map(|u| u.trim().to_string()).unwrap_or_default(),
        source: request
            .source
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "manual".to_string()),
        metadata,
        recorded_at,
    };

    match insert_sample(&pool, user_id, &sample).await {
        Ok(sample_id) => HttpResponse::Created().json(IngestMetricResponse {
            sample_id,
            recorded_at,
            timestamp_fallback,
        }),
        Err(e) => database_error(e),
    }
}

#[tracing::instrument(
    name = "Sync wearable data",
    skip(pool, fitbit, claims),
    fields(username = %claims.username)
)]
pub async fn sync_wearable(
    pool: web::Data<PgPool>,
    fitbit: web::Data<FitbitService>,
    claims: web::ReqData<Claims>,
) -> HttpResponse {
    let user_id = match user_id_from_claims(&claims) {
        Ok(id) => id,
        Err(response) => return response,
    };

    let connection = match fetch_connection(&pool, user_id, WearableProvider::Fitbit).await {
        Ok(Some(connection)) if connection.is_active() => connection,
        Ok(_) => return fitbit_error_response(FitbitError::NotConnected),
        Err(e) => return database_error(e),
    };

    let now = Utc::now();
    match fitbit.sync_connection(&pool, &connection, now).await {
        Ok(samples_written) => HttpResponse::Ok().json(SyncResponse {
            provider: WearableProvider::Fitbit.as_str().to_string(),
            samples_written,
            synced_at: now,
        }),
        Err(e) => fitbit_error_response(e),
    }
}

#[tracing::instrument(
    name = "Wearable summary",
    skip(pool, claims, query),
    fields(username = %claims.username)
)]
pub async fn wearable_summary(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
    query: web::Query<WindowQuery>,
) -> HttpResponse {
    let user_id = match user_id_from_claims(&claims) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let days = match query.validate(DEFAULT_WINDOW_DAYS) {
        Ok(days) => days,
        Err(message) => return bad_request(message),
    };

    match load_wearable_summary(&pool, user_id, days, Utc::now()).await {
        Ok((summary, _)) => {
            let text = render_wearable_summary(&summary);
            HttpResponse::Ok().json(WearableSummaryResponse { summary, text })
        }
        Err(e) => database_error(e),
    }
}

#[tracing::instrument(
    name = "Wearable timeseries",
    skip(pool, claims, query),
    fields(username = %claims.username)
)]
pub async fn wearable_timeseries(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
    query: web::Query<TimeseriesQuery>,
) -> HttpResponse {
    let user_id = match user_id_from_claims(&claims) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let days = match validate_window(query.days, DEFAULT_WINDOW_DAYS) {
        Ok(days) => days,
        Err(message) => return bad_request(message),
    };

    let metric_name = query.metric.as_deref().unwrap_or("steps");
    let kind = MetricKind::from_name(metric_name);

    let now = Utc::now();
    let samples = match fetch_metric_samples_between(
        &pool,
        user_id,
        &kind.query_names(),
        window_start(now, days),
        now,
    )
    .await
    {
        Ok(samples) => samples,
        Err(e) => return database_error(e),
    };

    HttpResponse::Ok().json(TimeseriesResponse {
        metric: kind.as_str().to_string(),
        days,
        series: daily_series(&samples, &kind),
    })
}

#[tracing::instrument(
    name = "Wearable recommendations",
    skip(pool, gemini, claims, query),
    fields(username = %claims.username)
)]
pub async fn wearable_recommendations(
    pool: web::Data<PgPool>,
    gemini: web::Data<GeminiService>,
    claims: web::ReqData<Claims>,
    query: web::Query<WindowQuery>,
) -> HttpResponse {
    let user_id = match user_id_from_claims(&claims) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let days = match query.validate(DEFAULT_WINDOW_DAYS) {
        Ok(days) => days,
        Err(message) => return bad_request(message),
    };

    let context = match load_chat_context(&pool, user_id, days, Utc::now()).await {
        Ok(context) => context,
        Err(e) => return database_error(e),
    };
    let outcome = generate_reply(&gemini, &context, RECOMMENDATIONS_QUESTION).await;

    HttpResponse::Ok().json(RecommendationsResponse {
        fallback: outcome.fallback_flag(),
        recommendations: outcome.into_text(),
        summary: context.summary,
    })
}
