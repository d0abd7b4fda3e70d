use actix_web::{web, HttpResponse};
use chrono::Utc;
use sqlx::PgPool;

use crate::context::prompt::INSIGHTS_QUESTION;
use crate::context::wearable_metrics::{daily_series, load_wearable_summary, window_start};
use crate::db::analytics::fetch_activity_counts;
use crate::db::helpers::database_error;
use crate::handlers::{bad_request, user_id_from_claims};
use crate::middleware::auth::Claims;
use crate::models::analytics::{
    DashboardResponse, InsightsResponse, TrendsQuery, TrendsResponse, DASHBOARD_PERIOD_DAYS,
};
use crate::models::common::validate_window;
use crate::models::wearable::MetricKind;
use crate::services::analytics_service::{build_trends, dashboard_summary};
use crate::services::chat_service::{generate_reply, load_chat_context};
use crate::services::GeminiService;

#[tracing::instrument(
    name = "Analytics dashboard",
    skip(pool, claims),
    fields(username = %claims.username)
)]
pub async fn dashboard(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
) -> HttpResponse {
    let user_id = match user_id_from_claims(&claims) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let now = Utc::now();

    let (summary, samples) =
        match load_wearable_summary(&pool, user_id, DASHBOARD_PERIOD_DAYS, now).await {
            Ok(loaded) => loaded,
            Err(e) => return database_error(e),
        };

    let activity = match fetch_activity_counts(
        &pool,
        user_id,
        window_start(now, DASHBOARD_PERIOD_DAYS),
        now,
    )
    .await
    {
        Ok(counts) => counts,
        Err(e) => return database_error(e),
    };

    HttpResponse::Ok().json(DashboardResponse {
        period_days: DASHBOARD_PERIOD_DAYS,
        summary: dashboard_summary(&summary, &samples),
        activity,
        daily_steps: daily_series(&samples, &MetricKind::Steps),
        daily_sleep_hours: daily_series(&samples, &MetricKind::Sleep),
    })
}

#[tracing::instrument(
    name = "Analytics trends",
    skip(pool, claims, query),
    fields(username = %claims.username)
)]
pub async fn trends(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
    query: web::Query<TrendsQuery>,
) -> HttpResponse {
    let user_id = match user_id_from_claims(&claims) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let period = match validate_window(query.period, DASHBOARD_PERIOD_DAYS) {
        Ok(days) => days,
        Err(message) => return bad_request(message),
    };

    match load_wearable_summary(&pool, user_id, period, Utc::now()).await {
        Ok((_, samples)) => HttpResponse::Ok().json(TrendsResponse {
            period_days: period,
            trends: build_trends(&samples),
        }),
        Err(e) => database_error(e),
    }
}

#[tracing::instrument(
    name = "Analytics insights",
    skip(pool, gemini, claims),
    fields(username = %claims.username)
)]
pub async fn insights(
    pool: web::Data<PgPool>,
    gemini: web::Data<GeminiService>,
    claims: web::ReqData<Claims>,
) -> HttpResponse {
    let user_id = match user_id_from_claims(&claims) {
        Ok(id) => id,
        Err(response) => return response,
    };

    let context = match load_chat_context(&pool, user_id, DASHBOARD_PERIOD_DAYS, Utc::now()).await {
        Ok(context) => context,
        Err(e) => return database_error(e),
    };
    let outcome = generate_reply(&gemini, &context, INSIGHTS_QUESTION).await;

    HttpResponse::Ok().json(InsightsResponse {
        fallback: outcome.fallback_flag(),
        insights: outcome.into_text(),
    })
}
