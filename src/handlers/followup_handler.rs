use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::context::prompt::followup_checkin_question;
use crate::db::followups::{
    deactivate_followup, fetch_active_followups, fetch_followup, fetch_followup_history,
    insert_followup, record_completion,
};
use crate::db::helpers::{database_error, require_record};
use crate::handlers::{bad_request, user_id_from_claims};
use crate::middleware::auth::Claims;
use crate::models::common::DEFAULT_WINDOW_DAYS;
use crate::models::followup::{
    CompleteFollowUpRequest, CompleteFollowUpResponse, CreateFollowUpRequest, FollowUpFrequency,
    FollowUpResponse,
};
use crate::services::chat_service::{generate_reply, load_chat_context};
use crate::services::GeminiService;

#[tracing::instrument(
    name = "List follow-ups",
    skip(pool, claims),
    fields(username = %claims.username)
)]
pub async fn list_followups(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
) -> HttpResponse {
    let user_id = match user_id_from_claims(&claims) {
        Ok(id) => id,
        Err(response) => return response,
    };

    let now = Utc::now();
    match fetch_active_followups(&pool, user_id).await {
        Ok(records) => {
            let followups: Vec<FollowUpResponse> = records
                .into_iter()
                .map(|record| FollowUpResponse::from_record(record, now))
                .collect();
            HttpResponse::Ok().json(json!({ "followups": followups }))
        }
        Err(e) => database_error(e),
    }
}

#[tracing::instrument(
    name = "Create follow-up",
    skip(pool, claims, body),
    fields(username = %claims.username)
)]
pub async fn create_followup(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
    body: web::Json<CreateFollowUpRequest>,
) -> HttpResponse {
    let user_id = match user_id_from_claims(&claims) {
        Ok(id) => id,
        Err(response) => return response,
    };

    let title = body.title.trim();
    if title.is_empty() {
        return bad_request("Title is required");
    }

    let frequency: FollowUpFrequency = match body.frequency.parse() {
        Ok(f) => f,
        Err(message) => return bad_request(message),
    };

    let notes = body.notes.as_deref().map(str::trim).filter(|n| !n.is_empty());
    let next_due = frequency.next_due_after(Utc::now());

    match insert_followup(&pool, user_id, title, notes, frequency, next_due).await {
        Ok(id) => HttpResponse::Created().json(json!({
            "message": "Follow-up created",
            "id": id,
            "next_date": next_due
        })),
        Err(e) => database_error(e),
    }
}

#[tracing::instrument(
    name = "Complete follow-up",
    skip(pool, gemini, claims, body),
    fields(username = %claims.username, followup_id = %path)
)]
pub async fn complete_followup(
    pool: web::Data<PgPool>,
    gemini: web::Data<GeminiService>,
    claims: web::ReqData<Claims>,
    path: web::Path<Uuid>,
    body: Option<web::Json<CompleteFollowUpRequest>>,
) -> HttpResponse {
    let user_id = match user_id_from_claims(&claims) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let followup_id = path.into_inner();

    let followup = match require_record(
        fetch_followup(&pool, user_id, followup_id).await,
        "Follow-up not found",
    ) {
        Ok(f) => f,
        Err(response) => return response,
    };

    let frequency: FollowUpFrequency = match followup.frequency.parse() {
        Ok(f) => f,
        Err(message) => {
            tracing::error!("Stored follow-up has an unknown frequency: {}", message);
            return HttpResponse::InternalServerError().json(json!({
                "error": "Follow-up has an invalid frequency"
            }));
        }
    };

    let notes = body
        .and_then(|b| b.into_inner().notes)
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty());

    let now = Utc::now();
    let context = match load_chat_context(&pool, user_id, DEFAULT_WINDOW_DAYS, now).await {
        Ok(context) => context,
        Err(e) => return database_error(e),
    };
    let question = followup_checkin_question(&followup.title, notes.as_deref());
    let outcome = generate_reply(&gemini, &context, &question).await;

    let next_due = frequency.next_due_after(now);
    if let Err(e) = record_completion(
        &pool,
        user_id,
        followup_id,
        notes.as_deref(),
        outcome.text(),
        now,
        next_due,
    )
    .await
    {
        return database_error(e);
    }

    tracing::info!("Follow-up {} completed, next due {}", followup_id, next_due);
    HttpResponse::Ok().json(CompleteFollowUpResponse {
        message: "Follow-up completed".to_string(),
        next_due,
        fallback: outcome.fallback_flag(),
        ai_response: outcome.into_text(),
    })
}

#[tracing::instrument(
    name = "Follow-up history",
    skip(pool, claims),
    fields(username = %claims.username, followup_id = %path)
)]
pub async fn followup_history(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
    path: web::Path<Uuid>,
) -> HttpResponse {
    let user_id = match user_id_from_claims(&claims) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let followup_id = path.into_inner();

    if let Err(response) = require_record(
        fetch_followup(&pool, user_id, followup_id).await,
        "Follow-up not found",
    ) {
        return response;
    }

    match fetch_followup_history(&pool, user_id, followup_id).await {
        Ok(history) => HttpResponse::Ok().json(json!({ "history": history })),
        Err(e) => database_error(e),
    }
}

#[tracing::instrument(
    name = "Delete follow-up",
    skip(pool, claims),
    fields(username = %claims.username, followup_id = %path)
)]
pub async fn delete_followup(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
    path: web::Path<Uuid>,
) -> HttpResponse {
    let user_id = match user_id_from_claims(&claims) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match deactivate_followup(&pool, user_id, path.into_inner()).await {
        Ok(true) => HttpResponse::Ok().json(json!({ "message": "Follow-up deleted" })),
        Ok(false) => HttpResponse::NotFound().json(json!({ "error": "Follow-up not found" })),
        Err(e) => database_error(e),
    }
}
