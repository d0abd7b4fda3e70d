use actix_web::{web, HttpResponse};
use chrono::Utc;
use sqlx::PgPool;

use crate::db::chat::{fetch_recent_history, insert_chat_entry, CHAT_HISTORY_LIMIT};
use crate::db::helpers::database_error;
use crate::handlers::{bad_request, user_id_from_claims};
use crate::middleware::auth::Claims;
use crate::models::chat::{ChatHistoryResponse, ChatRequest, ChatResponse};
use crate::models::common::DEFAULT_WINDOW_DAYS;
use crate::services::chat_service::{generate_reply, load_chat_context};
use crate::services::GeminiService;

#[tracing::instrument(
    name = "Chat message",
    skip(pool, gemini, claims, body),
    fields(username = %claims.username)
)]
pub async fn send_message(
    pool: web::Data<PgPool>,
    gemini: web::Data<GeminiService>,
    claims: web::ReqData<Claims>,
    body: web::Json<ChatRequest>,
) -> HttpResponse {
    let user_id = match user_id_from_claims(&claims) {
        Ok(id) => id,
        Err(response) => return response,
    };

    let message = body.message.trim();
    if message.is_empty() {
        return bad_request("Message is required");
    }

    let now = Utc::now();
    let context = match load_chat_context(&pool, user_id, DEFAULT_WINDOW_DAYS, now).await {
        Ok(context) => context,
        Err(e) => return database_error(e),
    };

    let outcome = generate_reply(&gemini, &context, message).await;
    let timestamp = Utc::now();

    if let Err(e) = insert_chat_entry(&pool, user_id, message, outcome.text(), timestamp).await {
        return database_error(e);
    }

    HttpResponse::Ok().json(ChatResponse {
        fallback: outcome.fallback_flag(),
        response: outcome.into_text(),
        timestamp,
    })
}

#[tracing::instrument(
    name = "Chat history",
    skip(pool, claims),
    fields(username = %claims.username)
)]
pub async fn chat_history(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
) -> HttpResponse {
    let user_id = match user_id_from_claims(&claims) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match fetch_recent_history(&pool, user_id, CHAT_HISTORY_LIMIT).await {
        Ok(history) => HttpResponse::Ok().json(ChatHistoryResponse { history }),
        Err(e) => database_error(e),
    }
}
