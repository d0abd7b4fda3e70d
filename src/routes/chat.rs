use actix_web::{get, post, web, HttpResponse};
use sqlx::PgPool;

use crate::handlers::chat_handler::{chat_history, send_message};
use crate::middleware::auth::Claims;
use crate::models::chat::ChatRequest;
use crate::services::GeminiService;

#[post("")]
async fn send_chat_message(
    pool: web::Data<PgPool>,
    gemini: web::Data<GeminiService>,
    claims: web::ReqData<Claims>,
    data: web::Json<ChatRequest>,
) -> HttpResponse {
    send_message(pool, gemini, claims, data).await
}

#[get("/history")]
async fn get_chat_history(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
) -> HttpResponse {
    chat_history(pool, claims).await
}
