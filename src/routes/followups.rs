use actix_web::{delete, get, post, web, HttpResponse};
use sqlx::PgPool;
use uuid::Uuid;

use crate::handlers::followup_handler::{
    complete_followup, create_followup, delete_followup, followup_history, list_followups,
};
use crate::middleware::auth::Claims;
use crate::models::followup::{CompleteFollowUpRequest, CreateFollowUpRequest};
use crate::services::GeminiService;

#[get("")]
async fn get_followups(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
) -> HttpResponse {
    list_followups(pool, claims).await
}

#[post("")]
async fn post_followup(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
    data: web::Json<CreateFollowUpRequest>,
) -> HttpResponse {
    create_followup(pool, claims, data).await
}

#[post("/{followup_id}/complete")]
async fn complete(
    pool: web::Data<PgPool>,
    gemini: web::Data<GeminiService>,
    claims: web::ReqData<Claims>,
    path: web::Path<Uuid>,
    data: Option<web::Json<CompleteFollowUpRequest>>,
) -> HttpResponse {
    complete_followup(pool, gemini, claims, path, data).await
}

#[get("/{followup_id}/history")]
async fn history(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
    path: web::Path<Uuid>,
) -> HttpResponse {
    followup_history(pool, claims, path).await
}

#[delete("/{followup_id}")]
async fn remove_followup(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
    path: web::Path<Uuid>,
) -> HttpResponse {
    delete_followup(pool, claims, path).await
}
